//! Showings and meetings, joined to the client they are booked with.

use acredb_core::descriptor::{
    Audience, DescriptorError, EntityDescriptor, EventPolicy, FilterOp, FilterSpec,
    FilterValueType, JoinKind, JoinSpec, SortDirection,
};

pub fn descriptor() -> Result<EntityDescriptor, DescriptorError> {
    EntityDescriptor::builder("appointment", "appointments", "a")
        .status_column("appointment_status")
        .required(&["title", "scheduled_at"])
        .statuses(&["scheduled", "completed", "cancelled", "no_show"])
        .search_columns(&["a.title", "a.location"])
        .sortable("scheduledAt", "a.scheduled_at")
        .sortable("createdAt", "a.created_at")
        .default_sort("scheduledAt", SortDirection::Asc)
        .join(JoinSpec::new(
            JoinKind::Left,
            "clients",
            "c",
            "c.id = a.client_id",
        ))
        .detail_columns(&["a.*", "c.first_name", "c.last_name"])
        .filter(FilterSpec::new(
            "startDate",
            "a.scheduled_at",
            FilterOp::Gte,
            FilterValueType::Date,
        ))
        .filter(FilterSpec::new(
            "endDate",
            "a.scheduled_at",
            FilterOp::Lte,
            FilterValueType::Date,
        ))
        .events(EventPolicy::rooms(vec![Audience::User, Audience::Team]))
        .build()
}

#[cfg(test)]
mod tests {
    use super::descriptor;

    #[test]
    fn detail_reads_join_the_client() {
        let desc = descriptor().expect("descriptor should build");

        assert_eq!(desc.query.joins.len(), 1);
        assert_eq!(desc.query.joins[0].on, "c.id = a.client_id");
        assert!(
            desc.query
                .detail_columns
                .contains(&"c.first_name".to_owned())
        );
        // List reads stay narrow.
        assert_eq!(desc.query.list_columns, vec!["a.*".to_owned()]);
    }

    #[test]
    fn date_window_filters_bracket_the_schedule() {
        let desc = descriptor().expect("descriptor should build");

        let names: Vec<&str> = desc.filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["startDate", "endDate"]);
    }
}
