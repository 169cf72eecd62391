//! Client records: buyers and sellers a user works with.

use acredb_core::descriptor::{
    DescriptorError, EntityDescriptor, FilterOp, FilterSpec, FilterValueType, SortDirection,
};

pub fn descriptor() -> Result<EntityDescriptor, DescriptorError> {
    EntityDescriptor::builder("client", "clients", "c")
        .status_column("client_status")
        .required(&["first_name", "last_name"])
        .statuses(&["active", "inactive", "past"])
        .search_columns(&["c.first_name", "c.last_name", "c.email", "c.phone"])
        .sortable("createdAt", "c.created_at")
        .sortable("lastName", "c.last_name")
        .default_sort("lastName", SortDirection::Asc)
        .filter(FilterSpec::new(
            "createdAfter",
            "c.created_at",
            FilterOp::Gte,
            FilterValueType::Date,
        ))
        .build()
}

#[cfg(test)]
mod tests {
    use super::descriptor;

    #[test]
    fn clients_sort_by_last_name_ascending() {
        let desc = descriptor().expect("descriptor should build");

        assert_eq!(desc.query.sort_expression(None), "c.last_name");
        assert_eq!(desc.query.default_direction.as_sql(), "ASC");
    }

    #[test]
    fn no_events_are_emitted() {
        let desc = descriptor().expect("descriptor should build");
        assert!(!desc.events.emit);
    }
}
