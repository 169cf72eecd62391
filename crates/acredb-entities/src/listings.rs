//! Property listings.

use acredb_core::descriptor::{
    Audience, DescriptorError, EntityDescriptor, EventPolicy, FilterOp, FilterSpec,
    FilterValueType, SortDirection,
};

pub fn descriptor() -> Result<EntityDescriptor, DescriptorError> {
    EntityDescriptor::builder("listing", "listings", "l")
        .owner_column("listing_agent_id")
        .broker_column("broker_id")
        .status_column("listing_status")
        .field_alias("listingAgentId", "listing_agent_id")
        .field_alias("mls", "mls_number")
        .required(&["address", "listing_status"])
        .statuses(&["draft", "active", "pending", "sold", "withdrawn"])
        .search_columns(&["l.address", "l.city", "l.mls_number"])
        .sortable("createdAt", "l.created_at")
        .sortable("updatedAt", "l.updated_at")
        .sortable("listPrice", "l.list_price")
        .default_sort("createdAt", SortDirection::Desc)
        .filter(FilterSpec::new(
            "minPrice",
            "l.list_price",
            FilterOp::Gte,
            FilterValueType::Number,
        ))
        .filter(FilterSpec::new(
            "maxPrice",
            "l.list_price",
            FilterOp::Lte,
            FilterValueType::Number,
        ))
        .filter(FilterSpec::new(
            "minBedrooms",
            "l.bedrooms",
            FilterOp::Gte,
            FilterValueType::Number,
        ))
        .events(EventPolicy::rooms(vec![Audience::Team, Audience::Broker]))
        .build()
}

#[cfg(test)]
mod tests {
    use super::descriptor;

    #[test]
    fn owner_lives_under_the_agent_column() {
        let desc = descriptor().expect("descriptor should build");

        assert_eq!(desc.fields.owner, "listing_agent_id");
        assert_eq!(desc.qualify(&desc.fields.owner), "l.listing_agent_id");
    }

    #[test]
    fn price_filters_target_the_same_column() {
        let desc = descriptor().expect("descriptor should build");

        let columns: Vec<&str> = desc
            .filters
            .iter()
            .filter(|f| f.name.ends_with("Price"))
            .map(|f| f.column.as_str())
            .collect();
        assert_eq!(columns, vec!["l.list_price", "l.list_price"]);
    }
}
