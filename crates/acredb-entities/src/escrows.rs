//! Escrow files.
//!
//! Escrows see concurrent edits from agents, coordinators, and brokers, so
//! they carry the optimistic-lock version column. New files get a
//! human-readable display id stamped at create time.

use acredb_core::descriptor::{
    Audience, DescriptorError, EntityDescriptor, EventPolicy, LifecycleHooks, SortDirection,
};
use chrono::{Datelike, Utc};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

pub fn descriptor() -> Result<EntityDescriptor, DescriptorError> {
    EntityDescriptor::builder("escrow", "escrows", "e")
        .status_column("escrow_status")
        .broker_column("broker_id")
        .version_column("version")
        .required(&["listing_id", "escrow_status"])
        .statuses(&[
            "opened",
            "contingency",
            "clear_to_close",
            "closed",
            "cancelled",
        ])
        .search_columns(&["e.display_id", "e.title_company"])
        .sortable("createdAt", "e.created_at")
        .sortable("closingDate", "e.closing_date")
        .default_sort("createdAt", SortDirection::Desc)
        .events(EventPolicy::rooms(vec![Audience::User, Audience::Broker]))
        .hooks(LifecycleHooks {
            before_create: Some(Arc::new(|mut payload, _ctx| {
                if !payload.contains_key("displayId") {
                    payload.insert(
                        "displayId".to_owned(),
                        JsonValue::String(new_display_id()),
                    );
                }
                Ok(payload)
            })),
            ..LifecycleHooks::default()
        })
        .build()
}

/// `ESC-<year>-<8 hex>`: unique enough for a human-facing file number
/// without a round-trip to the database.
fn new_display_id() -> String {
    let tail = Uuid::new_v4().simple().to_string();
    format!("ESC-{}-{}", Utc::now().year(), &tail[..8])
}
