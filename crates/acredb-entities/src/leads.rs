//! Sales leads.
//!
//! Leads are the only entity where agents routinely work territory that
//! overlaps teammates, so they carry the privacy column: a private lead is
//! visible to its owner alone even under team or brokerage scope.

use acredb_core::{
    descriptor::{
        Audience, DescriptorError, EntityDescriptor, EventPolicy, FilterOp, FilterSpec,
        FilterValueType, LifecycleHooks, SortDirection,
    },
    error::EngineError,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub fn descriptor() -> Result<EntityDescriptor, DescriptorError> {
    EntityDescriptor::builder("lead", "leads", "ld")
        .status_column("lead_status")
        .privacy_column("is_private")
        .required(&["first_name", "lead_status"])
        .statuses(&["new", "contacted", "qualified", "converted", "dead"])
        .search_columns(&["ld.first_name", "ld.last_name", "ld.email", "ld.phone"])
        .sortable("createdAt", "ld.created_at")
        .sortable("updatedAt", "ld.updated_at")
        .default_sort("createdAt", SortDirection::Desc)
        .filter(FilterSpec::new(
            "source",
            "ld.lead_source",
            FilterOp::Eq,
            FilterValueType::Text,
        ))
        .events(EventPolicy::rooms(vec![Audience::User, Audience::Team]))
        .hooks(LifecycleHooks {
            on_create: Some(Arc::new(|payload, _ctx| validate_email(payload))),
            on_update: Some(Arc::new(|payload, _prior, _ctx| validate_email(payload))),
            ..LifecycleHooks::default()
        })
        .build()
}

fn validate_email(
    payload: &serde_json::Map<String, JsonValue>,
) -> Result<(), EngineError> {
    let Some(email) = payload.get("email").and_then(JsonValue::as_str) else {
        return Ok(());
    };

    // A shape check, not RFC validation; the mail provider has the last word.
    let plausible = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    });
    if plausible {
        Ok(())
    } else {
        Err(EngineError::validation("a valid email address is required"))
    }
}

#[cfg(test)]
mod tests {
    use super::{descriptor, validate_email};
    use serde_json::json;

    fn payload(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn privacy_column_is_declared() {
        let desc = descriptor().expect("descriptor should build");
        assert_eq!(desc.fields.is_private.as_deref(), Some("is_private"));
    }

    #[test]
    fn email_shape_is_checked_when_present() {
        assert!(validate_email(&payload(json!({}))).is_ok());
        assert!(validate_email(&payload(json!({"email": "ann@example.com"}))).is_ok());
        assert!(validate_email(&payload(json!({"email": "not-an-email"}))).is_err());
        assert!(validate_email(&payload(json!({"email": "ann@nodot"}))).is_err());
    }
}
