//! Transaction documents.
//!
//! Documents are the one entity with row-level access control beyond the
//! ownership scope: each row declares an access level, checked by a record
//! guard after the scoped fetch.

use acredb_core::{
    context::{Role, UserContext},
    descriptor::{
        Audience, DescriptorError, EntityDescriptor, EventPolicy, LifecycleHooks, OperationFlags,
        SortDirection,
    },
    error::EngineError,
    row::EntityRow,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub fn descriptor() -> Result<EntityDescriptor, DescriptorError> {
    let operations = OperationFlags {
        batch_delete: false,
        ..OperationFlags::default()
    };

    EntityDescriptor::builder("document", "documents", "d")
        .status_column("document_status")
        .broker_column("broker_id")
        .privacy_column("is_private")
        .operations(operations)
        .required(&["title", "file_key"])
        .statuses(&["pending_signature", "signed", "expired", "voided"])
        .search_columns(&["d.title", "d.file_name"])
        .sortable("createdAt", "d.created_at")
        .sortable("title", "d.title")
        .default_sort("createdAt", SortDirection::Desc)
        .events(EventPolicy::rooms(vec![Audience::User]))
        .hooks(LifecycleHooks {
            record_guard: Some(Arc::new(access_guard)),
            ..LifecycleHooks::default()
        })
        .build()
}

/// Row-level document access: the owner and system admins always pass;
/// everyone else is judged by the row's declared access level. A private
/// row is owner-only regardless of level.
fn access_guard(row: &EntityRow, ctx: &UserContext) -> Result<(), EngineError> {
    if ctx.role == Some(Role::SystemAdmin) {
        return Ok(());
    }

    let owner = row.get_uuid("owner_id");
    if owner.is_some() && owner == ctx.id {
        return Ok(());
    }

    let denied = || EngineError::permission_denied("you do not have access to this document");

    let private = row
        .get("is_private")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);
    if private {
        return Err(denied());
    }

    match row.get_str("access_level").unwrap_or("private") {
        "public" => Ok(()),
        "team" => {
            let team = row.get_uuid("team_id");
            if team.is_some() && team == ctx.team_id {
                Ok(())
            } else {
                Err(denied())
            }
        }
        "brokerage" => {
            let broker = row.get_uuid("broker_id");
            if broker.is_some() && broker == ctx.broker_id {
                Ok(())
            } else {
                Err(denied())
            }
        }
        _ => Err(denied()),
    }
}

#[cfg(test)]
mod tests {
    use super::{access_guard, descriptor};
    use acredb_core::{
        context::{Role, UserContext},
        row::EntityRow,
    };
    use serde_json::json;
    use uuid::Uuid;

    const OWNER: Uuid = Uuid::from_u128(1);
    const TEAM: Uuid = Uuid::from_u128(2);
    const BROKER: Uuid = Uuid::from_u128(3);
    const STRANGER: Uuid = Uuid::from_u128(9);

    fn doc(value: serde_json::Value) -> EntityRow {
        match value {
            serde_json::Value::Object(map) => EntityRow::new(map),
            other => panic!("expected object, got {other}"),
        }
    }

    fn ctx(id: Uuid) -> UserContext {
        UserContext {
            id: Some(id),
            role: Some(Role::Agent),
            team_id: Some(TEAM),
            broker_id: Some(BROKER),
            ..UserContext::default()
        }
    }

    #[test]
    fn owner_always_passes() {
        let row = doc(json!({
            "owner_id": OWNER.to_string(),
            "access_level": "private",
            "is_private": true,
        }));
        assert!(access_guard(&row, &ctx(OWNER)).is_ok());
    }

    #[test]
    fn system_admin_bypasses_the_guard() {
        let row = doc(json!({
            "owner_id": OWNER.to_string(),
            "access_level": "private",
        }));
        let mut admin = ctx(STRANGER);
        admin.role = Some(Role::SystemAdmin);
        assert!(access_guard(&row, &admin).is_ok());
    }

    #[test]
    fn private_flag_overrides_a_permissive_level() {
        let row = doc(json!({
            "owner_id": OWNER.to_string(),
            "access_level": "public",
            "is_private": true,
        }));
        let err = access_guard(&row, &ctx(STRANGER)).expect_err("should deny");
        assert!(err.is_permission_denied());
    }

    #[test]
    fn team_level_requires_matching_team() {
        let row = doc(json!({
            "owner_id": OWNER.to_string(),
            "access_level": "team",
            "team_id": TEAM.to_string(),
        }));
        assert!(access_guard(&row, &ctx(STRANGER)).is_ok());

        let mut outsider = ctx(STRANGER);
        outsider.team_id = Some(Uuid::from_u128(99));
        assert!(access_guard(&row, &outsider).is_err());
    }

    #[test]
    fn missing_access_level_reads_as_private() {
        let row = doc(json!({ "owner_id": OWNER.to_string() }));
        assert!(access_guard(&row, &ctx(STRANGER)).is_err());
    }

    #[test]
    fn batch_delete_is_disabled() {
        let desc = descriptor().expect("descriptor should build");
        assert!(!desc.operations.batch_delete);
        assert!(desc.operations.hard_delete);
    }
}
