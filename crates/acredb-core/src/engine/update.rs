//! Record updates with optimistic concurrency.
//!
//! The prior row is fetched first so validate/rewrite hooks can compare
//! against it; the UPDATE itself is a single statement whose WHERE clause
//! carries the expected version when the caller supplied one.

use crate::{
    context::UserContext,
    descriptor::{EntityDescriptor, OperationKind, Payload},
    engine::{AccessEngine, translate_payload},
    error::EngineError,
    notify::ChangeAction,
    row::EntityRow,
    sql::{FragmentBuilder, SqlValue, Statement},
};
use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub(super) async fn run(
    engine: &AccessEngine,
    desc: &EntityDescriptor,
    ctx: &UserContext,
    id: Uuid,
    mut payload: Payload,
) -> Result<EntityRow, EngineError> {
    desc.ensure_enabled(OperationKind::Update)?;

    let mut conn = engine.connection().await?;
    let prior = engine
        .fetch_any(&mut conn, desc, id)
        .await?
        .ok_or_else(|| {
            EngineError::not_found(
                &desc.identity.name,
                format!("{} not found", desc.identity.label),
            )
        })?;

    // The expected version rides in the payload under the external name;
    // the column itself is engine-owned and never caller-writable.
    let expected_version = desc
        .fields
        .version
        .as_ref()
        .and_then(|_| payload.remove("version"))
        .as_ref()
        .and_then(JsonValue::as_i64);

    if let Some(hook) = &desc.hooks.on_update {
        hook(&payload, &prior, ctx)?;
    }
    if let Some(hook) = &desc.hooks.before_update {
        payload = hook(payload, &prior, ctx)?;
    }

    let mut columns = translate_payload(desc, &payload)?;
    columns.retain(|(column, _)| column != &desc.fields.id && !desc.is_immutable(column));

    if columns.is_empty() {
        return Err(EngineError::validation("no valid fields to update"));
    }

    let mut fb = FragmentBuilder::new();
    let mut assignments = columns
        .iter()
        .map(|(column, value)| {
            let ph = fb.bind(value.clone());
            format!("{column} = {ph}")
        })
        .collect::<Vec<_>>();

    let now_ph = fb.bind(SqlValue::Timestamp(Utc::now()));
    assignments.push(format!("{} = {now_ph}", desc.fields.updated_at));
    if let Some(version) = &desc.fields.version {
        assignments.push(format!("{version} = {version} + 1"));
    }

    let id_ph = fb.bind(SqlValue::Uuid(id));
    let mut conditions = vec![
        format!("{} = {id_ph}", desc.fields.id),
        format!("{} IS NULL", desc.fields.deleted_at),
    ];
    if let (Some(version), Some(expected)) = (&desc.fields.version, expected_version) {
        let ph = fb.bind(SqlValue::Int(expected));
        conditions.push(format!("{version} = {ph}"));
    }

    let stmt = Statement::new(
        format!(
            "UPDATE {} SET {} WHERE {} RETURNING *",
            desc.identity.table,
            assignments.join(", "),
            conditions.join(" AND ")
        ),
        fb.into_params(),
    );

    tracing::debug!(entity = %desc.identity.name, %id, "update");

    let rows = conn.query(&stmt).await?;
    let Some(row) = rows.into_iter().next() else {
        // The row existed a moment ago; a versioned miss is a concurrent
        // writer, an unversioned one is an archive race.
        return Err(if expected_version.is_some() {
            EngineError::version_conflict(&desc.identity.label)
        } else {
            EngineError::not_found(
                &desc.identity.name,
                format!("{} not found", desc.identity.label),
            )
        });
    };

    if let Some(hook) = &desc.hooks.after_update {
        if let Err(err) = hook(&row, &prior, ctx) {
            tracing::warn!(entity = %desc.identity.name, %err, "after-update hook failed");
        }
    }

    engine.publish(desc, ctx, &row, ChangeAction::Updated);

    Ok(row)
}
