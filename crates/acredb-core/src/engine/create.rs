//! Record creation.
//!
//! Pipeline: validate hook, rewrite hook, name translation, required-field
//! check, immutable-column strip, tenancy stamping, timestamps and the
//! version seed, then a single INSERT inside an explicit transaction frame.

use crate::{
    context::UserContext,
    descriptor::{EntityDescriptor, OperationKind, Payload},
    engine::{AccessEngine, translate_payload},
    error::EngineError,
    notify::ChangeAction,
    row::EntityRow,
    sql::{FragmentBuilder, SqlValue, Statement},
    store::StoreError,
};
use chrono::Utc;

pub(super) async fn run(
    engine: &AccessEngine,
    desc: &EntityDescriptor,
    ctx: &UserContext,
    mut payload: Payload,
) -> Result<EntityRow, EngineError> {
    desc.ensure_enabled(OperationKind::Create)?;

    if let Some(hook) = &desc.hooks.on_create {
        hook(&payload, ctx)?;
    }
    if let Some(hook) = &desc.hooks.before_create {
        payload = hook(payload, ctx)?;
    }

    let mut columns = translate_payload(desc, &payload)?;

    for required in &desc.required {
        let present = columns.iter().any(|(column, value)| {
            column == required
                && match value {
                    SqlValue::Null => false,
                    SqlValue::Text(text) => !text.is_empty(),
                    _ => true,
                }
        });
        if !present {
            return Err(EngineError::validation(format!("{required} is required")));
        }
    }

    // Immutable columns are server-assigned; caller-supplied values for
    // them are dropped silently, and the engine writes its own below.
    columns.retain(|(column, _)| !desc.is_immutable(column));

    // Tenancy comes from the caller context only; a payload value for any
    // of these columns is discarded before stamping.
    stamp(&mut columns, &desc.fields.owner, ctx.id);
    stamp(&mut columns, &desc.fields.team, ctx.team_id);
    if let Some(broker) = &desc.fields.broker {
        stamp(&mut columns, broker, ctx.broker_id);
    }

    let now = Utc::now();
    columns.push((desc.fields.created_at.clone(), SqlValue::Timestamp(now)));
    columns.push((desc.fields.updated_at.clone(), SqlValue::Timestamp(now)));
    if let Some(version) = &desc.fields.version {
        columns.push((version.clone(), SqlValue::Int(1)));
    }

    let mut fb = FragmentBuilder::new();
    let names = columns
        .iter()
        .map(|(column, _)| column.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = columns
        .iter()
        .map(|(_, value)| fb.bind(value.clone()))
        .collect::<Vec<_>>()
        .join(", ");

    let stmt = Statement::new(
        format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders}) RETURNING *",
            desc.identity.table
        ),
        fb.into_params(),
    );

    tracing::debug!(entity = %desc.identity.name, "create");

    let mut conn = engine.connection().await?;
    conn.begin().await?;
    let rows = match conn.query(&stmt).await {
        Ok(rows) => rows,
        Err(err) => {
            if let Err(rb) = conn.rollback().await {
                tracing::debug!(%rb, "rollback after failed insert");
            }
            return Err(err.into());
        }
    };
    conn.commit().await?;

    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::query("insert returned no row"))?;

    if let Some(hook) = &desc.hooks.after_create {
        if let Err(err) = hook(&row, ctx) {
            tracing::warn!(entity = %desc.identity.name, %err, "after-create hook failed");
        }
    }

    engine.publish(desc, ctx, &row, ChangeAction::Created);

    Ok(row)
}

fn stamp(columns: &mut Vec<(String, SqlValue)>, column: &str, value: Option<uuid::Uuid>) {
    columns.retain(|(existing, _)| existing != column);
    let Some(value) = value else { return };
    columns.push((column.to_owned(), SqlValue::Uuid(value)));
}
