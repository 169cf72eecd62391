//! Single-record reads.
//!
//! Get-by-id applies no ownership filter: callers arrive here with a
//! concrete id, and tier filtering is a list concern. Entities that need
//! record-level authorization install a `record_guard` hook, which runs
//! against the fetched row before it is returned.

use crate::{
    context::UserContext,
    descriptor::{EntityDescriptor, OperationKind},
    engine::AccessEngine,
    error::EngineError,
    row::EntityRow,
    sql::{FragmentBuilder, SqlValue, Statement},
};
use uuid::Uuid;

pub(super) async fn run(
    engine: &AccessEngine,
    desc: &EntityDescriptor,
    ctx: &UserContext,
    id: Uuid,
) -> Result<EntityRow, EngineError> {
    desc.ensure_enabled(OperationKind::Get)?;

    let mut fb = FragmentBuilder::new();
    let id_ph = fb.bind(SqlValue::Uuid(id));

    let projection = desc.query.detail_columns.join(", ");
    let mut from = format!("{} {}", desc.identity.table, desc.identity.alias);
    let joins = desc.query.join_clause();
    if !joins.is_empty() {
        from.push(' ');
        from.push_str(&joins);
    }

    let stmt = Statement::new(
        format!(
            "SELECT {projection} FROM {from} WHERE {} = {id_ph} AND {} IS NULL",
            desc.qualify(&desc.fields.id),
            desc.qualify(&desc.fields.deleted_at)
        ),
        fb.into_params(),
    );

    let mut conn = engine.connection().await?;
    let row = conn
        .query(&stmt)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            EngineError::not_found(
                &desc.identity.name,
                format!("{} not found", desc.identity.label),
            )
        })?;

    if let Some(guard) = &desc.hooks.record_guard {
        guard(&row, ctx)?;
    }

    Ok(row)
}
