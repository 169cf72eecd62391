//! The deletion ladder: archive, restore, hard delete, batch delete.
//!
//! Archival is the only soft state transition; permanent deletion refuses
//! rows that are not already archived, and the batch form verifies every
//! id inside one transaction before anything is removed.

use crate::{
    context::UserContext,
    descriptor::{EntityDescriptor, OperationKind},
    engine::AccessEngine,
    error::EngineError,
    notify::ChangeAction,
    row::EntityRow,
    sql::{SqlValue, Statement},
    store::StoreConn,
};
use chrono::Utc;
use uuid::Uuid;

///
/// BatchDeleted
///

#[derive(Clone, Debug)]
pub struct BatchDeleted {
    pub deleted: u64,
    pub rows: Vec<EntityRow>,
}

pub(super) async fn archive(
    engine: &AccessEngine,
    desc: &EntityDescriptor,
    ctx: &UserContext,
    id: Uuid,
) -> Result<EntityRow, EngineError> {
    desc.ensure_enabled(OperationKind::Archive)?;

    let mut conn = engine.connection().await?;

    // The delete-adjacent hooks are observational, never gating. The prior
    // snapshot is only fetched when the pre hook wants it; a miss here just
    // means the UPDATE below will miss too.
    if let Some(hook) = &desc.hooks.before_delete {
        let stmt = Statement::new(
            format!(
                "SELECT * FROM {} WHERE {} = $1 AND {} IS NULL",
                desc.identity.table, desc.fields.id, desc.fields.deleted_at
            ),
            vec![SqlValue::Uuid(id)],
        );
        if let Some(row) = conn.query(&stmt).await?.into_iter().next() {
            if let Err(err) = hook(&row, ctx) {
                tracing::warn!(entity = %desc.identity.name, %err, "before-delete hook failed");
            }
        }
    }

    let stmt = Statement::new(
        format!(
            "UPDATE {} SET {} = $1, {} = $1 WHERE {} = $2 AND {} IS NULL RETURNING *",
            desc.identity.table,
            desc.fields.deleted_at,
            desc.fields.updated_at,
            desc.fields.id,
            desc.fields.deleted_at
        ),
        vec![SqlValue::Timestamp(Utc::now()), SqlValue::Uuid(id)],
    );

    tracing::debug!(entity = %desc.identity.name, %id, "archive");

    let row = conn
        .query(&stmt)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| not_live(desc))?;

    if let Some(hook) = &desc.hooks.after_delete {
        if let Err(err) = hook(&row, ctx) {
            tracing::warn!(entity = %desc.identity.name, %err, "after-delete hook failed");
        }
    }

    Ok(row)
}

pub(super) async fn restore(
    engine: &AccessEngine,
    desc: &EntityDescriptor,
    _ctx: &UserContext,
    id: Uuid,
) -> Result<EntityRow, EngineError> {
    desc.ensure_enabled(OperationKind::Restore)?;

    let stmt = Statement::new(
        format!(
            "UPDATE {} SET {} = NULL, {} = $1 WHERE {} = $2 AND {} IS NOT NULL RETURNING *",
            desc.identity.table,
            desc.fields.deleted_at,
            desc.fields.updated_at,
            desc.fields.id,
            desc.fields.deleted_at
        ),
        vec![SqlValue::Timestamp(Utc::now()), SqlValue::Uuid(id)],
    );

    tracing::debug!(entity = %desc.identity.name, %id, "restore");

    let mut conn = engine.connection().await?;
    conn.query(&stmt)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            EngineError::not_found(
                &desc.identity.name,
                format!("{} not found in the archive", desc.identity.label),
            )
        })
}

pub(super) async fn hard_delete(
    engine: &AccessEngine,
    desc: &EntityDescriptor,
    ctx: &UserContext,
    id: Uuid,
) -> Result<EntityRow, EngineError> {
    desc.ensure_enabled(OperationKind::HardDelete)?;

    let stmt = Statement::new(
        format!(
            "DELETE FROM {} WHERE {} = $1 AND {} IS NOT NULL RETURNING *",
            desc.identity.table, desc.fields.id, desc.fields.deleted_at
        ),
        vec![SqlValue::Uuid(id)],
    );

    tracing::debug!(entity = %desc.identity.name, %id, "hard delete");

    let mut conn = engine.connection().await?;
    let row = conn
        .query(&stmt)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            EngineError::not_found(
                &desc.identity.name,
                format!(
                    "{} must be archived before permanent deletion",
                    desc.identity.label
                ),
            )
        })?;

    engine.publish(desc, ctx, &row, ChangeAction::Deleted);

    Ok(row)
}

pub(super) async fn batch_delete(
    engine: &AccessEngine,
    desc: &EntityDescriptor,
    _ctx: &UserContext,
    ids: &[Uuid],
) -> Result<BatchDeleted, EngineError> {
    desc.ensure_enabled(OperationKind::BatchDelete)?;

    if ids.is_empty() {
        return Err(EngineError::validation(format!(
            "no {} ids supplied",
            desc.identity.name
        )));
    }

    let mut conn = engine.connection().await?;
    conn.begin().await?;

    match batch_delete_in_tx(&mut conn, desc, ids).await {
        Ok(result) => {
            conn.commit().await?;
            tracing::debug!(
                entity = %desc.identity.name,
                deleted = result.deleted,
                "batch delete"
            );
            Ok(result)
        }
        Err(err) => {
            if let Err(rb) = conn.rollback().await {
                tracing::debug!(%rb, "rollback after failed batch delete");
            }
            Err(err)
        }
    }
}

async fn batch_delete_in_tx(
    conn: &mut Box<dyn StoreConn>,
    desc: &EntityDescriptor,
    ids: &[Uuid],
) -> Result<BatchDeleted, EngineError> {
    let check = Statement::new(
        format!(
            "SELECT {}, {} FROM {} WHERE {} = ANY($1)",
            desc.fields.id, desc.fields.deleted_at, desc.identity.table, desc.fields.id
        ),
        vec![SqlValue::UuidArray(ids.to_vec())],
    );

    let found = conn.query(&check).await?;
    if found.len() != ids.len() {
        return Err(EngineError::not_found(
            &desc.identity.name,
            format!("one or more {} were not found", desc.identity.name_plural),
        ));
    }

    let any_live = found
        .iter()
        .any(|row| row.is_null(&desc.fields.deleted_at));
    if any_live {
        return Err(EngineError::validation(format!(
            "all {} must be archived before batch deletion",
            desc.identity.name_plural
        )));
    }

    let delete = Statement::new(
        format!(
            "DELETE FROM {} WHERE {} = ANY($1) AND {} IS NOT NULL RETURNING *",
            desc.identity.table, desc.fields.id, desc.fields.deleted_at
        ),
        vec![SqlValue::UuidArray(ids.to_vec())],
    );

    let rows = conn.query(&delete).await?;

    // A row restored between the verify SELECT and the DELETE is skipped
    // by the tombstone guard; a short batch rolls back rather than leaving
    // a partial deletion behind.
    if rows.len() != ids.len() {
        return Err(EngineError::validation(format!(
            "all {} must be archived before batch deletion",
            desc.identity.name_plural
        )));
    }

    let deleted = rows.len() as u64;

    Ok(BatchDeleted { deleted, rows })
}

fn not_live(desc: &EntityDescriptor) -> EngineError {
    EngineError::not_found(
        &desc.identity.name,
        format!("{} not found or already archived", desc.identity.label),
    )
}
