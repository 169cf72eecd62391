//! The access engine.
//!
//! One engine serves every entity: each operation takes an
//! [`EntityDescriptor`] and a [`UserContext`] and derives its behavior
//! entirely from them. Query text is assembled from descriptor-validated
//! identifiers; caller values only ever travel as bound parameters.

mod create;
mod delete;
mod get;
mod list;
mod update;


pub use delete::BatchDeleted;
pub use list::{ListParams, Page};

use crate::{
    context::UserContext,
    descriptor::{Audience, EntityDescriptor, Payload},
    error::EngineError,
    notify::{ChangeAction, ChangeEvent, ChangeNotifier, Room},
    row::EntityRow,
    sql::{SqlValue, Statement},
    store::{StoreConn, StorePort},
};
use std::sync::Arc;
use uuid::Uuid;

///
/// AccessEngine
///
/// Descriptor-driven CRUD over the storage port, with best-effort change
/// notification after committed mutations.
///

#[derive(Clone)]
pub struct AccessEngine {
    store: Arc<dyn StorePort>,
    notifier: ChangeNotifier,
}

impl AccessEngine {
    #[must_use]
    pub fn new(store: Arc<dyn StorePort>, notifier: ChangeNotifier) -> Self {
        Self { store, notifier }
    }

    pub async fn list(
        &self,
        desc: &EntityDescriptor,
        ctx: &UserContext,
        params: &ListParams,
    ) -> Result<Page, EngineError> {
        list::run(self, desc, ctx, params).await
    }

    pub async fn get(
        &self,
        desc: &EntityDescriptor,
        ctx: &UserContext,
        id: Uuid,
    ) -> Result<EntityRow, EngineError> {
        get::run(self, desc, ctx, id).await
    }

    pub async fn create(
        &self,
        desc: &EntityDescriptor,
        ctx: &UserContext,
        payload: Payload,
    ) -> Result<EntityRow, EngineError> {
        create::run(self, desc, ctx, payload).await
    }

    pub async fn update(
        &self,
        desc: &EntityDescriptor,
        ctx: &UserContext,
        id: Uuid,
        payload: Payload,
    ) -> Result<EntityRow, EngineError> {
        update::run(self, desc, ctx, id, payload).await
    }

    pub async fn archive(
        &self,
        desc: &EntityDescriptor,
        ctx: &UserContext,
        id: Uuid,
    ) -> Result<EntityRow, EngineError> {
        delete::archive(self, desc, ctx, id).await
    }

    pub async fn restore(
        &self,
        desc: &EntityDescriptor,
        ctx: &UserContext,
        id: Uuid,
    ) -> Result<EntityRow, EngineError> {
        delete::restore(self, desc, ctx, id).await
    }

    pub async fn hard_delete(
        &self,
        desc: &EntityDescriptor,
        ctx: &UserContext,
        id: Uuid,
    ) -> Result<EntityRow, EngineError> {
        delete::hard_delete(self, desc, ctx, id).await
    }

    pub async fn batch_delete(
        &self,
        desc: &EntityDescriptor,
        ctx: &UserContext,
        ids: &[Uuid],
    ) -> Result<BatchDeleted, EngineError> {
        delete::batch_delete(self, desc, ctx, ids).await
    }

    pub(crate) async fn connection(&self) -> Result<Box<dyn StoreConn>, EngineError> {
        Ok(self.store.connection().await?)
    }

    /// Fetch a row by id regardless of archive state. Used as the prior
    /// snapshot for update hooks.
    pub(crate) async fn fetch_any(
        &self,
        conn: &mut Box<dyn StoreConn>,
        desc: &EntityDescriptor,
        id: Uuid,
    ) -> Result<Option<EntityRow>, EngineError> {
        let stmt = Statement::new(
            format!(
                "SELECT * FROM {} WHERE {} = $1",
                desc.identity.table, desc.fields.id
            ),
            vec![SqlValue::Uuid(id)],
        );

        Ok(conn.query(&stmt).await?.into_iter().next())
    }

    /// Publish a change event per the descriptor's policy. Rooms with no
    /// tenancy value on the caller are skipped; an empty room set skips
    /// publication entirely.
    pub(crate) fn publish(
        &self,
        desc: &EntityDescriptor,
        ctx: &UserContext,
        row: &EntityRow,
        action: ChangeAction,
    ) {
        if !desc.events.emit {
            return;
        }

        let mut rooms = Vec::new();
        for audience in &desc.events.audiences {
            match audience {
                Audience::User => {
                    if let Some(id) = ctx.id {
                        rooms.push(Room::User(id));
                    }
                }
                Audience::Team => {
                    if let Some(id) = ctx.team_id {
                        rooms.push(Room::Team(id));
                    }
                }
                Audience::Broker => {
                    if let Some(id) = ctx.broker_id {
                        rooms.push(Room::Broker(id));
                    }
                }
            }
        }
        if rooms.is_empty() {
            return;
        }

        self.notifier.publish(ChangeEvent {
            entity: desc.identity.name.clone(),
            entity_id: row.get_uuid(&desc.fields.id),
            action,
            payload: row.clone().into_json(),
            rooms,
        });
    }
}

/// Translate an externally-named payload into storage columns with bound
/// values. Fails on any name that cannot map to a safe identifier.
pub(crate) fn translate_payload(
    desc: &EntityDescriptor,
    payload: &Payload,
) -> Result<Vec<(String, SqlValue)>, EngineError> {
    payload
        .iter()
        .map(|(external, value)| {
            let column = desc.storage_column(external)?;
            Ok((column, SqlValue::from_json(value)))
        })
        .collect()
}
