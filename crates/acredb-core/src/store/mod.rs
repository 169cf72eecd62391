//! Storage port.
//!
//! The engine talks to persistence through [`StorePort`] and [`StoreConn`]
//! only; the Postgres-backed implementation lives in [`pg`]. Tests script
//! a fake connection against the same traits.

pub mod pg;

pub use pg::{PgConfig, PgStore};

use crate::{row::EntityRow, sql::Statement};
use async_trait::async_trait;
use thiserror::Error as ThisError;

///
/// StoreError
///
/// Infrastructure failure while talking to the store. Carried inside
/// `EngineError::Store`; callers see a generic failure, operators see the
/// message in the log.
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("connection pool error: {message}")]
    Pool { message: String },

    #[error("query failed: {message}")]
    Query { message: String },

    #[error("transaction control failed: {message}")]
    Tx { message: String },
}

impl StoreError {
    pub fn pool(message: impl Into<String>) -> Self {
        Self::Pool {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn tx(message: impl Into<String>) -> Self {
        Self::Tx {
            message: message.into(),
        }
    }
}

///
/// StorePort
///
/// Hands out connections. One engine operation checks out at most one
/// connection and runs all of its statements on it, so explicit BEGIN and
/// COMMIT frames stay on a single session.
///

#[async_trait]
pub trait StorePort: Send + Sync {
    async fn connection(&self) -> Result<Box<dyn StoreConn>, StoreError>;
}

///
/// StoreConn
///
/// One checked-out session. Transaction control is explicit; a dropped
/// connection with an open frame is rolled back by the pool's reset.
///

#[async_trait]
pub trait StoreConn: Send {
    async fn query(&mut self, stmt: &Statement) -> Result<Vec<EntityRow>, StoreError>;
    async fn execute(&mut self, stmt: &Statement) -> Result<u64, StoreError>;
    async fn begin(&mut self) -> Result<(), StoreError>;
    async fn commit(&mut self) -> Result<(), StoreError>;
    async fn rollback(&mut self) -> Result<(), StoreError>;
}
