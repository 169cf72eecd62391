//! Scripted store fake for engine tests.
//!
//! Tests enqueue canned responses in the order the engine will issue
//! statements, then assert on the recorded statement text and parameters
//! afterwards.

use crate::{
    row::EntityRow,
    sql::Statement,
    store::{StoreConn, StoreError, StorePort},
};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Recorded {
    Query(Statement),
    Execute(Statement),
    Begin,
    Commit,
    Rollback,
}

#[derive(Debug)]
enum Canned {
    Rows(Vec<EntityRow>),
    Affected(u64),
    Fail(String),
}

#[derive(Debug, Default)]
struct State {
    canned: VecDeque<Canned>,
    recorded: Vec<Recorded>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ScriptedStore {
    state: Arc<Mutex<State>>,
}

impl ScriptedStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_rows(&self, rows: Vec<EntityRow>) {
        self.lock().canned.push_back(Canned::Rows(rows));
    }

    pub(crate) fn push_affected(&self, affected: u64) {
        self.lock().canned.push_back(Canned::Affected(affected));
    }

    pub(crate) fn push_failure(&self, message: &str) {
        self.lock()
            .canned
            .push_back(Canned::Fail(message.to_owned()));
    }

    pub(crate) fn recorded(&self) -> Vec<Recorded> {
        self.lock().recorded.clone()
    }

    /// Just the issued statements, in order, transaction markers skipped.
    pub(crate) fn statements(&self) -> Vec<Statement> {
        self.lock()
            .recorded
            .iter()
            .filter_map(|entry| match entry {
                Recorded::Query(stmt) | Recorded::Execute(stmt) => Some(stmt.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("scripted store lock")
    }
}

#[async_trait]
impl StorePort for ScriptedStore {
    async fn connection(&self) -> Result<Box<dyn StoreConn>, StoreError> {
        Ok(Box::new(ScriptedConn {
            state: self.state.clone(),
        }))
    }
}

struct ScriptedConn {
    state: Arc<Mutex<State>>,
}

impl ScriptedConn {
    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("scripted store lock")
    }
}

#[async_trait]
impl StoreConn for ScriptedConn {
    async fn query(&mut self, stmt: &Statement) -> Result<Vec<EntityRow>, StoreError> {
        let mut state = self.lock();
        state.recorded.push(Recorded::Query(stmt.clone()));
        match state.canned.pop_front() {
            Some(Canned::Rows(rows)) => Ok(rows),
            Some(Canned::Fail(message)) => Err(StoreError::query(message)),
            other => panic!("unscripted query (next canned: {other:?}): {}", stmt.sql),
        }
    }

    async fn execute(&mut self, stmt: &Statement) -> Result<u64, StoreError> {
        let mut state = self.lock();
        state.recorded.push(Recorded::Execute(stmt.clone()));
        match state.canned.pop_front() {
            Some(Canned::Affected(affected)) => Ok(affected),
            Some(Canned::Fail(message)) => Err(StoreError::query(message)),
            other => panic!("unscripted execute (next canned: {other:?}): {}", stmt.sql),
        }
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        self.lock().recorded.push(Recorded::Begin);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.lock().recorded.push(Recorded::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.lock().recorded.push(Recorded::Rollback);
        Ok(())
    }
}

/// Build an [`EntityRow`] from a JSON object literal.
pub(crate) fn row(value: JsonValue) -> EntityRow {
    match value {
        JsonValue::Object(map) => EntityRow::new(map),
        other => panic!("row fixture must be a JSON object, got {other}"),
    }
}

/// A one-column count result as the store would return it.
pub(crate) fn count_row(total: i64) -> EntityRow {
    row(serde_json::json!({ "total": total }))
}
