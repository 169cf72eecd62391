//! Lifecycle hook slots.
//!
//! Hooks are the declarative extension point for entity-specific behavior:
//! plain functions stored on the descriptor and invoked at fixed points.
//! Pre-phase create/update hooks may reject (aborting before any write) or
//! rewrite the payload. Post-phase hooks and the delete-adjacent pair run
//! best-effort: their failures are logged but never surfaced, since the
//! mutation is already durable (or, for `before_delete`, observational).

use crate::{context::UserContext, error::EngineError, row::EntityRow};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::{error::Error as StdError, sync::Arc};

/// Caller-supplied field map, externally named.
pub type Payload = JsonMap<String, JsonValue>;

/// Post-phase hook failure; carried to the log, never to the caller.
pub type HookError = Box<dyn StdError + Send + Sync>;

pub type ValidateCreateFn =
    Arc<dyn Fn(&Payload, &UserContext) -> Result<(), EngineError> + Send + Sync>;
pub type ValidateUpdateFn =
    Arc<dyn Fn(&Payload, &EntityRow, &UserContext) -> Result<(), EngineError> + Send + Sync>;
pub type RewriteCreateFn =
    Arc<dyn Fn(Payload, &UserContext) -> Result<Payload, EngineError> + Send + Sync>;
pub type RewriteUpdateFn =
    Arc<dyn Fn(Payload, &EntityRow, &UserContext) -> Result<Payload, EngineError> + Send + Sync>;
pub type BeforeDeleteFn =
    Arc<dyn Fn(&EntityRow, &UserContext) -> Result<(), HookError> + Send + Sync>;
pub type AfterRowFn = Arc<dyn Fn(&EntityRow, &UserContext) -> Result<(), HookError> + Send + Sync>;
pub type AfterUpdateFn =
    Arc<dyn Fn(&EntityRow, &EntityRow, &UserContext) -> Result<(), HookError> + Send + Sync>;
pub type RecordGuardFn =
    Arc<dyn Fn(&EntityRow, &UserContext) -> Result<(), EngineError> + Send + Sync>;

///
/// LifecycleHooks
///
/// Optional callbacks per descriptor. All slots default to absent.
///

#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub on_create: Option<ValidateCreateFn>,
    pub on_update: Option<ValidateUpdateFn>,
    pub before_create: Option<RewriteCreateFn>,
    pub before_update: Option<RewriteUpdateFn>,
    pub before_delete: Option<BeforeDeleteFn>,
    pub after_create: Option<AfterRowFn>,
    pub after_update: Option<AfterUpdateFn>,
    pub after_delete: Option<AfterRowFn>,
    pub record_guard: Option<RecordGuardFn>,
}

impl std::fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = |present: bool| if present { "set" } else { "-" };
        f.debug_struct("LifecycleHooks")
            .field("on_create", &slot(self.on_create.is_some()))
            .field("on_update", &slot(self.on_update.is_some()))
            .field("before_create", &slot(self.before_create.is_some()))
            .field("before_update", &slot(self.before_update.is_some()))
            .field("before_delete", &slot(self.before_delete.is_some()))
            .field("after_create", &slot(self.after_create.is_some()))
            .field("after_update", &slot(self.after_update.is_some()))
            .field("after_delete", &slot(self.after_delete.is_some()))
            .field("record_guard", &slot(self.record_guard.is_some()))
            .finish()
    }
}
