//! Core runtime for acredb: user-context normalization, entity descriptors,
//! ownership scoping, the access engine, and the change notifier — plus the
//! ergonomics exported via the `prelude`.
#![warn(unreachable_pub)]

pub mod context;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod notify;
pub mod row;
pub mod scope;
pub mod sql;
pub mod store;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// Store implementations, SQL primitives, and helpers are not re-exported
/// here; reach for the concrete modules when wiring a service.
///

pub mod prelude {
    pub use crate::{
        context::{RawPrincipal, Role, UserContext},
        descriptor::{DescriptorBuilder, EntityDescriptor, OperationKind},
        engine::{AccessEngine, BatchDeleted, ListParams, Page},
        error::EngineError,
        notify::{ChangeAction, ChangeEvent, ChangeNotifier, EventSink},
        row::EntityRow,
        scope::OwnershipScope,
    };
}
