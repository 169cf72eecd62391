//! acredb: a configuration-driven entity access engine for multi-tenant
//! real-estate CRM backends.
//!
//! ## Crate layout
//! - `core`: user-context normalization, descriptors, ownership scoping,
//!   the access engine, storage port, and the change notifier.
//! - `entities`: the descriptor for each business entity.
//!
//! The `prelude` module mirrors the surface a service handler needs.

pub use acredb_core as core;
pub use acredb_entities as entities;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Service Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::entities;
}
