//! Entity descriptors for the acredb engine.
//!
//! Every business entity is a single descriptor value built here: column
//! roles, operation flags, query surface, named filters, event policy, and
//! hooks. There is no per-entity behavior anywhere else.

pub mod appointments;
pub mod clients;
pub mod documents;
pub mod escrows;
pub mod leads;
pub mod listings;

use acredb_core::descriptor::{DescriptorError, EntityDescriptor};

/// Build every descriptor. Called once at startup; a failure here is a
/// configuration bug and should abort the process.
pub fn all() -> Result<Vec<EntityDescriptor>, DescriptorError> {
    Ok(vec![
        listings::descriptor()?,
        clients::descriptor()?,
        leads::descriptor()?,
        appointments::descriptor()?,
        documents::descriptor()?,
        escrows::descriptor()?,
    ])
}
