use crate::store::StoreError;
use thiserror::Error as ThisError;

///
/// EngineError
///
/// Typed outcome surface of the access engine. Validation, not-found, and
/// conflict values are expected results handed back to callers; store errors
/// are logged where they occur and surfaced without driver detail.
///

#[derive(Debug, ThisError)]
pub enum EngineError {
    /// Input rejected before any write: missing required field, hook-raised
    /// error, empty update set, unmappable field name.
    #[error("{message}")]
    Validation { message: String },

    /// No live row matches, or a lifecycle precondition failed (for example
    /// hard-deleting a row that was never archived).
    #[error("{message}")]
    NotFound { entity: String, message: String },

    /// Optimistic update lost the race; the caller must refetch and retry.
    #[error("this {entity} was modified by another user; refresh and retry")]
    VersionConflict { entity: String },

    /// An explicit record-level check denied the caller.
    #[error("{message}")]
    PermissionDenied { message: String },

    /// Any lower-level storage failure, always after rolling back an open
    /// transaction.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub fn version_conflict(entity: impl Into<String>) -> Self {
        Self::VersionConflict {
            entity: entity.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub const fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}
