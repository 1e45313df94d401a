use crate::types::DbId;

/// Taxonomy code reported for every authorization failure.
pub const INSUFFICIENT_PERMISSION: &str = "insufficient-permission";

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Raised by the RBAC evaluator. Always carries the single
    /// `insufficient-permission` taxonomy, with the missing capability
    /// for logging.
    #[error("{INSUFFICIENT_PERMISSION}: {required}")]
    InsufficientPermission { required: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
