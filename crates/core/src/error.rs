use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Cyclic or order-inconsistent prerequisite data. Never worked around.
    #[error("Learning path {path_id} failed integrity check: {detail}")]
    GraphIntegrity { path_id: DbId, detail: String },

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a [`CoreError::NotFound`] for any displayable key (numeric id or name).
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Build a [`CoreError::GraphIntegrity`] for the given path.
    pub fn graph_integrity(path_id: DbId, detail: impl Into<String>) -> Self {
        Self::GraphIntegrity {
            path_id,
            detail: detail.into(),
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
