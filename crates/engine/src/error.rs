use careeros_core::error::CoreError;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Engine-level error type returned by every [`crate::CareerEngine`]
/// operation.
///
/// Wraps [`CoreError`] for domain errors and adds the failures that only
/// exist at the service boundary. [`EngineError::code`] and
/// [`EngineError::status`] give the stable code and HTTP-equivalent status
/// a transport layer should surface.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error from `careeros_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The operation exceeded the request-level timeout.
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Core(err.into())
    }
}

/// Convenience type alias for engine return values.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Core(core) => match core {
                CoreError::NotFound { .. } => "NOT_FOUND",
                CoreError::Validation(_) => "VALIDATION_ERROR",
                CoreError::GraphIntegrity { .. } => "GRAPH_INTEGRITY_ERROR",
                CoreError::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
                CoreError::Internal(_) => "INTERNAL_ERROR",
            },
            EngineError::Timeout { .. } => "TIMEOUT",
            EngineError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// HTTP-equivalent status code.
    pub fn status(&self) -> u16 {
        match self {
            EngineError::Core(core) => match core {
                CoreError::NotFound { .. } => 404,
                CoreError::Validation(_) => 400,
                CoreError::GraphIntegrity { .. } => 500,
                CoreError::DependencyUnavailable(_) => 503,
                CoreError::Internal(_) => 500,
            },
            EngineError::Timeout { .. } => 504,
            EngineError::Config(_) => 500,
        }
    }

    /// Whether the caller, not the data or the platform, is at fault.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}
