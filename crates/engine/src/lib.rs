//! CareerOS engine: the async service boundary around `careeros-core`.
//!
//! [`CareerEngine`] pulls read-only snapshots from a [`SkillProfileStore`],
//! runs the pure scoring and traversal logic, logs through `tracing`, and
//! bounds every operation with the configured request timeout.

pub mod config;
pub mod error;
pub mod memory;
pub mod service;
pub mod store;
pub mod telemetry;

pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use memory::InMemoryStore;
pub use service::{CareerEngine, StepProgressOutcome, MAX_MENTOR_RECOMMENDATIONS};
pub use store::{MentorAccessPredicate, MentorPoolFilter, SkillProfileStore, StoreError};
