//! CareerOS recommendation and compatibility-scoring domain logic.
//!
//! Pure functions over snapshots of catalog and profile data. Nothing in
//! this crate performs I/O or logs; the `careeros-engine` crate fetches the
//! snapshots and calls in here.
//!
//! - [`path_graph`]: prerequisite DAG of a learning path, next step and
//!   percent complete.
//! - [`skill_gap`]: gap analysis against a target role, per user or cohort.
//! - [`mentorship`]: mentor eligibility and compatibility scoring.
//! - [`recommendation`]: ranking of learning paths against a user's gaps.

pub mod error;
pub mod mentorship;
pub mod path_analytics;
pub mod path_graph;
pub mod proficiency;
pub mod recommendation;
pub mod scoring;
pub mod skill;
pub mod skill_gap;
pub mod threshold_validation;
pub mod types;

pub use error::CoreError;
pub use types::{DbId, Timestamp};
