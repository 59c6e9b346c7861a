//! Collaborator contract the engine pulls snapshots from.
//!
//! Persistence mechanics live behind [`SkillProfileStore`]; the only write is
//! [`SkillProfileStore::commit_step_progress`], which lands a step record and
//! its enrollment together or not at all. Population-level
//! aggregation ([`SkillProfileStore::get_cohort_level_counts`]) is expected
//! to run inside the store rather than be iterated in-process.

use std::fmt;
use std::sync::Arc;

use careeros_core::error::CoreError;
use careeros_core::mentorship::MentorProfile;
use careeros_core::path_graph::{Enrollment, LearningPathSnapshot, StepProgress, StepProgressMap};
use careeros_core::recommendation::{CatalogPath, PathFilter};
use careeros_core::skill::{Skill, SkillRequirement};
use careeros_core::skill_gap::{CohortSnapshot, SkillProfile};
use careeros_core::types::DbId;

/// Failure of the backing store. Never retried by the engine.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed record: {0}")]
    Corrupt(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::DependencyUnavailable(err.to_string())
    }
}

/// Capability check applied to each mentor before it reaches scoring.
pub type MentorAccessPredicate = Arc<dyn Fn(&MentorProfile) -> bool + Send + Sync>;

/// Coarse pre-filter for the mentor pool query.
#[derive(Clone, Default)]
pub struct MentorPoolFilter {
    /// Drop the requesting user's own mentor profile.
    pub exclude_user_id: Option<DbId>,
    pub available_only: bool,
    pub access: Option<MentorAccessPredicate>,
}

impl MentorPoolFilter {
    pub fn permits(&self, mentor: &MentorProfile) -> bool {
        if self.exclude_user_id == Some(mentor.mentor_user_id) {
            return false;
        }
        if self.available_only && !mentor.is_available {
            return false;
        }
        self.access.as_ref().map_or(true, |allowed| allowed(mentor))
    }
}

impl fmt::Debug for MentorPoolFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MentorPoolFilter")
            .field("exclude_user_id", &self.exclude_user_id)
            .field("available_only", &self.available_only)
            .field("access", &self.access.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

#[async_trait::async_trait]
pub trait SkillProfileStore: Send + Sync {
    /// A user's skill map, `None` if the user does not exist.
    async fn get_user_skills(&self, user_id: DbId) -> Result<Option<SkillProfile>, StoreError>;

    /// Catalog records for the given names; unknown names are omitted.
    async fn get_skills(&self, names: &[String]) -> Result<Vec<Skill>, StoreError>;

    async fn get_learning_path(
        &self,
        path_id: DbId,
    ) -> Result<Option<LearningPathSnapshot>, StoreError>;

    async fn get_user_step_progress(
        &self,
        user_id: DbId,
        path_id: DbId,
    ) -> Result<StepProgressMap, StoreError>;

    async fn get_enrollment(
        &self,
        user_id: DbId,
        path_id: DbId,
    ) -> Result<Option<Enrollment>, StoreError>;

    async fn list_enrollments(&self, user_id: DbId) -> Result<Vec<Enrollment>, StoreError>;

    /// Upsert one step's progress record and its enrollment in a single
    /// transaction. Both are keyed by the enrollment's `(user_id, path_id)`.
    /// On error neither record may be visible.
    async fn commit_step_progress(
        &self,
        step_id: DbId,
        progress: &StepProgress,
        enrollment: &Enrollment,
    ) -> Result<(), StoreError>;

    async fn list_catalog_paths(
        &self,
        filter: &PathFilter,
    ) -> Result<Vec<CatalogPath>, StoreError>;

    async fn get_mentor_pool(
        &self,
        filter: &MentorPoolFilter,
    ) -> Result<Vec<MentorProfile>, StoreError>;

    /// Required skills of a role, `None` if the role is unknown.
    async fn get_role_skill_profile(
        &self,
        role: &str,
    ) -> Result<Option<Vec<SkillRequirement>>, StoreError>;

    /// Per-skill level histogram over the given users.
    async fn get_cohort_level_counts(
        &self,
        user_ids: &[DbId],
        skill_names: &[String],
    ) -> Result<CohortSnapshot, StoreError>;
}
