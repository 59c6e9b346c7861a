//! In-memory [`SkillProfileStore`] for tests, fixtures and local runs.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use careeros_core::error::CoreError;
use careeros_core::mentorship::MentorProfile;
use careeros_core::path_graph::{Enrollment, LearningPathSnapshot, StepProgress, StepProgressMap};
use careeros_core::proficiency::ProficiencyLevel;
use careeros_core::recommendation::{CatalogPath, PathFilter};
use careeros_core::skill::{Skill, SkillMatchPolicy, SkillRequirement};
use careeros_core::skill_gap::{tally_cohort, CohortSnapshot, SkillProfile};
use careeros_core::types::DbId;

use crate::store::{MentorPoolFilter, SkillProfileStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<DbId, SkillProfile>,
    /// Keyed by normalized skill name.
    skills: HashMap<String, Skill>,
    paths: HashMap<DbId, LearningPathSnapshot>,
    catalog: BTreeMap<DbId, CatalogPath>,
    /// Keyed by `(user_id, path_id)`.
    progress: HashMap<(DbId, DbId), StepProgressMap>,
    enrollments: BTreeMap<(DbId, DbId), Enrollment>,
    mentors: BTreeMap<DbId, MentorProfile>,
    /// Keyed by normalized role name.
    roles: HashMap<String, Vec<SkillRequirement>>,
}

/// A [`SkillProfileStore`] backed by `tokio::sync::RwLock`-guarded maps.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    policy: SkillMatchPolicy,
}

impl InMemoryStore {
    pub fn new(policy: SkillMatchPolicy) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            policy,
        }
    }

    /// Register a user with an initial skill map (replacing any previous one).
    pub async fn insert_user(&self, user_id: DbId, skills: SkillProfile) {
        self.tables.write().await.users.insert(user_id, skills);
    }

    /// One record per (user, skill): a second call overwrites the level.
    pub async fn upsert_user_skill(&self, user_id: DbId, skill: &str, level: ProficiencyLevel) {
        let mut tables = self.tables.write().await;
        let profile = tables.users.entry(user_id).or_default();
        let existing = profile
            .keys()
            .find(|name| self.policy.matches(name, skill))
            .cloned();
        profile.insert(existing.unwrap_or_else(|| skill.to_string()), level);
    }

    /// Catalog records are validated on the way in.
    pub async fn insert_skill(&self, skill: Skill) -> Result<(), CoreError> {
        skill.validate()?;
        let key = self.policy.normalize(&skill.name);
        self.tables.write().await.skills.insert(key, skill);
        Ok(())
    }

    pub async fn insert_learning_path(&self, path: LearningPathSnapshot) {
        self.tables.write().await.paths.insert(path.id, path);
    }

    pub async fn insert_catalog_path(&self, path: CatalogPath) {
        self.tables.write().await.catalog.insert(path.id, path);
    }

    pub async fn insert_mentor(&self, mentor: MentorProfile) {
        self.tables.write().await.mentors.insert(mentor.id, mentor);
    }

    /// Seed an enrollment without touching step progress.
    pub async fn insert_enrollment(&self, enrollment: Enrollment) {
        let key = (enrollment.user_id, enrollment.path_id);
        self.tables.write().await.enrollments.insert(key, enrollment);
    }

    pub async fn insert_step_progress(
        &self,
        user_id: DbId,
        path_id: DbId,
        step_id: DbId,
        progress: StepProgress,
    ) {
        self.tables
            .write()
            .await
            .progress
            .entry((user_id, path_id))
            .or_default()
            .insert(step_id, progress);
    }

    pub async fn insert_role_profile(&self, role: &str, requirements: Vec<SkillRequirement>) {
        let key = self.policy.normalize(role);
        self.tables.write().await.roles.insert(key, requirements);
    }
}

#[async_trait::async_trait]
impl SkillProfileStore for InMemoryStore {
    async fn get_user_skills(&self, user_id: DbId) -> Result<Option<SkillProfile>, StoreError> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn get_skills(&self, names: &[String]) -> Result<Vec<Skill>, StoreError> {
        let tables = self.tables.read().await;
        Ok(names
            .iter()
            .filter_map(|n| tables.skills.get(&self.policy.normalize(n)).cloned())
            .collect())
    }

    async fn get_learning_path(
        &self,
        path_id: DbId,
    ) -> Result<Option<LearningPathSnapshot>, StoreError> {
        Ok(self.tables.read().await.paths.get(&path_id).cloned())
    }

    async fn get_user_step_progress(
        &self,
        user_id: DbId,
        path_id: DbId,
    ) -> Result<StepProgressMap, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .progress
            .get(&(user_id, path_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_enrollment(
        &self,
        user_id: DbId,
        path_id: DbId,
    ) -> Result<Option<Enrollment>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .enrollments
            .get(&(user_id, path_id))
            .cloned())
    }

    async fn list_enrollments(&self, user_id: DbId) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .enrollments
            .range((user_id, DbId::MIN)..=(user_id, DbId::MAX))
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn commit_step_progress(
        &self,
        step_id: DbId,
        progress: &StepProgress,
        enrollment: &Enrollment,
    ) -> Result<(), StoreError> {
        let key = (enrollment.user_id, enrollment.path_id);
        let mut tables = self.tables.write().await;
        tables
            .progress
            .entry(key)
            .or_default()
            .insert(step_id, progress.clone());
        tables.enrollments.insert(key, enrollment.clone());
        Ok(())
    }

    async fn list_catalog_paths(
        &self,
        filter: &PathFilter,
    ) -> Result<Vec<CatalogPath>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .catalog
            .values()
            .filter(|p| filter.matches(p, self.policy))
            .cloned()
            .collect())
    }

    async fn get_mentor_pool(
        &self,
        filter: &MentorPoolFilter,
    ) -> Result<Vec<MentorProfile>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .mentors
            .values()
            .filter(|m| filter.permits(m))
            .cloned()
            .collect())
    }

    async fn get_role_skill_profile(
        &self,
        role: &str,
    ) -> Result<Option<Vec<SkillRequirement>>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .roles
            .get(&self.policy.normalize(role))
            .cloned())
    }

    async fn get_cohort_level_counts(
        &self,
        user_ids: &[DbId],
        skill_names: &[String],
    ) -> Result<CohortSnapshot, StoreError> {
        let tables = self.tables.read().await;
        let profiles = user_ids.iter().filter_map(|id| tables.users.get(id));
        Ok(tally_cohort(profiles, skill_names, self.policy))
    }
}
