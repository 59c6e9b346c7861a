#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use careeros_core::mentorship::{MenteeRequest, MentorProfile, MentorshipStyle};
use careeros_core::path_graph::{
    Enrollment, EnrollmentStatus, LearningPathSnapshot, PathStep, StepProgress, StepProgressMap,
};
use careeros_core::proficiency::{MenteeLevelPreference, ProficiencyLevel};
use careeros_core::recommendation::{CatalogPath, PathFilter};
use careeros_core::skill::{Skill, SkillMatchPolicy, SkillRequirement};
use careeros_core::skill_gap::{CohortSnapshot, SkillProfile};
use careeros_core::types::DbId;
use careeros_engine::{
    CareerEngine, EngineConfig, InMemoryStore, MentorPoolFilter, SkillProfileStore, StoreError,
};

pub const LEARNER_ID: DbId = 1;
pub const EXPERT_ID: DbId = 2;
pub const NEWCOMER_ID: DbId = 3;
pub const UNKNOWN_USER_ID: DbId = 999;

pub const BACKEND_ROLE: &str = "Backend Engineer";

pub const GO_PATH_ID: DbId = 10;
pub const SQL_PATH_ID: DbId = 11;
pub const KAFKA_PATH_ID: DbId = 12;
pub const UX_PATH_ID: DbId = 13;
pub const RETIRED_PATH_ID: DbId = 14;
pub const CYCLIC_PATH_ID: DbId = 20;

pub const TOP_MENTOR_ID: DbId = 201;

// ---------------------------------------------------------------------------
// Catalog builders
// ---------------------------------------------------------------------------

pub fn skill(name: &str, category: &str, demand: f64) -> Skill {
    Skill {
        name: name.to_string(),
        category: category.to_string(),
        subcategory: None,
        market_demand: demand,
    }
}

pub fn step(id: DbId, order: i32, required: bool, prerequisites: &[DbId]) -> PathStep {
    PathStep {
        id,
        order,
        title: format!("Step {id}"),
        is_required: required,
        required_skills: BTreeSet::new(),
        prerequisite_step_ids: prerequisites.iter().copied().collect(),
        estimated_duration_hours: Some(4),
    }
}

pub fn catalog_path(
    id: DbId,
    title: &str,
    category: &str,
    difficulty: ProficiencyLevel,
    weeks: u32,
    skills: &[&str],
) -> CatalogPath {
    CatalogPath {
        id,
        title: title.to_string(),
        description: None,
        category: category.to_string(),
        difficulty,
        estimated_duration_weeks: weeks,
        target_skills: skills.iter().map(|s| s.to_string()).collect(),
        is_active: true,
    }
}

pub fn mentor(id: DbId, user_id: DbId, expertise: &[&str]) -> MentorProfile {
    MentorProfile {
        id,
        mentor_user_id: user_id,
        display_name: format!("Mentor {id}"),
        expertise_areas: expertise.iter().map(|s| s.to_string()).collect(),
        industries: ["fintech".to_string()].into_iter().collect(),
        years_of_experience: 3,
        hourly_rate: Some(80.0),
        preferred_mentee_level: None,
        mentorship_style: Some(MentorshipStyle::Flexible),
        current_mentees: 0,
        max_mentees: 4,
        average_rating: None,
        total_reviews: 0,
        is_available: true,
        available_time_slots: BTreeSet::new(),
        available_hours_per_week: None,
        timezone: Some("UTC".to_string()),
    }
}

pub fn completed_step() -> StepProgress {
    let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    StepProgress {
        completed: true,
        progress_percentage: 100.0,
        time_spent_minutes: 90,
        attempts: 1,
        started_at: Some(at),
        completed_at: Some(at),
        last_accessed_at: Some(at),
    }
}

pub fn enrollment(user_id: DbId, path_id: DbId, status: EnrollmentStatus) -> Enrollment {
    Enrollment {
        user_id,
        path_id,
        status,
        progress_percentage: 0.0,
        time_spent_hours: 0.0,
        enrolled_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        last_accessed_at: None,
    }
}

pub fn mentee_request(skills: &[&str]) -> MenteeRequest {
    MenteeRequest {
        mentee_user_id: LEARNER_ID,
        skills_to_learn: skills.iter().map(|s| s.to_string()).collect(),
        experience_level: Some(ProficiencyLevel::Intermediate),
        ..MenteeRequest::default()
    }
}

// ---------------------------------------------------------------------------
// Seeded store
// ---------------------------------------------------------------------------

/// A store holding a small but complete platform snapshot:
///
/// - users 1 (Go intermediate, SQL beginner), 2 (Go expert, Kafka advanced)
///   and 3 (no skills yet);
/// - the "Backend Engineer" role (Go expert, SQL intermediate, Kafka and
///   Docker beginner);
/// - learning path 10 (steps 1 -> 2 -> 4 required, 3 optional after 1) with
///   user 1 enrolled and step 1 done, plus path 20 whose steps form a cycle;
/// - five catalog paths, one of them retired;
/// - mentors 201 (strong fit), 202 (full), 203 (away), 204 (SQL only) and
///   205 (user 1's own profile).
pub async fn seeded_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new(SkillMatchPolicy::CaseInsensitive);

    for s in [
        skill("Go", "programming_languages", 0.9),
        skill("SQL", "databases", 0.6),
        skill("Kafka", "data_streaming", 0.5),
        skill("Docker", "devops", 0.8),
    ] {
        store.insert_skill(s).await.unwrap();
    }

    store
        .upsert_user_skill(LEARNER_ID, "Go", ProficiencyLevel::Intermediate)
        .await;
    store
        .upsert_user_skill(LEARNER_ID, "SQL", ProficiencyLevel::Beginner)
        .await;
    store
        .upsert_user_skill(EXPERT_ID, "Go", ProficiencyLevel::Expert)
        .await;
    store
        .upsert_user_skill(EXPERT_ID, "Kafka", ProficiencyLevel::Advanced)
        .await;
    store.insert_user(NEWCOMER_ID, SkillProfile::new()).await;

    store
        .insert_role_profile(
            BACKEND_ROLE,
            vec![
                requirement(skill("Go", "programming_languages", 0.9), ProficiencyLevel::Expert),
                requirement(skill("SQL", "databases", 0.6), ProficiencyLevel::Intermediate),
                requirement(skill("Kafka", "data_streaming", 0.5), ProficiencyLevel::Beginner),
                requirement(skill("Docker", "devops", 0.8), ProficiencyLevel::Beginner),
            ],
        )
        .await;

    store
        .insert_learning_path(LearningPathSnapshot {
            id: GO_PATH_ID,
            steps: vec![
                step(1, 1, true, &[]),
                step(2, 2, true, &[1]),
                step(3, 3, false, &[1]),
                step(4, 4, true, &[2]),
            ],
        })
        .await;
    store
        .insert_learning_path(LearningPathSnapshot {
            id: CYCLIC_PATH_ID,
            steps: vec![step(5, 1, true, &[6]), step(6, 2, true, &[5])],
        })
        .await;

    use ProficiencyLevel::{Advanced, Beginner, Intermediate};
    for path in [
        catalog_path(GO_PATH_ID, "Go Mastery", "backend", Intermediate, 8, &["Go", "Docker"]),
        catalog_path(SQL_PATH_ID, "SQL Foundations", "data", Beginner, 4, &["SQL"]),
        catalog_path(
            KAFKA_PATH_ID,
            "Streaming with Kafka",
            "backend",
            Advanced,
            6,
            &["Kafka", "Go"],
        ),
        catalog_path(UX_PATH_ID, "UX Basics", "design", Beginner, 3, &["Figma"]),
        CatalogPath {
            is_active: false,
            ..catalog_path(RETIRED_PATH_ID, "Legacy Go", "backend", Beginner, 2, &["Go"])
        },
    ] {
        store.insert_catalog_path(path).await;
    }

    let mut learner_enrollment = enrollment(LEARNER_ID, GO_PATH_ID, EnrollmentStatus::InProgress);
    learner_enrollment.progress_percentage = 33.33;
    learner_enrollment.time_spent_hours = 1.5;
    store.insert_enrollment(learner_enrollment).await;
    store
        .insert_step_progress(LEARNER_ID, GO_PATH_ID, 1, completed_step())
        .await;

    let mut top = mentor(TOP_MENTOR_ID, 101, &["Go", "Kafka"]);
    top.preferred_mentee_level = Some(MenteeLevelPreference::Intermediate);
    top.average_rating = Some(4.8);
    top.total_reviews = 40;
    top.years_of_experience = 12;
    top.available_hours_per_week = Some(6);

    let mut full = mentor(202, 102, &["Go"]);
    full.current_mentees = full.max_mentees;

    let mut away = mentor(203, 103, &["Go", "Kafka"]);
    away.is_available = false;

    let sql_only = mentor(204, 104, &["SQL"]);
    let own_profile = mentor(205, LEARNER_ID, &["Go", "Kafka"]);

    for m in [top, full, away, sql_only, own_profile] {
        store.insert_mentor(m).await;
    }

    Arc::new(store)
}

fn requirement(skill: Skill, level: ProficiencyLevel) -> SkillRequirement {
    SkillRequirement {
        skill,
        required_level: level,
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig::default()
}

/// An engine over the seeded store, with the store handle for seeding.
pub async fn seeded_engine() -> (CareerEngine, Arc<InMemoryStore>) {
    let store = seeded_store().await;
    let engine = CareerEngine::new(store.clone(), test_config());
    (engine, store)
}

// ---------------------------------------------------------------------------
// Faulty stores
// ---------------------------------------------------------------------------

/// A store whose every call fails as if the database were down.
pub struct UnavailableStore;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait::async_trait]
impl SkillProfileStore for UnavailableStore {
    async fn get_user_skills(&self, _: DbId) -> Result<Option<SkillProfile>, StoreError> {
        down()
    }
    async fn get_skills(&self, _: &[String]) -> Result<Vec<Skill>, StoreError> {
        down()
    }
    async fn get_learning_path(
        &self,
        _: DbId,
    ) -> Result<Option<LearningPathSnapshot>, StoreError> {
        down()
    }
    async fn get_user_step_progress(
        &self,
        _: DbId,
        _: DbId,
    ) -> Result<StepProgressMap, StoreError> {
        down()
    }
    async fn get_enrollment(&self, _: DbId, _: DbId) -> Result<Option<Enrollment>, StoreError> {
        down()
    }
    async fn list_enrollments(&self, _: DbId) -> Result<Vec<Enrollment>, StoreError> {
        down()
    }
    async fn commit_step_progress(
        &self,
        _: DbId,
        _: &StepProgress,
        _: &Enrollment,
    ) -> Result<(), StoreError> {
        down()
    }
    async fn list_catalog_paths(&self, _: &PathFilter) -> Result<Vec<CatalogPath>, StoreError> {
        down()
    }
    async fn get_mentor_pool(
        &self,
        _: &MentorPoolFilter,
    ) -> Result<Vec<MentorProfile>, StoreError> {
        down()
    }
    async fn get_role_skill_profile(
        &self,
        _: &str,
    ) -> Result<Option<Vec<SkillRequirement>>, StoreError> {
        down()
    }
    async fn get_cohort_level_counts(
        &self,
        _: &[DbId],
        _: &[String],
    ) -> Result<CohortSnapshot, StoreError> {
        down()
    }
}

/// Delegates to an inner store after sleeping `delay` on every call.
pub struct SlowStore {
    pub inner: Arc<InMemoryStore>,
    pub delay: Duration,
}

#[async_trait::async_trait]
impl SkillProfileStore for SlowStore {
    async fn get_user_skills(&self, user_id: DbId) -> Result<Option<SkillProfile>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_user_skills(user_id).await
    }
    async fn get_skills(&self, names: &[String]) -> Result<Vec<Skill>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_skills(names).await
    }
    async fn get_learning_path(
        &self,
        path_id: DbId,
    ) -> Result<Option<LearningPathSnapshot>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_learning_path(path_id).await
    }
    async fn get_user_step_progress(
        &self,
        user_id: DbId,
        path_id: DbId,
    ) -> Result<StepProgressMap, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_user_step_progress(user_id, path_id).await
    }
    async fn get_enrollment(
        &self,
        user_id: DbId,
        path_id: DbId,
    ) -> Result<Option<Enrollment>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_enrollment(user_id, path_id).await
    }
    async fn list_enrollments(&self, user_id: DbId) -> Result<Vec<Enrollment>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_enrollments(user_id).await
    }
    async fn commit_step_progress(
        &self,
        step_id: DbId,
        progress: &StepProgress,
        enrollment: &Enrollment,
    ) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner
            .commit_step_progress(step_id, progress, enrollment)
            .await
    }
    async fn list_catalog_paths(
        &self,
        filter: &PathFilter,
    ) -> Result<Vec<CatalogPath>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_catalog_paths(filter).await
    }
    async fn get_mentor_pool(
        &self,
        filter: &MentorPoolFilter,
    ) -> Result<Vec<MentorProfile>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_mentor_pool(filter).await
    }
    async fn get_role_skill_profile(
        &self,
        role: &str,
    ) -> Result<Option<Vec<SkillRequirement>>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_role_skill_profile(role).await
    }
    async fn get_cohort_level_counts(
        &self,
        user_ids: &[DbId],
        skill_names: &[String],
    ) -> Result<CohortSnapshot, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_cohort_level_counts(user_ids, skill_names).await
    }
}

/// Reads from an inner store; every write fails.
pub struct ReadOnlyStore {
    pub inner: Arc<InMemoryStore>,
}

#[async_trait::async_trait]
impl SkillProfileStore for ReadOnlyStore {
    async fn get_user_skills(&self, user_id: DbId) -> Result<Option<SkillProfile>, StoreError> {
        self.inner.get_user_skills(user_id).await
    }
    async fn get_skills(&self, names: &[String]) -> Result<Vec<Skill>, StoreError> {
        self.inner.get_skills(names).await
    }
    async fn get_learning_path(
        &self,
        path_id: DbId,
    ) -> Result<Option<LearningPathSnapshot>, StoreError> {
        self.inner.get_learning_path(path_id).await
    }
    async fn get_user_step_progress(
        &self,
        user_id: DbId,
        path_id: DbId,
    ) -> Result<StepProgressMap, StoreError> {
        self.inner.get_user_step_progress(user_id, path_id).await
    }
    async fn commit_step_progress(
        &self,
        _: DbId,
        _: &StepProgress,
        _: &Enrollment,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only replica".to_string()))
    }
    async fn get_enrollment(
        &self,
        user_id: DbId,
        path_id: DbId,
    ) -> Result<Option<Enrollment>, StoreError> {
        self.inner.get_enrollment(user_id, path_id).await
    }
    async fn list_enrollments(&self, user_id: DbId) -> Result<Vec<Enrollment>, StoreError> {
        self.inner.list_enrollments(user_id).await
    }
    async fn list_catalog_paths(
        &self,
        filter: &PathFilter,
    ) -> Result<Vec<CatalogPath>, StoreError> {
        self.inner.list_catalog_paths(filter).await
    }
    async fn get_mentor_pool(
        &self,
        filter: &MentorPoolFilter,
    ) -> Result<Vec<MentorProfile>, StoreError> {
        self.inner.get_mentor_pool(filter).await
    }
    async fn get_role_skill_profile(
        &self,
        role: &str,
    ) -> Result<Option<Vec<SkillRequirement>>, StoreError> {
        self.inner.get_role_skill_profile(role).await
    }
    async fn get_cohort_level_counts(
        &self,
        user_ids: &[DbId],
        skill_names: &[String],
    ) -> Result<CohortSnapshot, StoreError> {
        self.inner.get_cohort_level_counts(user_ids, skill_names).await
    }
}

/// Index candidates by id for order-independent assertions.
pub fn by_id<T, F>(items: &[T], id: F) -> HashMap<DbId, &T>
where
    F: Fn(&T) -> DbId,
{
    items.iter().map(|item| (id(item), item)).collect()
}
