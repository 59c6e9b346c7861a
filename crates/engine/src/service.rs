//! Request/response operations over a [`SkillProfileStore`].
//!
//! Each operation pulls its snapshots once, runs the pure `careeros_core`
//! logic, and is bounded by the request-level timeout. Operations share no
//! mutable state, so any number may run concurrently for the same user.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::try_join_all;
use serde::Serialize;

use careeros_core::error::CoreError;
use careeros_core::mentorship::{
    infer_experience_level, match_mentors, recommend_mentors, MatchSettings, MenteeRequest,
    MentorProfile, MentorRecommendation, MentorshipMatchCandidate,
};
use careeros_core::path_analytics::{compute_path_analytics, PathAnalytics};
use careeros_core::path_graph::{
    apply_step_update, has_activity, next_enrollment_status, resolve, weighted_progress,
    Enrollment, EnrollmentStatus, PathGraph, PathProgressView, StepProgress, StepProgressUpdate,
    StepStatus,
};
use careeros_core::recommendation::{
    recommend, target_requirements, EnrolledPath, PathRecommendationRequest, RankedPaths,
    RecommendationInputs, RecommendationSettings,
};
use careeros_core::skill::SkillRequirement;
use careeros_core::skill_gap::{
    analyze, build_gap_report, cohort_gap_metrics, CohortGapReport, SkillGapReport, SkillProfile,
};
use careeros_core::threshold_validation::{clamp_limit, round2, validate_count_range};
use careeros_core::types::DbId;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::store::{MentorAccessPredicate, MentorPoolFilter, SkillProfileStore};

/// Largest cohort accepted by [`CareerEngine::cohort_gap_report`].
pub const MAX_COHORT_SIZE: usize = 10_000;

/// Upper bound on [`CareerEngine::recommend_mentors`] results.
pub const MAX_MENTOR_RECOMMENDATIONS: i64 = 50;

const MINUTES_PER_HOUR: f64 = 60.0;

/// Result of recording a learning event against a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepProgressOutcome {
    pub progress: StepProgress,
    pub step_status: StepStatus,
    pub enrollment: Enrollment,
    pub view: PathProgressView,
}

/// The recommendation and compatibility-scoring service.
#[derive(Clone)]
pub struct CareerEngine {
    store: Arc<dyn SkillProfileStore>,
    config: EngineConfig,
    timeout: Duration,
    mentor_access: Option<MentorAccessPredicate>,
}

impl std::fmt::Debug for CareerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CareerEngine")
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .field("mentor_access", &self.mentor_access.is_some())
            .finish_non_exhaustive()
    }
}

impl CareerEngine {
    pub fn new(store: Arc<dyn SkillProfileStore>, config: EngineConfig) -> Self {
        let timeout = config.request_timeout();
        Self {
            store,
            config,
            timeout,
            mentor_access: None,
        }
    }

    /// Build with configuration from `.env` and the process environment.
    pub fn from_env(store: Arc<dyn SkillProfileStore>) -> EngineResult<Self> {
        Ok(Self::new(store, EngineConfig::load()?))
    }

    /// Build with configuration read through `lookup`.
    pub fn from_lookup<F>(store: Arc<dyn SkillProfileStore>, lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::new(store, EngineConfig::from_lookup(lookup)?))
    }

    /// Override the request-level timeout taken from the config.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restrict the mentor pool with a capability check.
    pub fn with_mentor_access(mut self, access: MentorAccessPredicate) -> Self {
        self.mentor_access = Some(access);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Learning paths
    // -----------------------------------------------------------------------

    /// Where `user_id` stands in `path_id`: next step and percent complete.
    /// An unknown user is `NotFound` even when the path exists.
    pub async fn resolve_path_progress(
        &self,
        user_id: DbId,
        path_id: DbId,
    ) -> EngineResult<PathProgressView> {
        self.run("resolve_path_progress", async {
            tracing::debug!(user_id, path_id, "Resolving path progress");
            let (_, graph, progress) = futures::try_join!(
                self.load_user_skills(user_id),
                self.load_graph(path_id),
                async {
                    Ok::<_, EngineError>(
                        self.store.get_user_step_progress(user_id, path_id).await?,
                    )
                },
            )?;
            let view = resolve(&graph, &progress);
            tracing::info!(
                user_id,
                path_id,
                percent_complete = view.percent_complete,
                next_step_id = ?view.next_step.as_ref().map(|s| s.step_id),
                "Resolved path progress"
            );
            Ok(view)
        })
        .await
    }

    /// Time, velocity and struggle/strength analytics for one enrollment.
    pub async fn path_analytics(
        &self,
        user_id: DbId,
        path_id: DbId,
    ) -> EngineResult<PathAnalytics> {
        self.run("path_analytics", async {
            tracing::debug!(user_id, path_id, "Computing path analytics");
            let (_, graph, progress) = futures::try_join!(
                self.load_user_skills(user_id),
                self.load_graph(path_id),
                async {
                    Ok::<_, EngineError>(
                        self.store.get_user_step_progress(user_id, path_id).await?,
                    )
                },
            )?;
            let analytics = compute_path_analytics(&graph, &progress, Utc::now());
            tracing::info!(
                user_id,
                path_id,
                completed_steps = analytics.completed_steps,
                struggling = analytics.struggling_steps.len(),
                "Computed path analytics"
            );
            Ok(analytics)
        })
        .await
    }

    /// Fold a learning event into a step and the owning enrollment.
    ///
    /// Both records are computed first and then handed to the store in one
    /// [`SkillProfileStore::commit_step_progress`] call, so a timeout or a
    /// store failure leaves neither written. The enrollment becomes
    /// `completed` exactly when every required step is.
    pub async fn record_step_progress(
        &self,
        user_id: DbId,
        path_id: DbId,
        step_id: DbId,
        update: StepProgressUpdate,
    ) -> EngineResult<StepProgressOutcome> {
        self.run("record_step_progress", async {
            tracing::debug!(user_id, path_id, step_id, "Recording step progress");
            let (graph, enrollment, mut progress) = futures::try_join!(
                self.load_graph(path_id),
                async {
                    Ok::<_, EngineError>(self.store.get_enrollment(user_id, path_id).await?)
                },
                async {
                    Ok::<_, EngineError>(
                        self.store.get_user_step_progress(user_id, path_id).await?,
                    )
                },
            )?;
            if graph.step(step_id).is_none() {
                return Err(CoreError::not_found("PathStep", step_id).into());
            }
            let mut enrollment = enrollment.ok_or_else(|| {
                CoreError::not_found("Enrollment", format!("{user_id}/{path_id}"))
            })?;

            let now = Utc::now();
            let updated = apply_step_update(progress.get(&step_id), &update, now)?;
            progress.insert(step_id, updated.clone());

            let view = resolve(&graph, &progress);
            let previous_status = enrollment.status;
            enrollment.status =
                next_enrollment_status(enrollment.status, &view, has_activity(&progress));
            enrollment.progress_percentage =
                weighted_progress(&graph, &progress, &self.config.scoring.progress);
            enrollment.time_spent_hours = round2(
                enrollment.time_spent_hours
                    + f64::from(update.time_spent_minutes) / MINUTES_PER_HOUR,
            );
            enrollment.last_accessed_at = Some(now);
            self.store
                .commit_step_progress(step_id, &updated, &enrollment)
                .await?;

            if enrollment.status != previous_status {
                tracing::info!(
                    user_id,
                    path_id,
                    from = previous_status.as_str(),
                    to = enrollment.status.as_str(),
                    "Enrollment status changed"
                );
            }
            tracing::info!(
                user_id,
                path_id,
                step_id,
                percent_complete = view.percent_complete,
                "Recorded step progress"
            );

            Ok(StepProgressOutcome {
                step_status: updated.status(),
                progress: updated,
                enrollment,
                view,
            })
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Skill gaps
    // -----------------------------------------------------------------------

    /// Gap report of `user_id` against the skill profile of `target_role`.
    pub async fn analyze_skill_gap(
        &self,
        user_id: DbId,
        target_role: &str,
    ) -> EngineResult<SkillGapReport> {
        self.run("analyze_skill_gap", async {
            tracing::debug!(user_id, target_role, "Analyzing skill gap");
            let (user_skills, requirements) =
                futures::try_join!(self.load_user_skills(user_id), self.load_role(target_role))?;

            let gaps = analyze(
                &user_skills,
                &requirements,
                &self.config.scoring.gaps,
                self.config.skill_match_policy,
            );
            let report =
                build_gap_report(user_id, Some(target_role), &user_skills, gaps, Utc::now());
            tracing::info!(
                user_id,
                target_role,
                gap_count = report.skill_gaps.len(),
                estimated_hours = report.estimated_time_to_fill_hours,
                "Analyzed skill gap"
            );
            Ok(report)
        })
        .await
    }

    /// Role-level coverage over a cohort. Aggregation runs in the store.
    pub async fn cohort_gap_report(
        &self,
        target_role: &str,
        user_ids: &[DbId],
    ) -> EngineResult<CohortGapReport> {
        self.run("cohort_gap_report", async {
            validate_count_range(user_ids.len(), MAX_COHORT_SIZE, "Cohort")?;
            tracing::debug!(
                target_role,
                cohort_size = user_ids.len(),
                "Building cohort gap report"
            );

            let requirements = self.load_role(target_role).await?;
            let skill_names: Vec<String> =
                requirements.iter().map(|r| r.skill.name.clone()).collect();
            let snapshot = self
                .store
                .get_cohort_level_counts(user_ids, &skill_names)
                .await?;
            let skills =
                cohort_gap_metrics(&snapshot, &requirements, self.config.skill_match_policy);

            tracing::info!(
                target_role,
                user_count = snapshot.total_users,
                skill_count = skills.len(),
                "Built cohort gap report"
            );
            Ok(CohortGapReport {
                target_role: target_role.to_string(),
                user_count: snapshot.total_users,
                skills,
            })
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Mentorship
    // -----------------------------------------------------------------------

    /// Ranked, eligible mentors for a mentee request.
    ///
    /// A request without `experience_level` falls back to the level inferred
    /// from the mentee's skill profile.
    pub async fn match_mentors(
        &self,
        request: MenteeRequest,
    ) -> EngineResult<Vec<MentorshipMatchCandidate>> {
        self.run("match_mentors", async {
            let mut request = request;
            let mentee_id = request.mentee_user_id;
            tracing::debug!(
                mentee_id,
                skills = request.skills_to_learn.len(),
                "Matching mentors"
            );
            let profile = self.load_user_skills(mentee_id).await?;
            if request.experience_level.is_none() {
                request.experience_level = infer_experience_level(&profile);
                tracing::debug!(
                    mentee_id,
                    inferred_level = ?request.experience_level,
                    "Inferred mentee experience level"
                );
            }

            let pool = self.mentor_pool(mentee_id).await?;

            let settings = MatchSettings {
                weights: self.config.scoring.matching.clone(),
                policy: self.config.skill_match_policy,
                default_min_score: self.config.min_compatibility_score,
                default_max_results: self.config.max_match_results,
            };
            let candidates = match_mentors(&request, &pool, &settings)?;
            tracing::info!(
                mentee_id,
                pool_size = pool.len(),
                match_count = candidates.len(),
                "Matched mentors"
            );
            Ok(candidates)
        })
        .await
    }

    /// Mentors suggested from the user's own profile, with no request.
    ///
    /// Skills at intermediate or below are the improvement areas; a mentor
    /// needs expertise in at least one of them. `limit` defaults to the
    /// configured `MAX_MATCH_RESULTS`.
    pub async fn recommend_mentors(
        &self,
        user_id: DbId,
        limit: Option<i64>,
    ) -> EngineResult<Vec<MentorRecommendation>> {
        self.run("recommend_mentors", async {
            tracing::debug!(user_id, "Recommending mentors");
            let (skills, pool) =
                futures::try_join!(self.load_user_skills(user_id), self.mentor_pool(user_id))?;

            let default_limit = i64::try_from(self.config.max_match_results)
                .unwrap_or(MAX_MENTOR_RECOMMENDATIONS);
            let limit = clamp_limit(limit, default_limit, MAX_MENTOR_RECOMMENDATIONS);
            let recommended =
                recommend_mentors(user_id, &skills, &pool, limit, self.config.skill_match_policy);
            tracing::info!(
                user_id,
                pool_size = pool.len(),
                recommended = recommended.len(),
                "Recommended mentors"
            );
            Ok(recommended)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Recommendations
    // -----------------------------------------------------------------------

    /// Learning paths ranked against the user's top skill gaps.
    pub async fn recommend_paths(
        &self,
        request: PathRecommendationRequest,
    ) -> EngineResult<RankedPaths> {
        self.run("recommend_paths", async {
            request.validate_request()?;
            let user_id = request.user_id;
            tracing::debug!(user_id, target_role = ?request.target_role, "Recommending paths");

            let role = request
                .target_role
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty());
            let filter = request.filter();

            let store = &self.store;
            let (user_skills, role_profile, catalog_skills, candidates, enrollments) =
                futures::try_join!(
                    self.load_user_skills(user_id),
                    async {
                        match role {
                            Some(role) => self.load_role(role).await,
                            None => Ok(Vec::new()),
                        }
                    },
                    async { Ok::<_, EngineError>(store.get_skills(&request.target_skills).await?) },
                    async { Ok::<_, EngineError>(store.list_catalog_paths(&filter).await?) },
                    async { Ok::<_, EngineError>(store.list_enrollments(user_id).await?) },
                )?;

            let policy = self.config.skill_match_policy;
            let requirements =
                target_requirements(role_profile, &request.target_skills, &catalog_skills, policy);
            let gaps = analyze(&user_skills, &requirements, &self.config.scoring.gaps, policy);
            let candidate_ids: HashSet<DbId> = candidates.iter().map(|p| p.id).collect();
            let enrolled = self
                .enrolled_progress(user_id, enrollments, &candidate_ids)
                .await?;

            let settings = RecommendationSettings {
                weights: self.config.scoring.recommendation.clone(),
                policy,
                gap_top_n: self.config.gap_top_n,
                default_limit: self.config.recommendation_limit,
            };
            let inputs = RecommendationInputs {
                user_skills: &user_skills,
                gaps: &gaps,
                candidates: &candidates,
                enrollments: &enrolled,
            };
            let ranked = recommend(&request, inputs, &settings)?;
            tracing::info!(
                user_id,
                candidates = candidates.len(),
                recommended = ranked.recommendations.len(),
                "Recommended paths"
            );
            Ok(ranked)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn run<T, F>(&self, operation: &'static str, fut: F) -> EngineResult<T>
    where
        F: Future<Output = EngineResult<T>>,
    {
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout {
                operation,
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };
        if let Err(err) = &result {
            if err.is_client_error() {
                tracing::warn!(operation, code = err.code(), error = %err, "Operation rejected");
            } else {
                tracing::error!(operation, code = err.code(), error = %err, "Operation failed");
            }
        }
        result
    }

    async fn load_graph(&self, path_id: DbId) -> EngineResult<PathGraph> {
        let snapshot = self
            .store
            .get_learning_path(path_id)
            .await?
            .ok_or_else(|| CoreError::not_found("LearningPath", path_id))?;
        Ok(PathGraph::build(snapshot)?)
    }

    async fn load_user_skills(&self, user_id: DbId) -> EngineResult<SkillProfile> {
        Ok(self
            .store
            .get_user_skills(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", user_id))?)
    }

    async fn mentor_pool(&self, user_id: DbId) -> EngineResult<Vec<MentorProfile>> {
        let filter = MentorPoolFilter {
            exclude_user_id: Some(user_id),
            available_only: true,
            access: self.mentor_access.clone(),
        };
        Ok(self.store.get_mentor_pool(&filter).await?)
    }

    async fn load_role(&self, role: &str) -> EngineResult<Vec<SkillRequirement>> {
        Ok(self
            .store
            .get_role_skill_profile(role)
            .await?
            .ok_or_else(|| CoreError::not_found("Role", role))?)
    }

    /// Resolve the live percent complete of the unfinished enrollments in
    /// `candidate_ids`. Enrollments outside the candidate set are never
    /// loaded.
    ///
    /// Completed enrollments are passed through so the ranking can skip
    /// them. An enrollment whose path snapshot is gone keeps its stored
    /// percentage.
    async fn enrolled_progress(
        &self,
        user_id: DbId,
        enrollments: Vec<Enrollment>,
        candidate_ids: &HashSet<DbId>,
    ) -> EngineResult<HashMap<DbId, EnrolledPath>> {
        let relevant = enrollments
            .into_iter()
            .filter(|e| candidate_ids.contains(&e.path_id));
        let resolved = try_join_all(relevant.map(|enrollment| async move {
            if enrollment.status == EnrollmentStatus::Completed {
                return Ok::<_, EngineError>((
                    enrollment.path_id,
                    EnrolledPath {
                        status: enrollment.status,
                        percent_complete: 100.0,
                    },
                ));
            }
            let snapshot = self.store.get_learning_path(enrollment.path_id).await?;
            let percent_complete = match snapshot {
                Some(snapshot) => {
                    let graph = PathGraph::build(snapshot)?;
                    let progress = self
                        .store
                        .get_user_step_progress(user_id, enrollment.path_id)
                        .await?;
                    resolve(&graph, &progress).percent_complete
                }
                None => enrollment.progress_percentage,
            };
            Ok((
                enrollment.path_id,
                EnrolledPath {
                    status: enrollment.status,
                    percent_complete,
                },
            ))
        }))
        .await?;
        Ok(resolved.into_iter().collect())
    }
}
