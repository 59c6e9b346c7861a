//! Learning-path recommendation ranking.
//!
//! Combines the user's ranked skill gaps with their existing enrollments
//! into a ranked list of catalog paths. The caller fetches the candidate
//! paths, the gaps and the enrolled progress; everything here is pure.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::path_graph::EnrollmentStatus;
use crate::proficiency::{DifficultyLevel, ProficiencyLevel};
use crate::scoring::RecommendationWeights;
use crate::skill::{validate_skill_name, Skill, SkillMatchPolicy, SkillRequirement};
use crate::skill_gap::{estimate_duration_weeks, suggest_difficulty, SkillGap, SkillProfile};
use crate::threshold_validation::{clamp_limit, round2, round_score};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of top gaps a path is scored against by default.
pub const DEFAULT_GAP_TOP_N: usize = 5;

/// Default and maximum number of recommendations returned.
pub const DEFAULT_RECOMMENDATION_LIMIT: i64 = 10;
pub const MAX_RECOMMENDATION_LIMIT: i64 = 50;

/// Level required for free-form target skills that no role profile names.
pub const DEFAULT_TARGET_LEVEL: ProficiencyLevel = ProficiencyLevel::Intermediate;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A learning path as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPath {
    pub id: DbId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub difficulty: DifficultyLevel,
    pub estimated_duration_weeks: u32,
    /// Skills the path declares it teaches.
    pub target_skills: BTreeSet<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Catalog filters carried by a recommendation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathFilter {
    pub category: Option<String>,
    pub difficulty: Option<DifficultyLevel>,
    pub max_duration_weeks: Option<u32>,
}

impl PathFilter {
    /// Whether an active catalog path passes every set filter.
    pub fn matches(&self, path: &CatalogPath, policy: SkillMatchPolicy) -> bool {
        path.is_active
            && self
                .category
                .as_deref()
                .map_or(true, |c| policy.matches(c, &path.category))
            && self.difficulty.map_or(true, |d| d == path.difficulty)
            && self
                .max_duration_weeks
                .map_or(true, |max| path.estimated_duration_weeks <= max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PathRecommendationRequest {
    pub user_id: DbId,
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub target_role: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub target_skills: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<DifficultyLevel>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_duration_weeks: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<i64>,
}

impl PathRecommendationRequest {
    /// Field validation, the requirement that a target is given, and a
    /// length check on every non-blank target skill name.
    pub fn validate_request(&self) -> Result<(), CoreError> {
        self.validate()?;
        let has_role = self
            .target_role
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        let has_skills = self.target_skills.iter().any(|s| !s.trim().is_empty());
        if !has_role && !has_skills {
            return Err(CoreError::Validation(
                "Either target_role or target_skills is required".to_string(),
            ));
        }
        for skill in self.target_skills.iter().filter(|s| !s.trim().is_empty()) {
            validate_skill_name(skill)?;
        }
        Ok(())
    }

    pub fn filter(&self) -> PathFilter {
        PathFilter {
            category: self.category.clone(),
            difficulty: self.difficulty,
            max_duration_weeks: self
                .max_duration_weeks
                .map(|w| w.clamp(0, i64::from(u32::MAX)) as u32),
        }
    }
}

/// Progress of an existing enrollment, keyed by path id in the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnrolledPath {
    pub status: EnrollmentStatus,
    pub percent_complete: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathRecommendation {
    pub path: CatalogPath,
    pub match_score: f64,
    /// Share of the considered gaps (by gap size) the path teaches.
    pub gap_coverage: f64,
    pub closes_skills: Vec<String>,
    pub percent_complete: Option<f64>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPaths {
    pub user_id: DbId,
    pub target_role: Option<String>,
    /// Names of the top gaps the paths were scored against.
    pub considered_gaps: Vec<String>,
    pub suggested_difficulty: DifficultyLevel,
    pub estimated_weeks: u32,
    pub recommendations: Vec<PathRecommendation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSettings {
    pub weights: RecommendationWeights,
    pub policy: SkillMatchPolicy,
    pub gap_top_n: usize,
    pub default_limit: i64,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            weights: RecommendationWeights::default(),
            policy: SkillMatchPolicy::default(),
            gap_top_n: DEFAULT_GAP_TOP_N,
            default_limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }
}

/// Snapshot data a recommendation is computed from.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInputs<'a> {
    pub user_skills: &'a SkillProfile,
    /// Gaps ranked by [`crate::skill_gap::analyze`].
    pub gaps: &'a [SkillGap],
    pub candidates: &'a [CatalogPath],
    pub enrollments: &'a HashMap<DbId, EnrolledPath>,
}

// ---------------------------------------------------------------------------
// Target resolution
// ---------------------------------------------------------------------------

/// Merge a role profile with free-form target skill names.
///
/// Names already in the role profile keep the role's level; the rest are
/// required at [`DEFAULT_TARGET_LEVEL`] and take their catalog record from
/// `catalog` when present.
pub fn target_requirements(
    role_profile: Vec<SkillRequirement>,
    extra_skills: &[String],
    catalog: &[Skill],
    policy: SkillMatchPolicy,
) -> Vec<SkillRequirement> {
    let mut seen: BTreeSet<String> = role_profile
        .iter()
        .map(|r| policy.normalize(&r.skill.name))
        .collect();
    let catalog_by_name: HashMap<String, &Skill> = catalog
        .iter()
        .map(|s| (policy.normalize(&s.name), s))
        .collect();

    let mut requirements = role_profile;
    for name in extra_skills.iter().filter(|s| !s.trim().is_empty()) {
        let key = policy.normalize(name);
        if !seen.insert(key.clone()) {
            continue;
        }
        let skill = catalog_by_name
            .get(&key)
            .map(|s| (*s).clone())
            .unwrap_or_else(|| Skill::uncatalogued(name.trim()));
        requirements.push(SkillRequirement {
            skill,
            required_level: DEFAULT_TARGET_LEVEL,
        });
    }
    requirements
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score one candidate path against the considered gaps.
///
/// Returns `None` for paths that close no considered gap and have no
/// enrollment to finish.
fn score_path(
    path: &CatalogPath,
    top_gaps: &[SkillGap],
    enrolled: Option<&EnrolledPath>,
    settings: &RecommendationSettings,
) -> Option<PathRecommendation> {
    let policy = settings.policy;
    let teaches = policy.normalize_set(&path.target_skills);

    let total_gap: u32 = top_gaps.iter().map(|g| g.gap_size).sum();
    let closed: Vec<&SkillGap> = top_gaps
        .iter()
        .filter(|g| teaches.contains(&policy.normalize(&g.skill_name)))
        .collect();
    let closed_gap: u32 = closed.iter().map(|g| g.gap_size).sum();
    let gap_coverage = if total_gap == 0 {
        0.0
    } else {
        f64::from(closed_gap) / f64::from(total_gap)
    };

    let percent_complete = enrolled.map(|e| e.percent_complete.clamp(0.0, 100.0));
    let progress = percent_complete.unwrap_or(0.0) / 100.0;

    let weights = &settings.weights;
    let total_weight = weights.total();
    let match_score = if total_weight <= 0.0 {
        0.0
    } else {
        let weighted = weights.gap_coverage * gap_coverage + weights.progress * progress;
        round_score(weighted / total_weight)
    };
    if match_score <= 0.0 && enrolled.is_none() {
        return None;
    }

    let closes_skills: Vec<String> = closed.iter().map(|g| g.skill_name.clone()).collect();
    let mut reasons = Vec::new();
    if !closes_skills.is_empty() {
        reasons.push(format!(
            "Covers {} of your top {} skill gaps: {}",
            closes_skills.len(),
            top_gaps.len(),
            closes_skills.join(", ")
        ));
    }
    if let Some(pct) = percent_complete {
        reasons.push(format!("You are {pct:.0}% through this path"));
    }
    reasons.push(format!(
        "Takes about {} weeks at {} level",
        path.estimated_duration_weeks,
        path.difficulty.as_str()
    ));

    Some(PathRecommendation {
        path: path.clone(),
        match_score,
        gap_coverage: round2(gap_coverage),
        closes_skills,
        percent_complete,
        reasons,
    })
}

/// Rank candidate paths for a user.
///
/// Inactive paths, paths outside the request filters and paths the user
/// already completed are skipped. Ordering is match score descending, then
/// estimated duration ascending, then path id.
pub fn recommend(
    request: &PathRecommendationRequest,
    inputs: RecommendationInputs<'_>,
    settings: &RecommendationSettings,
) -> Result<RankedPaths, CoreError> {
    request.validate_request()?;

    let policy = settings.policy;
    let filter = request.filter();
    let top_gaps = &inputs.gaps[..inputs.gaps.len().min(settings.gap_top_n)];
    let limit = clamp_limit(request.limit, settings.default_limit, MAX_RECOMMENDATION_LIMIT);

    let mut recommendations: Vec<PathRecommendation> = inputs
        .candidates
        .iter()
        .filter(|p| filter.matches(p, policy))
        .filter_map(|p| {
            let enrolled = inputs.enrollments.get(&p.id);
            if enrolled.is_some_and(|e| e.status == EnrollmentStatus::Completed) {
                return None;
            }
            score_path(p, top_gaps, enrolled, settings)
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.match_score
            .total_cmp(&a.match_score)
            .then_with(|| {
                a.path
                    .estimated_duration_weeks
                    .cmp(&b.path.estimated_duration_weeks)
            })
            .then_with(|| a.path.id.cmp(&b.path.id))
    });
    recommendations.truncate(limit);

    let considered_gaps: Vec<String> = top_gaps.iter().map(|g| g.skill_name.clone()).collect();

    Ok(RankedPaths {
        user_id: request.user_id,
        target_role: request.target_role.clone(),
        suggested_difficulty: suggest_difficulty(inputs.user_skills, &considered_gaps, policy),
        estimated_weeks: estimate_duration_weeks(inputs.user_skills, &considered_gaps, policy),
        considered_gaps,
        recommendations,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::GapWeights;
    use crate::skill::MAX_SKILL_NAME_LENGTH;
    use crate::skill_gap::analyze;

    fn path(id: DbId, weeks: u32, skills: &[&str]) -> CatalogPath {
        CatalogPath {
            id,
            title: format!("Path {id}"),
            description: None,
            category: "backend".to_string(),
            difficulty: ProficiencyLevel::Intermediate,
            estimated_duration_weeks: weeks,
            target_skills: skills.iter().map(|s| s.to_string()).collect(),
            is_active: true,
        }
    }

    fn requirement(name: &str, demand: f64, level: ProficiencyLevel) -> SkillRequirement {
        SkillRequirement {
            skill: Skill {
                market_demand: demand,
                ..Skill::uncatalogued(name)
            },
            required_level: level,
        }
    }

    fn request() -> PathRecommendationRequest {
        PathRecommendationRequest {
            user_id: 1,
            target_role: Some("Backend Engineer".to_string()),
            ..PathRecommendationRequest::default()
        }
    }

    struct Fixture {
        user: SkillProfile,
        gaps: Vec<SkillGap>,
        enrollments: HashMap<DbId, EnrolledPath>,
    }

    impl Fixture {
        fn new() -> Self {
            let user: SkillProfile = [("Go".to_string(), ProficiencyLevel::Intermediate)].into();
            let targets = vec![
                requirement("Go", 0.9, ProficiencyLevel::Expert),
                requirement("SQL", 0.6, ProficiencyLevel::Beginner),
                requirement("Kafka", 0.5, ProficiencyLevel::Beginner),
            ];
            let gaps = analyze(
                &user,
                &targets,
                &GapWeights::default(),
                SkillMatchPolicy::CaseInsensitive,
            );
            Self {
                user,
                gaps,
                enrollments: HashMap::new(),
            }
        }

        fn rank(&self, req: &PathRecommendationRequest, candidates: &[CatalogPath]) -> RankedPaths {
            let inputs = RecommendationInputs {
                user_skills: &self.user,
                gaps: &self.gaps,
                candidates,
                enrollments: &self.enrollments,
            };
            recommend(req, inputs, &RecommendationSettings::default()).unwrap()
        }
    }

    fn ids(ranked: &RankedPaths) -> Vec<DbId> {
        ranked.recommendations.iter().map(|r| r.path.id).collect()
    }

    // -- request validation --

    #[test]
    fn request_needs_role_or_skills() {
        let req = PathRecommendationRequest {
            user_id: 1,
            ..PathRecommendationRequest::default()
        };
        assert!(matches!(req.validate_request(), Err(CoreError::Validation(_))));

        let req = PathRecommendationRequest {
            user_id: 1,
            target_skills: vec!["Rust".into()],
            ..PathRecommendationRequest::default()
        };
        assert!(req.validate_request().is_ok());
    }

    #[test]
    fn out_of_range_limit_is_invalid() {
        let req = PathRecommendationRequest {
            limit: Some(0),
            ..request()
        };
        assert!(req.validate_request().is_err());
    }

    #[test]
    fn overlong_target_skill_is_invalid() {
        let req = PathRecommendationRequest {
            target_skills: vec!["Rust".into(), "x".repeat(MAX_SKILL_NAME_LENGTH + 1)],
            ..request()
        };
        assert!(matches!(req.validate_request(), Err(CoreError::Validation(_))));
    }

    // -- ranking --

    #[test]
    fn coverage_of_top_gaps_drives_score() {
        let f = Fixture::new();
        // Gaps: Go (2), SQL (1), Kafka (1); total 4.
        let candidates = vec![
            path(1, 8, &["SQL"]),
            path(2, 8, &["Go", "SQL"]),
            path(3, 8, &["Figma"]),
        ];
        let ranked = f.rank(&request(), &candidates);
        assert_eq!(ids(&ranked), vec![2, 1]);
        let top = &ranked.recommendations[0];
        assert!((top.gap_coverage - 0.75).abs() < 1e-9);
        assert!((top.match_score - 0.525).abs() < 1e-9);
        assert_eq!(top.closes_skills, vec!["Go", "SQL"]);
    }

    #[test]
    fn ties_prefer_shorter_paths() {
        let f = Fixture::new();
        let candidates = vec![path(1, 12, &["SQL"]), path(2, 4, &["sql"]), path(3, 4, &["SQL"])];
        assert_eq!(ids(&f.rank(&request(), &candidates)), vec![2, 3, 1]);
    }

    #[test]
    fn in_progress_enrollment_boosts_score() {
        let mut f = Fixture::new();
        f.enrollments.insert(
            1,
            EnrolledPath {
                status: EnrollmentStatus::InProgress,
                percent_complete: 80.0,
            },
        );
        let candidates = vec![path(1, 8, &["SQL"]), path(2, 8, &["Go"])];
        let ranked = f.rank(&request(), &candidates);
        // Path 1: 0.7 * 0.25 + 0.3 * 0.8 = 0.415; path 2: 0.7 * 0.5 = 0.35.
        assert_eq!(ids(&ranked), vec![1, 2]);
        assert_eq!(ranked.recommendations[0].percent_complete, Some(80.0));
    }

    #[test]
    fn completed_enrollments_are_excluded() {
        let mut f = Fixture::new();
        f.enrollments.insert(
            2,
            EnrolledPath {
                status: EnrollmentStatus::Completed,
                percent_complete: 100.0,
            },
        );
        let candidates = vec![path(1, 8, &["SQL"]), path(2, 8, &["Go"])];
        assert_eq!(ids(&f.rank(&request(), &candidates)), vec![1]);
    }

    #[test]
    fn filters_apply() {
        let f = Fixture::new();
        let mut long = path(1, 30, &["Go"]);
        long.category = "Backend".into();
        let mut inactive = path(2, 4, &["Go"]);
        inactive.is_active = false;
        let mut advanced = path(3, 4, &["Go"]);
        advanced.difficulty = ProficiencyLevel::Advanced;
        let other = path(4, 4, &["Go"]);

        let req = PathRecommendationRequest {
            category: Some("backend".into()),
            difficulty: Some(ProficiencyLevel::Intermediate),
            max_duration_weeks: Some(12),
            ..request()
        };
        assert_eq!(ids(&f.rank(&req, &[long, inactive, advanced, other])), vec![4]);
    }

    #[test]
    fn only_top_n_gaps_are_considered() {
        let f = Fixture::new();
        let inputs = RecommendationInputs {
            user_skills: &f.user,
            gaps: &f.gaps,
            candidates: &[path(1, 8, &["SQL"]), path(2, 8, &["Go"])],
            enrollments: &f.enrollments,
        };
        let settings = RecommendationSettings {
            gap_top_n: 1,
            ..RecommendationSettings::default()
        };
        let ranked = recommend(&request(), inputs, &settings).unwrap();
        assert_eq!(ranked.considered_gaps, vec!["Go"]);
        assert_eq!(ids(&ranked), vec![2]);
    }

    #[test]
    fn limit_truncates() {
        let f = Fixture::new();
        let candidates: Vec<CatalogPath> = (1..=5).map(|id| path(id, 8, &["Go"])).collect();
        let req = PathRecommendationRequest {
            limit: Some(2),
            ..request()
        };
        assert_eq!(ids(&f.rank(&req, &candidates)), vec![1, 2]);
    }

    #[test]
    fn no_gaps_and_no_enrollments_yield_empty_list() {
        let f = Fixture {
            gaps: Vec::new(),
            ..Fixture::new()
        };
        let ranked = f.rank(&request(), &[path(1, 8, &["Go"])]);
        assert!(ranked.recommendations.is_empty());
        assert_eq!(ranked.estimated_weeks, 2);
    }

    #[test]
    fn ranked_list_carries_difficulty_and_weeks() {
        let f = Fixture::new();
        let ranked = f.rank(&request(), &[path(1, 8, &["Go"])]);
        assert_eq!(ranked.considered_gaps, vec!["Go", "SQL", "Kafka"]);
        // Go intermediate (1.0 x 4) + SQL and Kafka absent (2.0 x 4 each).
        assert_eq!(ranked.estimated_weeks, 20);
        assert_eq!(ranked.suggested_difficulty, ProficiencyLevel::Beginner);
    }

    // -- target_requirements --

    #[test]
    fn free_form_skills_extend_role_profile() {
        let role = vec![requirement("Go", 0.9, ProficiencyLevel::Expert)];
        let catalog = vec![Skill {
            name: "PostgreSQL".into(),
            category: "databases".into(),
            subcategory: None,
            market_demand: 0.7,
        }];
        let extra: Vec<String> = ["go", "postgresql", "Zig", " "]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let merged = target_requirements(role, &extra, &catalog, SkillMatchPolicy::CaseInsensitive);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].required_level, ProficiencyLevel::Expert);
        assert_eq!(merged[1].skill.category, "databases");
        assert_eq!(merged[1].required_level, DEFAULT_TARGET_LEVEL);
        assert!((merged[2].skill.market_demand - 0.0).abs() < f64::EPSILON);
    }
}
