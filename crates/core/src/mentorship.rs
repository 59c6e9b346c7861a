//! Mentor-mentee compatibility scoring.
//!
//! Mentors first pass hard eligibility constraints ([`check_eligibility`]),
//! then are scored on five weighted factors ([`MatchWeights`]). The pool is
//! supplied by the caller; role-based access filtering happens there.
//!
//! [`recommend_mentors`] suggests mentors without an explicit request, from
//! the skills a user holds only at beginner or intermediate level.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::proficiency::{MenteeLevelPreference, ProficiencyLevel};
use crate::scoring::MatchWeights;
use crate::skill::SkillMatchPolicy;
use crate::skill_gap::SkillProfile;
use crate::threshold_validation::{round2, round_score, validate_unit_range};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Threshold used when a request omits `min_compatibility_score`.
pub const DEFAULT_MIN_COMPATIBILITY: f64 = 0.6;

/// Result count used when a request omits `max_results`.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Highest possible mentor rating.
pub const MAX_RATING: f64 = 5.0;

/// Factor score when the mentee or mentor left a preference unspecified.
pub const NEUTRAL_FACTOR_SCORE: f64 = 0.5;

/// Experience-fit score for mentors open to all levels.
pub const ALL_LEVELS_FIT: f64 = 0.8;

pub const STRONG_MATCH_SCORE: f64 = 0.8;
pub const SEASONED_MENTOR_YEARS: u32 = 5;
pub const TOP_RATED_THRESHOLD: f64 = 4.5;
pub const GENEROUS_AVAILABILITY_HOURS: u32 = 5;

/// Years of experience at which the recommendation experience factor saturates.
pub const FULL_EXPERIENCE_YEARS: f64 = 10.0;
/// Weekly hours at which the recommendation availability factor saturates.
pub const FULL_AVAILABILITY_HOURS: f64 = 20.0;

const RECOMMEND_RATING_WEIGHT: f64 = 0.3;
const RECOMMEND_EXPERIENCE_WEIGHT: f64 = 0.3;
const RECOMMEND_AVAILABILITY_WEIGHT: f64 = 0.2;
const RECOMMEND_RELEVANCE_WEIGHT: f64 = 0.2;

pub const STYLE_STRUCTURED: &str = "structured";
pub const STYLE_FLEXIBLE: &str = "flexible";
pub const STYLE_PROJECT_BASED: &str = "project_based";
pub const STYLE_CAREER_FOCUSED: &str = "career_focused";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a mentor runs their sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentorshipStyle {
    Structured,
    Flexible,
    ProjectBased,
    CareerFocused,
}

impl MentorshipStyle {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STYLE_STRUCTURED => Ok(Self::Structured),
            STYLE_FLEXIBLE => Ok(Self::Flexible),
            STYLE_PROJECT_BASED => Ok(Self::ProjectBased),
            STYLE_CAREER_FOCUSED => Ok(Self::CareerFocused),
            _ => Err(format!(
                "Invalid mentorship style '{s}'. Must be one of: {STYLE_STRUCTURED}, \
                 {STYLE_FLEXIBLE}, {STYLE_PROJECT_BASED}, {STYLE_CAREER_FOCUSED}"
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structured => STYLE_STRUCTURED,
            Self::Flexible => STYLE_FLEXIBLE,
            Self::ProjectBased => STYLE_PROJECT_BASED,
            Self::CareerFocused => STYLE_CAREER_FOCUSED,
        }
    }
}

/// A mentor's public profile as of snapshot time.
///
/// `current_mentees` may be stale by the time a session is accepted; the
/// capacity check is re-verified at commit time by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorProfile {
    pub id: DbId,
    pub mentor_user_id: DbId,
    pub display_name: String,
    pub expertise_areas: BTreeSet<String>,
    #[serde(default)]
    pub industries: BTreeSet<String>,
    pub years_of_experience: u32,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub preferred_mentee_level: Option<MenteeLevelPreference>,
    #[serde(default)]
    pub mentorship_style: Option<MentorshipStyle>,
    pub current_mentees: u32,
    pub max_mentees: u32,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_reviews: u32,
    pub is_available: bool,
    #[serde(default)]
    pub available_time_slots: BTreeSet<String>,
    #[serde(default)]
    pub available_hours_per_week: Option<u32>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl MentorProfile {
    /// Whether the mentor can take one more mentee.
    pub fn has_capacity(&self) -> bool {
        self.current_mentees < self.max_mentees
    }

    /// Rating usable for scoring and ordering; unrated or invalid is `None`.
    pub fn effective_rating(&self) -> Option<f64> {
        self.average_rating
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, MAX_RATING))
    }
}

/// A mentee's match request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct MenteeRequest {
    pub mentee_user_id: DbId,
    pub skills_to_learn: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<ProficiencyLevel>,
    #[serde(default)]
    pub preferred_style: Option<MentorshipStyle>,
    #[serde(default)]
    pub industry_preference: Option<String>,
    #[serde(default)]
    pub preferred_time_slots: Vec<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub min_compatibility_score: Option<f64>,
    #[validate(range(min = 0, max = 100))]
    #[serde(default)]
    pub max_results: Option<i64>,
}

/// Why a mentor was excluded before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ineligibility {
    AtCapacity,
    Unavailable,
    IndustryMismatch,
    /// The mentor profile belongs to the requesting mentee.
    SelfMatch,
}

/// Per-factor scores, each in `[0, 1]`, before weighting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchBreakdown {
    pub skill_overlap: f64,
    pub experience_fit: f64,
    pub style: f64,
    pub quality: f64,
    pub schedule: f64,
}

/// A scored, eligible mentor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentorshipMatchCandidate {
    pub mentor: MentorProfile,
    pub compatibility_score: f64,
    pub shared_skills: Vec<String>,
    pub match_reason: String,
    pub match_reasons: Vec<String>,
    pub breakdown: MatchBreakdown,
}

/// Matching knobs that are not part of the request itself.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSettings {
    pub weights: MatchWeights,
    pub policy: SkillMatchPolicy,
    pub default_min_score: f64,
    pub default_max_results: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            weights: MatchWeights::default(),
            policy: SkillMatchPolicy::default(),
            default_min_score: DEFAULT_MIN_COMPATIBILITY,
            default_max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

fn industry_preference(request: &MenteeRequest) -> Option<&str> {
    request
        .industry_preference
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Hard constraints; a failing mentor is never scored.
pub fn check_eligibility(
    mentor: &MentorProfile,
    request: &MenteeRequest,
    policy: SkillMatchPolicy,
) -> Result<(), Ineligibility> {
    if mentor.mentor_user_id == request.mentee_user_id {
        return Err(Ineligibility::SelfMatch);
    }
    if !mentor.is_available {
        return Err(Ineligibility::Unavailable);
    }
    if !mentor.has_capacity() {
        return Err(Ineligibility::AtCapacity);
    }
    if let Some(industry) = industry_preference(request) {
        if !mentor.industries.iter().any(|i| policy.matches(i, industry)) {
            return Err(Ineligibility::IndustryMismatch);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Factor scores
// ---------------------------------------------------------------------------

/// 1.0 on an exact tier match, graded down by ordinal distance otherwise.
pub fn experience_fit(
    preferred: Option<MenteeLevelPreference>,
    mentee_level: Option<ProficiencyLevel>,
) -> f64 {
    let (Some(preferred), Some(level)) = (preferred, mentee_level) else {
        return NEUTRAL_FACTOR_SCORE;
    };
    match preferred.target_level() {
        None => ALL_LEVELS_FIT,
        Some(target) => {
            let max_distance = f64::from(ProficiencyLevel::Expert.ordinal());
            let distance = f64::from((target.ordinal() - level.ordinal()).abs());
            1.0 - distance / max_distance
        }
    }
}

pub fn style_fit(mentor: Option<MentorshipStyle>, mentee: Option<MentorshipStyle>) -> f64 {
    match (mentor, mentee) {
        (Some(a), Some(b)) if a == b => 1.0,
        (Some(_), Some(_)) => 0.0,
        _ => NEUTRAL_FACTOR_SCORE,
    }
}

/// `average_rating / 5`, 0 when unrated.
pub fn quality_score(mentor: &MentorProfile) -> f64 {
    mentor.effective_rating().map_or(0.0, |r| r / MAX_RATING)
}

/// Fraction of the mentee's preferred slots the mentor offers.
pub fn schedule_overlap(
    mentor_slots: &BTreeSet<String>,
    preferred_slots: &[String],
    policy: SkillMatchPolicy,
) -> f64 {
    let wanted = policy.normalize_set(preferred_slots);
    if wanted.is_empty() {
        return NEUTRAL_FACTOR_SCORE;
    }
    let offered = policy.normalize_set(mentor_slots);
    wanted.intersection(&offered).count() as f64 / wanted.len() as f64
}

/// Mentee skills the mentor lists as expertise, in the mentee's wording.
fn shared_skills(
    mentor: &MentorProfile,
    skills_to_learn: &[String],
    policy: SkillMatchPolicy,
) -> Vec<String> {
    let expertise = policy.normalize_set(&mentor.expertise_areas);
    let mut seen = BTreeSet::new();
    skills_to_learn
        .iter()
        .filter(|s| expertise.contains(&policy.normalize(s)))
        .filter(|s| seen.insert(policy.normalize(s)))
        .cloned()
        .collect()
}

fn weighted_score(breakdown: &MatchBreakdown, weights: &MatchWeights) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }
    let sum = weights.skill_overlap * breakdown.skill_overlap
        + weights.experience_fit * breakdown.experience_fit
        + weights.style * breakdown.style
        + weights.quality * breakdown.quality
        + weights.schedule * breakdown.schedule;
    round_score((sum / total).clamp(0.0, 1.0))
}

/// Human-readable reasons a mentor was matched.
pub fn match_reasons(mentor: &MentorProfile, score: f64, shared: &[String]) -> Vec<String> {
    let mut reasons = Vec::new();
    if !shared.is_empty() {
        reasons.push(format!("Expertise in {}", shared.join(", ")));
    }
    if score >= STRONG_MATCH_SCORE {
        reasons.push("Strong overall compatibility".to_string());
    }
    if mentor.years_of_experience >= SEASONED_MENTOR_YEARS {
        reasons.push(format!(
            "{} years of professional experience",
            mentor.years_of_experience
        ));
    }
    if let Some(rating) = mentor.effective_rating().filter(|r| *r >= TOP_RATED_THRESHOLD) {
        reasons.push(format!("Highly rated mentor ({rating:.1}/5)"));
    }
    if let Some(hours) = mentor
        .available_hours_per_week
        .filter(|h| *h >= GENEROUS_AVAILABILITY_HOURS)
    {
        reasons.push(format!("Available {hours} hours per week"));
    }
    reasons
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Validate the request fields the derive cannot express.
fn validate_request(request: &MenteeRequest) -> Result<(), CoreError> {
    request.validate()?;
    if let Some(min) = request.min_compatibility_score {
        validate_unit_range(min, "min_compatibility_score")?;
    }
    Ok(())
}

/// Score one eligible mentor. `wanted_count` is the number of distinct,
/// non-blank skills to learn.
fn score_mentor(
    mentor: &MentorProfile,
    request: &MenteeRequest,
    wanted_count: usize,
    settings: &MatchSettings,
) -> MentorshipMatchCandidate {
    let policy = settings.policy;
    let shared = shared_skills(mentor, &request.skills_to_learn, policy);
    let breakdown = MatchBreakdown {
        skill_overlap: shared.len() as f64 / wanted_count as f64,
        experience_fit: experience_fit(mentor.preferred_mentee_level, request.experience_level),
        style: style_fit(mentor.mentorship_style, request.preferred_style),
        quality: quality_score(mentor),
        schedule: schedule_overlap(
            &mentor.available_time_slots,
            &request.preferred_time_slots,
            policy,
        ),
    };
    let score = weighted_score(&breakdown, &settings.weights);
    let reasons = match_reasons(mentor, score, &shared);
    let match_reason = reasons.first().cloned().unwrap_or_else(|| {
        format!("Compatibility score {:.2}", round2(score))
    });

    MentorshipMatchCandidate {
        mentor: mentor.clone(),
        compatibility_score: score,
        shared_skills: shared,
        match_reason,
        match_reasons: reasons,
        breakdown,
    }
}

/// Rank the eligible mentors in `pool` for `request`.
///
/// Candidates below the minimum score are dropped; the rest are ordered by
/// score, rating, review count (all descending) and then profile id, and
/// truncated to `max_results`. An empty pool or an empty `skills_to_learn`
/// yields an empty list.
pub fn match_mentors(
    request: &MenteeRequest,
    pool: &[MentorProfile],
    settings: &MatchSettings,
) -> Result<Vec<MentorshipMatchCandidate>, CoreError> {
    validate_request(request)?;

    let wanted: BTreeSet<String> = request
        .skills_to_learn
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| settings.policy.normalize(s))
        .collect();
    if wanted.is_empty() || pool.is_empty() {
        return Ok(Vec::new());
    }

    let min_score = request
        .min_compatibility_score
        .unwrap_or(settings.default_min_score);
    let max_results = request
        .max_results
        .map_or(settings.default_max_results, |n| n.max(0) as usize);

    let mut candidates: Vec<MentorshipMatchCandidate> = pool
        .iter()
        .filter(|m| check_eligibility(m, request, settings.policy).is_ok())
        .map(|m| score_mentor(m, request, wanted.len(), settings))
        .filter(|c| c.compatibility_score >= min_score)
        .collect();

    candidates.sort_by(|a, b| {
        let rating = |c: &MentorshipMatchCandidate| c.mentor.effective_rating().unwrap_or(0.0);
        b.compatibility_score
            .total_cmp(&a.compatibility_score)
            .then_with(|| rating(b).total_cmp(&rating(a)))
            .then_with(|| b.mentor.total_reviews.cmp(&a.mentor.total_reviews))
            .then_with(|| a.mentor.id.cmp(&b.mentor.id))
    });
    candidates.truncate(max_results);
    Ok(candidates)
}

// ---------------------------------------------------------------------------
// Mentee level inference
// ---------------------------------------------------------------------------

/// The mentee's tier as the rounded mean tier of the skills they hold.
///
/// Used when a request leaves `experience_level` unset. `None` for an empty
/// profile, which keeps the experience factor neutral.
pub fn infer_experience_level(skills: &SkillProfile) -> Option<ProficiencyLevel> {
    if skills.is_empty() {
        return None;
    }
    let total: i32 = skills.values().map(|level| level.ordinal()).sum();
    let mean = f64::from(total) / skills.len() as f64;
    Some(ProficiencyLevel::from_ordinal(mean.round() as i32))
}

// ---------------------------------------------------------------------------
// Unprompted recommendations
// ---------------------------------------------------------------------------

/// A mentor suggested from the user's own profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentorRecommendation {
    pub mentor: MentorProfile,
    pub score: f64,
    /// Improvement areas the mentor has expertise in.
    pub shared_skills: Vec<String>,
}

/// Skills held at beginner or intermediate level, one per name under
/// `policy`, sorted.
pub fn improvement_areas(skills: &SkillProfile, policy: SkillMatchPolicy) -> Vec<String> {
    let mut areas: BTreeMap<String, &String> = BTreeMap::new();
    for (name, level) in skills {
        if *level <= ProficiencyLevel::Intermediate {
            areas.entry(policy.normalize(name)).or_insert(name);
        }
    }
    let mut names: Vec<String> = areas.into_values().cloned().collect();
    names.sort();
    names
}

/// Rating, seniority, weekly availability and relevance blended into `[0, 1]`.
pub fn recommendation_score(mentor: &MentorProfile, relevance: f64) -> f64 {
    let experience = (f64::from(mentor.years_of_experience) / FULL_EXPERIENCE_YEARS).min(1.0);
    let availability = mentor
        .available_hours_per_week
        .map_or(0.0, |h| (f64::from(h) / FULL_AVAILABILITY_HOURS).min(1.0));
    round_score(
        RECOMMEND_RATING_WEIGHT * quality_score(mentor)
            + RECOMMEND_EXPERIENCE_WEIGHT * experience
            + RECOMMEND_AVAILABILITY_WEIGHT * availability
            + RECOMMEND_RELEVANCE_WEIGHT * relevance.clamp(0.0, 1.0),
    )
}

/// Suggest mentors for `user_id` without an explicit request.
///
/// Only eligible mentors with expertise in at least one improvement area
/// are kept. They are ordered by [`recommendation_score`], then rating
/// (descending) and profile id, and truncated to `limit`.
pub fn recommend_mentors(
    user_id: DbId,
    skills: &SkillProfile,
    pool: &[MentorProfile],
    limit: usize,
    policy: SkillMatchPolicy,
) -> Vec<MentorRecommendation> {
    let areas = improvement_areas(skills, policy);
    if areas.is_empty() || limit == 0 {
        return Vec::new();
    }
    let as_mentee = MenteeRequest {
        mentee_user_id: user_id,
        ..MenteeRequest::default()
    };

    let mut recommendations: Vec<MentorRecommendation> = pool
        .iter()
        .filter(|m| check_eligibility(m, &as_mentee, policy).is_ok())
        .filter_map(|m| {
            let shared = shared_skills(m, &areas, policy);
            if shared.is_empty() {
                return None;
            }
            let relevance = shared.len() as f64 / areas.len() as f64;
            Some(MentorRecommendation {
                mentor: m.clone(),
                score: recommendation_score(m, relevance),
                shared_skills: shared,
            })
        })
        .collect();

    recommendations.sort_by(|a, b| {
        let rating = |r: &MentorRecommendation| r.mentor.effective_rating().unwrap_or(0.0);
        b.score
            .total_cmp(&a.score)
            .then_with(|| rating(b).total_cmp(&rating(a)))
            .then_with(|| a.mentor.id.cmp(&b.mentor.id))
    });
    recommendations.truncate(limit);
    recommendations
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
