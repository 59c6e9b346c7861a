//! Skill-gap analysis between a user's profile and a target role.
//!
//! [`analyze`] diffs one user's proficiency map against a role's required
//! skills and ranks the gaps. [`cohort_gap_metrics`] does the same at the
//! population level from a pre-aggregated level histogram; the histogram
//! itself is produced by the store (or [`tally_cohort`] for small,
//! in-memory cohorts).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::proficiency::{rank_of, DifficultyLevel, ProficiencyLevel};
use crate::scoring::GapWeights;
use crate::skill::{SkillMatchPolicy, SkillRequirement};
use crate::threshold_validation::{round2, round_score};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest possible gap: absent (-1) to expert (3).
pub const MAX_GAP_SIZE: u32 = 4;

/// Market demand at or above which a skill counts as in demand.
pub const HIGH_DEMAND: f64 = 0.7;

/// Number of top gaps spelled out in report recommendations.
pub const REPORT_RECOMMENDATION_COUNT: usize = 3;

pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_MEDIUM: &str = "medium";
pub const PRIORITY_LOW: &str = "low";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A user's skills keyed by skill name.
pub type SkillProfile = HashMap<String, ProficiencyLevel>;

/// Coarse priority label shown alongside the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPriority {
    High,
    Medium,
    Low,
}

impl GapPriority {
    /// Classify a gap by size and market demand.
    pub fn classify(gap_size: u32, market_demand: f64) -> Self {
        let in_demand = market_demand >= HIGH_DEMAND;
        if gap_size >= 3 || (gap_size >= 2 && in_demand) {
            Self::High
        } else if gap_size >= 2 || in_demand {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => PRIORITY_HIGH,
            Self::Medium => PRIORITY_MEDIUM,
            Self::Low => PRIORITY_LOW,
        }
    }
}

/// One unmet requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill_name: String,
    pub category: String,
    /// `None` when the user does not hold the skill at all.
    pub current_level: Option<ProficiencyLevel>,
    pub required_level: ProficiencyLevel,
    pub gap_size: u32,
    pub market_demand: f64,
    /// Gap size plus the weighted demand share, scaled into `[0, 1)`.
    /// One gap tier always outweighs the whole demand range, so the gap
    /// list is non-increasing in this score.
    pub priority_score: f64,
    pub priority: GapPriority,
    pub estimated_learning_hours: u32,
}

// ---------------------------------------------------------------------------
// Single-user analysis
// ---------------------------------------------------------------------------

/// Ordinal distance from `current` up to `required`; 0 if already met.
pub fn gap_size(current: Option<ProficiencyLevel>, required: ProficiencyLevel) -> u32 {
    (required.ordinal() - rank_of(current)).max(0) as u32
}

/// Estimated hours to close a gap of `gap_size` tiers.
///
/// Each tier costs `hours_per_level`; every tier beyond the first adds a
/// growing `escalation_hours` surcharge. Monotonic in `gap_size`, never
/// negative.
pub fn estimate_learning_hours(gap_size: u32, weights: &GapWeights) -> u32 {
    let base = gap_size.saturating_mul(weights.hours_per_level);
    let steps_beyond_first = gap_size.saturating_mul(gap_size.saturating_sub(1)) / 2;
    base.saturating_add(steps_beyond_first.saturating_mul(weights.escalation_hours))
}

/// Demand clamped to `[0, 1]`; non-finite values count as no demand.
fn sanitize_demand(demand: f64) -> f64 {
    if demand.is_finite() {
        demand.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// `(gap + share * demand) / (MAX_GAP_SIZE + 1)` with `share < 1`.
pub fn priority_score(gap_size: u32, market_demand: f64, weights: &GapWeights) -> f64 {
    let share = weights.demand_share();
    let share = if share.is_finite() { share.clamp(0.0, 1.0) } else { 0.0 };
    let tiers = f64::from(gap_size.min(MAX_GAP_SIZE));
    round_score((tiers + share * market_demand) / f64::from(MAX_GAP_SIZE + 1))
}

/// Diff a user's skills against target requirements.
///
/// Met requirements are dropped. Gaps are ordered by `priority_score`
/// descending (gap size first, market demand second), then skill name
/// ascending. A target
/// listed twice (under `policy`) keeps its highest required level.
pub fn analyze(
    user_skills: &SkillProfile,
    targets: &[SkillRequirement],
    weights: &GapWeights,
    policy: SkillMatchPolicy,
) -> Vec<SkillGap> {
    let current_by_name = normalized_profile(user_skills, policy);

    let mut deduped: BTreeMap<String, &SkillRequirement> = BTreeMap::new();
    for target in targets {
        let key = policy.normalize(&target.skill.name);
        let keep = deduped
            .get(&key)
            .map_or(true, |existing| existing.required_level < target.required_level);
        if keep {
            deduped.insert(key, target);
        }
    }

    let mut gaps: Vec<SkillGap> = deduped
        .into_iter()
        .filter_map(|(key, target)| {
            let current = current_by_name.get(&key).copied();
            let size = gap_size(current, target.required_level);
            if size == 0 {
                return None;
            }
            let demand = sanitize_demand(target.skill.market_demand);
            Some(SkillGap {
                skill_name: target.skill.name.clone(),
                category: target.skill.category.clone(),
                current_level: current,
                required_level: target.required_level,
                gap_size: size,
                market_demand: demand,
                priority_score: priority_score(size, demand, weights),
                priority: GapPriority::classify(size, demand),
                estimated_learning_hours: estimate_learning_hours(size, weights),
            })
        })
        .collect();

    gaps.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then_with(|| a.skill_name.cmp(&b.skill_name))
    });
    gaps
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A user's gap analysis against a role, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGapReport {
    pub user_id: DbId,
    pub target_role: Option<String>,
    pub current_skills: Vec<String>,
    /// Target skills the user does not hold at any level.
    pub missing_skills: Vec<String>,
    pub skill_gaps: Vec<SkillGap>,
    pub estimated_time_to_fill_hours: u32,
    pub recommendations: Vec<String>,
    pub analysis_date: Timestamp,
}

/// Assemble a report from an already ranked gap list.
pub fn build_gap_report(
    user_id: DbId,
    target_role: Option<&str>,
    user_skills: &SkillProfile,
    gaps: Vec<SkillGap>,
    now: Timestamp,
) -> SkillGapReport {
    let mut current_skills: Vec<String> = user_skills.keys().cloned().collect();
    current_skills.sort();

    let mut missing_skills: Vec<String> = gaps
        .iter()
        .filter(|g| g.current_level.is_none())
        .map(|g| g.skill_name.clone())
        .collect();
    missing_skills.sort();

    let estimated_time_to_fill_hours = gaps
        .iter()
        .fold(0u32, |acc, g| acc.saturating_add(g.estimated_learning_hours));

    let recommendations = if gaps.is_empty() {
        vec!["You already meet every skill requirement for this target".to_string()]
    } else {
        gaps.iter()
            .take(REPORT_RECOMMENDATION_COUNT)
            .map(|g| {
                let from = g.current_level.map_or("no experience", ProficiencyLevel::as_str);
                format!(
                    "Prioritize {}: move from {from} to {} (about {} hours)",
                    g.skill_name,
                    g.required_level.as_str(),
                    g.estimated_learning_hours
                )
            })
            .collect()
    };

    SkillGapReport {
        user_id,
        target_role: target_role.map(str::to_string),
        current_skills,
        missing_skills,
        skill_gaps: gaps,
        estimated_time_to_fill_hours,
        recommendations,
        analysis_date: now,
    }
}

// ---------------------------------------------------------------------------
// Cohort aggregates
// ---------------------------------------------------------------------------

/// Number of users per proficiency level for one skill.
pub type LevelDistribution = BTreeMap<ProficiencyLevel, u64>;

/// Store-side aggregate of a cohort's skills.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortSnapshot {
    pub total_users: u64,
    /// Level histogram per skill name; users without the skill are absent.
    pub level_counts: HashMap<String, LevelDistribution>,
}

/// Population-level coverage of one target skill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGapMetrics {
    pub skill_name: String,
    pub required_level: ProficiencyLevel,
    pub users_with_skill: u64,
    pub users_without_skill: u64,
    /// `users_with_skill / total_users`, 0 for an empty cohort.
    pub skill_coverage: f64,
    pub level_distribution: LevelDistribution,
    /// Mean tier of holders on a 1 (beginner) to 4 (expert) scale.
    pub average_proficiency: Option<f64>,
    pub users_meeting_requirement: u64,
}

/// Role-level gap report over a cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortGapReport {
    pub target_role: String,
    pub user_count: u64,
    pub skills: Vec<SkillGapMetrics>,
}

/// Build the per-skill level histogram for an in-memory cohort.
pub fn tally_cohort<'a, I>(
    profiles: I,
    skill_names: &[String],
    policy: SkillMatchPolicy,
) -> CohortSnapshot
where
    I: IntoIterator<Item = &'a SkillProfile>,
{
    let wanted: HashMap<String, &String> = skill_names
        .iter()
        .map(|name| (policy.normalize(name), name))
        .collect();

    let mut snapshot = CohortSnapshot::default();
    for profile in profiles {
        snapshot.total_users += 1;
        for (name, &level) in profile {
            if let Some(&canonical) = wanted.get(&policy.normalize(name)) {
                *snapshot
                    .level_counts
                    .entry(canonical.clone())
                    .or_default()
                    .entry(level)
                    .or_insert(0) += 1;
            }
        }
    }
    snapshot
}

/// Turn a cohort histogram into per-skill coverage metrics.
///
/// Results are ordered by coverage ascending (worst-covered first), then
/// skill name.
pub fn cohort_gap_metrics(
    snapshot: &CohortSnapshot,
    targets: &[SkillRequirement],
    policy: SkillMatchPolicy,
) -> Vec<SkillGapMetrics> {
    let by_name: HashMap<String, &LevelDistribution> = snapshot
        .level_counts
        .iter()
        .map(|(name, dist)| (policy.normalize(name), dist))
        .collect();

    let mut metrics: Vec<SkillGapMetrics> = targets
        .iter()
        .map(|target| {
            let distribution = by_name
                .get(&policy.normalize(&target.skill.name))
                .map(|d| (*d).clone())
                .unwrap_or_default();

            let holders: u64 = distribution.values().sum();
            let users_with_skill = holders.min(snapshot.total_users);
            let weighted_tiers: u64 = distribution
                .iter()
                .map(|(level, count)| (level.ordinal() as u64 + 1) * count)
                .sum();
            let users_meeting_requirement = distribution
                .iter()
                .filter(|(level, _)| **level >= target.required_level)
                .map(|(_, count)| count)
                .sum();

            SkillGapMetrics {
                skill_name: target.skill.name.clone(),
                required_level: target.required_level,
                users_with_skill,
                users_without_skill: snapshot.total_users - users_with_skill,
                skill_coverage: if snapshot.total_users == 0 {
                    0.0
                } else {
                    round2(users_with_skill as f64 / snapshot.total_users as f64)
                },
                average_proficiency: (holders > 0)
                    .then(|| round2(weighted_tiers as f64 / holders as f64)),
                users_meeting_requirement,
                level_distribution: distribution,
            }
        })
        .collect();

    metrics.sort_by(|a, b| {
        a.skill_coverage
            .total_cmp(&b.skill_coverage)
            .then_with(|| a.skill_name.cmp(&b.skill_name))
    });
    metrics
}

// ---------------------------------------------------------------------------
// Difficulty and duration suggestions
// ---------------------------------------------------------------------------

/// Base weeks to learn one target skill at intermediate level.
pub const BASE_WEEKS_PER_SKILL: u32 = 4;

/// Lower bound for any duration estimate.
pub const MIN_DURATION_WEEKS: u32 = 2;

/// Path difficulty matching the user's average standing in the targets.
///
/// Levels count 1 (beginner or absent) to 4 (expert); the mean maps to
/// expert at 3.5, advanced at 2.5, intermediate at 1.5.
pub fn suggest_difficulty(
    user_skills: &SkillProfile,
    target_skills: &[String],
    policy: SkillMatchPolicy,
) -> DifficultyLevel {
    if target_skills.is_empty() {
        return ProficiencyLevel::Beginner;
    }
    let current = normalized_profile(user_skills, policy);
    let total: i32 = target_skills
        .iter()
        .map(|name| {
            current
                .get(&policy.normalize(name))
                .map_or(1, |level| level.ordinal() + 1)
        })
        .sum();
    let average = f64::from(total) / target_skills.len() as f64;

    if average >= 3.5 {
        ProficiencyLevel::Expert
    } else if average >= 2.5 {
        ProficiencyLevel::Advanced
    } else if average >= 1.5 {
        ProficiencyLevel::Intermediate
    } else {
        ProficiencyLevel::Beginner
    }
}

/// Weeks needed to work through the target skills from the user's levels.
///
/// Each skill costs [`BASE_WEEKS_PER_SKILL`], doubled for beginners and
/// newcomers, halved for advanced, quartered for experts. The sum is
/// floored at [`MIN_DURATION_WEEKS`].
pub fn estimate_duration_weeks(
    user_skills: &SkillProfile,
    target_skills: &[String],
    policy: SkillMatchPolicy,
) -> u32 {
    let current = normalized_profile(user_skills, policy);
    // Quarter-weeks keep the expert multiplier integral.
    let quarter_weeks: u32 = target_skills
        .iter()
        .map(|name| {
            let multiplier_quarters = match current.get(&policy.normalize(name)) {
                None | Some(ProficiencyLevel::Beginner) => 8,
                Some(ProficiencyLevel::Intermediate) => 4,
                Some(ProficiencyLevel::Advanced) => 2,
                Some(ProficiencyLevel::Expert) => 1,
            };
            BASE_WEEKS_PER_SKILL * multiplier_quarters
        })
        .fold(0u32, u32::saturating_add);
    (quarter_weeks / 4).max(MIN_DURATION_WEEKS)
}

fn normalized_profile(
    user_skills: &SkillProfile,
    policy: SkillMatchPolicy,
) -> HashMap<String, ProficiencyLevel> {
    user_skills
        .iter()
        .map(|(name, &level)| (policy.normalize(name), level))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
