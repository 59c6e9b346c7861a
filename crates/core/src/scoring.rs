//! Weight tables for the multi-factor scoring functions.
//!
//! Every scorer takes its weights as a plain struct so the tables can be
//! swapped (e.g. loaded from JSON) and tested independently of the
//! traversal and ranking logic. All structs deserialize with per-field
//! defaults, so a partial JSON document overrides only what it names.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::threshold_validation::validate_weight;

// ---------------------------------------------------------------------------
// Mentorship matching
// ---------------------------------------------------------------------------

/// Weights of the five mentor-mentee compatibility factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchWeights {
    pub skill_overlap: f64,
    pub experience_fit: f64,
    pub style: f64,
    pub quality: f64,
    pub schedule: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            skill_overlap: 0.4,
            experience_fit: 0.2,
            style: 0.15,
            quality: 0.15,
            schedule: 0.1,
        }
    }
}

impl MatchWeights {
    pub fn total(&self) -> f64 {
        self.skill_overlap + self.experience_fit + self.style + self.quality + self.schedule
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_weight(self.skill_overlap, "matching.skill_overlap")?;
        validate_weight(self.experience_fit, "matching.experience_fit")?;
        validate_weight(self.style, "matching.style")?;
        validate_weight(self.quality, "matching.quality")?;
        validate_weight(self.schedule, "matching.schedule")?;
        validate_positive_total(self.total(), "matching")
    }
}

// ---------------------------------------------------------------------------
// Skill gaps
// ---------------------------------------------------------------------------

/// Weights for the gap priority score and the learning-time estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapWeights {
    /// Relative weight of gap size in `priority_score`. Must be positive.
    pub gap_size: f64,
    /// Relative weight of market demand. Its share of the total scales the
    /// demand term, which stays below one gap tier.
    pub market_demand: f64,
    /// Estimated hours to climb a single proficiency tier.
    pub hours_per_level: u32,
    /// Extra hours added per tier beyond the first (larger jumps cost more).
    pub escalation_hours: u32,
}

impl Default for GapWeights {
    fn default() -> Self {
        Self {
            gap_size: 0.7,
            market_demand: 0.3,
            hours_per_level: 40,
            escalation_hours: 10,
        }
    }
}

impl GapWeights {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_weight(self.gap_size, "gaps.gap_size")?;
        validate_weight(self.market_demand, "gaps.market_demand")?;
        if self.gap_size <= 0.0 {
            return Err(CoreError::Validation(
                "gaps.gap_size must be positive so gap size stays the primary key".to_string(),
            ));
        }
        Ok(())
    }

    /// Share of the demand term, strictly below 1.
    pub fn demand_share(&self) -> f64 {
        self.market_demand / (self.gap_size + self.market_demand)
    }
}

// ---------------------------------------------------------------------------
// Path recommendation
// ---------------------------------------------------------------------------

/// Weights combining gap coverage with existing enrollment progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationWeights {
    pub gap_coverage: f64,
    pub progress: f64,
}

impl Default for RecommendationWeights {
    fn default() -> Self {
        Self {
            gap_coverage: 0.7,
            progress: 0.3,
        }
    }
}

impl RecommendationWeights {
    pub fn total(&self) -> f64 {
        self.gap_coverage + self.progress
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_weight(self.gap_coverage, "recommendation.gap_coverage")?;
        validate_weight(self.progress, "recommendation.progress")?;
        validate_positive_total(self.total(), "recommendation")
    }
}

// ---------------------------------------------------------------------------
// Enrollment progress aggregation
// ---------------------------------------------------------------------------

/// Per-step weights for the derived enrollment progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressWeights {
    pub required: f64,
    pub optional: f64,
}

impl Default for ProgressWeights {
    fn default() -> Self {
        Self {
            required: 1.0,
            optional: 0.25,
        }
    }
}

impl ProgressWeights {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_weight(self.required, "progress.required")?;
        validate_weight(self.optional, "progress.optional")
    }
}

// ---------------------------------------------------------------------------
// ScoringConfig
// ---------------------------------------------------------------------------

/// All scoring weight tables in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub matching: MatchWeights,
    pub gaps: GapWeights,
    pub recommendation: RecommendationWeights,
    pub progress: ProgressWeights,
}

impl ScoringConfig {
    /// Parse a JSON document; omitted fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid scoring config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.matching.validate()?;
        self.gaps.validate()?;
        self.recommendation.validate()?;
        self.progress.validate()
    }
}

fn validate_positive_total(total: f64, table: &str) -> Result<(), CoreError> {
    if total <= 0.0 {
        return Err(CoreError::Validation(format!(
            "{table} weights must not all be zero"
        )));
    }
    Ok(())
}
