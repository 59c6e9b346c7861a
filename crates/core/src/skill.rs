//! Skill catalog records and skill-name matching policy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::proficiency::ProficiencyLevel;
use crate::threshold_validation::validate_unit_range;

/// Maximum length of a skill name.
pub const MAX_SKILL_NAME_LENGTH: usize = 100;

/// Market demand assumed for skills missing from the catalog snapshot.
pub const DEFAULT_MARKET_DEMAND: f64 = 0.0;

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// A catalog skill. `name` is unique; `market_demand` is refreshed by an
/// external scheduled job and lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub market_demand: f64,
}

impl Skill {
    /// Catalog stand-in for a skill name the catalog does not know.
    pub fn uncatalogued(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: "uncategorized".to_string(),
            subcategory: None,
            market_demand: DEFAULT_MARKET_DEMAND,
        }
    }

    /// Validate name and demand range.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_skill_name(&self.name)?;
        validate_unit_range(self.market_demand, "market_demand")
    }
}

/// A target-role requirement: a catalog skill and the level the role needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: Skill,
    pub required_level: ProficiencyLevel,
}

/// Validate a skill name: non-empty after trimming and within
/// [`MAX_SKILL_NAME_LENGTH`].
pub fn validate_skill_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Skill name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_SKILL_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Skill name must not exceed {MAX_SKILL_NAME_LENGTH} characters, got {}",
            name.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Matching policy
// ---------------------------------------------------------------------------

pub const POLICY_EXACT: &str = "exact";
pub const POLICY_CASE_INSENSITIVE: &str = "case_insensitive";

/// How skill and industry names from different vocabularies are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillMatchPolicy {
    /// Byte-for-byte comparison.
    Exact,
    /// Trimmed, lowercase comparison.
    #[default]
    CaseInsensitive,
}

impl SkillMatchPolicy {
    /// Canonical form of `name` under this policy.
    pub fn normalize(self, name: &str) -> String {
        match self {
            Self::Exact => name.to_string(),
            Self::CaseInsensitive => name.trim().to_lowercase(),
        }
    }

    /// Whether two names are equal under this policy.
    pub fn matches(self, a: &str, b: &str) -> bool {
        self.normalize(a) == self.normalize(b)
    }

    /// Normalized set of names.
    pub fn normalize_set<'a, I>(self, names: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names.into_iter().map(|n| self.normalize(n)).collect()
    }

    /// Convert from a configuration string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            POLICY_EXACT => Ok(Self::Exact),
            POLICY_CASE_INSENSITIVE => Ok(Self::CaseInsensitive),
            _ => Err(format!(
                "Invalid skill match policy '{s}'. Must be one of: \
                 {POLICY_EXACT}, {POLICY_CASE_INSENSITIVE}"
            )),
        }
    }
}
