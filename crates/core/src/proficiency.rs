//! Proficiency tiers shared by skill profiles, mentor preferences, and
//! learning-path difficulty.
//!
//! Levels are totally ordered: `beginner < intermediate < advanced < expert`.
//! An absent skill ranks one below `beginner` (see [`rank_of`]).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const LEVEL_BEGINNER: &str = "beginner";
pub const LEVEL_INTERMEDIATE: &str = "intermediate";
pub const LEVEL_ADVANCED: &str = "advanced";
pub const LEVEL_EXPERT: &str = "expert";
pub const LEVEL_ALL: &str = "all_levels";

/// All valid proficiency level strings, in ascending order.
pub const VALID_LEVELS: &[&str] = &[
    LEVEL_BEGINNER,
    LEVEL_INTERMEDIATE,
    LEVEL_ADVANCED,
    LEVEL_EXPERT,
];

/// Rank assigned to a skill the user does not hold at all.
pub const ABSENT_RANK: i32 = -1;

// ---------------------------------------------------------------------------
// ProficiencyLevel
// ---------------------------------------------------------------------------

/// Ordinal mastery tier of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// Learning paths are graded on the same four-tier scale.
pub type DifficultyLevel = ProficiencyLevel;

impl ProficiencyLevel {
    /// All levels in ascending order.
    pub const ALL: [ProficiencyLevel; 4] = [
        Self::Beginner,
        Self::Intermediate,
        Self::Advanced,
        Self::Expert,
    ];

    /// Zero-based ordinal (`beginner` = 0, `expert` = 3).
    pub fn ordinal(self) -> i32 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
            Self::Expert => 3,
        }
    }

    /// Inverse of [`ordinal`](Self::ordinal), clamping out-of-range input.
    pub fn from_ordinal(ordinal: i32) -> Self {
        match ordinal {
            i32::MIN..=0 => Self::Beginner,
            1 => Self::Intermediate,
            2 => Self::Advanced,
            _ => Self::Expert,
        }
    }

    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            LEVEL_BEGINNER => Ok(Self::Beginner),
            LEVEL_INTERMEDIATE => Ok(Self::Intermediate),
            LEVEL_ADVANCED => Ok(Self::Advanced),
            LEVEL_EXPERT => Ok(Self::Expert),
            _ => Err(format!(
                "Invalid proficiency level '{s}'. Must be one of: {}",
                VALID_LEVELS.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => LEVEL_BEGINNER,
            Self::Intermediate => LEVEL_INTERMEDIATE,
            Self::Advanced => LEVEL_ADVANCED,
            Self::Expert => LEVEL_EXPERT,
        }
    }
}

/// Rank of an optional level; `None` (skill absent) ranks at [`ABSENT_RANK`].
pub fn rank_of(level: Option<ProficiencyLevel>) -> i32 {
    level.map_or(ABSENT_RANK, ProficiencyLevel::ordinal)
}

// ---------------------------------------------------------------------------
// MenteeLevelPreference
// ---------------------------------------------------------------------------

/// The mentee experience tier a mentor prefers to work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenteeLevelPreference {
    Beginner,
    Intermediate,
    Advanced,
    AllLevels,
}

impl MenteeLevelPreference {
    /// The proficiency tier this preference targets, `None` for `all_levels`.
    pub fn target_level(self) -> Option<ProficiencyLevel> {
        match self {
            Self::Beginner => Some(ProficiencyLevel::Beginner),
            Self::Intermediate => Some(ProficiencyLevel::Intermediate),
            Self::Advanced => Some(ProficiencyLevel::Advanced),
            Self::AllLevels => None,
        }
    }

    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            LEVEL_BEGINNER => Ok(Self::Beginner),
            LEVEL_INTERMEDIATE => Ok(Self::Intermediate),
            LEVEL_ADVANCED => Ok(Self::Advanced),
            LEVEL_ALL => Ok(Self::AllLevels),
            _ => Err(format!(
                "Invalid mentee level preference '{s}'. Must be one of: \
                 {LEVEL_BEGINNER}, {LEVEL_INTERMEDIATE}, {LEVEL_ADVANCED}, {LEVEL_ALL}"
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => LEVEL_BEGINNER,
            Self::Intermediate => LEVEL_INTERMEDIATE,
            Self::Advanced => LEVEL_ADVANCED,
            Self::AllLevels => LEVEL_ALL,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
