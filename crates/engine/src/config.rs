use std::path::PathBuf;
use std::time::Duration;

use careeros_core::mentorship::{DEFAULT_MAX_RESULTS, DEFAULT_MIN_COMPATIBILITY};
use careeros_core::recommendation::{
    DEFAULT_GAP_TOP_N, DEFAULT_RECOMMENDATION_LIMIT, MAX_RECOMMENDATION_LIMIT,
};
use careeros_core::scoring::ScoringConfig;
use careeros_core::skill::SkillMatchPolicy;

/// A configuration value that could not be parsed or validated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to read scoring config {path}: {source}")]
    ScoringFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scoring config {path}: {reason}")]
    ScoringInvalid { path: PathBuf, reason: String },
}

/// Engine configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-operation timeout in seconds (default: `10`).
    pub request_timeout_secs: u64,
    /// Threshold applied when a match request omits one (default: `0.6`).
    pub min_compatibility_score: f64,
    /// Result cap applied when a match request omits one (default: `10`).
    pub max_match_results: usize,
    /// Top gaps considered by path recommendation (default: `5`).
    pub gap_top_n: usize,
    /// Recommendations returned when a request omits a limit (default: `10`).
    pub recommendation_limit: i64,
    pub skill_match_policy: SkillMatchPolicy,
    pub scoring: ScoringConfig,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            min_compatibility_score: DEFAULT_MIN_COMPATIBILITY,
            max_match_results: DEFAULT_MAX_RESULTS,
            gap_top_n: DEFAULT_GAP_TOP_N,
            recommendation_limit: DEFAULT_RECOMMENDATION_LIMIT,
            skill_match_policy: SkillMatchPolicy::default(),
            scoring: ScoringConfig::default(),
            log_json: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default            |
    /// |---------------------------|--------------------|
    /// | `REQUEST_TIMEOUT_SECS`    | `10`               |
    /// | `MIN_COMPATIBILITY_SCORE` | `0.6`              |
    /// | `MAX_MATCH_RESULTS`       | `10`               |
    /// | `GAP_TOP_N`               | `5`                |
    /// | `RECOMMENDATION_LIMIT`    | `10` (max `50`)    |
    /// | `SKILL_MATCH_POLICY`      | `case_insensitive` |
    /// | `SCORING_CONFIG_PATH`     | unset              |
    /// | `LOG_FORMAT`              | `text` (or `json`) |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load `.env` (if present) and then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Build from an arbitrary key lookup. Used by [`Self::from_env`] and
    /// by tests that must not touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let request_timeout_secs: u64 =
            parse_var(&lookup, "REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?;
        if request_timeout_secs == 0 {
            return Err(invalid("REQUEST_TIMEOUT_SECS", "0", "must be at least 1"));
        }

        let min_compatibility_score: f64 = parse_var(
            &lookup,
            "MIN_COMPATIBILITY_SCORE",
            defaults.min_compatibility_score,
        )?;
        if !(0.0..=1.0).contains(&min_compatibility_score) {
            return Err(invalid(
                "MIN_COMPATIBILITY_SCORE",
                &min_compatibility_score.to_string(),
                "must be between 0.0 and 1.0",
            ));
        }

        let max_match_results =
            parse_var(&lookup, "MAX_MATCH_RESULTS", defaults.max_match_results)?;
        let gap_top_n: usize = parse_var(&lookup, "GAP_TOP_N", defaults.gap_top_n)?;
        if gap_top_n == 0 {
            return Err(invalid("GAP_TOP_N", "0", "must be at least 1"));
        }

        let recommendation_limit: i64 =
            parse_var(&lookup, "RECOMMENDATION_LIMIT", defaults.recommendation_limit)?;
        if !(1..=MAX_RECOMMENDATION_LIMIT).contains(&recommendation_limit) {
            return Err(invalid(
                "RECOMMENDATION_LIMIT",
                &recommendation_limit.to_string(),
                &format!("must be between 1 and {MAX_RECOMMENDATION_LIMIT}"),
            ));
        }

        let skill_match_policy = match lookup("SKILL_MATCH_POLICY") {
            Some(raw) => SkillMatchPolicy::from_str_value(raw.trim())
                .map_err(|reason| invalid("SKILL_MATCH_POLICY", &raw, &reason))?,
            None => defaults.skill_match_policy,
        };

        let scoring = match lookup("SCORING_CONFIG_PATH").filter(|p| !p.trim().is_empty()) {
            Some(path) => load_scoring(PathBuf::from(path))?,
            None => defaults.scoring,
        };

        let log_json = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => false,
            Some("json") => true,
            Some(other) => return Err(invalid("LOG_FORMAT", other, "must be text or json")),
        };

        Ok(Self {
            request_timeout_secs,
            min_compatibility_score,
            max_match_results,
            gap_top_n,
            recommendation_limit,
            skill_match_policy,
            scoring,
            log_json,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(var, &raw, &e.to_string())),
        None => Ok(default),
    }
}

fn load_scoring(path: PathBuf) -> Result<ScoringConfig, ConfigError> {
    let json = std::fs::read_to_string(&path).map_err(|source| ConfigError::ScoringFile {
        path: path.clone(),
        source,
    })?;
    ScoringConfig::from_json(&json).map_err(|e| ConfigError::ScoringInvalid {
        path,
        reason: e.to_string(),
    })
}
