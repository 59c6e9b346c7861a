//! Per-enrollment learning analytics.
//!
//! Aggregates a learner's step progress into time, velocity, and
//! completion-forecast metrics. Pure; `now` is passed in by the caller.

use chrono::Duration;
use serde::Serialize;

use crate::path_graph::{resolve, PathGraph, StepProgressMap};
use crate::threshold_validation::round2;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// A step retried more often than this is flagged as a struggle.
pub const STRUGGLING_ATTEMPTS: u32 = 3;
/// A step that consumed more than this many minutes is flagged as a struggle.
pub const STRUGGLING_MINUTES: u32 = 480;
/// A step completed in under this many minutes is flagged as a strength.
pub const STRONG_MINUTES: u32 = 120;

const MINUTES_PER_HOUR: f64 = 60.0;
const DAYS_PER_WEEK: i64 = 7;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A step referenced by an analytics flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRef {
    pub step_id: DbId,
    pub title: String,
}

/// Learning analytics for one enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathAnalytics {
    pub path_id: DbId,
    pub percent_complete: f64,
    pub completed_steps: u32,
    pub total_steps: u32,
    pub time_spent_hours: f64,
    /// Mean minutes spent on completed steps, 0 when none are completed.
    pub average_step_minutes: f64,
    pub struggling_steps: Vec<StepRef>,
    pub strong_steps: Vec<StepRef>,
    /// Completed steps per elapsed week since the earliest start.
    pub learning_velocity: f64,
    pub estimated_completion: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute analytics for a learner on a validated path graph.
///
/// Progress rows for steps outside the graph are ignored.
pub fn compute_path_analytics(
    graph: &PathGraph,
    progress: &StepProgressMap,
    now: Timestamp,
) -> PathAnalytics {
    let view = resolve(graph, progress);

    let mut completed_steps = 0u32;
    let mut total_minutes = 0u64;
    let mut completed_minutes = 0u64;
    let mut earliest_start: Option<Timestamp> = None;
    let mut struggling_steps = Vec::new();
    let mut strong_steps = Vec::new();

    for step in graph.steps() {
        let Some(p) = progress.get(&step.id) else {
            continue;
        };
        total_minutes += u64::from(p.time_spent_minutes);
        if let Some(started) = p.started_at {
            earliest_start = Some(earliest_start.map_or(started, |e| e.min(started)));
        }
        if p.completed {
            completed_steps += 1;
            completed_minutes += u64::from(p.time_spent_minutes);
        }

        let step_ref = || StepRef {
            step_id: step.id,
            title: step.title.clone(),
        };
        if p.attempts > STRUGGLING_ATTEMPTS || p.time_spent_minutes > STRUGGLING_MINUTES {
            struggling_steps.push(step_ref());
        } else if p.completed && p.time_spent_minutes < STRONG_MINUTES {
            strong_steps.push(step_ref());
        }
    }

    let average_step_minutes = if completed_steps == 0 {
        0.0
    } else {
        round2(completed_minutes as f64 / f64::from(completed_steps))
    };

    let learning_velocity = learning_velocity(completed_steps, earliest_start, now);
    let remaining_required = view
        .total_required_count
        .saturating_sub(view.completed_required_count);
    let estimated_completion = if view.is_complete {
        None
    } else {
        estimate_completion(remaining_required, learning_velocity, now)
    };

    PathAnalytics {
        path_id: graph.path_id(),
        percent_complete: view.percent_complete,
        completed_steps,
        total_steps: graph.len() as u32,
        time_spent_hours: round2(total_minutes as f64 / MINUTES_PER_HOUR),
        average_step_minutes,
        struggling_steps,
        strong_steps,
        learning_velocity,
        estimated_completion,
    }
}

/// Completed steps per elapsed whole week.
///
/// When less than a week has elapsed the completed count itself is the
/// velocity. Zero when nothing is completed or no start time is known.
pub fn learning_velocity(
    completed_steps: u32,
    earliest_start: Option<Timestamp>,
    now: Timestamp,
) -> f64 {
    if completed_steps == 0 {
        return 0.0;
    }
    let Some(start) = earliest_start else {
        return 0.0;
    };
    let weeks = (now - start).num_days() / DAYS_PER_WEEK;
    if weeks > 0 {
        round2(f64::from(completed_steps) / weeks as f64)
    } else {
        f64::from(completed_steps)
    }
}

/// Project a completion date from remaining required steps and velocity.
///
/// `None` when velocity is not positive.
pub fn estimate_completion(
    remaining_steps: u32,
    velocity: f64,
    now: Timestamp,
) -> Option<Timestamp> {
    if velocity <= 0.0 || !velocity.is_finite() {
        return None;
    }
    let weeks = (f64::from(remaining_steps) / velocity).floor() as i64;
    Some(now + Duration::weeks(weeks))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
