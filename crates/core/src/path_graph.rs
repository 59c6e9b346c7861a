//! Learning-path prerequisite graph resolution.
//!
//! A learning path is an acyclic graph of steps. Each step lists the steps
//! that must be completed before it unlocks, and every prerequisite must
//! carry a strictly smaller `order` than the step it gates. [`PathGraph::build`]
//! loads a path snapshot into an id-indexed arena and rejects cyclic or
//! order-inconsistent data up front, so resolution never has to cope with a
//! malformed graph.
//!
//! Resolution, step progress updates, and enrollment transitions are pure
//! functions over pre-loaded snapshots; the caller fetches the data.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::scoring::ProgressWeights;
use crate::threshold_validation::{round2, validate_percentage};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Progress percentage at which a step counts as completed.
pub const STEP_COMPLETE_PCT: f64 = 100.0;

/// Maximum number of steps a single learning path may declare.
pub const MAX_STEPS_PER_PATH: usize = 1_000;

pub const STATUS_NOT_STARTED: &str = "not_started";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_ABANDONED: &str = "abandoned";

/// All valid enrollment status strings.
pub const VALID_ENROLLMENT_STATUSES: &[&str] = &[
    STATUS_NOT_STARTED,
    STATUS_IN_PROGRESS,
    STATUS_COMPLETED,
    STATUS_ABANDONED,
];

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// A single node of a learning path as delivered by the catalog store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub id: DbId,
    pub order: i32,
    pub title: String,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
    #[serde(default)]
    pub prerequisite_step_ids: BTreeSet<DbId>,
    #[serde(default)]
    pub estimated_duration_hours: Option<u32>,
}

/// All steps of one learning path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPathSnapshot {
    pub id: DbId,
    pub steps: Vec<PathStep>,
}

/// A user's progress on one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    pub completed: bool,
    pub progress_percentage: f64,
    #[serde(default)]
    pub time_spent_minutes: u32,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    #[serde(default)]
    pub last_accessed_at: Option<Timestamp>,
}

/// A user's step progress keyed by step id.
pub type StepProgressMap = HashMap<DbId, StepProgress>;

/// Lifecycle of a single step for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl StepProgress {
    pub fn status(&self) -> StepStatus {
        if self.completed {
            StepStatus::Completed
        } else if self.progress_percentage > 0.0 || self.time_spent_minutes > 0 {
            StepStatus::InProgress
        } else {
            StepStatus::NotStarted
        }
    }
}

/// Whether any step shows learning activity.
pub fn has_activity(progress: &StepProgressMap) -> bool {
    progress
        .values()
        .any(|p| p.status() != StepStatus::NotStarted)
}

// ---------------------------------------------------------------------------
// Step progress updates
// ---------------------------------------------------------------------------

/// A learning event reported against one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgressUpdate {
    pub progress_percentage: f64,
    #[serde(default)]
    pub time_spent_minutes: u32,
}

/// Fold a learning event into a step's progress record.
///
/// Time accumulates, attempts increment, and the first event stamps
/// `started_at`. Reaching [`STEP_COMPLETE_PCT`] marks the step completed;
/// a completed step never regresses.
pub fn apply_step_update(
    existing: Option<&StepProgress>,
    update: &StepProgressUpdate,
    now: Timestamp,
) -> Result<StepProgress, CoreError> {
    validate_percentage(update.progress_percentage, "progress_percentage")?;

    let mut next = existing.cloned().unwrap_or_default();
    next.started_at.get_or_insert(now);
    next.attempts = next.attempts.saturating_add(1);
    next.time_spent_minutes = next
        .time_spent_minutes
        .saturating_add(update.time_spent_minutes);
    next.last_accessed_at = Some(now);

    if next.completed {
        next.progress_percentage = STEP_COMPLETE_PCT;
    } else {
        next.progress_percentage = update.progress_percentage;
        if update.progress_percentage >= STEP_COMPLETE_PCT {
            next.completed = true;
            next.completed_at = Some(now);
        }
    }
    Ok(next)
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

/// Status of a user's enrollment in a learning path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    NotStarted,
    InProgress,
    Completed,
    Abandoned,
}

impl EnrollmentStatus {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATUS_NOT_STARTED => Ok(Self::NotStarted),
            STATUS_IN_PROGRESS => Ok(Self::InProgress),
            STATUS_COMPLETED => Ok(Self::Completed),
            STATUS_ABANDONED => Ok(Self::Abandoned),
            _ => Err(format!(
                "Invalid enrollment status '{s}'. Must be one of: {}",
                VALID_ENROLLMENT_STATUSES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => STATUS_NOT_STARTED,
            Self::InProgress => STATUS_IN_PROGRESS,
            Self::Completed => STATUS_COMPLETED,
            Self::Abandoned => STATUS_ABANDONED,
        }
    }
}

/// One enrollment per (user, path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub user_id: DbId,
    pub path_id: DbId,
    pub status: EnrollmentStatus,
    pub progress_percentage: f64,
    pub time_spent_hours: f64,
    pub enrolled_at: Timestamp,
    pub last_accessed_at: Option<Timestamp>,
}

/// Status an enrollment should hold after the given resolution.
///
/// `completed` holds exactly when every required step is done and at least
/// one required step exists. An abandoned enrollment stays abandoned until
/// it completes; otherwise any activity means `in_progress`.
pub fn next_enrollment_status(
    current: EnrollmentStatus,
    view: &PathProgressView,
    any_activity: bool,
) -> EnrollmentStatus {
    if view.is_complete {
        return EnrollmentStatus::Completed;
    }
    match current {
        EnrollmentStatus::Abandoned => EnrollmentStatus::Abandoned,
        EnrollmentStatus::NotStarted if !any_activity => EnrollmentStatus::NotStarted,
        _ => EnrollmentStatus::InProgress,
    }
}

// ---------------------------------------------------------------------------
// PathGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StepNode {
    step: PathStep,
    /// Arena indices of this step's prerequisites.
    prerequisites: Vec<usize>,
}

/// Validated prerequisite graph of one learning path.
///
/// Steps live in an arena sorted by `(order, id)`. Because every
/// prerequisite has a strictly smaller order, arena order is also a
/// topological order.
#[derive(Debug, Clone)]
pub struct PathGraph {
    path_id: DbId,
    nodes: Vec<StepNode>,
    index: HashMap<DbId, usize>,
}

impl PathGraph {
    /// Load and validate a path snapshot.
    ///
    /// Fails with [`CoreError::GraphIntegrity`] on duplicate step ids,
    /// dangling prerequisite references, prerequisite cycles (self-loops
    /// included), or a prerequisite whose order is not strictly smaller
    /// than its dependent's.
    pub fn build(snapshot: LearningPathSnapshot) -> Result<Self, CoreError> {
        let path_id = snapshot.id;
        if snapshot.steps.len() > MAX_STEPS_PER_PATH {
            return Err(CoreError::graph_integrity(
                path_id,
                format!(
                    "path declares {} steps, exceeding the maximum of {MAX_STEPS_PER_PATH}",
                    snapshot.steps.len()
                ),
            ));
        }

        let mut steps = snapshot.steps;
        steps.sort_by_key(|s| (s.order, s.id));

        let mut index = HashMap::with_capacity(steps.len());
        for (i, step) in steps.iter().enumerate() {
            if index.insert(step.id, i).is_some() {
                return Err(CoreError::graph_integrity(
                    path_id,
                    format!("duplicate step id {}", step.id),
                ));
            }
        }

        let mut nodes = Vec::with_capacity(steps.len());
        for step in steps {
            let mut prerequisites = Vec::with_capacity(step.prerequisite_step_ids.len());
            for prereq_id in &step.prerequisite_step_ids {
                let &prereq_idx = index.get(prereq_id).ok_or_else(|| {
                    CoreError::graph_integrity(
                        path_id,
                        format!(
                            "step {} requires unknown step {prereq_id}",
                            step.id
                        ),
                    )
                })?;
                prerequisites.push(prereq_idx);
            }
            nodes.push(StepNode {
                step,
                prerequisites,
            });
        }

        let graph = Self {
            path_id,
            nodes,
            index,
        };
        graph.check_acyclic()?;
        graph.check_order_consistency()?;
        Ok(graph)
    }

    /// Topological check over the prerequisite edges.
    fn check_acyclic(&self) -> Result<(), CoreError> {
        let mut dag: DiGraph<DbId, ()> = DiGraph::with_capacity(self.nodes.len(), 0);
        let node_ids: Vec<NodeIndex> = self
            .nodes
            .iter()
            .map(|n| dag.add_node(n.step.id))
            .collect();
        for (i, node) in self.nodes.iter().enumerate() {
            for &prereq in &node.prerequisites {
                dag.add_edge(node_ids[prereq], node_ids[i], ());
            }
        }

        toposort(&dag, None).map(|_| ()).map_err(|cycle| {
            let start = cycle.node_id();
            let mut members: Vec<DbId> = tarjan_scc(&dag)
                .into_iter()
                .find(|scc| scc.contains(&start))
                .unwrap_or_else(|| vec![start])
                .into_iter()
                .map(|idx| dag[idx])
                .collect();
            members.sort_unstable();
            CoreError::graph_integrity(
                self.path_id,
                format!("prerequisite cycle among steps {members:?}"),
            )
        })
    }

    fn check_order_consistency(&self) -> Result<(), CoreError> {
        for node in &self.nodes {
            for &prereq in &node.prerequisites {
                let prereq_step = &self.nodes[prereq].step;
                if prereq_step.order >= node.step.order {
                    return Err(CoreError::graph_integrity(
                        self.path_id,
                        format!(
                            "step {} (order {}) requires step {} with order {}; \
                             prerequisites must have a strictly smaller order",
                            node.step.id, node.step.order, prereq_step.id, prereq_step.order
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn path_id(&self) -> DbId {
        self.path_id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a step by id.
    pub fn step(&self, id: DbId) -> Option<&PathStep> {
        self.index.get(&id).map(|&i| &self.nodes[i].step)
    }

    /// Steps in ascending `(order, id)`.
    pub fn steps(&self) -> impl Iterator<Item = &PathStep> {
        self.nodes.iter().map(|n| &n.step)
    }

    /// A prerequisite-respecting ordering of all steps.
    pub fn topological_order(&self) -> Vec<&PathStep> {
        self.steps().collect()
    }

    /// Direct prerequisites of a step (empty for unknown ids).
    pub fn prerequisites_of(&self, id: DbId) -> Vec<&PathStep> {
        self.index
            .get(&id)
            .map(|&i| {
                self.nodes[i]
                    .prerequisites
                    .iter()
                    .map(|&p| &self.nodes[p].step)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of required steps.
    pub fn required_count(&self) -> usize {
        self.steps().filter(|s| s.is_required).count()
    }

    /// Ids of steps in this graph that `progress` marks completed.
    /// Progress rows for steps outside the graph are ignored.
    pub fn completed_ids(&self, progress: &StepProgressMap) -> HashSet<DbId> {
        progress
            .iter()
            .filter(|(id, p)| p.completed && self.index.contains_key(id))
            .map(|(&id, _)| id)
            .collect()
    }

    /// A step is unlocked iff all of its prerequisites are completed.
    /// Steps without prerequisites are starting points.
    pub fn is_unlocked(&self, id: DbId, completed: &HashSet<DbId>) -> bool {
        match self.index.get(&id) {
            Some(&i) => self.nodes[i]
                .prerequisites
                .iter()
                .all(|&p| completed.contains(&self.nodes[p].step.id)),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// The step a learner should tackle next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStep {
    pub step_id: DbId,
    pub order: i32,
    pub title: String,
    pub is_required: bool,
}

impl From<&PathStep> for NextStep {
    fn from(step: &PathStep) -> Self {
        Self {
            step_id: step.id,
            order: step.order,
            title: step.title.clone(),
            is_required: step.is_required,
        }
    }
}

/// A learner's position in a learning path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathProgressView {
    pub path_id: DbId,
    /// Completed required steps over total required steps, in `[0, 100]`,
    /// rounded to two decimals. Zero when the path has no required steps.
    pub percent_complete: f64,
    pub next_step: Option<NextStep>,
    pub completed_required_count: u32,
    pub total_required_count: u32,
    pub completed_optional_count: u32,
    pub total_optional_count: u32,
    pub is_complete: bool,
}

/// Percentage of required steps completed, clamped to `[0, 100]`.
///
/// Returns 0 if `total_required` is 0.
pub fn percent_complete(completed_required: u32, total_required: u32) -> f64 {
    if total_required == 0 {
        return 0.0;
    }
    let pct = completed_required as f64 / total_required as f64 * 100.0;
    round2(pct.clamp(0.0, 100.0))
}

/// Resolve a learner's progress view for a validated path graph.
///
/// `next_step` is the lowest-order unlocked, incomplete required step;
/// if none exists, the lowest-order unlocked, incomplete optional step.
pub fn resolve(graph: &PathGraph, progress: &StepProgressMap) -> PathProgressView {
    let completed = graph.completed_ids(progress);

    let mut completed_required = 0u32;
    let mut total_required = 0u32;
    let mut completed_optional = 0u32;
    let mut total_optional = 0u32;
    let mut next_required: Option<&PathStep> = None;
    let mut next_optional: Option<&PathStep> = None;

    for step in graph.steps() {
        let done = completed.contains(&step.id);
        if step.is_required {
            total_required += 1;
            completed_required += u32::from(done);
        } else {
            total_optional += 1;
            completed_optional += u32::from(done);
        }

        if done || !graph.is_unlocked(step.id, &completed) {
            continue;
        }
        let slot = if step.is_required {
            &mut next_required
        } else {
            &mut next_optional
        };
        if slot.is_none() {
            *slot = Some(step);
        }
    }

    PathProgressView {
        path_id: graph.path_id(),
        percent_complete: percent_complete(completed_required, total_required),
        next_step: next_required.or(next_optional).map(NextStep::from),
        completed_required_count: completed_required,
        total_required_count: total_required,
        completed_optional_count: completed_optional,
        total_optional_count: total_optional,
        is_complete: total_required > 0 && completed_required == total_required,
    }
}

/// Weighted mean of per-step progress, in `[0, 100]`.
///
/// Required and optional steps are weighted by [`ProgressWeights`];
/// a completed step counts as 100 regardless of its recorded percentage.
pub fn weighted_progress(
    graph: &PathGraph,
    progress: &StepProgressMap,
    weights: &ProgressWeights,
) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for step in graph.steps() {
        let weight = if step.is_required {
            weights.required
        } else {
            weights.optional
        };
        let pct = match progress.get(&step.id) {
            Some(p) if p.completed => STEP_COMPLETE_PCT,
            Some(p) if p.progress_percentage.is_finite() => {
                p.progress_percentage.clamp(0.0, STEP_COMPLETE_PCT)
            }
            _ => 0.0,
        };
        weighted_sum += weight * pct;
        weight_total += weight;
    }

    if weight_total <= 0.0 {
        return 0.0;
    }
    round2(weighted_sum / weight_total)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
