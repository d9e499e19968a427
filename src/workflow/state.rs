//! Workflow Session State
//!
//! Tracks the loaded workflow, the cursor, the variables reported so far and
//! the outcome recorded for each step. One instance lives for the whole
//! session and is owned by the [`Engine`](crate::execution::Engine).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{AssertionResult, Step, StepOutcome, StepStatus, Variables};

/// Coarse progress of a loaded workflow.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// No outcome recorded yet
    NotStarted,
    /// Some steps reported, none failed
    InProgress,
    /// Every step has an outcome and none failed
    Complete,
    /// At least one step failed
    Failed,
}

/// Mutable state of the current workflow session.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    /// Path of the loaded workflow document
    pub file_path: String,

    /// Parsed steps, fixed after load
    pub steps: Vec<Step>,

    /// Index of the step awaiting execution/report
    pub current_step: usize,

    /// Variables merged from passed outcomes
    pub variables: Variables,

    /// Outcome per step number
    pub step_outcomes: BTreeMap<usize, StepOutcome>,

    /// When the workflow was loaded
    pub loaded_at: Option<DateTime<Utc>>,
}

impl WorkflowState {
    /// Creates an empty, unloaded state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the loaded workflow and clears all progress.
    pub fn load(&mut self, file_path: impl Into<String>, steps: Vec<Step>) {
        self.file_path = file_path.into();
        self.steps = steps;
        self.loaded_at = Some(Utc::now());
        self.reset();
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn is_loaded(&self) -> bool {
        !self.file_path.is_empty() && !self.steps.is_empty()
    }

    /// True once every step has a recorded outcome.
    pub fn is_complete(&self) -> bool {
        self.step_outcomes.len() >= self.total_steps()
    }

    /// True if any recorded outcome failed.
    pub fn is_failed(&self) -> bool {
        self.step_outcomes
            .values()
            .any(|o| o.status == StepStatus::Failed)
    }

    /// Step numbers with a passed outcome, ascending.
    pub fn completed_steps(&self) -> Vec<usize> {
        self.steps_with_status(StepStatus::Passed)
    }

    /// Step numbers with a failed outcome, ascending.
    pub fn failed_steps(&self) -> Vec<usize> {
        self.steps_with_status(StepStatus::Failed)
    }

    fn steps_with_status(&self, status: StepStatus) -> Vec<usize> {
        self.step_outcomes
            .iter()
            .filter(|(_, o)| o.status == status)
            .map(|(n, _)| *n)
            .collect()
    }

    pub fn phase(&self) -> WorkflowPhase {
        if self.is_failed() {
            WorkflowPhase::Failed
        } else if self.is_complete() {
            WorkflowPhase::Complete
        } else if self.step_outcomes.is_empty() {
            WorkflowPhase::NotStarted
        } else {
            WorkflowPhase::InProgress
        }
    }

    /// Returns the step at the cursor, if the cursor is in range.
    pub fn current(&self) -> Option<&Step> {
        self.steps.get(self.current_step)
    }

    /// Records an outcome; only a passed outcome contributes its variables.
    ///
    /// Does not move the cursor.
    pub fn record_step_outcome(&mut self, outcome: StepOutcome) {
        if outcome.is_passed() {
            for (name, value) in &outcome.output_variables {
                self.variables.insert(name.clone(), value.clone());
            }
        }
        debug!(
            "Recorded step {} as {}",
            outcome.step_number, outcome.status
        );
        self.step_outcomes.insert(outcome.step_number, outcome);
    }

    /// Moves the cursor to the next step.
    pub fn advance(&mut self) {
        self.current_step += 1;
    }

    /// Returns to the first step, keeping the loaded steps.
    pub fn reset(&mut self) {
        self.current_step = 0;
        self.variables.clear();
        self.step_outcomes.clear();
    }

    /// Serializable view of the state.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            file_path: self.file_path.clone(),
            total_steps: self.total_steps(),
            current_step: self.current_step,
            status: self.phase(),
            is_complete: self.is_complete(),
            is_failed: self.is_failed(),
            completed_steps: self.completed_steps(),
            failed_steps: self.failed_steps(),
            variables: self.variables.clone(),
            loaded_at: self.loaded_at,
            step_outcomes: self
                .step_outcomes
                .iter()
                .map(|(n, o)| (*n, OutcomeSnapshot::from(o)))
                .collect(),
        }
    }
}

/// Full state as returned by `get_workflow_state`.
#[derive(Serialize, Debug, Clone)]
pub struct StateSnapshot {
    pub file_path: String,
    pub total_steps: usize,
    pub current_step: usize,
    pub status: WorkflowPhase,
    pub is_complete: bool,
    pub is_failed: bool,
    pub completed_steps: Vec<usize>,
    pub failed_steps: Vec<usize>,
    pub variables: Variables,
    pub loaded_at: Option<DateTime<Utc>>,
    pub step_outcomes: BTreeMap<usize, OutcomeSnapshot>,
}

/// Per-step entry of [`StateSnapshot`].
#[derive(Serialize, Debug, Clone)]
pub struct OutcomeSnapshot {
    pub status: StepStatus,
    pub assertion_results: Vec<AssertionResult>,
    pub all_assertions_passed: bool,
    pub output_variables: Variables,
    pub error_message: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<&StepOutcome> for OutcomeSnapshot {
    fn from(outcome: &StepOutcome) -> Self {
        Self {
            status: outcome.status,
            assertion_results: outcome.assertion_results.clone(),
            all_assertions_passed: outcome.all_assertions_passed(),
            output_variables: outcome.output_variables.clone(),
            error_message: outcome.error_message.clone(),
            recorded_at: outcome.recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn three_steps() -> Vec<Step> {
        vec![
            Step::new(0, "one", "first", "tool_a"),
            Step::new(1, "two", "second", "tool_b"),
            Step::new(2, "three", "third", "tool_c"),
        ]
    }

    fn loaded_state() -> WorkflowState {
        let mut state = WorkflowState::new();
        state.load("workflow.md", three_steps());
        state
    }

    fn outputs(pairs: &[(&str, serde_json::Value)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_state_creation() {
        let state = WorkflowState::new();
        assert!(!state.is_loaded());
        assert_eq!(state.total_steps(), 0);
        assert!(state.loaded_at.is_none());
    }

    #[test]
    fn test_is_loaded_requires_path_and_steps() {
        let mut state = WorkflowState::new();
        state.load("", three_steps());
        assert!(!state.is_loaded());

        state.load("workflow.md", Vec::new());
        assert!(!state.is_loaded());

        state.load("workflow.md", three_steps());
        assert!(state.is_loaded());
        assert!(state.loaded_at.is_some());
    }

    #[test]
    fn test_load_clears_progress() {
        let mut state = loaded_state();
        state.record_step_outcome(
            StepOutcome::new(0, StepStatus::Passed)
                .with_output_variables(outputs(&[("A", json!(1))])),
        );
        state.advance();

        state.load("other.md", three_steps());

        assert_eq!(state.file_path, "other.md");
        assert_eq!(state.current_step, 0);
        assert!(state.variables.is_empty());
        assert!(state.step_outcomes.is_empty());
    }

    #[test]
    fn test_passed_outcome_merges_variables() {
        let mut state = loaded_state();
        state.variables.insert("A".to_string(), json!("old"));

        state.record_step_outcome(
            StepOutcome::new(0, StepStatus::Passed)
                .with_output_variables(outputs(&[("A", json!("new")), ("B", json!(2))])),
        );

        assert_eq!(state.variables["A"], json!("new"));
        assert_eq!(state.variables["B"], json!(2));
        assert_eq!(state.current_step, 0);
    }

    #[test]
    fn test_failed_outcome_discards_variables() {
        let mut state = loaded_state();
        state.record_step_outcome(
            StepOutcome::new(0, StepStatus::Failed)
                .with_output_variables(outputs(&[("LEAKED", json!("x"))])),
        );

        assert!(!state.variables.contains_key("LEAKED"));
        assert!(state.is_failed());
        assert_eq!(state.failed_steps(), vec![0]);
        assert_eq!(state.phase(), WorkflowPhase::Failed);
    }

    #[test]
    fn test_phase_progression() {
        let mut state = loaded_state();
        assert_eq!(state.phase(), WorkflowPhase::NotStarted);

        for n in 0..3 {
            state.record_step_outcome(StepOutcome::new(n, StepStatus::Passed));
            state.advance();
            if n < 2 {
                assert_eq!(state.phase(), WorkflowPhase::InProgress);
            }
        }

        assert!(state.is_complete());
        assert_eq!(state.phase(), WorkflowPhase::Complete);
        assert_eq!(state.completed_steps(), vec![0, 1, 2]);
        assert!(state.current().is_none());
    }

    #[test]
    fn test_one_outcome_per_step() {
        let mut state = loaded_state();
        state.record_step_outcome(StepOutcome::new(0, StepStatus::Failed));
        state.record_step_outcome(StepOutcome::new(0, StepStatus::Failed).with_error_message("again"));

        assert_eq!(state.step_outcomes.len(), 1);
        assert_eq!(state.step_outcomes[&0].error_message, "again");
    }

    #[test]
    fn test_reset_keeps_steps() {
        let mut state = loaded_state();
        state.record_step_outcome(StepOutcome::new(0, StepStatus::Passed));
        state.advance();
        state.record_step_outcome(StepOutcome::new(1, StepStatus::Failed));

        state.reset();

        assert_eq!(state.current_step, 0);
        assert!(state.step_outcomes.is_empty());
        assert!(!state.is_failed());
        assert_eq!(state.total_steps(), 3);
        assert_eq!(state.file_path, "workflow.md");
    }

    #[test]
    fn test_snapshot_shape() {
        let mut state = loaded_state();
        state.record_step_outcome(
            StepOutcome::new(0, StepStatus::Passed)
                .with_output_variables(outputs(&[("REPO_NAME", json!("api"))])),
        );
        state.advance();

        let value = serde_json::to_value(state.snapshot()).unwrap();

        assert_eq!(value["file_path"], "workflow.md");
        assert_eq!(value["total_steps"], 3);
        assert_eq!(value["current_step"], 1);
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["is_complete"], false);
        assert_eq!(value["completed_steps"], json!([0]));
        assert_eq!(value["variables"]["REPO_NAME"], "api");
        assert_eq!(value["step_outcomes"]["0"]["status"], "passed");
        assert_eq!(value["step_outcomes"]["0"]["all_assertions_passed"], true);
    }
}
