//! Workflow Orchestration Engine
//!
//! The engine owns the session's [`WorkflowState`] and implements the five
//! operations a calling model uses to drive a workflow:
//! - `load_workflow`: parse a markdown file and start a fresh session
//! - `execute_step`: return the enriched prompt for the step at the cursor
//! - `report_result`: record an outcome and hand back the next prompt
//! - `get_state`: snapshot progress, variables and outcomes
//! - `reset`: go back to the first step keeping the loaded steps
//!
//! Every operation runs to completion before returning; the engine is the
//! only mutator of the state.

use log::{info, warn};

use crate::error::{Result, WorkflowError};
use crate::workflow::{
    build_enriched_prompt, load_workflow_file, AssertionResult, StateSnapshot, StepOutcome,
    StepStatus, WorkflowState,
};

use super::report::{
    assertion_mismatch_warning, AdvanceSummary, FailureSummary, LoadSummary, ReportResponse,
    ResetSummary, StepPrompt, StepReport, StepSummary,
};

/// Workflow orchestration engine.
///
/// # Example
///
/// ```rust,no_run
/// use workflow_orchestrator::execution::{Engine, StepReport};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut engine = Engine::new();
///     engine.load_workflow("workflows/release.md")?;
///
///     let step = engine.execute_step()?;
///     println!("{}", step.prompt);
///
///     engine.report_result(StepReport::passed(step.step_number))?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct Engine {
    state: WorkflowState,
}

impl Engine {
    /// Creates an engine with nothing loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only access to the session state.
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    fn require_loaded(&self, operation: &str) -> Result<()> {
        if self.state.is_loaded() {
            Ok(())
        } else {
            warn!("Rejected '{}': no workflow loaded", operation);
            Err(WorkflowError::no_workflow_loaded(operation))
        }
    }

    /// Loads a workflow file, replacing any previous session.
    ///
    /// The state is only replaced once the whole document parsed.
    pub fn load_workflow(&mut self, file_path: &str) -> Result<LoadSummary> {
        let steps = load_workflow_file(file_path)?;

        let first_step = steps
            .first()
            .map(StepSummary::from)
            .ok_or_else(|| WorkflowError::EmptyWorkflow {
                path: file_path.to_string(),
            })?;
        let step_count = steps.len();

        self.state.load(file_path, steps);
        info!("Workflow loaded: {} ({} steps)", file_path, step_count);

        Ok(LoadSummary {
            success: true,
            step_count,
            first_step,
        })
    }

    /// Builds the prompt for the step at the cursor.
    pub fn execute_step(&self) -> Result<StepPrompt> {
        self.require_loaded("execute a workflow step")?;
        self.ensure_not_finished()?;

        let step = self.state.current().ok_or(WorkflowError::NoMoreSteps)?;
        let prompt = build_enriched_prompt(step, &self.state.variables)?;

        info!(
            "Issuing step {}/{}: {}",
            step.step_number + 1,
            self.state.total_steps(),
            step.name
        );

        Ok(StepPrompt {
            prompt,
            step_number: step.step_number,
            step_name: step.name.clone(),
            total_steps: self.state.total_steps(),
        })
    }

    /// Rejects work on a workflow that already completed or failed.
    fn ensure_not_finished(&self) -> Result<()> {
        if let Some(step) = self.state.failed_steps().first() {
            return Err(WorkflowError::WorkflowFailed { step: *step });
        }
        if self.state.is_complete() {
            return Err(WorkflowError::WorkflowComplete);
        }
        Ok(())
    }

    /// Checks that `reported` names the pending step and returns it.
    ///
    /// Any other number, negative ones included, is out of order.
    pub fn check_report_order(&self, reported: i64) -> Result<usize> {
        self.require_loaded("report a step result")?;

        let expected = self.state.current_step;
        match usize::try_from(reported) {
            Ok(step_number) if step_number == expected => Ok(step_number),
            _ => {
                warn!(
                    "Out-of-order report for step {} while step {} is pending",
                    reported, expected
                );
                Err(WorkflowError::StepOutOfOrder { reported, expected })
            }
        }
    }

    /// Records the caller's outcome for the pending step.
    ///
    /// On a passed report the cursor advances and the next step's prompt is
    /// built immediately. If that prompt cannot be built the error is
    /// returned, but the recorded outcome and merged variables are kept.
    pub fn report_result(&mut self, report: StepReport) -> Result<ReportResponse> {
        self.check_report_order(report.step_number as i64)?;

        if let Some(step) = self.state.failed_steps().first() {
            return Err(WorkflowError::WorkflowFailed { step: *step });
        }

        let warning = self.record_report(report.clone())?;

        match report.status {
            StepStatus::Passed => self.next_prompt(report.step_number, warning),
            StepStatus::Failed => Ok(ReportResponse::Failed(FailureSummary {
                success: false,
                step_number: report.step_number,
                status: StepStatus::Failed,
                error_message: report.error_message,
                warning,
            })),
        }
    }

    /// Phase one of a report: store the outcome and move the cursor.
    ///
    /// Returns the assertion mismatch warning, if any.
    fn record_report(&mut self, report: StepReport) -> Result<Option<String>> {
        let step = self.state.current().ok_or(WorkflowError::NoMoreSteps)?;
        let step_name = step.name.clone();
        let declared = step.assertions.len();

        let assertion_results: Vec<AssertionResult> = report
            .assertion_results
            .into_iter()
            .map(AssertionResult::from)
            .collect();

        let warning = assertion_mismatch_warning(declared, assertion_results.len());
        if let Some(ref message) = warning {
            warn!("Step {} '{}': {}", report.step_number, step_name, message);
        }

        let outcome = StepOutcome::new(report.step_number, report.status)
            .with_assertion_results(assertion_results)
            .with_output_variables(report.output_variables)
            .with_error_message(report.error_message);

        let passed = outcome.is_passed();
        self.state.record_step_outcome(outcome);

        if passed {
            self.state.advance();
            info!("Step {} '{}' passed", report.step_number, step_name);
        } else {
            warn!("Step {} '{}' failed", report.step_number, step_name);
        }

        Ok(warning)
    }

    /// Phase two of a passed report: prompt for the next step, or completion.
    fn next_prompt(&self, step_number: usize, warning: Option<String>) -> Result<ReportResponse> {
        let mut summary = AdvanceSummary {
            success: true,
            step_number,
            warning,
            prompt: None,
            next_step: None,
            workflow_complete: None,
        };

        match self.state.current() {
            Some(next) => {
                summary.prompt = Some(build_enriched_prompt(next, &self.state.variables)?);
                summary.next_step = Some(next.step_number);
            }
            None => {
                info!(
                    "Workflow complete: {} steps passed",
                    self.state.completed_steps().len()
                );
                summary.workflow_complete = Some(true);
            }
        }

        Ok(ReportResponse::Advanced(summary))
    }

    /// Returns a snapshot of the session.
    pub fn get_state(&self) -> Result<StateSnapshot> {
        self.require_loaded("get workflow state")?;
        Ok(self.state.snapshot())
    }

    /// Resets progress while keeping the loaded workflow.
    pub fn reset(&mut self) -> Result<ResetSummary> {
        self.require_loaded("reset the workflow")?;
        self.state.reset();
        info!("Workflow reset: {}", self.state.file_path);

        Ok(ResetSummary {
            success: true,
            current_step: self.state.current_step,
            total_steps: self.state.total_steps(),
        })
    }
}
