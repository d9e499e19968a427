//! Operation Inputs and Results
//!
//! Plain structures exchanged between the transport layer and the
//! [`Engine`](super::Engine). Results serialize to the JSON shapes returned
//! to the calling model.

use serde::{Deserialize, Serialize};

use crate::workflow::{AssertionResult, Step, StepStatus, Variables};

/// One raw per-assertion verdict as sent by the caller.
///
/// Every field is optional on the wire; missing values fall back to an
/// empty assertion text, `passed = false` and an empty detail.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AssertionReport {
    #[serde(default)]
    pub assertion: Option<String>,
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl AssertionReport {
    pub fn new(assertion: impl Into<String>, passed: bool) -> Self {
        Self {
            assertion: Some(assertion.into()),
            passed: Some(passed),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<AssertionReport> for AssertionResult {
    fn from(report: AssertionReport) -> Self {
        AssertionResult {
            assertion: report.assertion.unwrap_or_default(),
            passed: report.passed.unwrap_or(false),
            detail: report.detail.unwrap_or_default(),
        }
    }
}

/// Arguments of `report_step_result`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step_number: usize,
    pub status: StepStatus,
    pub assertion_results: Vec<AssertionReport>,
    pub output_variables: Variables,
    pub error_message: String,
}

impl StepReport {
    pub fn passed(step_number: usize) -> Self {
        Self::new(step_number, StepStatus::Passed)
    }

    pub fn failed(step_number: usize, error_message: impl Into<String>) -> Self {
        Self::new(step_number, StepStatus::Failed).with_error_message(error_message)
    }

    pub fn new(step_number: usize, status: StepStatus) -> Self {
        Self {
            step_number,
            status,
            assertion_results: Vec::new(),
            output_variables: Variables::new(),
            error_message: String::new(),
        }
    }

    pub fn with_assertion(mut self, assertion: AssertionReport) -> Self {
        self.assertion_results.push(assertion);
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.output_variables.insert(name.into(), value);
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }
}

/// Warning text when fewer verdicts were reported than the step declared.
///
/// Reporting more verdicts than declared is not a mismatch.
pub fn assertion_mismatch_warning(expected: usize, actual: usize) -> Option<String> {
    if expected > 0 && actual < expected {
        Some(format!(
            "Assertion count mismatch: expected {}, received {}. {} assertion(s) unverified.",
            expected,
            actual,
            expected - actual
        ))
    } else {
        None
    }
}

/// Brief description of a step.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StepSummary {
    pub name: String,
    pub description: String,
    pub tool_names: Vec<String>,
}

impl From<&Step> for StepSummary {
    fn from(step: &Step) -> Self {
        Self {
            name: step.name.clone(),
            description: step.description.clone(),
            tool_names: step.tool_names.clone(),
        }
    }
}

/// Result of `load_workflow`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub success: bool,
    pub step_count: usize,
    pub first_step: StepSummary,
}

/// Result of `execute_workflow_step`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StepPrompt {
    pub prompt: String,
    pub step_number: usize,
    pub step_name: String,
    pub total_steps: usize,
}

/// Result of a passed report: the next prompt, or completion.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AdvanceSummary {
    pub success: bool,
    pub step_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_complete: Option<bool>,
}

/// Result of a failed report.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FailureSummary {
    pub success: bool,
    pub step_number: usize,
    pub status: StepStatus,
    pub error_message: String,
    pub warning: Option<String>,
}

/// Result of `report_step_result`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ReportResponse {
    Advanced(AdvanceSummary),
    Failed(FailureSummary),
}

impl ReportResponse {
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Advanced(s) => s.warning.as_deref(),
            Self::Failed(s) => s.warning.as_deref(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            Self::Advanced(AdvanceSummary {
                workflow_complete: Some(true),
                ..
            })
        )
    }
}

/// Result of `reset_workflow`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResetSummary {
    pub success: bool,
    pub current_step: usize,
    pub total_steps: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assertion_report_defaults() {
        let report: AssertionReport = serde_json::from_value(json!({})).unwrap();
        let result = AssertionResult::from(report);

        assert_eq!(result.assertion, "");
        assert!(!result.passed);
        assert_eq!(result.detail, "");
    }

    #[test]
    fn test_assertion_report_conversion() {
        let report: AssertionReport =
            serde_json::from_value(json!({"assertion": "a > 0", "passed": true})).unwrap();
        let result = AssertionResult::from(report);

        assert_eq!(result, AssertionResult::new("a > 0", true, ""));
    }

    #[test]
    fn test_mismatch_only_when_fewer() {
        assert!(assertion_mismatch_warning(0, 0).is_none());
        assert!(assertion_mismatch_warning(2, 2).is_none());
        assert!(assertion_mismatch_warning(2, 5).is_none());

        let warning = assertion_mismatch_warning(3, 1).unwrap();
        assert_eq!(
            warning,
            "Assertion count mismatch: expected 3, received 1. 2 assertion(s) unverified."
        );
    }

    #[test]
    fn test_advance_summary_omits_absent_fields() {
        let response = ReportResponse::Advanced(AdvanceSummary {
            success: true,
            step_number: 0,
            warning: None,
            prompt: None,
            next_step: None,
            workflow_complete: Some(true),
        });
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value, json!({"success": true, "step_number": 0, "workflow_complete": true}));
        assert!(response.is_complete());
    }

    #[test]
    fn test_failure_summary_keeps_null_warning() {
        let response = ReportResponse::Failed(FailureSummary {
            success: false,
            step_number: 1,
            status: StepStatus::Failed,
            error_message: "boom".to_string(),
            warning: None,
        });
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["status"], "failed");
        assert_eq!(value["warning"], serde_json::Value::Null);
        assert!(!response.is_complete());
    }
}
