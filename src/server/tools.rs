//! Workflow Tools
//!
//! The tool catalogue advertised to the client and the router that turns a
//! `tools/call` into an [`Engine`] operation. Workflow errors never escape
//! as protocol errors: they become tool results flagged with `isError`.

use std::str::FromStr;

use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::protocol::{TextContent, ToolCallResult, ToolDefinition};
use crate::error::{Result, WorkflowError};
use crate::execution::{AssertionReport, Engine, StepReport};
use crate::workflow::{StepStatus, Variables};

/// Tools exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    LoadWorkflow,
    ExecuteWorkflowStep,
    ReportStepResult,
    GetWorkflowState,
    ResetWorkflow,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::LoadWorkflow,
        ToolName::ExecuteWorkflowStep,
        ToolName::ReportStepResult,
        ToolName::GetWorkflowState,
        ToolName::ResetWorkflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadWorkflow => "load_workflow",
            Self::ExecuteWorkflowStep => "execute_workflow_step",
            Self::ReportStepResult => "report_step_result",
            Self::GetWorkflowState => "get_workflow_state",
            Self::ResetWorkflow => "reset_workflow",
        }
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

/// Returns the definitions listed by `tools/list`.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::ALL.iter().map(|tool| definition(*tool)).collect()
}

fn definition(tool: ToolName) -> ToolDefinition {
    match tool {
        ToolName::LoadWorkflow => ToolDefinition {
            name: tool.as_str(),
            description: "Load and parse a workflow markdown file. Extracts steps tagged with \
                '### 🔧 WORKFLOW STEP:' including tool specifications, inputs, outputs, and \
                assertions. Returns the step count and a summary of the first step.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Absolute or relative path to the workflow markdown file"
                    }
                },
                "required": ["file_path"]
            }),
        },
        ToolName::ExecuteWorkflowStep => ToolDefinition {
            name: tool.as_str(),
            description: "Execute the current workflow step by returning an enriched prompt. \
                The prompt includes the step description, tool names, resolved variables, \
                assertion criteria, and instructions to call report_step_result when done.",
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        },
        ToolName::ReportStepResult => ToolDefinition {
            name: tool.as_str(),
            description: "Report the outcome of a workflow step after execution: pass/fail \
                status, assertion results, and output variables extracted from the tool \
                results. Returns the next step's prompt or the completion status.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "step_number": {
                        "type": "integer",
                        "description": "The step number being reported on"
                    },
                    "status": {
                        "type": "string",
                        "enum": ["passed", "failed"],
                        "description": "Whether the step passed or failed"
                    },
                    "assertion_results": {
                        "type": "array",
                        "description": "Per-assertion pass/fail results",
                        "items": {
                            "type": "object",
                            "properties": {
                                "assertion": {"type": "string", "description": "The original assertion text"},
                                "passed": {"type": "boolean", "description": "Whether this assertion passed"},
                                "detail": {"type": "string", "description": "Explanation of the result"}
                            },
                            "required": ["assertion", "passed"]
                        }
                    },
                    "output_variables": {
                        "type": "object",
                        "description": "Output variables extracted from results (variable name → value)",
                        "additionalProperties": true
                    },
                    "error_message": {
                        "type": "string",
                        "description": "Error details if the step failed"
                    }
                },
                "required": ["step_number", "status"]
            }),
        },
        ToolName::GetWorkflowState => ToolDefinition {
            name: tool.as_str(),
            description: "Get the current state of the loaded workflow: which steps passed, \
                failed or are pending, current variables, and assertion results.",
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        },
        ToolName::ResetWorkflow => ToolDefinition {
            name: tool.as_str(),
            description: "Reset the workflow to the beginning. Clears all step outcomes, \
                variables, and execution state. The workflow script remains loaded.",
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        },
    }
}

/// Routes tool calls to the engine it owns.
#[derive(Debug, Default)]
pub struct ToolRouter {
    engine: Engine,
}

impl ToolRouter {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Runs a tool and wraps its outcome as MCP content.
    pub fn call(&mut self, tool: ToolName, arguments: &Value) -> ToolCallResult {
        info!("Tool called: {} with arguments: {}", tool.as_str(), arguments);

        match self.invoke(tool, arguments) {
            Ok(result) => {
                info!("Tool {} succeeded", tool.as_str());
                text_result(&result, false)
            }
            Err(err) => {
                warn!("Tool {} failed ({}): {}", tool.as_str(), err.kind(), err);
                text_result(&failure_payload(&err), true)
            }
        }
    }

    fn invoke(&mut self, tool: ToolName, arguments: &Value) -> Result<Value> {
        match tool {
            ToolName::LoadWorkflow => {
                let file_path = required_str(tool, arguments, "file_path")?;
                to_json(self.engine.load_workflow(file_path)?)
            }
            ToolName::ExecuteWorkflowStep => to_json(self.engine.execute_step()?),
            ToolName::ReportStepResult => {
                let step_number = self.engine.check_report_order(step_number_arg(arguments)?)?;
                let report = parse_report(arguments, step_number)?;
                to_json(self.engine.report_result(report)?)
            }
            ToolName::GetWorkflowState => to_json(self.engine.get_state()?),
            ToolName::ResetWorkflow => to_json(self.engine.reset()?),
        }
    }
}

/// Structured failure returned inside a tool result.
pub fn failure_payload(err: &WorkflowError) -> Value {
    json!({
        "success": false,
        "error": err.actionable_message(),
        "error_type": err.kind(),
        "suggestion": err.suggestion(),
    })
}

fn text_result(value: &Value, is_error: bool) -> ToolCallResult {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    ToolCallResult {
        content: vec![TextContent::new(text)],
        is_error,
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| WorkflowError::Unexpected(format!("failed to serialize result: {}", e)))
}

fn required_str<'a>(tool: ToolName, arguments: &'a Value, key: &str) -> Result<&'a str> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            WorkflowError::invalid_arguments(
                tool.as_str(),
                format!("'{}' is required and must be a string", key),
            )
        })
}

/// Reads `step_number` as a signed integer; range is the engine's concern.
fn step_number_arg(arguments: &Value) -> Result<i64> {
    arguments
        .get("step_number")
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            WorkflowError::invalid_arguments(
                ToolName::ReportStepResult.as_str(),
                "'step_number' is required and must be an integer",
            )
        })
}

/// Builds a [`StepReport`] for an already order-checked step.
fn parse_report(arguments: &Value, step_number: usize) -> Result<StepReport> {
    let tool = ToolName::ReportStepResult;
    let invalid = |reason: String| WorkflowError::invalid_arguments(tool.as_str(), reason);

    let status = required_str(tool, arguments, "status")?;
    let status = StepStatus::from_str(status).map_err(invalid)?;

    let assertion_results: Vec<AssertionReport> = match arguments.get("assertion_results") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| invalid(format!("'assertion_results' is malformed: {}", e)))?,
    };

    let output_variables: Variables = match arguments.get("output_variables") {
        None | Some(Value::Null) => Variables::new(),
        Some(Value::Object(map)) => object_to_variables(map),
        Some(_) => return Err(invalid("'output_variables' must be an object".into())),
    };

    let error_message = match arguments.get("error_message") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(invalid("'error_message' must be a string".into())),
    };

    Ok(StepReport {
        step_number,
        status,
        assertion_results,
        output_variables,
        error_message,
    })
}

fn object_to_variables(map: &Map<String, Value>) -> Variables {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::fixtures::VALID_WORKFLOW;
    use tempfile::TempDir;

    fn payload(result: &ToolCallResult) -> Value {
        serde_json::from_str(&result.content[0].text).unwrap()
    }

    fn loaded_router() -> (TempDir, ToolRouter) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflow.md");
        std::fs::write(&path, VALID_WORKFLOW).unwrap();

        let mut router = ToolRouter::default();
        let result = router.call(
            ToolName::LoadWorkflow,
            &json!({"file_path": path.to_str().unwrap()}),
        );
        assert!(!result.is_error);
        (dir, router)
    }

    #[test]
    fn test_tool_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
        assert!("launch_rockets".parse::<ToolName>().is_err());
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let definitions = tool_definitions();
        assert_eq!(definitions.len(), 5);

        let report = definitions
            .iter()
            .find(|d| d.name == "report_step_result")
            .unwrap();
        assert_eq!(report.input_schema["required"], json!(["step_number", "status"]));
        assert_eq!(
            report.input_schema["properties"]["status"]["enum"],
            json!(["passed", "failed"])
        );
    }

    #[test]
    fn test_load_returns_step_count() {
        let (_dir, router) = loaded_router();
        assert_eq!(router.engine().state().total_steps(), 3);
    }

    #[test]
    fn test_workflow_error_becomes_error_result() {
        let mut router = ToolRouter::default();
        let result = router.call(ToolName::ExecuteWorkflowStep, &json!({}));

        assert!(result.is_error);
        let body = payload(&result);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_type"], "no_workflow_loaded");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("No workflow has been loaded"));
    }

    #[test]
    fn test_missing_file_path_is_invalid_arguments() {
        let mut router = ToolRouter::default();
        let result = router.call(ToolName::LoadWorkflow, &json!({}));

        assert!(result.is_error);
        assert_eq!(payload(&result)["error_type"], "unexpected");
        assert!(payload(&result)["error"]
            .as_str()
            .unwrap()
            .contains("'file_path' is required"));
    }

    #[test]
    fn test_report_round_trip_through_router() {
        let (_dir, mut router) = loaded_router();

        let result = router.call(
            ToolName::ReportStepResult,
            &json!({
                "step_number": 0,
                "status": "passed",
                "assertion_results": [
                    {"assertion": "result contains \"repositories\"", "passed": true},
                    {"assertion": "result.repositories.length > 0", "passed": true, "detail": "3 repos"}
                ],
                "output_variables": {"REPO_NAME": "api-service"}
            }),
        );

        assert!(!result.is_error);
        let body = payload(&result);
        assert_eq!(body["success"], true);
        assert_eq!(body["next_step"], 1);
        assert!(body["prompt"].as_str().unwrap().contains("api-service"));
        assert!(body.get("warning").is_none());
    }

    #[test]
    fn test_report_defaults_missing_optional_fields() {
        let (_dir, mut router) = loaded_router();

        let result = router.call(
            ToolName::ReportStepResult,
            &json!({"step_number": 0, "status": "failed", "assertion_results": null}),
        );

        assert!(!result.is_error);
        let body = payload(&result);
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], "failed");
        assert_eq!(body["error_message"], "");
        assert!(body["warning"].as_str().unwrap().contains("expected 2, received 0"));
    }

    #[test]
    fn test_report_rejects_unknown_status() {
        let (_dir, mut router) = loaded_router();

        let result = router.call(
            ToolName::ReportStepResult,
            &json!({"step_number": 0, "status": "skipped"}),
        );

        assert!(result.is_error);
        assert!(payload(&result)["error"].as_str().unwrap().contains("unknown status"));
        assert!(router.engine().state().step_outcomes.is_empty());
    }

    #[test]
    fn test_report_out_of_order_kind() {
        let (_dir, mut router) = loaded_router();

        let result = router.call(
            ToolName::ReportStepResult,
            &json!({"step_number": 2, "status": "passed"}),
        );

        assert!(result.is_error);
        assert_eq!(payload(&result)["error_type"], "step_out_of_order");
    }

    #[test]
    fn test_negative_step_number_is_out_of_order() {
        let (_dir, mut router) = loaded_router();

        let result = router.call(
            ToolName::ReportStepResult,
            &json!({"step_number": -1, "status": "passed"}),
        );

        assert!(result.is_error);
        let body = payload(&result);
        assert_eq!(body["error_type"], "step_out_of_order");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Received result for step -1, but step 0 is in progress"));
        assert_eq!(router.engine().state().current_step, 0);
    }

    #[test]
    fn test_non_integer_step_number_is_invalid_arguments() {
        let (_dir, mut router) = loaded_router();

        let result = router.call(
            ToolName::ReportStepResult,
            &json!({"step_number": "first", "status": "passed"}),
        );

        assert!(result.is_error);
        let body = payload(&result);
        assert_eq!(body["error_type"], "unexpected");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("'step_number' is required and must be an integer"));
    }

    #[test]
    fn test_get_state_and_reset() {
        let (_dir, mut router) = loaded_router();

        let state = payload(&router.call(ToolName::GetWorkflowState, &json!({})));
        assert_eq!(state["total_steps"], 3);
        assert_eq!(state["status"], "not_started");

        let reset = payload(&router.call(ToolName::ResetWorkflow, &Value::Null));
        assert_eq!(reset, json!({"success": true, "current_step": 0, "total_steps": 3}));
    }
}
