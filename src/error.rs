//! Workflow Error Taxonomy
//!
//! Every failure in the orchestrator is a [`WorkflowError`]. Each variant
//! carries enough context to build an actionable message for the calling
//! model: what went wrong, a short suggestion, and (for format problems) an
//! example of the expected markdown.

use serde::Serialize;
use thiserror::Error;

/// Example of a minimal, well-formed workflow step.
const STEP_EXAMPLE: &str = "### 🔧 WORKFLOW STEP: Step name\n\
```\n\
Step description here\n\
```\n\
\n\
### 🛠️ TOOL: tool_name";

/// Example of both tool specification forms.
const TOOL_EXAMPLE: &str = "### 🛠️ TOOL: tool_name\n\
*or*\n\
### 🛠️ TOOLS:\n\
- first_tool\n\
- second_tool";

/// Machine-readable error category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FileNotFound,
    InvalidFormat,
    NoWorkflowLoaded,
    EmptyWorkflow,
    MissingToolSpec,
    VariableMissing,
    StepOutOfOrder,
    Unexpected,
}

impl ErrorKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileNotFound => "file_not_found",
            Self::InvalidFormat => "invalid_format",
            Self::NoWorkflowLoaded => "no_workflow_loaded",
            Self::EmptyWorkflow => "empty_workflow",
            Self::MissingToolSpec => "missing_tool_spec",
            Self::VariableMissing => "variable_missing",
            Self::StepOutOfOrder => "step_out_of_order",
            Self::Unexpected => "unexpected",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the parser, the prompt builder and the workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow file not found at {path}")]
    FileNotFound { path: String },

    #[error("Failed to read workflow file '{path}': {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid workflow format in {path}: {issue}")]
    InvalidFormat { path: String, issue: String },

    #[error("No workflow steps found in {path}")]
    EmptyWorkflow { path: String },

    #[error("Step '{step}' has no tool specification")]
    MissingToolSpec { step: String },

    #[error("Cannot {operation}: No workflow has been loaded")]
    NoWorkflowLoaded { operation: String },

    #[error("Variable '{variable}' required by step '{step}' has not been set")]
    VariableMissing { variable: String, step: String },

    #[error("Received result for step {reported}, but step {expected} is in progress")]
    StepOutOfOrder { reported: i64, expected: usize },

    #[error("Workflow is already complete")]
    WorkflowComplete,

    #[error("Workflow has failed at step {step}, cannot continue")]
    WorkflowFailed { step: usize },

    #[error("No more steps to execute")]
    NoMoreSteps,

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl WorkflowError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn invalid_format(path: impl Into<String>, issue: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            issue: issue.into(),
        }
    }

    pub fn no_workflow_loaded(operation: impl Into<String>) -> Self {
        Self::NoWorkflowLoaded {
            operation: operation.into(),
        }
    }

    pub fn variable_missing(variable: impl Into<String>, step: impl Into<String>) -> Self {
        Self::VariableMissing {
            variable: variable.into(),
            step: step.into(),
        }
    }

    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Returns the machine-readable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. } => ErrorKind::FileNotFound,
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::EmptyWorkflow { .. } => ErrorKind::EmptyWorkflow,
            Self::MissingToolSpec { .. } => ErrorKind::MissingToolSpec,
            Self::NoWorkflowLoaded { .. } => ErrorKind::NoWorkflowLoaded,
            Self::VariableMissing { .. } => ErrorKind::VariableMissing,
            Self::StepOutOfOrder { .. } => ErrorKind::StepOutOfOrder,
            Self::ReadFailed { .. }
            | Self::WorkflowComplete
            | Self::WorkflowFailed { .. }
            | Self::NoMoreSteps
            | Self::InvalidArguments { .. }
            | Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Returns a short suggestion for resolving the error.
    pub fn suggestion(&self) -> String {
        match self {
            Self::FileNotFound { .. } => {
                "Check that the file path is correct and the file exists".to_string()
            }
            Self::ReadFailed { .. } => {
                "Ensure the file is readable and properly encoded".to_string()
            }
            Self::InvalidFormat { .. } => {
                "Ensure each step follows the required format".to_string()
            }
            Self::EmptyWorkflow { .. } => {
                "Workflow files must contain at least one step block".to_string()
            }
            Self::MissingToolSpec { .. } => {
                "Each workflow step must specify a TOOL or TOOLS section".to_string()
            }
            Self::NoWorkflowLoaded { .. } => {
                "Load a workflow first using load_workflow(file_path)".to_string()
            }
            Self::VariableMissing { .. } => {
                "Ensure a prior step defines this variable in its OUTPUTS section".to_string()
            }
            Self::StepOutOfOrder { expected, .. } => {
                format!("Report results for step {} first", expected)
            }
            Self::WorkflowComplete => "Use reset_workflow() to run again".to_string(),
            Self::WorkflowFailed { .. } => {
                "Use reset_workflow() to restart the workflow from the first step".to_string()
            }
            Self::NoMoreSteps => {
                "The workflow may be complete, check get_workflow_state()".to_string()
            }
            Self::InvalidArguments { tool, .. } => {
                format!("Check the input schema of '{}' in tools/list", tool)
            }
            Self::Unexpected(_) => "Check the server logs for details".to_string(),
        }
    }

    /// Returns an example of the expected document format, if relevant.
    pub fn example(&self) -> Option<&'static str> {
        match self {
            Self::InvalidFormat { .. } | Self::EmptyWorkflow { .. } => Some(STEP_EXAMPLE),
            Self::MissingToolSpec { .. } => Some(TOOL_EXAMPLE),
            _ => None,
        }
    }

    /// Formats the message together with its suggestion and example.
    pub fn actionable_message(&self) -> String {
        let mut message = self.to_string();

        let suggestion = self.suggestion();
        if !suggestion.is_empty() {
            message.push_str("\nSuggestion: ");
            message.push_str(&suggestion);
        }

        if let Some(example) = self.example() {
            message.push_str("\nExample:\n");
            message.push_str(example);
        }

        message
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, WorkflowError>;
