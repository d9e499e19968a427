//! Workflow Data Model
//!
//! Core data structures representing parsed workflow steps and the outcomes
//! reported back for them.
//!
//! # Example Markdown Format
//!
//! ~~~text
//! ## Discovery Phase
//!
//! ### 🔧 WORKFLOW STEP: Discover repositories
//! ```
//! Find all repositories in the current project.
//! ```
//!
//! ### 🛠️ TOOL: repository_discovery
//!
//! ### 📤 OUTPUTS:
//! - result.repositories[0].name → REPO_NAME
//!
//! ### ✅ ASSERT:
//! - result.repositories.length > 0
//! ~~~

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Runtime variables shared between steps (name -> reported value).
pub type Variables = BTreeMap<String, Value>;

/// A variable a step needs before its prompt can be built.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VariableInput {
    /// Variable name, e.g. `REPO_NAME`
    pub name: String,

    /// Why the step needs it
    pub description: String,
}

/// Where a value lives in a tool result and which variable receives it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OutputMapping {
    /// Free-form result path, e.g. `result.repositories[0].name`
    pub source: String,

    /// Variable name the caller should report the value under
    pub target: String,
}

/// A single step extracted from a workflow document.
///
/// Steps are immutable once parsed; `step_number` is the only valid
/// execution order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Zero-based position in the document
    pub step_number: usize,

    /// Human-readable label from the step header
    pub name: String,

    /// Instruction text, may contain `[VARIABLE_NAME]` placeholders
    pub description: String,

    /// Tools to invoke, in order
    pub tool_names: Vec<String>,

    /// Required variables, in declaration order
    #[serde(default)]
    pub inputs: Vec<VariableInput>,

    /// Result paths to extract, in declaration order
    #[serde(default)]
    pub outputs: Vec<OutputMapping>,

    /// Natural-language success criteria
    #[serde(default)]
    pub assertions: Vec<String>,

    /// Nearest `##` heading above the step
    #[serde(default)]
    pub section_title: String,
}

impl Step {
    /// Creates a step with a single tool and no optional sections.
    ///
    /// # Example
    ///
    /// ```
    /// use workflow_orchestrator::workflow::Step;
    ///
    /// let step = Step::new(0, "Discover", "Find repositories", "repository_discovery")
    ///     .with_output("result.repositories[0].name", "REPO_NAME")
    ///     .with_assertion("result.repositories.length > 0");
    ///
    /// assert_eq!(step.output_targets(), vec!["REPO_NAME"]);
    /// ```
    pub fn new(
        step_number: usize,
        name: impl Into<String>,
        description: impl Into<String>,
        tool: impl Into<String>,
    ) -> Self {
        Self {
            step_number,
            name: name.into().trim().to_string(),
            description: description.into(),
            tool_names: vec![tool.into().trim().to_string()],
            inputs: Vec::new(),
            outputs: Vec::new(),
            assertions: Vec::new(),
            section_title: String::new(),
        }
    }

    /// Replaces the tool list.
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tool_names = tools;
        self
    }

    /// Declares a required input variable.
    pub fn with_input(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.set_input(name, description);
        self
    }

    /// Declares an output mapping.
    pub fn with_output(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.set_output(source, target);
        self
    }

    /// Adds an assertion.
    pub fn with_assertion(mut self, assertion: impl Into<String>) -> Self {
        self.assertions.push(assertion.into());
        self
    }

    /// Sets the enclosing section title.
    pub fn with_section(mut self, title: impl Into<String>) -> Self {
        self.section_title = title.into();
        self
    }

    /// Inserts an input, overwriting the description of a repeated name in place.
    pub fn set_input(&mut self, name: impl Into<String>, description: impl Into<String>) {
        let name = name.into();
        let description = description.into();
        match self.inputs.iter_mut().find(|i| i.name == name) {
            Some(existing) => existing.description = description,
            None => self.inputs.push(VariableInput { name, description }),
        }
    }

    /// Inserts an output mapping, overwriting the target of a repeated source in place.
    pub fn set_output(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into();
        let target = target.into();
        match self.outputs.iter_mut().find(|o| o.source == source) {
            Some(existing) => existing.target = target,
            None => self.outputs.push(OutputMapping { source, target }),
        }
    }

    /// Names of the variables this step reports, in declaration order.
    pub fn output_targets(&self) -> Vec<&str> {
        self.outputs.iter().map(|o| o.target.as_str()).collect()
    }

    /// Returns the first declared input that is not present in `variables`.
    pub fn first_missing_input(&self, variables: &Variables) -> Option<&VariableInput> {
        self.inputs.iter().find(|i| !variables.contains_key(&i.name))
    }
}

/// Reported status of a step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            other => Err(format!(
                "unknown status '{}', expected \"passed\" or \"failed\"",
                other
            )),
        }
    }
}

/// Caller's verdict for one assertion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    pub assertion: String,
    pub passed: bool,
    #[serde(default)]
    pub detail: String,
}

impl AssertionResult {
    pub fn new(assertion: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            assertion: assertion.into(),
            passed,
            detail: detail.into(),
        }
    }
}

/// The recorded result of attempting a step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step_number: usize,
    pub status: StepStatus,
    #[serde(default)]
    pub assertion_results: Vec<AssertionResult>,
    #[serde(default)]
    pub output_variables: Variables,
    #[serde(default)]
    pub error_message: String,

    /// When the outcome was reported
    pub recorded_at: DateTime<Utc>,
}

impl StepOutcome {
    /// Creates an outcome with no assertion results or outputs.
    pub fn new(step_number: usize, status: StepStatus) -> Self {
        Self {
            step_number,
            status,
            assertion_results: Vec::new(),
            output_variables: Variables::new(),
            error_message: String::new(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_assertion_results(mut self, results: Vec<AssertionResult>) -> Self {
        self.assertion_results = results;
        self
    }

    pub fn with_output_variables(mut self, variables: Variables) -> Self {
        self.output_variables = variables;
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// True iff every reported assertion passed (vacuously true when none were reported).
    pub fn all_assertions_passed(&self) -> bool {
        self.assertion_results.iter().all(|r| r.passed)
    }

    pub fn is_passed(&self) -> bool {
        self.status == StepStatus::Passed
    }
}
