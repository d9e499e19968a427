//! Enriched Prompt Builder
//!
//! Turns a [`Step`] and the current variables into the instruction text the
//! calling model executes. The text always follows the same order: header,
//! description, tools, inputs, success criteria, output variables, and the
//! callback instructions for `report_step_result`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use super::model::{Step, Variables};
use crate::error::{Result, WorkflowError};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Z_]+)\]").expect("valid placeholder pattern"));

/// Builds the enriched prompt for a step.
///
/// # Errors
///
/// Returns `VariableMissing` for the first declared input that has no value
/// in `variables`.
pub fn build_enriched_prompt(step: &Step, variables: &Variables) -> Result<String> {
    if let Some(missing) = step.first_missing_input(variables) {
        return Err(WorkflowError::variable_missing(&missing.name, &step.name));
    }

    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(
        "## Workflow Step {}: {}\n",
        step.step_number + 1,
        step.name
    ));
    parts.push(format!("{}\n", resolve_variables(&step.description, variables)));

    if let [tool] = step.tool_names.as_slice() {
        parts.push(format!("**Use tool:** `{}`\n", tool));
    } else {
        parts.push("**Use these tools in order:**".to_string());
        for (i, tool) in step.tool_names.iter().enumerate() {
            parts.push(format!("  {}. `{}`", i + 1, tool));
        }
        parts.push(String::new());
    }

    if !step.inputs.is_empty() {
        parts.push("**Inputs:**".to_string());
        for input in &step.inputs {
            let value = variables
                .get(&input.name)
                .map(display_value)
                .unwrap_or_else(|| format!("[{}]", input.name));
            parts.push(format!(
                "  - {} = `{}` ({})",
                input.name, value, input.description
            ));
        }
        parts.push(String::new());
    }

    if !step.assertions.is_empty() {
        parts.push(format!(
            "**Success criteria ({} assertions to evaluate):**",
            step.assertions.len()
        ));
        for (i, assertion) in step.assertions.iter().enumerate() {
            parts.push(format!("  {}. {}", i + 1, assertion));
        }
        parts.push(String::new());
    }

    if !step.outputs.is_empty() {
        parts.push("**Output variables to extract:**".to_string());
        for output in &step.outputs {
            parts.push(format!(
                "  - Extract `{}` → report as `{}`",
                output.source, output.target
            ));
        }
        parts.push(String::new());
    }

    parts.push("**After execution**, call `report_step_result` with:".to_string());
    parts.push(format!("  - step_number: {}", step.step_number));
    parts.push("  - status: \"passed\" or \"failed\"".to_string());

    if !step.assertions.is_empty() {
        parts.push(format!(
            "  - assertion_results: array of {} results, each with:",
            step.assertions.len()
        ));
        parts.push("    - assertion: the assertion text".to_string());
        parts.push("    - passed: true/false".to_string());
        parts.push("    - detail: brief explanation of pass/fail".to_string());
    }

    if !step.outputs.is_empty() {
        parts.push(format!(
            "  - output_variables: object with keys: {}",
            step.output_targets().join(", ")
        ));
    }

    parts.push("  - error_message: \"\" if passed, or description of failure".to_string());

    Ok(parts.join("\n"))
}

/// Replaces `[VARIABLE_NAME]` placeholders with their values.
///
/// Placeholders without a matching variable are left untouched.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use workflow_orchestrator::workflow::{prompt::resolve_variables, Variables};
///
/// let mut vars = Variables::new();
/// vars.insert("REPO_NAME".to_string(), json!("api"));
///
/// assert_eq!(
///     resolve_variables("Use [REPO_NAME] on [BRANCH]", &vars),
///     "Use api on [BRANCH]"
/// );
/// ```
pub fn resolve_variables(text: &str, variables: &Variables) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => display_value(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Strings are shown verbatim, everything else in its JSON form.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
