//! Workflow Parser
//!
//! Extracts workflow steps from markdown documents. A step starts at a
//! `### 🔧 WORKFLOW STEP:` header and runs until the next step header (or the
//! end of the document):
//!
//! ~~~text
//! ### 🔧 WORKFLOW STEP: <step name>
//! ```
//! Step description, may reference [VARIABLE_NAME]
//! ```
//! ### 🛠️ TOOL: tool_name          (or ### 🛠️ TOOLS: + bulleted list)
//! ### 📥 INPUTS:                   (optional, "- NAME: description")
//! ### 📤 OUTPUTS:                  (optional, "- source → NAME")
//! ### ✅ ASSERT:                   (optional, "- criterion")
//! ~~~

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use super::model::Step;
use crate::error::{Result, WorkflowError};

static STEP_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"###[ \t]*🔧[ \t]*WORKFLOW STEP:[ \t]*(.*)").expect("valid step header pattern")
});

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```\s*\n(.*?)```").expect("valid fenced block pattern"));

static TOOLS_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"###\s*🛠\x{FE0F}?\s*TOOLS:\s*\n((?:\s*-\s*.+\n?)+)").expect("valid tools pattern")
});

static TOOL_SINGLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"###\s*🛠\x{FE0F}?\s*TOOL:[ \t]*(.*)").expect("valid tool pattern")
});

static INPUTS_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"###\s*📥\s*INPUTS:\s*\n((?:\s*-\s*.+\n?)+)").expect("valid inputs pattern")
});

static OUTPUTS_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"###\s*📤\s*OUTPUTS:\s*\n((?:\s*-\s*.+\n?)+)").expect("valid outputs pattern")
});

static ASSERT_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"###\s*✅\x{FE0F}?\s*ASSERT:\s*\n((?:\s*-\s*.+\n?)+)").expect("valid assert pattern")
});

static SECTION_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^##[ \t]+(.+)$").expect("valid section pattern"));

/// Loads and parses a workflow markdown file.
///
/// # Errors
///
/// * `FileNotFound` - the path does not exist
/// * `ReadFailed` - the file exists but could not be read as UTF-8 text
/// * `EmptyWorkflow` - the document contains no step headers
/// * any error from [`parse_workflow_markdown`]
///
/// # Example
///
/// ```rust,no_run
/// use workflow_orchestrator::workflow::load_workflow_file;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let steps = load_workflow_file("workflows/release.md")?;
///     println!("Loaded {} steps", steps.len());
///     Ok(())
/// }
/// ```
pub fn load_workflow_file(path: &str) -> Result<Vec<Step>> {
    info!("Loading workflow from: {}", path);

    if !Path::new(path).exists() {
        return Err(WorkflowError::file_not_found(path));
    }

    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => WorkflowError::file_not_found(path),
        _ => WorkflowError::ReadFailed {
            path: path.to_string(),
            source: e,
        },
    })?;

    debug!("Markdown content loaded ({} bytes)", content.len());

    let steps = parse_workflow_markdown(&content, path)?;
    if steps.is_empty() {
        return Err(WorkflowError::EmptyWorkflow {
            path: path.to_string(),
        });
    }

    Ok(steps)
}

/// Parses workflow steps from markdown text.
///
/// `source` names the document in error messages. A document without any
/// step header yields an empty list rather than an error.
pub fn parse_workflow_markdown(content: &str, source: &str) -> Result<Vec<Step>> {
    let headers: Vec<_> = STEP_HEADER.captures_iter(content).collect();
    let mut steps = Vec::with_capacity(headers.len());

    for (index, captures) in headers.iter().enumerate() {
        let header = captures.get(0).map_or(0..0, |m| m.range());
        let name = captures.get(1).map_or("", |m| m.as_str()).trim();

        if name.is_empty() {
            return Err(WorkflowError::invalid_format(
                source,
                format!("step {} has an empty name", index + 1),
            ));
        }

        let end = headers
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map_or(content.len(), |m| m.start());
        let section = &content[header.end..end];

        let mut step = Step {
            step_number: index,
            name: name.to_string(),
            description: extract_description(section, source, name)?,
            tool_names: extract_tools(section, name)?,
            inputs: Vec::new(),
            outputs: Vec::new(),
            assertions: extract_assertions(section),
            section_title: section_title_before(content, header.start),
        };

        for (var_name, description) in extract_inputs(section) {
            step.set_input(var_name, description);
        }
        for (source_path, target) in extract_outputs(section) {
            step.set_output(source_path, target);
        }

        debug!(
            "Parsed step {} '{}': {} tool(s), {} input(s), {} output(s), {} assertion(s)",
            step.step_number,
            step.name,
            step.tool_names.len(),
            step.inputs.len(),
            step.outputs.len(),
            step.assertions.len()
        );

        steps.push(step);
    }

    info!("Parsed {} workflow steps from {}", steps.len(), source);
    Ok(steps)
}

/// Returns the trimmed body of the first fenced block in the section.
fn extract_description(section: &str, source: &str, step_name: &str) -> Result<String> {
    FENCED_BLOCK
        .captures(section)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| {
            WorkflowError::invalid_format(
                source,
                format!("step '{}' is missing a description code block", step_name),
            )
        })
}

/// Extracts tool names, preferring the multi-tool list over the single-tool form.
fn extract_tools(section: &str, step_name: &str) -> Result<Vec<String>> {
    if let Some(list) = TOOLS_LIST.captures(section).and_then(|c| c.get(1)) {
        let tools = bullet_items(list.as_str());
        if !tools.is_empty() {
            return Ok(tools);
        }
    }

    if let Some(tool) = TOOL_SINGLE.captures(section).and_then(|c| c.get(1)) {
        let tool = tool.as_str().trim();
        if !tool.is_empty() {
            return Ok(vec![tool.to_string()]);
        }
    }

    Err(WorkflowError::MissingToolSpec {
        step: step_name.to_string(),
    })
}

/// Extracts `NAME: description` pairs; lines without a colon are skipped.
fn extract_inputs(section: &str) -> Vec<(String, String)> {
    let Some(list) = INPUTS_LIST.captures(section).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    bullet_items(list.as_str())
        .into_iter()
        .filter_map(|line| {
            line.split_once(':')
                .map(|(name, description)| (name.trim().to_string(), description.trim().to_string()))
        })
        .collect()
}

/// Extracts `source → TARGET` pairs, accepting `->` as well.
fn extract_outputs(section: &str) -> Vec<(String, String)> {
    let Some(list) = OUTPUTS_LIST.captures(section).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    bullet_items(list.as_str())
        .into_iter()
        .filter_map(|line| {
            line.split_once('→')
                .or_else(|| line.split_once("->"))
                .map(|(source, target)| (source.trim().to_string(), target.trim().to_string()))
        })
        .collect()
}

fn extract_assertions(section: &str) -> Vec<String> {
    ASSERT_LIST
        .captures(section)
        .and_then(|c| c.get(1))
        .map(|list| bullet_items(list.as_str()))
        .unwrap_or_default()
}

/// Returns the last `## heading` before `position`, or an empty string.
fn section_title_before(content: &str, position: usize) -> String {
    SECTION_HEADING
        .captures_iter(&content[..position])
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Splits a bulleted block into its non-empty items.
fn bullet_items(block: &str) -> Vec<String> {
    block
        .trim()
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c| c == '-' || c == ' ')
                .trim()
                .to_string()
        })
        .filter(|item| !item.is_empty())
        .collect()
}
