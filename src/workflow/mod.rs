//! Workflow Definition Module
//!
//! Provides data structures and utilities for parsing markdown workflows,
//! tracking session progress and composing step prompts.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (Step, StepOutcome, AssertionResult)
//! - [`parser`]: Markdown parsing and loading
//! - [`state`]: Session state and snapshots
//! - [`prompt`]: Enriched prompt composition

pub mod model;
pub mod parser;
pub mod prompt;
pub mod state;

#[cfg(test)]
pub(crate) mod fixtures;

pub use model::{
    AssertionResult, OutputMapping, Step, StepOutcome, StepStatus, VariableInput, Variables,
};
pub use parser::{load_workflow_file, parse_workflow_markdown};
pub use prompt::{build_enriched_prompt, resolve_variables};
pub use state::{StateSnapshot, WorkflowPhase, WorkflowState};
