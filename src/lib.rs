//! Workflow Orchestrator - Step-by-step Markdown Workflow Server
//!
//! Parses markdown workflow scripts into ordered steps and hands them, one at
//! a time, to a calling language model as enriched prompts. The caller runs
//! the tools, reports per-assertion verdicts and extracted output variables,
//! and the orchestrator decides whether to advance.
//!
//! # Architecture
//!
//! The library is organized into four main modules:
//!
//! - [`workflow`]: Step model, markdown parser, prompt builder and session state
//! - [`execution`]: The engine implementing the five workflow operations
//! - [`server`]: MCP tool surface over JSON-RPC on stdio
//! - [`error`]: Error categories with actionable guidance
//!
//! # Example
//!
//! ```rust,no_run
//! use workflow_orchestrator::execution::{Engine, StepReport};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new();
//!     engine.load_workflow("deploy.md")?;
//!
//!     // Hand the prompt to the model, then report what it observed
//!     let step = engine.execute_step()?;
//!     println!("{}", step.prompt);
//!
//!     let response = engine.report_result(StepReport::passed(step.step_number))?;
//!     println!("complete: {}", response.is_complete());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod execution;
pub mod server;
pub mod workflow;

// Re-export commonly used types
pub use error::{ErrorKind, Result, WorkflowError};
pub use execution::engine::Engine;
pub use workflow::model::{Step, StepOutcome, StepStatus};
pub use workflow::parser::load_workflow_file;
pub use workflow::state::WorkflowState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "workflow-orchestrator";

/// Name announced to MCP clients
pub const SERVER_NAME: &str = "workflow-orchestrator";

/// MCP protocol revision spoken by the server
pub const PROTOCOL_VERSION: &str = "2024-11-05";
