//! Workflow Execution Module
//!
//! Provides the orchestration engine that sequences parsing, state and
//! prompt building into the operations exposed to the calling model.
//!
//! # Architecture
//!
//! - [`engine`]: The five workflow operations over a single session state
//! - [`report`]: Operation inputs and serializable results

pub mod engine;
pub mod report;

pub use engine::Engine;
pub use report::{
    AdvanceSummary, AssertionReport, FailureSummary, LoadSummary, ReportResponse, ResetSummary,
    StepPrompt, StepReport, StepSummary,
};
