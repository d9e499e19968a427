//! MCP Server Module
//!
//! Exposes the workflow engine as five tools over JSON-RPC on stdio.
//!
//! # Structure
//!
//! - [`protocol`]: JSON-RPC and tool message types
//! - [`tools`]: Tool catalogue and the router owning the engine
//! - [`stdio`]: Line-delimited transport loop

pub mod protocol;
pub mod stdio;
pub mod tools;

pub use stdio::StdioServer;
pub use tools::{tool_definitions, ToolName, ToolRouter};
