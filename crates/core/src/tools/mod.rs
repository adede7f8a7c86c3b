//! External utility invocation.
//!
//! The pipeline drives three utilities: an archive extractor, a tree
//! synchronizer and an image author. They are reached only through the
//! [`ToolInvoker`] trait so the engine can be exercised without them.

pub mod commands;
pub mod invoker;
pub mod preflight;
pub mod process;
pub mod scripted;

pub use commands::ToolCommands;
pub use invoker::{ToolError, ToolInvoker, ToolOutput, ToolRequest};
pub use process::ProcessToolInvoker;
pub use scripted::{ScriptedResponse, ScriptedToolInvoker};
