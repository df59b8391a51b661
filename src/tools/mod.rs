//! Tool-call surface for agent orchestration layers.
//!
//! Tools are a fixed table of named operations with typed arguments
//! ([`ToolRequest`]) that run against an explicit [`Session`] and always
//! answer with a well-formed [`ToolResponse`]:
//!
//! ```
//! use loadset_engine::tools::Session;
//! use serde_json::json;
//!
//! let mut session = Session::new();
//! let response = session.call_tool("get_load_summary", &json!({}));
//! assert!(!response.success);
//! assert!(response.message.contains("No LoadSet loaded"));
//! ```
//!
//! The transport that carries these calls is not part of this crate.

pub mod protocol;
pub mod session;

pub use protocol::{tool_definitions, ToolDefinition, ToolRequest, ToolResponse};
pub use session::Session;
