//! Tool management module
//!
//! Exposes the tools of connected servers to the model under namespaced
//! names and routes the model's tool calls back to the owning server.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  ToolRegistry                                 │
//! │                                               │
//! │  - Registers servers in connection order      │
//! │  - Names tools `{server}_{tool}` for the LLM  │
//! │  - Resolves calls to (server, original name)  │
//! │  - Executes calls, producing result + marker  │
//! └───────────────────────────────────────────────┘
//!           │
//!           │ MCP (tools/list, tools/call)
//!           ▼
//! ┌───────────────────────────────────────────────┐
//! │  ToolServer (one per connected server)        │
//! └───────────────────────────────────────────────┘
//! ```

mod registry;

pub use registry::{namespaced_name, ToolExecution, ToolInfo, ToolRegistry};
