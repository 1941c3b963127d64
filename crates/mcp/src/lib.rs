// MCP (Model Context Protocol) server for the Canopy content backend.
// Exposes branch, transaction and query tools to agent clients.

pub mod context;
pub mod protocol;
pub mod server;
pub mod tools;

pub use context::ToolContext;
pub use server::McpServer;
