// Tool layer - exposes the drive service to a tool-calling agent over MCP stdio.

#[path = "tool_models.rs"]
pub mod models;

#[path = "drive_tools.rs"]
pub mod drive_tools;

#[path = "mcp_server.rs"]
pub mod server;
