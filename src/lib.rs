//! MCP server exposing command-line utilities and REST APIs as tools.
//!
//! Every tool is a declarative [`adapter::ToolSpec`]; one adapter validates
//! arguments, builds an argv pipeline or HTTP request, runs it under a
//! timeout and maps the result to a canonical `{ok, data, error}` outcome.
//! Tools are served over JSON-RPC 2.0 stdio transport.

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod toolbox;

pub mod schema;
