//! Expose a REST API as MCP tools.
//!
//! The binary loads `config.json` and the generated `tools.json`, then serves every tool over
//! MCP streamable HTTP. The same pieces are exported here so tests can run the server in-process.

pub mod config;
pub mod error;
pub mod server;

pub use config::AdapterConfig;
pub use error::{AdapterError, Result};
pub use server::{BridgeServer, router, serve};
