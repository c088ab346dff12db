//! Tool catalog and HTTP runtime for the REST-to-MCP adapter.
//!
//! A tools document (one tool per API endpoint) is compiled into a [`catalog::ToolCatalog`];
//! [`runtime::ApiToolSource`] turns each tool call into a single HTTP request against the wrapped
//! API and relays the response as MCP content.

pub mod auth;
pub mod catalog;
pub mod config;
mod query;
pub mod runtime;
pub mod safety;
pub mod semantics;
pub mod validation;
