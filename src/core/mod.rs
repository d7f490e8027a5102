//! Core Server Framework Module
//!
//! - config.rs: environment-driven server settings
//! - error.rs: configuration and tool error types
//! - protocol.rs: JSON-RPC 2.0 and MCP message types
//! - server.rs: tool registry, dispatcher, and STDIO/HTTP transports

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
