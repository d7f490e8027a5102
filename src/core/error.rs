//! Error types for server configuration and tool execution.

use thiserror::Error;

/// Errors raised while reading server configuration from the environment.
///
/// These are fatal at startup: the entry point logs them and exits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `MCP_TRANSPORT_MODE` is not one of the supported modes
    #[error("invalid transport mode '{0}', must be 'stdio', 'http', or 'both'")]
    InvalidTransport(String),

    /// A numeric variable could not be parsed
    #[error("invalid value for {key}: '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

/// Errors raised by a single tool invocation.
///
/// A tool error never reaches the transport as a JSON-RPC error; the
/// dispatcher renders it into a tool result with `isError: true`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    /// A required argument was not supplied
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// An argument was supplied with the wrong JSON type
    #[error("Invalid parameter: {name} must be {expected}")]
    InvalidParameter {
        name: &'static str,
        expected: &'static str,
    },

    /// The result buffer for this many dice could not be allocated
    #[error("cannot roll {0} dice: too many to hold in memory")]
    TooManyDice(i64),
}
