//! Demonstration MCP server exposing two tools: `roll_dice` and
//! `add_numbers`.
//!
//! The binary in `main.rs` wires configuration and logging; everything it
//! runs lives here so the dispatcher can be driven directly from tests.

pub mod core;
pub mod tools;
