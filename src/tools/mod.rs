//! Tools Module
//!
//! Each tool lives in its own module exporting the pure function it wraps
//! and a `register` function that adds it to the registry at startup.

pub mod add;
pub mod dice;
