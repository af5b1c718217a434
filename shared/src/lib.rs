//! Shared types and utilities for Prism
//!
//! This crate contains the report shapes produced by the analysis engine and
//! consumed by the CLI and any serving layer in front of it.

pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::{httplog::*, pprof::*, slowlog::*};
