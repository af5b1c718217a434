//! Report data structures
//!
//! One module per artifact class. Every JSON shape the engine emits is an
//! explicit struct here, so the schema can be tested apart from the analysis.

pub mod httplog;
pub mod pprof;
pub mod slowlog;
