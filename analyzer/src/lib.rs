//! Telemetry artifact analysis engine
//!
//! Three independent analyzers turn raw artifacts into JSON reports:
//!
//! - [`pprof`]: pprof profile decoder and hotspot reporter
//! - [`httplog`]: tab-separated access-log aggregator
//! - [`slowlog`]: MySQL slow-query log aggregator (streaming, with a deadline)
//!
//! [`service::AnalysisService`] wires them to an [`store::ArtifactStore`].

pub mod config;
pub mod error;
pub mod httplog;
pub mod metrics;
pub mod pprof;
pub mod service;
pub mod slowlog;
pub mod store;

pub use config::AnalyzerConfig;
pub use error::{AnalyzeError, Result};
pub use service::AnalysisService;
