//! Error types for the analysis engine
//!
//! Only decode and final-encode failures reach callers of the analyzers.
//! Per-line and per-field problems in text logs degrade to empty/zero values,
//! and a slow-log deadline truncates the result instead of failing it.

use thiserror::Error;

/// Malformed binary profile. Fatal to the call, no partial output.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("empty profile data")]
    Empty,

    #[error("gzip decompression failed: {0}")]
    Gzip(#[source] std::io::Error),

    #[error("protobuf decoding failed: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("string table is empty or does not start with \"\"")]
    StringTable,

    #[error("string index {index} out of range (table has {len} entries)")]
    StringIndex { index: i64, len: usize },
}

/// Operator pattern configuration could not be used
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no pattern config found (tried: {0})")]
    NotFound(String),

    #[error("failed to read pattern config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("invalid analyzer config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("artifact {0} not found")]
    NotFound(String),

    #[error("no {kind} artifact for group {group}")]
    NoMatch { kind: String, group: String },

    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("log producer failed: {0}")]
    Producer(String),
}

pub type Result<T, E = AnalyzeError> = std::result::Result<T, E>;
