//! Access-log aggregator
//!
//! Input is LTSV-style text: one request per line, `key:value` fields
//! separated by tabs. Two independent passes run over the same lines, one
//! grouping requests by normalized endpoint and one collecting slow requests.

pub mod pattern;

use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::metrics;
use prism_shared::types::httplog::{EndpointStats, HttpLogReport, SlowRequest};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

pub use pattern::{normalize_numeric, UriPatterns};

/// Slow requests kept in the report
pub const MAX_SLOW_REQUESTS: usize = 10;

/// Value of the first field starting with `prefix`, or `""`
pub fn extract_field<'a>(fields: &[&'a str], prefix: &str) -> &'a str {
    fields
        .iter()
        .find_map(|field| field.strip_prefix(prefix))
        .unwrap_or("")
}

/// One parsed access-log line. Missing or unparsable fields degrade to
/// empty strings and zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord<'a> {
    pub time: &'a str,
    pub uri: &'a str,
    pub method: &'a str,
    pub req_time: f64,
    pub status: u16,
    pub vhost: &'a str,
}

impl<'a> LogRecord<'a> {
    pub fn parse(line: &'a str) -> Self {
        let fields: Vec<&str> = line.split('\t').collect();
        let req_time = extract_field(&fields, "reqtime:")
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .unwrap_or(0.0);

        Self {
            time: extract_field(&fields, "time:"),
            uri: extract_field(&fields, "uri:"),
            method: extract_field(&fields, "method:"),
            req_time,
            status: extract_field(&fields, "status:").trim().parse().unwrap_or(0),
            vhost: extract_field(&fields, "vhost:"),
        }
    }
}

fn records(content: &str) -> impl Iterator<Item = LogRecord<'_>> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(LogRecord::parse)
}

/// Access-log analyzer holding the compiled operator patterns
#[derive(Debug, Clone, Default)]
pub struct HttpLogAnalyzer {
    patterns: UriPatterns,
}

impl HttpLogAnalyzer {
    /// Analyzer using only the numeric-id normalization
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patterns(patterns: UriPatterns) -> Self {
        Self { patterns }
    }

    /// Build from the configured ALP pattern file. A missing or unreadable
    /// file is logged and the default normalization is used.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        match config.load_alp_config() {
            Ok(alp) => Self::with_patterns(UriPatterns::compile(&alp)),
            Err(e) => {
                warn!("Failed to load ALP config, using default URI patterns: {}", e);
                Self::new()
            }
        }
    }

    pub fn config_used(&self) -> bool {
        !self.patterns.is_empty()
    }

    /// Group requests by normalized endpoint
    pub fn endpoint_stats(&self, content: &str) -> BTreeMap<String, EndpointStats> {
        let mut stats: BTreeMap<String, EndpointStats> = BTreeMap::new();
        for record in records(content) {
            stats
                .entry(self.patterns.normalize(record.uri))
                .or_default()
                .record(record.req_time, record.status);
        }
        for s in stats.values_mut() {
            s.finalize();
        }
        stats
    }

    /// Run both passes over one log
    pub fn analyze(&self, content: &[u8], threshold: f64) -> HttpLogReport {
        let started = Instant::now();
        let text = String::from_utf8_lossy(content);

        let endpoint_stats = self.endpoint_stats(&text);
        let mut slow_requests = slow_requests(&text, threshold);
        slow_requests.truncate(MAX_SLOW_REQUESTS);

        let lines = records(&text).count();
        metrics::RECORDS_TOTAL
            .with_label_values(&["httplog"])
            .inc_by(lines as f64);
        metrics::observe("httplog", true, started);
        debug!(
            lines,
            endpoints = endpoint_stats.len(),
            slow = slow_requests.len(),
            "analyzed access log"
        );

        HttpLogReport {
            endpoint_stats,
            slow_requests,
            config_used: self.config_used(),
        }
    }

    /// [`HttpLogAnalyzer::analyze`] serialized as pretty JSON
    pub fn analyze_json(&self, content: &[u8], threshold: f64) -> Result<String> {
        Ok(serde_json::to_string_pretty(
            &self.analyze(content, threshold),
        )?)
    }
}

/// Requests with `req_time >= threshold`, slowest first. Equal times keep
/// log order.
pub fn slow_requests(content: &str, threshold: f64) -> Vec<SlowRequest> {
    let mut slow: Vec<SlowRequest> = records(content)
        .filter(|r| r.req_time >= threshold)
        .map(|r| SlowRequest {
            time: r.time.to_string(),
            uri: r.uri.to_string(),
            method: r.method.to_string(),
            req_time: r.req_time,
            host: r.vhost.to_string(),
        })
        .collect();
    slow.sort_by(|a, b| b.req_time.total_cmp(&a.req_time));
    slow
}
