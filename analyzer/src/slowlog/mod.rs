//! Slow-query aggregator
//!
//! A blocking producer parses the log and feeds events into a bounded
//! channel. The consumer folds them into per-fingerprint statistics until
//! the channel closes or the deadline fires, whichever comes first. A fired
//! deadline finalizes whatever was consumed; it is never an error.

pub mod fingerprint;
pub mod parser;

use crate::config::{AnalyzerConfig, DEFAULT_SLOWLOG_THRESHOLD, DEFAULT_SLOWLOG_TIMEOUT};
use crate::error::{AnalyzeError, Result};
use crate::metrics;
use prism_shared::types::slowlog::{QueryStats, SlowLogReport, SlowQuery};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub use fingerprint::fingerprint;
pub use parser::{SlowLogEvent, SlowLogParser};

/// Bounded buffer between the parser and the aggregator
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Query patterns kept in the report
pub const MAX_PATTERNS: usize = 20;

/// Individual slow queries kept in the report
pub const MAX_SLOW_QUERIES: usize = 10;

/// Running totals owned by the consumer loop
#[derive(Debug)]
struct Aggregation {
    threshold: f64,
    patterns: HashMap<String, QueryStats>,
    slow_queries: Vec<SlowQuery>,
    total_queries: u64,
    total_time: f64,
}

impl Aggregation {
    fn new(threshold: f64) -> Self {
        Self {
            threshold,
            patterns: HashMap::new(),
            slow_queries: Vec::new(),
            total_queries: 0,
            total_time: 0.0,
        }
    }

    fn fold(&mut self, event: SlowLogEvent) {
        let query_time = event.query_time();
        let rows_examined = event.rows_examined();
        let rows_sent = event.rows_sent();

        self.patterns
            .entry(fingerprint(&event.query))
            .or_insert_with_key(|pattern| QueryStats::new(pattern.clone(), event.query.clone()))
            .record(query_time, rows_examined, rows_sent, event.ts);

        self.total_queries += 1;
        self.total_time += query_time;

        if query_time >= self.threshold {
            self.slow_queries.push(SlowQuery {
                time: event.ts,
                lock_time: event.lock_time(),
                user: event.user,
                host: event.host,
                db: event.db,
                query_time,
                rows_sent,
                rows_examined,
                query: event.query,
            });
        }
    }

    fn finish(self, timed_out: bool) -> SlowLogReport {
        let mut top_query_patterns: Vec<QueryStats> = self
            .patterns
            .into_values()
            .filter(|s| s.count > 0)
            .map(|mut s| {
                s.finalize();
                s
            })
            .collect();
        top_query_patterns.sort_by(|a, b| {
            b.total_time
                .total_cmp(&a.total_time)
                .then_with(|| a.pattern.cmp(&b.pattern))
        });
        top_query_patterns.truncate(MAX_PATTERNS);

        let mut slowest_queries = self.slow_queries;
        slowest_queries.sort_by(|a, b| b.query_time.total_cmp(&a.query_time));
        slowest_queries.truncate(MAX_SLOW_QUERIES);

        SlowLogReport {
            top_query_patterns,
            slowest_queries,
            total_queries: self.total_queries,
            total_time: self.total_time,
            timed_out,
        }
    }
}

/// Slow-query log analyzer
#[derive(Debug, Clone)]
pub struct SlowLogAnalyzer {
    threshold: f64,
    timeout: Duration,
}

impl Default for SlowLogAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SLOWLOG_THRESHOLD)
    }
}

impl SlowLogAnalyzer {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            timeout: DEFAULT_SLOWLOG_TIMEOUT,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.slowlog_threshold).with_timeout(config.slowlog_timeout)
    }

    /// Override the wall-clock deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Parse and aggregate a whole log
    pub async fn analyze(&self, content: Vec<u8>) -> Result<SlowLogReport> {
        let started = Instant::now();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let producer = tokio::task::spawn_blocking(move || {
            let text = String::from_utf8_lossy(&content);
            parser::parse_events(&text, |event| tx.blocking_send(event).is_ok());
        });

        let report = self.aggregate_events(rx).await;

        // On timeout the receiver is gone and the producer stops at its next send
        if !report.timed_out {
            if let Err(e) = producer.await {
                metrics::observe("slowlog", false, started);
                return Err(AnalyzeError::Producer(e.to_string()));
            }
        }

        metrics::observe("slowlog", true, started);
        Ok(report)
    }

    /// [`SlowLogAnalyzer::analyze`] serialized as pretty JSON
    pub async fn analyze_json(&self, content: Vec<u8>) -> Result<String> {
        let report = self.analyze(content).await?;
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Consume events until the channel closes or the deadline fires
    pub async fn aggregate_events(&self, mut rx: mpsc::Receiver<SlowLogEvent>) -> SlowLogReport {
        let mut agg = Aggregation::new(self.threshold);
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let timed_out = loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => agg.fold(event),
                    None => break false,
                },
                _ = &mut deadline => {
                    warn!(
                        "Slow log analysis timed out after {:?}, {} queries consumed",
                        self.timeout, agg.total_queries
                    );
                    metrics::SLOWLOG_TIMEOUTS.inc();
                    break true;
                }
            }
        };

        metrics::RECORDS_TOTAL
            .with_label_values(&["slowlog"])
            .inc_by(agg.total_queries as f64);
        debug!(
            queries = agg.total_queries,
            patterns = agg.patterns.len(),
            slow = agg.slow_queries.len(),
            timed_out,
            "aggregated slow log"
        );

        agg.finish(timed_out)
    }
}
