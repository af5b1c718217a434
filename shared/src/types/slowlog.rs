//! Slow-query log report shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregated statistics for one query fingerprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryStats {
    /// Fingerprinted SQL text
    pub pattern: String,
    pub count: u64,
    pub total_time: f64,
    pub avg_time: f64,
    pub max_time: f64,
    /// Starts at +inf and is only ever lowered
    pub min_time: f64,
    pub rows_examined: u64,
    pub rows_examined_avg: f64,
    pub rows_sent: u64,
    pub rows_sent_avg: f64,
    /// First raw query seen for this pattern
    pub example: String,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl QueryStats {
    pub fn new(pattern: String, example: String) -> Self {
        Self {
            pattern,
            count: 0,
            total_time: 0.0,
            avg_time: 0.0,
            max_time: 0.0,
            min_time: f64::INFINITY,
            rows_examined: 0,
            rows_examined_avg: 0.0,
            rows_sent: 0,
            rows_sent_avg: 0.0,
            example,
            first_seen: None,
            last_seen: None,
        }
    }

    /// Fold one execution into the totals. Events must arrive in log order
    /// for `first_seen`/`last_seen` to be meaningful.
    pub fn record(
        &mut self,
        query_time: f64,
        rows_examined: u64,
        rows_sent: u64,
        ts: Option<DateTime<Utc>>,
    ) {
        self.count += 1;
        self.total_time += query_time;
        if query_time > self.max_time {
            self.max_time = query_time;
        }
        if query_time < self.min_time {
            self.min_time = query_time;
        }
        self.rows_examined += rows_examined;
        self.rows_sent += rows_sent;

        if ts.is_some() {
            if self.first_seen.is_none() {
                self.first_seen = ts;
            }
            self.last_seen = ts;
        }
    }

    /// Compute averages from the accumulated totals
    pub fn finalize(&mut self) {
        if self.count == 0 {
            return;
        }
        let count = self.count as f64;
        self.avg_time = self.total_time / count;
        self.rows_examined_avg = self.rows_examined as f64 / count;
        self.rows_sent_avg = self.rows_sent as f64 / count;
    }
}

/// One query at or above the slow threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowQuery {
    pub time: Option<DateTime<Utc>>,
    pub user: String,
    pub host: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub db: String,
    pub query_time: f64,
    pub lock_time: f64,
    pub rows_sent: u64,
    pub rows_examined: u64,
    pub query: String,
}

/// Result of analyzing one slow-query log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlowLogReport {
    /// Patterns with the highest total time
    pub top_query_patterns: Vec<QueryStats>,

    /// Individual slowest queries
    pub slowest_queries: Vec<SlowQuery>,

    /// Events consumed (not just slow ones)
    pub total_queries: u64,

    /// Sum of query time over all consumed events
    pub total_time: f64,

    /// Set when the analysis deadline cut the stream short
    #[serde(skip)]
    pub timed_out: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_min_max_bounds() {
        let mut stats = QueryStats::new("select ?".to_string(), "select 1".to_string());
        assert_eq!(stats.min_time, f64::INFINITY);

        stats.record(1.0, 10, 1, None);
        stats.record(3.0, 30, 1, None);
        stats.record(2.0, 20, 1, None);
        stats.finalize();

        assert_eq!(stats.count, 3);
        assert_eq!(stats.min_time, 1.0);
        assert_eq!(stats.max_time, 3.0);
        assert_eq!(stats.avg_time, 2.0);
        assert_eq!(stats.rows_examined, 60);
        assert_eq!(stats.rows_examined_avg, 20.0);
        assert_eq!(stats.rows_sent_avg, 1.0);
    }

    #[test]
    fn test_seen_follows_encounter_order() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap();

        let mut stats = QueryStats::new("p".to_string(), "q".to_string());
        stats.record(0.1, 0, 0, Some(t1));
        stats.record(0.1, 0, 0, None);
        stats.record(0.1, 0, 0, Some(t2));

        assert_eq!(stats.first_seen, Some(t1));
        assert_eq!(stats.last_seen, Some(t2));
    }

    #[test]
    fn test_slow_query_omits_empty_db() {
        let q = SlowQuery {
            time: None,
            user: "root".to_string(),
            host: "localhost".to_string(),
            db: String::new(),
            query_time: 1.0,
            lock_time: 0.0,
            rows_sent: 0,
            rows_examined: 0,
            query: "select 1".to_string(),
        };
        let json = serde_json::to_value(&q).unwrap();
        assert!(json.get("db").is_none());
        assert_eq!(json["query_time"], 1.0);
    }

    #[test]
    fn test_report_does_not_serialize_timeout_flag() {
        let report = SlowLogReport {
            timed_out: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("timed_out").is_none());
        assert_eq!(json["total_queries"], 0);
    }
}
