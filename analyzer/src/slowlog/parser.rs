//! Line-oriented MySQL slow-query log parser
//!
//! Each record is a block of `# Key: value` header lines followed by one
//! statement, possibly spanning several lines:
//!
//! ```text
//! # Time: 2024-01-01T00:00:00.123456Z
//! # User@Host: app[app] @ web-1 [10.0.0.5]  Id:    42
//! # Query_time: 1.000000  Lock_time: 0.000100 Rows_sent: 1  Rows_examined: 1000
//! use shop;
//! SET timestamp=1704067200;
//! SELECT * FROM orders WHERE id = 7;
//! ```
//!
//! A record is complete when the next header block starts or input ends.
//! Admin statements (`log_slow_admin_statements`) carry no statement line;
//! their `# administrator command: <cmd>;` header ends the record, with
//! `<cmd>` as the query.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static USER_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#\s*User@Host:\s*([^\[\s]*)\[([^\]]*)\]\s*@\s*(\S*)\s*\[([^\]]*)\]").unwrap()
});

static METRIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+):\s+(\S+)").unwrap());

static SET_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^SET\s+timestamp\s*=\s*(\d+)\s*;?$").unwrap());

static USE_DB: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^use\s+`?([^`;\s]+)`?\s*;?$").unwrap());

/// One completed slow-log record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlowLogEvent {
    pub ts: Option<DateTime<Utc>>,
    pub user: String,
    pub host: String,
    pub db: String,
    pub query: String,
    /// `*_time` header values in seconds
    pub time_metrics: HashMap<String, f64>,
    /// Other numeric header values
    pub number_metrics: HashMap<String, u64>,
}

impl SlowLogEvent {
    pub fn query_time(&self) -> f64 {
        self.time_metrics.get("Query_time").copied().unwrap_or(0.0)
    }

    pub fn lock_time(&self) -> f64 {
        self.time_metrics.get("Lock_time").copied().unwrap_or(0.0)
    }

    pub fn rows_sent(&self) -> u64 {
        self.number_metrics.get("Rows_sent").copied().unwrap_or(0)
    }

    pub fn rows_examined(&self) -> u64 {
        self.number_metrics.get("Rows_examined").copied().unwrap_or(0)
    }
}

/// Parse a `# Time:` value, RFC 3339 or the legacy `yymmdd hh:mm:ss` form
pub fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    let squeezed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&squeezed, "%y%m%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Lines the server writes at startup or log rotation
fn is_server_header(line: &str) -> bool {
    line.contains(", Version: ")
        || line.contains("started with:")
        || line.starts_with("Tcp port:")
        || (line.starts_with("Time ") && line.contains("Id Command"))
}

/// Incremental parser. Feed lines in order, then call [`finish`](Self::finish).
///
/// The current database carries over between records, since the server only
/// writes `use db;` when it changes.
#[derive(Debug, Default)]
pub struct SlowLogParser {
    current: SlowLogEvent,
    query_lines: Vec<String>,
    db: String,
    /// Set once an admin command header has closed the current record
    closed: bool,
}

impl SlowLogParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one line, returning the previous record if this line starts
    /// a new one
    pub fn feed_line(&mut self, line: &str) -> Option<SlowLogEvent> {
        let line = line.trim_end_matches('\r');
        let trimmed = line.trim();

        if trimmed.is_empty() || is_server_header(trimmed) {
            return None;
        }

        let is_header = trimmed.starts_with('#');
        let completed = if self.closed || (is_header && !self.query_lines.is_empty()) {
            self.take_event()
        } else {
            None
        };

        if is_header {
            self.parse_header(trimmed);
            return completed;
        }

        if self.query_lines.is_empty() {
            if let Some(caps) = USE_DB.captures(trimmed) {
                self.db = caps[1].to_string();
                self.current.db = self.db.clone();
                return completed;
            }
            if let Some(caps) = SET_TIMESTAMP.captures(trimmed) {
                if self.current.ts.is_none() {
                    self.current.ts = caps[1]
                        .parse::<i64>()
                        .ok()
                        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
                }
                return completed;
            }
        }

        self.query_lines.push(line.to_string());
        completed
    }

    /// Flush the record in progress at end of input
    pub fn finish(mut self) -> Option<SlowLogEvent> {
        self.take_event()
    }

    fn take_event(&mut self) -> Option<SlowLogEvent> {
        self.closed = false;
        let mut event = std::mem::take(&mut self.current);
        let query = std::mem::take(&mut self.query_lines).join("\n");
        event.query = query.trim().trim_end_matches(';').trim_end().to_string();
        if event.db.is_empty() {
            event.db = self.db.clone();
        }
        (!event.query.is_empty()).then_some(event)
    }

    fn parse_header(&mut self, line: &str) {
        let body = line.trim_start_matches('#').trim_start();

        if let Some(command) = body.strip_prefix("administrator command:") {
            self.query_lines = vec![command.trim().to_string()];
            self.closed = true;
            return;
        }

        if let Some(value) = body.strip_prefix("Time:") {
            self.current.ts = parse_time(value);
            return;
        }

        if body.starts_with("User@Host:") {
            if let Some(caps) = USER_HOST.captures(line) {
                let user = if caps[1].is_empty() { &caps[2] } else { &caps[1] };
                let host = if caps[3].is_empty() { &caps[4] } else { &caps[3] };
                self.current.user = user.to_string();
                self.current.host = host.to_string();
            }
            // Id / Thread_id may follow on the same line
            let rest = body.rsplit(']').next().unwrap_or("");
            self.parse_metrics(rest);
            return;
        }

        self.parse_metrics(body);
    }

    fn parse_metrics(&mut self, text: &str) {
        for caps in METRIC.captures_iter(text) {
            let (key, value) = (&caps[1], &caps[2]);
            if key == "Schema" {
                self.current.db = value.to_string();
                self.db = value.to_string();
            } else if key.ends_with("_time") {
                if let Ok(v) = value.parse::<f64>() {
                    self.current.time_metrics.insert(key.to_string(), v);
                }
            } else if let Ok(v) = value.parse::<u64>() {
                self.current.number_metrics.insert(key.to_string(), v);
            }
        }
    }
}

/// Parse a whole log, handing each record to `emit` in log order. Stops
/// early when `emit` returns `false`.
pub fn parse_events(content: &str, mut emit: impl FnMut(SlowLogEvent) -> bool) {
    let mut parser = SlowLogParser::new();
    for line in content.lines() {
        if let Some(event) = parser.feed_line(line) {
            if !emit(event) {
                return;
            }
        }
    }
    if let Some(event) = parser.finish() {
        emit(event);
    }
}

/// Collect every record of a log
pub fn parse_all(content: &str) -> Vec<SlowLogEvent> {
    let mut events = Vec::new();
    parse_events(content, |event| {
        events.push(event);
        true
    });
    events
}
