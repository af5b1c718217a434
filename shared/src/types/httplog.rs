//! Access-log report shapes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-endpoint timing and status statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStats {
    /// Number of requests
    pub count: u64,

    /// Sum of request times in seconds
    pub total_time: f64,

    /// `total_time / count`, filled in by [`EndpointStats::finalize`]
    pub avg_time: f64,

    /// Slowest request seen
    pub max_time: f64,

    /// Status code -> request count
    pub status_codes: BTreeMap<u16, u64>,
}

impl EndpointStats {
    /// Fold one request into the statistics
    pub fn record(&mut self, req_time: f64, status: u16) {
        self.count += 1;
        self.total_time += req_time;
        if req_time > self.max_time {
            self.max_time = req_time;
        }
        *self.status_codes.entry(status).or_insert(0) += 1;
    }

    /// Compute the average once all requests have been recorded
    pub fn finalize(&mut self) {
        self.avg_time = if self.count == 0 {
            0.0
        } else {
            self.total_time / self.count as f64
        };
    }
}

/// A request at or above the slow threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowRequest {
    pub time: String,
    pub uri: String,
    pub method: String,
    pub req_time: f64,
    pub host: String,
}

/// Result of analyzing one access log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpLogReport {
    /// Normalized URI pattern -> statistics
    pub endpoint_stats: BTreeMap<String, EndpointStats>,

    /// Slowest requests, descending by request time
    pub slow_requests: Vec<SlowRequest>,

    /// Whether operator matching groups were applied
    pub config_used: bool,
}
