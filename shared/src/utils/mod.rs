//! Utility functions and helpers

use anyhow::{Context, Result};
use std::time::Duration;

/// Parse a duration string (e.g., "250ms", "30s", "5m", "1h").
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    let (num_str, unit_ms) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3_600_000)
    } else {
        (s, 1_000)
    };

    let value: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("invalid duration: {s:?}"))?;
    Ok(Duration::from_millis(value.saturating_mul(unit_ms)))
}
