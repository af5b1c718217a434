//! Profile report shapes
//!
//! Three views of one decoded profiling snapshot: a flattened structured
//! summary, a lossless detailed graph keyed by numeric ids, and a text report
//! wrapped in a small JSON envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Structured summary ──────────────────────────────────────────────────────

/// Flattened view of a profile, suitable for feeding to an LLM or a UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredProfile {
    pub metadata: ProfileMetadata,

    /// Locations that resolved to at least one function line
    pub stack_traces: Vec<StackTrace>,

    pub samples: Vec<SampleSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMetadata {
    /// Caller-supplied measurement label ("cpu", "heap", ...)
    pub profile_type: String,
    pub time_nanos: i64,
    pub duration: i64,
    pub period: i64,
    pub period_type: String,
    pub period_unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTrace {
    pub id: u64,
    pub address: u64,
    pub call_stack: Vec<CallSite>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub function: String,
    pub filename: String,
    pub line: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    #[serde(rename = "locationIDs")]
    pub location_ids: Vec<u64>,
    pub values: Vec<i64>,
    pub labels: BTreeMap<String, Vec<String>>,
}

// ── Detailed graph ──────────────────────────────────────────────────────────

/// Lossless re-encoding of the decoded graph. Cross references are numeric
/// ids rather than embedded objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedProfile {
    pub sample_type: Vec<ValueTypeJson>,
    pub default_sample_type: String,
    pub sample: Vec<DetailedSample>,
    pub mapping: Vec<DetailedMapping>,
    pub location: Vec<DetailedLocation>,
    pub function: Vec<DetailedFunction>,
    pub comments: Vec<String>,
    pub drop_frames: String,
    pub keep_frames: String,
    pub time_nanos: i64,
    pub duration_nanos: i64,
    pub period_type: Option<ValueTypeJson>,
    pub period: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTypeJson {
    #[serde(rename = "type")]
    pub ty: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedSample {
    /// Location ids, innermost frame first
    pub location: Vec<u64>,
    pub value: Vec<i64>,
    pub label: BTreeMap<String, Vec<String>>,
    pub num_label: BTreeMap<String, Vec<i64>>,
    pub num_unit: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedMapping {
    pub id: u64,
    pub start: u64,
    pub limit: u64,
    pub offset: u64,
    pub file: String,
    pub build_id: String,
    pub has_functions: bool,
    pub has_filenames: bool,
    pub has_line_numbers: bool,
    pub has_inline_frames: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedLocation {
    pub id: u64,
    /// Mapping id, 0 when the location has no mapping
    pub mapping: u64,
    pub address: u64,
    pub line: Vec<DetailedLine>,
    pub is_folded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedLine {
    pub function: u64,
    pub line: i64,
    pub column: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedFunction {
    pub id: u64,
    pub name: String,
    pub system_name: String,
    pub filename: String,
    pub start_line: i64,
}

// ── Text report envelope ────────────────────────────────────────────────────

/// Hotspot text report as returned to tool callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub format: String,
    pub profile_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    pub report: String,
}

impl ProfileReport {
    pub fn text(profile_type: &str, entry_id: Option<&str>, report: String) -> Self {
        Self {
            format: "text".to_string(),
            profile_type: profile_type.to_string(),
            entry_id: entry_id.map(str::to_string),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_summary_field_names() {
        let sample = SampleSummary {
            location_ids: vec![1, 2],
            values: vec![10],
            labels: BTreeMap::new(),
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["locationIDs"], serde_json::json!([1, 2]));
        assert_eq!(json["values"], serde_json::json!([10]));
    }

    #[test]
    fn test_report_envelope_omits_missing_entry_id() {
        let report = ProfileReport::text("cpu", None, "body".to_string());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["format"], "text");
        assert_eq!(json["profile_type"], "cpu");
        assert!(json.get("entry_id").is_none());

        let report = ProfileReport::text("heap", Some("heap-1"), String::new());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entry_id"], "heap-1");
    }

    #[test]
    fn test_value_type_uses_type_key() {
        let vt = ValueTypeJson {
            ty: "cpu".to_string(),
            unit: "nanoseconds".to_string(),
        };
        let json = serde_json::to_string(&vt).unwrap();
        assert_eq!(json, r#"{"type":"cpu","unit":"nanoseconds"}"#);
    }

    #[test]
    fn test_metadata_camel_case() {
        let meta = ProfileMetadata {
            profile_type: "cpu".to_string(),
            time_nanos: 1,
            duration: 2,
            period: 3,
            period_type: "cpu".to_string(),
            period_unit: "nanoseconds".to_string(),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["profileType"], "cpu");
        assert_eq!(json["timeNanos"], 1);
        assert_eq!(json["periodUnit"], "nanoseconds");
    }
}
