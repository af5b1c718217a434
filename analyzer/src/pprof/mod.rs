//! Profile decoder and reporter
//!
//! Decodes a pprof snapshot (gzip-compressed or raw protobuf) into a
//! [`ProfileGraph`] and renders one of three views:
//!
//! - **structured**: flat metadata / stack traces / samples summary
//! - **detailed**: lossless graph with numeric id references
//! - **report**: ranked text hotspot report in a small JSON envelope
//!
//! Every view is a pure mapping from the decoded graph; nothing is shared
//! between calls.

pub mod detailed;
pub mod graph;
pub mod proto;
pub mod report;
pub mod summary;

use crate::error::{DecodeError, Result};
use crate::metrics;
use prism_shared::types::pprof::{DetailedProfile, ProfileReport, StructuredProfile};
use std::time::Instant;
use tracing::debug;

pub use graph::ProfileGraph;

/// Which view of a profile to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileFormat {
    #[default]
    Structured,
    Detailed,
    Report,
}

impl std::str::FromStr for ProfileFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structured" | "json" => Ok(ProfileFormat::Structured),
            "detailed" => Ok(ProfileFormat::Detailed),
            "report" | "text" => Ok(ProfileFormat::Report),
            _ => anyhow::bail!("Invalid profile format: {}", s),
        }
    }
}

/// Decode a snapshot, recording the outcome in metrics
pub fn decode(data: &[u8]) -> Result<ProfileGraph, DecodeError> {
    let started = Instant::now();
    let result = ProfileGraph::decode(data);
    metrics::observe("pprof", result.is_ok(), started);

    if let Ok(graph) = &result {
        metrics::RECORDS_TOTAL
            .with_label_values(&["pprof"])
            .inc_by(graph.samples.len() as f64);
        debug!(
            samples = graph.samples.len(),
            locations = graph.locations.len(),
            functions = graph.functions.len(),
            "decoded profile"
        );
    }
    result
}

/// Structured summary of a snapshot
pub fn structured_summary(data: &[u8], profile_type: &str) -> Result<StructuredProfile, DecodeError> {
    let graph = decode(data)?;
    Ok(summary::structured(&graph, profile_type))
}

/// Full detailed graph of a snapshot
pub fn detailed_graph(data: &[u8]) -> Result<DetailedProfile, DecodeError> {
    let graph = decode(data)?;
    Ok(detailed::detailed(&graph))
}

/// Human-readable hotspot report
pub fn hotspot_report(data: &[u8]) -> Result<String, DecodeError> {
    let graph = decode(data)?;
    Ok(report::render(&graph))
}

/// Produce the requested view serialized as pretty JSON
pub fn analyze(
    data: &[u8],
    format: ProfileFormat,
    profile_type: &str,
    entry_id: Option<&str>,
) -> Result<String> {
    let json = match format {
        ProfileFormat::Structured => {
            serde_json::to_string_pretty(&structured_summary(data, profile_type)?)?
        }
        ProfileFormat::Detailed => serde_json::to_string_pretty(&detailed_graph(data)?)?,
        ProfileFormat::Report => {
            let envelope = ProfileReport::text(profile_type, entry_id, hotspot_report(data)?);
            serde_json::to_string_pretty(&envelope)?
        }
    };
    Ok(json)
}


#[cfg(test)]
mod tests {
    use super::testutil::{sample_profile, ProfileBuilder};
    use super::*;

    #[test]
    fn test_structured_summary_drops_empty_locations() {
        let data = sample_profile().encode_gzip();
        let out = structured_summary(&data, "cpu").unwrap();

        assert_eq!(out.metadata.profile_type, "cpu");
        assert_eq!(out.metadata.period, 10_000_000);
        assert_eq!(out.metadata.period_type, "cpu");
        assert_eq!(out.metadata.period_unit, "nanoseconds");
        assert_eq!(out.metadata.duration, 1_000_000_000);

        let ids: Vec<u64> = out.stack_traces.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let inlined = &out.stack_traces[1].call_stack;
        assert_eq!(inlined.len(), 2);
        assert_eq!(inlined[0].function, "compute");
        assert_eq!(inlined[0].filename, "compute.go");
        assert_eq!(inlined[0].line, 31);
        assert_eq!(inlined[1].function, "handler");

        assert_eq!(out.samples.len(), 2);
        assert_eq!(out.samples[0].location_ids, vec![2, 1]);
        assert_eq!(out.samples[0].values, vec![70, 700]);
    }

    #[test]
    fn test_raw_protobuf_is_accepted() {
        use prost::Message;
        let raw = sample_profile().build().encode_to_vec();
        let out = structured_summary(&raw, "heap").unwrap();
        assert_eq!(out.metadata.profile_type, "heap");
        assert_eq!(out.samples.len(), 2);
    }

    #[test]
    fn test_unresolved_function_is_not_a_call_site() {
        let data = ProfileBuilder::new()
            .sample_type("cpu", "nanoseconds")
            .function(1, "main", "main.go", 1)
            .location(1, &[(1, 2), (99, 3)])
            .location(2, &[(98, 1)])
            .sample(&[1], &[1])
            .encode_gzip();
        let out = structured_summary(&data, "cpu").unwrap();
        assert_eq!(out.stack_traces.len(), 1);
        assert_eq!(out.stack_traces[0].call_stack.len(), 1);
    }

    #[test]
    fn test_detailed_graph_keeps_everything() {
        let data = sample_profile().encode_gzip();
        let out = detailed_graph(&data).unwrap();

        assert_eq!(out.sample_type.len(), 2);
        assert_eq!(out.sample_type[1].ty, "cpu");
        assert_eq!(out.location.len(), 4);
        assert_eq!(out.function.len(), 3);
        assert_eq!(out.sample[0].location, vec![2, 1]);
        assert_eq!(out.location[1].line[0].function, 3);
        assert_eq!(out.location[1].line[1].function, 2);
        assert_eq!(out.function[2].start_line, 30);
        assert_eq!(out.period_type.as_ref().unwrap().unit, "nanoseconds");

        let json = serde_json::to_value(&out).unwrap();
        for key in [
            "sampleType",
            "sample",
            "location",
            "function",
            "timeNanos",
            "durationNanos",
            "periodType",
            "period",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_corrupt_bytes_produce_no_output() {
        for format in [
            ProfileFormat::Structured,
            ProfileFormat::Detailed,
            ProfileFormat::Report,
        ] {
            let err = analyze(b"invalid data", format, "cpu", None).unwrap_err();
            assert!(matches!(err, crate::error::AnalyzeError::Decode(_)));
        }
    }

    #[test]
    fn test_report_envelope() {
        let data = sample_profile().encode_gzip();
        let json = analyze(&data, ProfileFormat::Report, "cpu", Some("cpu-123")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["format"], "text");
        assert_eq!(value["profile_type"], "cpu");
        assert_eq!(value["entry_id"], "cpu-123");
        assert!(value["report"]
            .as_str()
            .unwrap()
            .starts_with("===== Profile Information Summary ====="));
    }

    #[test]
    fn test_profile_format_parse() {
        assert_eq!("report".parse::<ProfileFormat>().unwrap(), ProfileFormat::Report);
        assert_eq!("Detailed".parse::<ProfileFormat>().unwrap(), ProfileFormat::Detailed);
        assert_eq!("json".parse::<ProfileFormat>().unwrap(), ProfileFormat::Structured);
        assert!("flamegraph".parse::<ProfileFormat>().is_err());
    }
}
