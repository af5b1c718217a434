//! Flat structured summary of a profile

use super::graph::ProfileGraph;
use prism_shared::types::pprof::{
    CallSite, ProfileMetadata, SampleSummary, StackTrace, StructuredProfile,
};

/// Map a decoded graph to the structured summary view.
///
/// Locations whose lines resolve to no known function are dropped from
/// `stack_traces`; samples are kept as-is and still reference them by id.
pub fn structured(graph: &ProfileGraph, profile_type: &str) -> StructuredProfile {
    let (period_type, period_unit) = graph
        .period_type
        .as_ref()
        .map(|vt| (vt.ty.clone(), vt.unit.clone()))
        .unwrap_or_default();

    let metadata = ProfileMetadata {
        profile_type: profile_type.to_string(),
        time_nanos: graph.time_nanos,
        duration: graph.duration_nanos,
        period: graph.period,
        period_type,
        period_unit,
    };

    let stack_traces = graph
        .locations
        .iter()
        .filter_map(|loc| {
            let call_stack: Vec<CallSite> = loc
                .lines
                .iter()
                .filter_map(|line| {
                    graph.function(line.function_id).map(|f| CallSite {
                        function: f.name.clone(),
                        filename: f.filename.clone(),
                        line: line.line,
                    })
                })
                .collect();

            (!call_stack.is_empty()).then(|| StackTrace {
                id: loc.id,
                address: loc.address,
                call_stack,
            })
        })
        .collect();

    let samples = graph
        .samples
        .iter()
        .map(|s| SampleSummary {
            location_ids: s.location_ids.clone(),
            values: s.values.clone(),
            labels: s.labels.clone(),
        })
        .collect();

    StructuredProfile {
        metadata,
        stack_traces,
        samples,
    }
}
