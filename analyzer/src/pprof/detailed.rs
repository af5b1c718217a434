//! Lossless detailed view of a profile

use super::graph::{ProfileGraph, ValueType};
use prism_shared::types::pprof::{
    DetailedFunction, DetailedLine, DetailedLocation, DetailedMapping, DetailedProfile,
    DetailedSample, ValueTypeJson,
};

fn value_type(vt: &ValueType) -> ValueTypeJson {
    ValueTypeJson {
        ty: vt.ty.clone(),
        unit: vt.unit.clone(),
    }
}

/// Re-encode the whole graph with numeric id references
pub fn detailed(graph: &ProfileGraph) -> DetailedProfile {
    DetailedProfile {
        sample_type: graph.sample_types.iter().map(value_type).collect(),
        default_sample_type: graph.default_sample_type.clone(),
        sample: graph
            .samples
            .iter()
            .map(|s| DetailedSample {
                location: s.location_ids.clone(),
                value: s.values.clone(),
                label: s.labels.clone(),
                num_label: s.num_labels.clone(),
                num_unit: s.num_units.clone(),
            })
            .collect(),
        mapping: graph
            .mappings
            .iter()
            .map(|m| DetailedMapping {
                id: m.id,
                start: m.memory_start,
                limit: m.memory_limit,
                offset: m.file_offset,
                file: m.file.clone(),
                build_id: m.build_id.clone(),
                has_functions: m.has_functions,
                has_filenames: m.has_filenames,
                has_line_numbers: m.has_line_numbers,
                has_inline_frames: m.has_inline_frames,
            })
            .collect(),
        location: graph
            .locations
            .iter()
            .map(|l| DetailedLocation {
                id: l.id,
                mapping: l.mapping_id,
                address: l.address,
                line: l
                    .lines
                    .iter()
                    .map(|ln| DetailedLine {
                        function: ln.function_id,
                        line: ln.line,
                        column: ln.column,
                    })
                    .collect(),
                is_folded: l.is_folded,
            })
            .collect(),
        function: graph
            .functions
            .iter()
            .map(|f| DetailedFunction {
                id: f.id,
                name: f.name.clone(),
                system_name: f.system_name.clone(),
                filename: f.filename.clone(),
                start_line: f.start_line,
            })
            .collect(),
        comments: graph.comments.clone(),
        drop_frames: graph.drop_frames.clone(),
        keep_frames: graph.keep_frames.clone(),
        time_nanos: graph.time_nanos,
        duration_nanos: graph.duration_nanos,
        period_type: graph.period_type.as_ref().map(value_type),
        period: graph.period,
    }
}
