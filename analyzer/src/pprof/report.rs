//! Ranked hotspot report
//!
//! Four fixed sections, always in this order:
//!
//! 1. profile summary (duration, period, sample types and their totals)
//! 2. top functions by cumulative primary value
//! 3. top call paths by sample value, outermost frame first
//! 4. generic bottleneck hints
//!
//! Percentages are relative to the sum of `values[0]` over all samples.

use super::graph::{Function, ProfileGraph};
use std::collections::HashMap;
use std::fmt::{self, Write};

/// Functions listed in the report
pub const TOP_FUNCTIONS: usize = 50;

/// Call paths listed in the report
pub const TOP_PATHS: usize = 50;

const HINTS: [&str; 4] = [
    "Focus on top functions (especially those consuming more than 10% of total resources)",
    "Deep call paths may indicate excessive recursion or library calls",
    "Consider optimizing functions that appear in multiple call paths",
    "Consider algorithm improvements, caching, and parallel processing for optimization",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionHotspot<'a> {
    pub function: &'a Function,
    pub value: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathHotspot<'a> {
    /// Function names, caller first
    pub frames: Vec<&'a str>,
    pub value: i64,
    pub percent: f64,
}

fn percent(value: i64, total: i64) -> f64 {
    if total > 0 {
        value as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Rank functions by cumulative primary value.
///
/// Every line of every resolved location in a sample credits its function
/// with the sample's value, so a function inlined or recursing N times in one
/// stack is credited N times. Sums saturate instead of wrapping. Ties break
/// by name, then id.
pub fn function_hotspots(graph: &ProfileGraph, limit: usize) -> Vec<FunctionHotspot<'_>> {
    let mut cumulative: HashMap<u64, i64> = HashMap::new();
    for sample in &graph.samples {
        let Some(value) = sample.primary_value() else {
            continue;
        };
        for loc in graph.sample_locations(sample) {
            for line in &loc.lines {
                let acc = cumulative.entry(line.function_id).or_insert(0);
                *acc = acc.saturating_add(value);
            }
        }
    }

    let total = graph.total_value(0);
    let mut ranked: Vec<FunctionHotspot<'_>> = cumulative
        .into_iter()
        .filter_map(|(id, value)| {
            let function = graph.function(id).filter(|f| !f.name.is_empty())?;
            Some(FunctionHotspot {
                function,
                value,
                percent: percent(value, total),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.value
            .cmp(&a.value)
            .then_with(|| a.function.name.cmp(&b.function.name))
            .then_with(|| a.function.id.cmp(&b.function.id))
    });
    ranked.truncate(limit);
    ranked
}

/// Rank individual sample stacks by value. Each location contributes its
/// outermost inlined line. Ties keep sample order.
pub fn path_hotspots(graph: &ProfileGraph, limit: usize) -> Vec<PathHotspot<'_>> {
    let total = graph.total_value(0);
    let mut paths: Vec<PathHotspot<'_>> = graph
        .samples
        .iter()
        .filter_map(|sample| {
            let value = sample.primary_value()?;
            let frames: Vec<&str> = sample
                .location_ids
                .iter()
                .rev()
                .filter_map(|&id| graph.location(id))
                .filter_map(|loc| loc.lines.last())
                .filter_map(|line| graph.function(line.function_id))
                .map(|f| f.name.as_str())
                .collect();
            (!frames.is_empty()).then(|| PathHotspot {
                frames,
                value,
                percent: percent(value, total),
            })
        })
        .collect();

    paths.sort_by(|a, b| b.value.cmp(&a.value));
    paths.truncate(limit);
    paths
}

/// Render the full text report
pub fn render(graph: &ProfileGraph) -> String {
    let mut out = String::new();
    write_report(graph, &mut out).expect("writing to a String cannot fail");
    out
}

fn write_report(graph: &ProfileGraph, out: &mut impl Write) -> fmt::Result {
    writeln!(out, "===== Profile Information Summary =====")?;
    writeln!(out, "Duration: {} nanoseconds", graph.duration_nanos)?;
    if let Some(pt) = &graph.period_type {
        writeln!(out, "Period: {} {} ({})", graph.period, pt.ty, pt.unit)?;
    }
    if !graph.sample_types.is_empty() {
        let types = graph
            .sample_types
            .iter()
            .map(|st| format!("{} ({})", st.ty, st.unit))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "Sample Types: {types}")?;
        for (i, st) in graph.sample_types.iter().enumerate() {
            writeln!(out, "Total {}: {} {}", st.ty, graph.total_value(i), st.unit)?;
        }
    }
    writeln!(out)?;

    writeln!(out, "===== Top {TOP_FUNCTIONS} Hotspot Functions =====")?;
    for (rank, hs) in function_hotspots(graph, TOP_FUNCTIONS).iter().enumerate() {
        writeln!(
            out,
            "{}. {} ({}:{})",
            rank + 1,
            hs.function.name,
            hs.function.filename,
            hs.function.start_line
        )?;
        writeln!(out, "   Value: {} ({:.2}%)", hs.value, hs.percent)?;
        writeln!(out)?;
    }

    writeln!(out, "===== Important Call Paths =====")?;
    for (rank, path) in path_hotspots(graph, TOP_PATHS).iter().enumerate() {
        writeln!(
            out,
            "Path {} - Value: {} ({:.2}%)",
            rank + 1,
            path.value,
            path.percent
        )?;
        for (depth, name) in path.frames.iter().enumerate() {
            writeln!(out, "{}-> {}", "  ".repeat(depth), name)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "===== Bottleneck Analysis Hints =====")?;
    for (i, hint) in HINTS.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, hint)?;
    }
    Ok(())
}
