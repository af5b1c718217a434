//! Summary command implementation

use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use prism_analyzer::httplog::HttpLogAnalyzer;
use prism_analyzer::pprof::{self, report};
use prism_analyzer::slowlog::SlowLogAnalyzer;
use prism_analyzer::store::{ArtifactKind, ArtifactStore};
use prism_analyzer::AnalyzerConfig;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Artifact kind: pprof, httplog, or slowlog
    pub kind: ArtifactKind,

    /// Artifact file
    pub file: PathBuf,

    /// Slow threshold in seconds (defaults per kind)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Rows shown per section
    #[arg(short = 'n', long, default_value = "10")]
    pub top: usize,
}

pub async fn run(args: SummaryArgs) -> Result<()> {
    let (store, id) = super::load_artifact(&args.file, args.kind, None).await?;
    let data = store.get(&id).await?;

    let mut config = AnalyzerConfig::default();
    if let Some(threshold) = args.threshold {
        config.httplog_threshold = threshold;
        config.slowlog_threshold = threshold;
    }
    config.validate().context("Invalid configuration")?;

    match args.kind {
        ArtifactKind::Pprof => summarize_profile(&data, args.top),
        ArtifactKind::HttpLog => {
            summarize_access_log(&data, &config, args.top);
            Ok(())
        }
        ArtifactKind::SlowLog => summarize_slow_log(data, &config, args.top).await,
    }
}

fn summarize_profile(data: &[u8], top: usize) -> Result<()> {
    let graph = pprof::decode(data).context("Failed to decode profile")?;

    output::section("Profile");
    println!("  Duration:     {:.3}s", graph.duration_nanos as f64 / 1e9);
    for (i, st) in graph.sample_types.iter().enumerate() {
        println!("  Total {:<7} {} {}", format!("{}:", st.ty), graph.total_value(i), st.unit);
    }
    println!("  Samples:      {}", graph.samples.len());

    output::section("Hotspot Functions");
    for hs in report::function_hotspots(&graph, top) {
        println!(
            "  {} {:>12}  {} ({}:{})",
            output::percent(hs.percent),
            hs.value,
            hs.function.name,
            hs.function.filename,
            hs.function.start_line
        );
    }

    output::section("Hot Paths");
    for path in report::path_hotspots(&graph, top) {
        println!(
            "  {} {}",
            output::percent(path.percent),
            output::truncate(&path.frames.join(" → "), 120)
        );
    }
    Ok(())
}

fn summarize_access_log(data: &[u8], config: &AnalyzerConfig, top: usize) {
    let threshold = config.httplog_threshold;
    let report = HttpLogAnalyzer::from_config(config).analyze(data, threshold);

    let mut endpoints: Vec<_> = report.endpoint_stats.iter().collect();
    endpoints.sort_by(|a, b| b.1.total_time.total_cmp(&a.1.total_time));

    output::section("Endpoints by Total Time");
    println!(
        "  {:>8} {:>10} {:>10} {:>10}  {}",
        "COUNT", "TOTAL", "AVG", "MAX", "PATTERN"
    );
    for (pattern, stats) in endpoints.iter().take(top) {
        println!(
            "  {:>8} {} {} {}  {}",
            stats.count,
            output::seconds(stats.total_time, f64::INFINITY),
            output::seconds(stats.avg_time, threshold),
            output::seconds(stats.max_time, threshold),
            output::truncate(pattern, 80)
        );
    }

    output::section(&format!("Slow Requests (≥ {}s)", threshold));
    if report.slow_requests.is_empty() {
        output::info("No slow requests");
    }
    for req in report.slow_requests.iter().take(top) {
        println!(
            "  {} {:<6} {}  {}",
            output::seconds(req.req_time, threshold),
            req.method,
            output::truncate(&req.uri, 80),
            req.time
        );
    }
}

async fn summarize_slow_log(data: Vec<u8>, config: &AnalyzerConfig, top: usize) -> Result<()> {
    let analyzer = SlowLogAnalyzer::from_config(config);
    let threshold = analyzer.threshold();
    let report = analyzer.analyze(data).await.context("Failed to analyze slow log")?;

    if report.timed_out {
        output::warning(&format!(
            "Analysis stopped after {:?}; results are partial",
            analyzer.timeout()
        ));
    }

    output::section("Overview");
    println!("  Queries:    {}", report.total_queries);
    println!("  Total time: {:.3}s", report.total_time);

    output::section("Top Query Patterns");
    println!(
        "  {:>7} {:>10} {:>10} {:>10}  {}",
        "COUNT", "TOTAL", "AVG", "MAX", "PATTERN"
    );
    for stats in report.top_query_patterns.iter().take(top) {
        println!(
            "  {:>7} {} {} {}  {}",
            stats.count,
            output::seconds(stats.total_time, f64::INFINITY),
            output::seconds(stats.avg_time, threshold),
            output::seconds(stats.max_time, threshold),
            output::truncate(&stats.pattern, 80)
        );
    }

    output::section(&format!("Slowest Queries (≥ {}s)", threshold));
    if report.slowest_queries.is_empty() {
        output::info("No slow queries");
    }
    for q in report.slowest_queries.iter().take(top) {
        println!(
            "  {} {}@{}  {}",
            output::seconds(q.query_time, threshold),
            q.user,
            q.host,
            output::truncate(&q.query, 80)
        );
    }
    Ok(())
}
