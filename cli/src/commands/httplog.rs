//! Httplog command implementation

use anyhow::{Context, Result};
use clap::Args;
use prism_analyzer::config::DEFAULT_HTTPLOG_THRESHOLD;
use prism_analyzer::store::ArtifactKind;
use prism_analyzer::AnalyzerConfig;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct HttplogArgs {
    /// Access log with tab-separated key:value fields
    pub file: PathBuf,

    /// Requests at or above this many seconds are listed as slow
    #[arg(long, env = "PRISM_HTTPLOG_THRESHOLD", default_value_t = DEFAULT_HTTPLOG_THRESHOLD)]
    pub threshold: f64,

    /// ALP config with matching_groups (defaults to data/alp.yml)
    #[arg(long, env = "PRISM_ALP_CONFIG")]
    pub alp_config: Option<PathBuf>,
}

pub async fn run(args: HttplogArgs) -> Result<()> {
    let (store, id) = super::load_artifact(&args.file, ArtifactKind::HttpLog, None).await?;

    let config = AnalyzerConfig {
        httplog_threshold: args.threshold,
        alp_config: args.alp_config,
        ..AnalyzerConfig::default()
    };
    let service = super::build_service(store, config)?;

    let json = service
        .analyze_httplog(&id)
        .await
        .with_context(|| format!("Failed to analyze access log {}", args.file.display()))?;

    println!("{}", json);
    Ok(())
}
