//! Slowlog command implementation

use anyhow::{Context, Result};
use clap::Args;
use prism_analyzer::config::DEFAULT_SLOWLOG_THRESHOLD;
use prism_analyzer::store::ArtifactKind;
use prism_analyzer::AnalyzerConfig;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SlowlogArgs {
    /// MySQL slow-query log
    pub file: PathBuf,

    /// Queries at or above this many seconds are listed as slow
    #[arg(long, env = "PRISM_SLOWLOG_THRESHOLD", default_value_t = DEFAULT_SLOWLOG_THRESHOLD)]
    pub threshold: f64,

    /// Analysis deadline (e.g., "30s", "2m"); defaults to PRISM_SLOWLOG_TIMEOUT_SECS or 30s
    #[arg(long)]
    pub timeout: Option<String>,
}

fn analyzer_config(args: &SlowlogArgs) -> Result<AnalyzerConfig> {
    let mut config = AnalyzerConfig {
        slowlog_threshold: args.threshold,
        ..AnalyzerConfig::default()
    };
    if let Some(timeout) = &args.timeout {
        config.slowlog_timeout =
            prism_shared::utils::parse_duration(timeout).context("Failed to parse timeout")?;
    }
    Ok(config)
}

pub async fn run(args: SlowlogArgs) -> Result<()> {
    let config = analyzer_config(&args)?;

    let (store, id) = super::load_artifact(&args.file, ArtifactKind::SlowLog, None).await?;

    let service = super::build_service(store, config)?;

    let json = service
        .analyze_slowlog(&id)
        .await
        .with_context(|| format!("Failed to analyze slow log {}", args.file.display()))?;

    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::time::Duration;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SlowlogArgs,
    }

    fn parse(argv: &[&str]) -> SlowlogArgs {
        TestCli::parse_from(std::iter::once("prism").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_timeout_defaults_to_config() {
        let config = analyzer_config(&parse(&["slow.log"])).unwrap();
        assert_eq!(config.slowlog_timeout, AnalyzerConfig::default().slowlog_timeout);
    }

    #[test]
    fn test_timeout_flag_overrides_config() {
        let config = analyzer_config(&parse(&["slow.log", "--timeout", "2m"])).unwrap();
        assert_eq!(config.slowlog_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        assert!(analyzer_config(&parse(&["slow.log", "--timeout", "soon"])).is_err());
    }
}
