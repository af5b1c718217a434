//! CLI for Prism
//!
//! Reads a telemetry artifact from disk and prints its analysis:
//! - pprof: profile summary, detailed graph or hotspot report
//! - httplog: per-endpoint access-log statistics
//! - slowlog: MySQL slow-query patterns
//! - summary: colored digest of any of the above

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "prism")]
#[command(about = "Prism - telemetry artifact analyzer", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "PRISM_LOG_JSON")]
    log_json: bool,

    /// Dump Prometheus metrics to stderr when done
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a pprof profile
    Pprof(commands::pprof::PprofArgs),

    /// Aggregate a tab-separated access log
    Httplog(commands::httplog::HttplogArgs),

    /// Aggregate a MySQL slow-query log
    Slowlog(commands::slowlog::SlowlogArgs),

    /// Print a human-readable digest of an artifact
    Summary(commands::summary::SummaryArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = match cli.command {
        Commands::Pprof(args) => commands::pprof::run(args).await,
        Commands::Httplog(args) => commands::httplog::run(args).await,
        Commands::Slowlog(args) => commands::slowlog::run(args).await,
        Commands::Summary(args) => commands::summary::run(args).await,
    };

    if cli.metrics {
        eprint!("{}", prism_analyzer::metrics::encode_metrics());
    }

    if let Err(e) = result {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Reports go to stdout, so logs stay on stderr
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
