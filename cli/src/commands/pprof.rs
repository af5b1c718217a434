//! Pprof command implementation

use anyhow::{Context, Result};
use clap::Args;
use prism_analyzer::pprof::{self, ProfileFormat};
use prism_analyzer::store::{ArtifactKind, ArtifactStore};
use prism_analyzer::AnalyzerConfig;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct PprofArgs {
    /// Profile file (gzip-compressed or raw protobuf)
    pub file: PathBuf,

    /// Output view: structured, detailed, or report
    #[arg(short, long, default_value = "structured")]
    pub format: ProfileFormat,

    /// Profile label in the output (inferred from the entry id by default)
    #[arg(short = 't', long)]
    pub profile_type: Option<String>,

    /// Entry id recorded in the report (defaults to the file name)
    #[arg(long)]
    pub entry_id: Option<String>,
}

pub async fn run(args: PprofArgs) -> Result<()> {
    let (store, id) =
        super::load_artifact(&args.file, ArtifactKind::Pprof, args.entry_id.as_deref()).await?;

    let json = match &args.profile_type {
        Some(profile_type) => {
            let data = store.get(&id).await?;
            pprof::analyze(&data, args.format, profile_type, Some(&id))
        }
        None => {
            let service = super::build_service(store, AnalyzerConfig::default())?;
            service.analyze_pprof(&id, args.format).await
        }
    }
    .with_context(|| format!("Failed to analyze profile {}", args.file.display()))?;

    println!("{}", json);
    Ok(())
}
