//! Subcommand implementations

pub mod httplog;
pub mod pprof;
pub mod slowlog;
pub mod summary;

use anyhow::{Context, Result};
use prism_analyzer::store::{ArtifactKind, InMemoryStore};
use prism_analyzer::{AnalysisService, AnalyzerConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Group assigned to artifacts loaded from the command line
const LOCAL_GROUP: &str = "local";

/// Read `path` into a fresh store. Returns the store and the entry id
/// (the file name unless `entry_id` overrides it).
pub async fn load_artifact(
    path: &Path,
    kind: ArtifactKind,
    entry_id: Option<&str>,
) -> Result<(Arc<InMemoryStore>, String)> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let id = match entry_id {
        Some(id) => id.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
    };

    info!("Loaded {} ({} bytes) as {} artifact {}", path.display(), data.len(), kind, id);

    let store = Arc::new(InMemoryStore::new(1));
    store
        .put(id.clone(), kind, LOCAL_GROUP, data)
        .context("Failed to store artifact")?;
    Ok((store, id))
}

/// Validate `config` and build a service over `store`
pub fn build_service(store: Arc<InMemoryStore>, config: AnalyzerConfig) -> Result<AnalysisService> {
    config.validate().context("Invalid configuration")?;
    Ok(AnalysisService::new(store, config))
}
