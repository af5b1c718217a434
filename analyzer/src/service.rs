//! Analysis service: fetch an artifact, run the matching analyzer, return JSON

use crate::config::AnalyzerConfig;
use crate::error::{Result, StoreError};
use crate::httplog::HttpLogAnalyzer;
use crate::pprof::{self, ProfileFormat};
use crate::slowlog::SlowLogAnalyzer;
use crate::store::{ArtifactKind, ArtifactStore};
use std::sync::Arc;
use tracing::info;

/// Profile label derived from an entry id (`cpu`, `heap`, else `unknown`)
pub fn infer_profile_type(entry_id: &str) -> &'static str {
    if entry_id.contains("cpu") {
        "cpu"
    } else if entry_id.contains("heap") {
        "heap"
    } else {
        "unknown"
    }
}

pub struct AnalysisService {
    store: Arc<dyn ArtifactStore>,
    config: AnalyzerConfig,
    httplog: HttpLogAnalyzer,
    slowlog: SlowLogAnalyzer,
}

impl AnalysisService {
    /// Build the analyzers from `config`. The ALP pattern file is read here,
    /// once, not per analysis.
    pub fn new(store: Arc<dyn ArtifactStore>, config: AnalyzerConfig) -> Self {
        let httplog = HttpLogAnalyzer::from_config(&config);
        let slowlog = SlowLogAnalyzer::from_config(&config);
        Self {
            store,
            config,
            httplog,
            slowlog,
        }
    }

    /// Replace the access-log analyzer (e.g. with explicit patterns)
    pub fn with_httplog_analyzer(mut self, analyzer: HttpLogAnalyzer) -> Self {
        self.httplog = analyzer;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Pick an entry of `kind` in `group`: `entry_id` when given and present
    /// in the group, otherwise the most recent one
    pub async fn resolve(
        &self,
        kind: ArtifactKind,
        group: &str,
        entry_id: Option<&str>,
    ) -> Result<String> {
        let Some(id) = entry_id else {
            return Ok(self.store.latest(kind, group).await?.id);
        };
        self.store
            .list(Some(kind))
            .await?
            .into_iter()
            .find(|meta| meta.group == group && meta.id == id)
            .map(|meta| meta.id)
            .ok_or_else(|| {
                StoreError::NoMatch {
                    kind: kind.to_string(),
                    group: group.to_string(),
                }
                .into()
            })
    }

    pub async fn analyze_pprof(&self, entry_id: &str, format: ProfileFormat) -> Result<String> {
        let data = self.store.get(entry_id).await?;
        let profile_type = infer_profile_type(entry_id);
        info!(entry_id, profile_type, ?format, "analyzing profile");
        pprof::analyze(&data, format, profile_type, Some(entry_id))
    }

    pub async fn analyze_httplog(&self, entry_id: &str) -> Result<String> {
        let data = self.store.get(entry_id).await?;
        info!(entry_id, threshold = self.config.httplog_threshold, "analyzing access log");
        self.httplog
            .analyze_json(&data, self.config.httplog_threshold)
    }

    pub async fn analyze_slowlog(&self, entry_id: &str) -> Result<String> {
        let data = self.store.get(entry_id).await?;
        info!(entry_id, threshold = self.slowlog.threshold(), "analyzing slow log");
        self.slowlog.analyze_json(data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_profile_type() {
        assert_eq!(infer_profile_type("cpu-20240101"), "cpu");
        assert_eq!(infer_profile_type("run-3/heap.pb.gz"), "heap");
        assert_eq!(infer_profile_type("goroutine-1"), "unknown");
    }
}
