//! Artifact store seam
//!
//! The analyzers take raw bytes; where those bytes come from is behind
//! [`ArtifactStore`]. [`InMemoryStore`] is the bundled implementation.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// What an artifact contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Pprof,
    HttpLog,
    SlowLog,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactKind::Pprof => "pprof",
            ArtifactKind::HttpLog => "httplog",
            ArtifactKind::SlowLog => "slowlog",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pprof" | "profile" => Ok(ArtifactKind::Pprof),
            "httplog" | "access" => Ok(ArtifactKind::HttpLog),
            "slowlog" | "slow" => Ok(ArtifactKind::SlowLog),
            _ => anyhow::bail!("Invalid artifact kind: {}", s),
        }
    }
}

/// Listing entry for a stored artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub id: String,
    pub kind: ArtifactKind,
    /// Collection run the artifact belongs to
    pub group: String,
    pub size: usize,
    pub stored_at_ns: i64,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Raw bytes of one artifact
    async fn get(&self, id: &str) -> Result<Vec<u8>, StoreError>;

    /// Artifacts of one kind (all kinds when `None`), oldest first
    async fn list(&self, kind: Option<ArtifactKind>) -> Result<Vec<ArtifactMeta>, StoreError>;

    /// Most recent artifact of `kind` in `group`
    async fn latest(&self, kind: ArtifactKind, group: &str) -> Result<ArtifactMeta, StoreError> {
        self.list(Some(kind))
            .await?
            .into_iter()
            .rev()
            .find(|meta| meta.group == group)
            .ok_or_else(|| StoreError::NoMatch {
                kind: kind.to_string(),
                group: group.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
struct StoredArtifact {
    meta: ArtifactMeta,
    payload: Vec<u8>,
}

/// Bounded in-memory store. Oldest artifacts are evicted at capacity.
#[derive(Debug)]
pub struct InMemoryStore {
    capacity: usize,
    artifacts: RwLock<VecDeque<StoredArtifact>>,
}

impl InMemoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            artifacts: RwLock::new(VecDeque::with_capacity(capacity.min(4096))),
        }
    }

    /// Store an artifact. An existing artifact with the same id is replaced
    /// and moves to the newest position.
    pub fn put(
        &self,
        id: impl Into<String>,
        kind: ArtifactKind,
        group: impl Into<String>,
        payload: Vec<u8>,
    ) -> Result<(), StoreError> {
        let stored_at_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        let artifact = StoredArtifact {
            meta: ArtifactMeta {
                id: id.into(),
                kind,
                group: group.into(),
                size: payload.len(),
                stored_at_ns,
            },
            payload,
        };

        let mut artifacts = self
            .artifacts
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        artifacts.retain(|a| a.meta.id != artifact.meta.id);
        artifacts.push_back(artifact);

        let mut evicted = 0u64;
        while artifacts.len() > self.capacity {
            artifacts.pop_front();
            evicted += 1;
        }

        crate::metrics::STORE_ARTIFACTS.set(artifacts.len() as f64);
        if evicted > 0 {
            crate::metrics::STORE_EVICTIONS.inc_by(evicted as f64);
            tracing::debug!(evicted, "store at capacity, dropped oldest artifacts");
        }
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let artifacts = self
            .artifacts
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(artifacts.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ArtifactStore for InMemoryStore {
    async fn get(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        let artifacts = self
            .artifacts
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        artifacts
            .iter()
            .find(|a| a.meta.id == id)
            .map(|a| a.payload.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self, kind: Option<ArtifactKind>) -> Result<Vec<ArtifactMeta>, StoreError> {
        let artifacts = self
            .artifacts
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(artifacts
            .iter()
            .filter(|a| kind.map_or(true, |k| a.meta.kind == k))
            .map(|a| a.meta.clone())
            .collect())
    }
}
