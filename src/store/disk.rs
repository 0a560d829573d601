// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Disk-backed artifact store.
//!
//! The artifact lives in `<root>/<key>.bin` with a JSON sidecar
//! `<root>/<key>.meta.json` recording the save time, size and sha256. Both
//! files are written to temporaries and renamed, metadata last, so `exists`
//! only reports true once the pair is complete.

use super::{ArtifactStore, StoreError, StoredArtifact};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactMeta {
    saved_at: DateTime<Utc>,
    size_bytes: u64,
    sha256: String,
}

pub struct DiskArtifactStore {
    root: PathBuf,
}

impl DiskArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.bin", key))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.meta.json", key))
    }

    fn persistence(err: impl std::fmt::Display) -> StoreError {
        StoreError::Persistence {
            reason: err.to_string(),
        }
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl ArtifactStore for DiskArtifactStore {
    async fn exists(&self, key: &str) -> bool {
        let blob = tokio::fs::try_exists(self.blob_path(key)).await;
        let meta = tokio::fs::try_exists(self.meta_path(key)).await;
        matches!((blob, meta), (Ok(true), Ok(true)))
    }

    async fn save(&self, key: &str, artifact: &[u8]) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(Self::persistence)?;

        let meta = ArtifactMeta {
            saved_at: Utc::now(),
            size_bytes: artifact.len() as u64,
            sha256: sha256_hex(artifact),
        };
        let meta_json = serde_json::to_vec_pretty(&meta).map_err(Self::persistence)?;

        let blob_path = self.blob_path(key);
        let meta_path = self.meta_path(key);
        let blob_tmp = blob_path.with_extension("bin.tmp");
        let meta_tmp = meta_path.with_extension("json.tmp");

        tokio::fs::write(&blob_tmp, artifact)
            .await
            .map_err(Self::persistence)?;
        tokio::fs::write(&meta_tmp, &meta_json)
            .await
            .map_err(Self::persistence)?;

        // Blob first, metadata last: a reader that sees the sidecar can trust
        // the blob beside it.
        tokio::fs::rename(&blob_tmp, &blob_path)
            .await
            .map_err(Self::persistence)?;
        tokio::fs::rename(&meta_tmp, &meta_path)
            .await
            .map_err(Self::persistence)?;

        debug!(
            key,
            size_bytes = meta.size_bytes,
            sha256 = %meta.sha256,
            "artifact persisted"
        );
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<StoredArtifact, StoreError> {
        let meta_raw = match tokio::fs::read(self.meta_path(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(Self::persistence(e)),
        };
        let meta: ArtifactMeta =
            serde_json::from_slice(&meta_raw).map_err(Self::persistence)?;

        let bytes = match tokio::fs::read(self.blob_path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(Self::persistence(e)),
        };

        if bytes.len() as u64 != meta.size_bytes || sha256_hex(&bytes) != meta.sha256 {
            warn!(key, "cached artifact failed integrity check");
            return Err(StoreError::Persistence {
                reason: format!("cached artifact under key {} is corrupt", key),
            });
        }

        Ok(StoredArtifact {
            bytes,
            saved_at: meta.saved_at,
        })
    }

    async fn saved_at(&self, key: &str) -> Result<DateTime<Utc>, StoreError> {
        let meta_raw = match tokio::fs::read(self.meta_path(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(Self::persistence(e)),
        };
        let meta: ArtifactMeta =
            serde_json::from_slice(&meta_raw).map_err(Self::persistence)?;
        Ok(meta.saved_at)
    }
}
