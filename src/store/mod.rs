// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persistent local cache for a single named model artifact.
//!
//! Holds at most one artifact per key; a later save overwrites the earlier
//! one. Saves are atomic from the caller's perspective: a concurrent reader
//! sees either the prior artifact or the fully written new one, never a
//! partial write.

pub mod disk;

pub use disk::DiskArtifactStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("artifact not found under key: {key}")]
    NotFound { key: String },
    #[error("persistence failure: {reason}")]
    Persistence { reason: String },
}

/// A cached artifact together with the moment it was persisted.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub bytes: Vec<u8>,
    pub saved_at: DateTime<Utc>,
}

/// Key/value persistence capability for the model artifact.
///
/// No concurrency guard beyond last-writer-wins; the lifecycle manager
/// serializes writers for a given key.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// True iff a complete artifact is present under `key`. Never errors; an
    /// unavailable medium reports `false`.
    async fn exists(&self, key: &str) -> bool;

    /// Persists `artifact` under `key`, overwriting any prior value.
    async fn save(&self, key: &str, artifact: &[u8]) -> Result<(), StoreError>;

    /// Loads the artifact under `key`, verifying its integrity.
    async fn load(&self, key: &str) -> Result<StoredArtifact, StoreError>;

    /// When the artifact under `key` was persisted.
    async fn saved_at(&self, key: &str) -> Result<DateTime<Utc>, StoreError>;
}
