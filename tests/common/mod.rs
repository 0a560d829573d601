// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Mock collaborators shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edge_vision_node::{
    ArtifactStore, FreshnessSignal, LoadedModel, ModelLoader, RemoteError, RemoteSource,
    StoreError, StoredArtifact,
};
use ndarray::Array4;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Remote source serving a fixed artifact and a scriptable freshness signal.
pub struct MockRemote {
    artifact: Vec<u8>,
    freshness: Mutex<Option<DateTime<Utc>>>,
    artifact_fetches: AtomicUsize,
    freshness_fetches: AtomicUsize,
    fetch_delay_ms: u64,
}

impl MockRemote {
    pub fn new(artifact: impl Into<Vec<u8>>) -> Self {
        Self {
            artifact: artifact.into(),
            freshness: Mutex::new(None),
            artifact_fetches: AtomicUsize::new(0),
            freshness_fetches: AtomicUsize::new(0),
            fetch_delay_ms: 0,
        }
    }

    pub fn with_fetch_delay_ms(mut self, delay_ms: u64) -> Self {
        self.fetch_delay_ms = delay_ms;
        self
    }

    /// `None` makes the next freshness fetch fail like a dead network.
    pub fn set_freshness(&self, last_updated: Option<DateTime<Utc>>) {
        *self.freshness.lock().unwrap() = last_updated;
    }

    pub fn artifact_fetches(&self) -> usize {
        self.artifact_fetches.load(Ordering::SeqCst)
    }

    pub fn freshness_fetches(&self) -> usize {
        self.freshness_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for MockRemote {
    async fn fetch_artifact(&self, _locator: &str) -> Result<Vec<u8>, RemoteError> {
        if self.fetch_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.fetch_delay_ms)).await;
        }
        self.artifact_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.artifact.clone())
    }

    async fn fetch_freshness(&self, _locator: &str) -> Result<FreshnessSignal, RemoteError> {
        self.freshness_fetches.fetch_add(1, Ordering::SeqCst);
        match *self.freshness.lock().unwrap() {
            Some(last_updated) => Ok(FreshnessSignal { last_updated }),
            None => Err(RemoteError::Network("connection refused".to_string())),
        }
    }
}

/// Model returning scripted scores and recording the input shapes it saw.
pub struct ScriptedModel {
    scores: Vec<f32>,
    pub seen_shapes: Mutex<Vec<Vec<usize>>>,
}

impl LoadedModel for ScriptedModel {
    fn infer(&self, input: &Array4<f32>) -> anyhow::Result<Vec<f32>> {
        self.seen_shapes.lock().unwrap().push(input.shape().to_vec());
        Ok(self.scores.clone())
    }
}

/// Loader producing [`ScriptedModel`]s and counting loads.
pub struct ScriptedLoader {
    scores: Vec<f32>,
    loads: AtomicUsize,
    last_artifact: Mutex<Vec<u8>>,
}

impl ScriptedLoader {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            loads: AtomicUsize::new(0),
            last_artifact: Mutex::new(Vec::new()),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn last_artifact(&self) -> Vec<u8> {
        self.last_artifact.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelLoader for ScriptedLoader {
    async fn load(&self, artifact: &[u8]) -> anyhow::Result<Arc<dyn LoadedModel>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.last_artifact.lock().unwrap() = artifact.to_vec();
        Ok(Arc::new(ScriptedModel {
            scores: self.scores.clone(),
            seen_shapes: Mutex::new(Vec::new()),
        }))
    }
}

/// Counts every store call made through it, delegating to an inner store.
pub struct RecordingStore<S> {
    inner: S,
    calls: AtomicUsize,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: ArtifactStore> ArtifactStore for RecordingStore<S> {
    async fn exists(&self, key: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(key).await
    }

    async fn save(&self, key: &str, artifact: &[u8]) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.save(key, artifact).await
    }

    async fn load(&self, key: &str) -> Result<StoredArtifact, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.load(key).await
    }

    async fn saved_at(&self, key: &str) -> Result<DateTime<Utc>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.saved_at(key).await
    }
}

/// A medium that rejects every write, like disabled or over-quota storage.
pub struct RejectingStore;

#[async_trait]
impl ArtifactStore for RejectingStore {
    async fn exists(&self, _key: &str) -> bool {
        false
    }

    async fn save(&self, _key: &str, _artifact: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::Persistence {
            reason: "quota exceeded".to_string(),
        })
    }

    async fn load(&self, key: &str) -> Result<StoredArtifact, StoreError> {
        Err(StoreError::NotFound {
            key: key.to_string(),
        })
    }

    async fn saved_at(&self, key: &str) -> Result<DateTime<Utc>, StoreError> {
        Err(StoreError::NotFound {
            key: key.to_string(),
        })
    }
}
