// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model lifecycle: decides whether to serve the cached artifact or fetch a
//! fresh one, checks the remote freshness signal, and swaps the live handle
//! on update.
//!
//! State machine: `Unloaded -> Loading -> Ready`, with `update_available` as
//! a side channel that never changes the main state. One lifecycle operation
//! is in flight at a time; a competing `ensure_ready`/`apply_update` waits
//! for the first to settle instead of racing a second load against the same
//! artifact key.

use crate::model::{ModelHandle, ModelLoader};
use crate::remote::{RemoteError, RemoteSource};
use crate::store::ArtifactStore;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LifecycleError {
    /// No model could be obtained by any path. Fatal: no model, no service.
    #[error("failed to fetch model artifact: {0}")]
    Fetch(#[from] RemoteError),
    #[error("failed to load model: {reason}")]
    ModelLoad { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready,
}

/// Outcome of a freshness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCheck {
    pub update_available: bool,
}

struct LifecycleState {
    state: ModelState,
    handle: Option<ModelHandle>,
    /// Remote timestamp observed by the previous successful freshness fetch
    /// in this session. The first observation only records a baseline.
    last_seen_remote: Option<DateTime<Utc>>,
    update_available: bool,
}

pub struct ModelLifecycleManager {
    artifact_key: String,
    store: Option<Arc<dyn ArtifactStore>>,
    remote: Arc<dyn RemoteSource>,
    loader: Arc<dyn ModelLoader>,
    state: Arc<RwLock<LifecycleState>>,
    op_guard: Mutex<()>,
    next_generation: AtomicU64,
}

impl ModelLifecycleManager {
    /// `store` is the explicit persistence capability; `None` means the node
    /// runs network-only and never touches a cache.
    pub fn new(
        artifact_key: impl Into<String>,
        store: Option<Arc<dyn ArtifactStore>>,
        remote: Arc<dyn RemoteSource>,
        loader: Arc<dyn ModelLoader>,
    ) -> Self {
        Self {
            artifact_key: artifact_key.into(),
            store,
            remote,
            loader,
            state: Arc::new(RwLock::new(LifecycleState {
                state: ModelState::Unloaded,
                handle: None,
                last_seen_remote: None,
                update_available: false,
            })),
            op_guard: Mutex::new(()),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn has_persistence(&self) -> bool {
        self.store.is_some()
    }

    pub async fn state(&self) -> ModelState {
        self.state.read().await.state
    }

    pub async fn update_available(&self) -> bool {
        self.state.read().await.update_available
    }

    /// Returns the live handle, loading the model first if necessary.
    ///
    /// When already `Ready` this is idempotent and performs no I/O. Otherwise
    /// the artifact comes from the store when cached, or from the network
    /// (and is persisted and loaded back, so the in-memory handle matches the
    /// cached bytes exactly). Persistence failures degrade to network-only
    /// operation; only a model unobtainable by any path is an error.
    pub async fn ensure_ready(&self, model_locator: &str) -> Result<ModelHandle, LifecycleError> {
        if let Some(handle) = self.ready_handle().await {
            return Ok(handle);
        }

        let _op = self.op_guard.lock().await;
        // A competing call may have finished the load while we waited.
        if let Some(handle) = self.ready_handle().await {
            return Ok(handle);
        }

        self.state.write().await.state = ModelState::Loading;

        let bytes = match self.obtain_artifact(model_locator).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.state.write().await.state = ModelState::Unloaded;
                return Err(e);
            }
        };
        let handle = match self.build_handle(&bytes).await {
            Ok(handle) => handle,
            Err(e) => {
                self.state.write().await.state = ModelState::Unloaded;
                return Err(e);
            }
        };

        let mut state = self.state.write().await;
        state.handle = Some(handle.clone());
        state.state = ModelState::Ready;
        info!(
            key = %self.artifact_key,
            generation = handle.generation(),
            "model ready"
        );
        Ok(handle)
    }

    /// Compares the remote freshness signal against the cached artifact.
    ///
    /// Conservative: the first observation in a session only records a
    /// baseline and never reports an update. Afterwards an update is reported
    /// when the new remote timestamp is not older than the baseline and not
    /// older than the local save time. Any network or parse failure degrades
    /// silently to "no update" without changing state.
    pub async fn check_for_update(&self, freshness_locator: &str) -> UpdateCheck {
        let signal = match self.remote.fetch_freshness(freshness_locator).await {
            Ok(signal) => signal,
            Err(e) => {
                warn!(error = %e, "freshness check failed; assuming no update");
                return UpdateCheck {
                    update_available: false,
                };
            }
        };

        let saved_at = match &self.store {
            Some(store) => store.saved_at(&self.artifact_key).await.ok(),
            None => None,
        };

        let mut state = self.state.write().await;
        let available = match (state.last_seen_remote, saved_at) {
            (Some(baseline), Some(saved_at)) => {
                signal.last_updated >= baseline && signal.last_updated >= saved_at
            }
            _ => false,
        };
        state.last_seen_remote = Some(signal.last_updated);
        state.update_available = available;
        debug!(
            last_updated = %signal.last_updated,
            update_available = available,
            "freshness check complete"
        );
        UpdateCheck {
            update_available: available,
        }
    }

    /// Unconditionally fetches a fresh artifact, overwrites the cached copy,
    /// and swaps the live handle. The previous handle is released only after
    /// the new one is confirmed loaded, so there is never a window with no
    /// usable model.
    pub async fn apply_update(&self, model_locator: &str) -> Result<ModelHandle, LifecycleError> {
        let _op = self.op_guard.lock().await;
        info!(key = %self.artifact_key, "applying model update");

        let fetched = self.remote.fetch_artifact(model_locator).await?;
        let bytes = match &self.store {
            None => fetched,
            Some(store) => match store.save(&self.artifact_key, &fetched).await {
                Ok(()) => match store.load(&self.artifact_key).await {
                    Ok(stored) => stored.bytes,
                    Err(e) => {
                        warn!(error = %e, "load-back after update failed; serving fetched bytes");
                        fetched
                    }
                },
                Err(e) => {
                    warn!(error = %e, "update save rejected; serving fetched bytes");
                    fetched
                }
            },
        };

        let new_handle = self.build_handle(&bytes).await?;

        let previous = {
            let mut state = self.state.write().await;
            state.state = ModelState::Ready;
            state.update_available = false;
            state.handle.replace(new_handle.clone())
        };
        if let Some(previous) = previous {
            previous.dispose();
        }

        info!(
            key = %self.artifact_key,
            generation = new_handle.generation(),
            "model update applied"
        );
        Ok(new_handle)
    }

    /// Releases the live handle. Valid from any state; a no-op if nothing was
    /// ever loaded. Subsequent `ensure_ready` calls reload from scratch.
    pub async fn dispose(&self) {
        let mut state = self.state.write().await;
        if let Some(handle) = state.handle.take() {
            handle.dispose();
        }
        state.state = ModelState::Unloaded;
    }

    async fn ready_handle(&self) -> Option<ModelHandle> {
        let state = self.state.read().await;
        match state.state {
            ModelState::Ready => state.handle.clone(),
            _ => None,
        }
    }

    async fn obtain_artifact(&self, model_locator: &str) -> Result<Vec<u8>, LifecycleError> {
        let store = match &self.store {
            None => {
                info!("persistence capability absent; fetching artifact directly");
                return Ok(self.remote.fetch_artifact(model_locator).await?);
            }
            Some(store) => store,
        };

        if store.exists(&self.artifact_key).await {
            match store.load(&self.artifact_key).await {
                Ok(stored) => {
                    debug!(key = %self.artifact_key, "serving cached artifact");
                    return Ok(stored.bytes);
                }
                Err(e) => {
                    warn!(error = %e, "cached artifact unusable; refetching");
                }
            }
        }

        let fetched = self.remote.fetch_artifact(model_locator).await?;
        match store.save(&self.artifact_key, &fetched).await {
            Ok(()) => match store.load(&self.artifact_key).await {
                Ok(stored) => Ok(stored.bytes),
                Err(e) => {
                    warn!(error = %e, "load-back after save failed; serving fetched bytes");
                    Ok(fetched)
                }
            },
            Err(e) => {
                warn!(error = %e, "artifact save rejected; running network-only");
                Ok(fetched)
            }
        }
    }

    async fn build_handle(&self, bytes: &[u8]) -> Result<ModelHandle, LifecycleError> {
        let model = self
            .loader
            .load(bytes)
            .await
            .map_err(|e| LifecycleError::ModelLoad {
                reason: e.to_string(),
            })?;
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        Ok(ModelHandle::new(model, generation))
    }
}
