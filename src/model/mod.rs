// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model seams: loading an opaque artifact into a runnable model, and the
//! shared handle the lifecycle manager serves to callers.

pub mod onnx;

use async_trait::async_trait;
use ndarray::Array4;
use std::sync::{Arc, RwLock};

/// A loaded, runnable model.
///
/// `infer` takes the prepared `[1, S, S, 3]` tensor and returns the flat
/// class-score vector, already extracted out of any native tensor form.
pub trait LoadedModel: Send + Sync {
    fn infer(&self, input: &Array4<f32>) -> anyhow::Result<Vec<f32>>;
}

/// Turns raw artifact bytes into a [`LoadedModel`].
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, artifact: &[u8]) -> anyhow::Result<Arc<dyn LoadedModel>>;
}

/// Shared handle to the live model.
///
/// Cheap to clone; all clones refer to the same underlying model and the same
/// prediction gate. Disposing the handle releases the model for every clone,
/// which is how an old handle is invalidated after an update swap.
#[derive(Clone)]
pub struct ModelHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    generation: u64,
    model: RwLock<Option<Arc<dyn LoadedModel>>>,
    prediction_gate: tokio::sync::Mutex<()>,
}

impl ModelHandle {
    pub(crate) fn new(model: Arc<dyn LoadedModel>, generation: u64) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                generation,
                model: RwLock::new(Some(model)),
                prediction_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Monotonic load counter; a reloaded model gets a new generation.
    pub fn generation(&self) -> u64 {
        self.inner.generation
    }

    pub fn is_ready(&self) -> bool {
        self.inner
            .model
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    pub(crate) fn model(&self) -> Option<Arc<dyn LoadedModel>> {
        self.inner.model.read().ok().and_then(|slot| slot.clone())
    }

    pub(crate) fn prediction_gate(&self) -> &tokio::sync::Mutex<()> {
        &self.inner.prediction_gate
    }

    /// Releases the underlying model. Idempotent; safe even if a load never
    /// completed. Subsequent predictions through this handle fail as
    /// not-ready.
    pub fn dispose(&self) {
        if let Ok(mut slot) = self.inner.model.write() {
            slot.take();
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("generation", &self.inner.generation)
            .field("ready", &self.is_ready())
            .finish()
    }
}
