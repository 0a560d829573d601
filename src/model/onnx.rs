// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime backing for the classifier model.
//!
//! The artifact bytes the lifecycle manager obtains (from the cache or the
//! network) are committed straight into an in-memory session; nothing is
//! written to disk here.

use super::{LoadedModel, ModelLoader};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::Array4;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::sync::{Arc, Mutex};
use tracing::info;

/// ONNX-backed classifier model.
///
/// The session is wrapped in a `Mutex` because `run` needs exclusive access;
/// the per-handle prediction gate already serializes callers, so this lock is
/// uncontended in practice.
pub struct OnnxClassifierModel {
    session: Mutex<Session>,
    input_name: String,
}

impl LoadedModel for OnnxClassifierModel {
    fn infer(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("classifier session poisoned"))?;

        let outputs = session.run(ort::inputs![
            self.input_name.as_str() => Value::from_array(input.clone())?
        ])?;

        // Extract by index: output names vary across exported classifiers.
        // Copy the scores out before the session outputs drop.
        let scores = outputs[0]
            .try_extract_array::<f32>()
            .context("failed to extract score tensor")?;
        Ok(scores.iter().copied().collect())
    }
}

/// Loads serialized ONNX artifacts into runnable sessions.
pub struct OnnxModelLoader {
    intra_threads: usize,
}

impl OnnxModelLoader {
    pub fn new() -> Self {
        Self { intra_threads: 4 }
    }
}

impl Default for OnnxModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelLoader for OnnxModelLoader {
    async fn load(&self, artifact: &[u8]) -> Result<Arc<dyn LoadedModel>> {
        if artifact.is_empty() {
            anyhow::bail!("model artifact is empty");
        }

        let session = Session::builder()
            .context("failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("failed to set optimization level")?
            .with_intra_threads(self.intra_threads)
            .context("failed to set intra threads")?
            .commit_from_memory(artifact)
            .context("failed to load ONNX model from artifact bytes")?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .context("model declares no inputs")?;

        info!(
            input_name = %input_name,
            size_bytes = artifact.len(),
            "ONNX classifier session ready"
        );

        Ok(Arc::new(OnnxClassifierModel {
            session: Mutex::new(session),
            input_name,
        }))
    }
}
