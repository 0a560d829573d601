// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runs the ready model on a prepared input.
//!
//! At most one prediction is outstanding per handle: a second `predict`
//! against the same handle waits for the first to settle. Scores leave this
//! module as a plain `Vec<f32>`, so ranking never depends on native tensor
//! resources.

use crate::model::ModelHandle;
use crate::preprocess::PreparedImage;
use thiserror::Error;
use tracing::debug;

/// Raw class scores, unordered, length = number of known classes.
pub type PredictionVector = Vec<f32>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("model handle is not ready; call ensure_ready before predict")]
    ModelNotReady,
    #[error("inference failed: {0}")]
    Inference(#[from] anyhow::Error),
}

pub struct InferenceEngine;

impl InferenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Runs the model behind `handle` on `input`, consuming the input.
    ///
    /// Fails with [`EngineError::ModelNotReady`] when the handle has been
    /// disposed: that is a caller-ordering violation, not a transient state.
    pub async fn predict(
        &self,
        handle: &ModelHandle,
        input: PreparedImage,
    ) -> Result<PredictionVector, EngineError> {
        let model = handle.model().ok_or(EngineError::ModelNotReady)?;
        let _outstanding = handle.prediction_gate().lock().await;

        let tensor = input.into_tensor();
        let scores = model.infer(&tensor)?;
        debug!(
            generation = handle.generation(),
            classes = scores.len(),
            "prediction complete"
        );
        Ok(scores)
    }
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LoadedModel;
    use crate::preprocess::{ImagePreprocessor, SourceKind};
    use image::{DynamicImage, Rgb, RgbImage};
    use ndarray::Array4;
    use std::sync::Arc;

    struct FixedModel(Vec<f32>);

    impl LoadedModel for FixedModel {
        fn infer(&self, input: &Array4<f32>) -> anyhow::Result<Vec<f32>> {
            assert_eq!(input.shape()[0], 1);
            Ok(self.0.clone())
        }
    }

    fn prepared() -> PreparedImage {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([127; 3])));
        ImagePreprocessor::new(4).transform(&source, SourceKind::Still)
    }

    #[tokio::test]
    async fn predict_returns_plain_scores() {
        let handle = ModelHandle::new(Arc::new(FixedModel(vec![0.1, 0.7, 0.2])), 1);
        let engine = InferenceEngine::new();

        let scores = engine.predict(&handle, prepared()).await.unwrap();
        assert_eq!(scores, vec![0.1, 0.7, 0.2]);
    }

    #[tokio::test]
    async fn disposed_handle_is_not_ready() {
        let handle = ModelHandle::new(Arc::new(FixedModel(vec![1.0])), 1);
        handle.dispose();

        let engine = InferenceEngine::new();
        let result = engine.predict(&handle, prepared()).await;
        assert!(matches!(result, Err(EngineError::ModelNotReady)));
    }

    #[tokio::test]
    async fn predictions_on_one_handle_are_serialized() {
        let handle = ModelHandle::new(Arc::new(FixedModel(vec![0.5])), 1);
        let engine = Arc::new(InferenceEngine::new());

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                engine.predict(&handle, prepared()).await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
    }
}
