// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! On-device image classification core: versioned local caching of a model
//! artifact, cache-vs-remote freshness checks, image-to-tensor preprocessing
//! and top-K ranking of raw class scores.
//!
//! The presentation layer (camera UI, upload forms) lives elsewhere and calls
//! in through a narrow contract: `ensure_ready` -> `transform` -> `predict`
//! -> `top_k_classes`.

pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod model;
pub mod preprocess;
pub mod ranking;
pub mod remote;
pub mod store;

pub use config::NodeConfig;
pub use engine::{EngineError, InferenceEngine, PredictionVector};
pub use lifecycle::{LifecycleError, ModelLifecycleManager, ModelState, UpdateCheck};
pub use model::onnx::OnnxModelLoader;
pub use model::{LoadedModel, ModelHandle, ModelLoader};
pub use preprocess::{ImagePreprocessor, PreparedImage, SourceKind};
pub use ranking::{load_class_labels, top_k_classes, ClassScore, RankError};
pub use remote::{FreshnessSignal, HttpRemoteSource, RemoteError, RemoteSource};
pub use store::{ArtifactStore, DiskArtifactStore, StoreError, StoredArtifact};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
