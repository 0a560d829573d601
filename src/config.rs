// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::PathBuf;

/// Node-wide configuration for the classification core.
///
/// Built once at process start and handed to the components by reference;
/// there is no ambient global state.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Fixed key the single cached artifact lives under.
    pub artifact_key: String,
    /// Locator for the serialized model artifact (opaque GET).
    pub model_locator: String,
    /// Locator for the remote freshness signal.
    pub freshness_locator: String,
    /// Cache directory for the persisted artifact. `None` means the
    /// persistence capability is absent and the node runs network-only.
    pub cache_dir: Option<PathBuf>,
    /// Square edge length of the model input, in pixels.
    pub input_size: u32,
    /// How many ranked classes to surface by default.
    pub top_k: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            artifact_key: "web-model".to_string(),
            model_locator: "http://localhost:8080/model/model.onnx".to_string(),
            freshness_locator: "http://localhost:8080/model_info".to_string(),
            cache_dir: Some(PathBuf::from("./cache")),
            input_size: 224,
            top_k: 5,
        }
    }
}
