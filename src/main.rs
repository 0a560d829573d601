// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Reference caller for the classification core: ensure the model is ready,
//! transform an image, run prediction and print the ranked result as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use edge_vision_node::{
    load_class_labels, top_k_classes, ArtifactStore, DiskArtifactStore, HttpRemoteSource,
    ImagePreprocessor, InferenceEngine, ModelLifecycleManager, ModelLoader, NodeConfig,
    OnnxModelLoader, RemoteSource, SourceKind,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "edge-vision-node", version, about = "On-device image classifier")]
struct Args {
    /// Image file to classify
    image: PathBuf,

    /// Locator for the serialized model artifact
    #[arg(long, env = "MODEL_URL")]
    model_url: String,

    /// Locator for the model freshness signal
    #[arg(long, env = "MODEL_INFO_URL")]
    model_info_url: String,

    /// JSON label table (ordered array of class names)
    #[arg(long, env = "CLASS_LABELS")]
    labels: PathBuf,

    /// Artifact cache directory; omit to run network-only
    #[arg(long, env = "MODEL_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Number of top classes to report
    #[arg(long, default_value_t = 5)]
    top_k: usize,

    /// Model input edge length in pixels
    #[arg(long, default_value_t = 224)]
    input_size: u32,

    /// Also ask the server whether a newer model is published
    #[arg(long)]
    check_update: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = NodeConfig {
        model_locator: args.model_url.clone(),
        freshness_locator: args.model_info_url.clone(),
        cache_dir: args.cache_dir.clone(),
        input_size: args.input_size,
        top_k: args.top_k,
        ..NodeConfig::default()
    };

    let remote: Arc<dyn RemoteSource> = Arc::new(HttpRemoteSource::new()?);
    let store: Option<Arc<dyn ArtifactStore>> = config
        .cache_dir
        .as_ref()
        .map(|dir| Arc::new(DiskArtifactStore::new(dir)) as Arc<dyn ArtifactStore>);
    let loader: Arc<dyn ModelLoader> = Arc::new(OnnxModelLoader::new());
    let lifecycle =
        ModelLifecycleManager::new(config.artifact_key.clone(), store, remote, loader);

    let labels = load_class_labels(&args.labels).await?;
    let handle = lifecycle.ensure_ready(&config.model_locator).await?;

    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("failed to read image {}", args.image.display()))?;
    let (frame, _info) = edge_vision_node::preprocess::decode_image_bytes(&bytes)?;

    let preprocessor = ImagePreprocessor::new(config.input_size);
    let prepared = preprocessor.transform(&frame, SourceKind::Still);

    let engine = InferenceEngine::new();
    let scores = engine.predict(&handle, prepared).await?;
    let ranked = top_k_classes(&scores, &labels, config.top_k)?;

    println!("{}", serde_json::to_string_pretty(&ranked)?);

    if args.check_update {
        let check = lifecycle.check_for_update(&config.freshness_locator).await;
        println!(
            "{}",
            serde_json::json!({ "update_available": check.update_available })
        );
    }

    lifecycle.dispose().await;
    Ok(())
}
