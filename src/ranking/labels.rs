// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class label tables.
//!
//! The table is an ordered JSON array of strings whose positions match the
//! model's output indices. A table that does not match the model's output
//! width surfaces later as a ranking configuration error.

use anyhow::{Context, Result};
use std::path::Path;

/// Loads an ordered class-label table from a JSON array file.
pub async fn load_class_labels(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read label table {}", path.display()))?;
    let labels: Vec<String> = serde_json::from_slice(&raw)
        .with_context(|| format!("label table {} is not a JSON string array", path.display()))?;
    if labels.is_empty() {
        anyhow::bail!("label table {} is empty", path.display());
    }
    Ok(labels)
}
