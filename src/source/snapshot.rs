use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read a JSON array of rows exported from the store.
pub async fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read snapshot at {}", path.display()))?;

    let rows: Vec<T> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot: expected a JSON array of rows in {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = rows.len(), "loaded snapshot");
    Ok(rows)
}
