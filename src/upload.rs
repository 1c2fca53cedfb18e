use std::path::Path;

use anyhow::Context;
use uuid::Uuid;

use crate::error::AppResult;

/// Store uploaded bytes under the upload directory and return the
/// backend-relative URL they are retrievable at.
pub async fn save_upload(dir: &Path, original_name: &str, bytes: &[u8]) -> AppResult<String> {
    tokio::fs::create_dir_all(dir)
        .await
        .context("create upload dir")?;

    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let filename = format!("{}{ext}", Uuid::new_v4());

    tokio::fs::write(dir.join(&filename), bytes)
        .await
        .context("write upload")?;

    Ok(format!("/uploads/{filename}"))
}
