//! Side-channel copy of the latest snapshot on disk.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::telemetry::TelemetrySnapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot encoding: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io { path: path.to_path_buf(), source }
}

/// Overwrite `path` with the snapshot. Written to a sibling temp file first
/// and renamed, so external readers never see a truncated file.
pub async fn persist(path: &Path, snapshot: &TelemetrySnapshot) -> Result<(), StoreError> {
    let body = serde_json::to_vec(snapshot)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &body).await.map_err(io_err(&tmp))?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err(path))?;
    Ok(())
}

pub async fn load(path: &Path) -> Result<TelemetrySnapshot, StoreError> {
    let body = tokio::fs::read(path).await.map_err(io_err(path))?;
    Ok(serde_json::from_slice(&body)?)
}
