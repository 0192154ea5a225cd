use std::io;
use std::path::Path;

use quotedesk_core::config::StorageConfig;
use tokio::fs;

use crate::repositories::{JsonFileQuoteRepository, RepositoryError};

pub async fn ensure_data_dir(data_dir: &Path) -> Result<(), RepositoryError> {
    fs::create_dir_all(data_dir)
        .await
        .map_err(|source| RepositoryError::Io { path: data_dir.to_path_buf(), source })
}

/// Creates the data directory if needed and returns a repository bound to the
/// configured data file. The file itself is created lazily on first read.
pub async fn open_with_settings(
    storage: &StorageConfig,
) -> Result<JsonFileQuoteRepository, RepositoryError> {
    ensure_data_dir(&storage.data_dir).await?;
    Ok(JsonFileQuoteRepository::new(storage.data_file()))
}

/// Writes and removes a probe file to confirm the directory accepts writes.
pub async fn probe_writable(data_dir: &Path) -> io::Result<()> {
    let probe = data_dir.join(".quotedesk-probe");
    fs::write(&probe, b"ok").await?;
    fs::remove_file(&probe).await
}
