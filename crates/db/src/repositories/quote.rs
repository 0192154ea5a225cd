use std::io;
use std::path::{Path, PathBuf};

use quotedesk_core::domain::quote::{QuoteEntry, QuoteRecord};
use serde_json::Value;
use tokio::fs;
use tracing::warn;

use super::{QuoteRepository, RepositoryError};

/// Stores the collection as one pretty-printed JSON array on disk.
pub struct JsonFileQuoteRepository {
    path: PathBuf,
}

impl JsonFileQuoteRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Reads the collection without creating the document when it is absent.
    /// Unlike `load_all`, an unreadable document is reported as an error.
    pub async fn read_existing(&self) -> Result<Vec<QuoteEntry>, RepositoryError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(decode_collection(&raw, &self.path)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(RepositoryError::Io { path: self.path.clone(), source }),
        }
    }

    async fn write_document(&self, quotes: &[QuoteEntry]) -> Result<(), RepositoryError> {
        let mut body = serde_json::to_vec_pretty(quotes)?;
        body.push(b'\n');

        let staging = self.staging_path();
        fs::write(&staging, &body)
            .await
            .map_err(|source| RepositoryError::Io { path: staging.clone(), source })?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|source| RepositoryError::Io { path: self.path.clone(), source })
    }
}

#[async_trait::async_trait]
impl QuoteRepository for JsonFileQuoteRepository {
    async fn load_all(&self) -> Result<Vec<QuoteEntry>, RepositoryError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                if let Err(error) = self.write_document(&[]).await {
                    warn!(
                        event_name = "storage.quotes.init_failed",
                        path = %self.path.display(),
                        error = %error,
                        "could not create empty quotes document"
                    );
                }
                return Ok(Vec::new());
            }
            Err(error) => {
                warn!(
                    event_name = "storage.quotes.unreadable",
                    path = %self.path.display(),
                    error = %error,
                    "quotes document unreadable, treating collection as empty"
                );
                return Ok(Vec::new());
            }
        };

        Ok(decode_collection(&raw, &self.path))
    }

    async fn save_all(&self, quotes: &[QuoteEntry]) -> Result<(), RepositoryError> {
        self.write_document(quotes).await
    }
}

fn decode_collection(raw: &str, path: &Path) -> Vec<QuoteEntry> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let entries = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(entries)) => entries,
        Ok(other) => {
            warn!(
                event_name = "storage.quotes.corrupt",
                path = %path.display(),
                kind = json_kind(&other),
                "quotes document is not an array, treating collection as empty"
            );
            return Vec::new();
        }
        Err(error) => {
            warn!(
                event_name = "storage.quotes.corrupt",
                path = %path.display(),
                error = %error,
                "quotes document failed to parse, treating collection as empty"
            );
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match serde_json::from_value::<QuoteRecord>(entry.clone()) {
            Ok(record) => QuoteEntry::Record(record),
            Err(error) => {
                warn!(
                    event_name = "storage.quotes.entry_unrecognized",
                    path = %path.display(),
                    index,
                    error = %error,
                    "quote entry does not decode, keeping it verbatim"
                );
                QuoteEntry::Unrecognized(entry)
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
