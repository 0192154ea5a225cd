use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use quotedesk_core::domain::quote::QuoteEntry;

pub mod memory;
pub mod quote;

pub use memory::InMemoryQuoteRepository;
pub use quote::JsonFileQuoteRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("io error on `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Whole-collection persistence for quote entries, newest first.
///
/// Every mutation reads the full collection and writes it back; backends give
/// no read-modify-write atomicity, so callers serialize writers themselves.
/// Entries that `load_all` returns must survive a `save_all` of the same slice.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn load_all(&self) -> Result<Vec<QuoteEntry>, RepositoryError>;
    async fn save_all(&self, quotes: &[QuoteEntry]) -> Result<(), RepositoryError>;
}
