use tokio::sync::RwLock;

use quotedesk_core::domain::quote::QuoteEntry;

use super::{QuoteRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryQuoteRepository {
    quotes: RwLock<Vec<QuoteEntry>>,
}

impl InMemoryQuoteRepository {
    pub fn with_quotes(quotes: Vec<QuoteEntry>) -> Self {
        Self { quotes: RwLock::new(quotes) }
    }
}

#[async_trait::async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn load_all(&self) -> Result<Vec<QuoteEntry>, RepositoryError> {
        let quotes = self.quotes.read().await;
        Ok(quotes.clone())
    }

    async fn save_all(&self, quotes: &[QuoteEntry]) -> Result<(), RepositoryError> {
        let mut stored = self.quotes.write().await;
        *stored = quotes.to_vec();
        Ok(())
    }
}
