pub mod data_file;
pub mod repositories;

pub use data_file::{ensure_data_dir, open_with_settings, probe_writable};
pub use repositories::{
    InMemoryQuoteRepository, JsonFileQuoteRepository, QuoteRepository, RepositoryError,
};
