use quotedesk_core::config::{AppConfig, LoadOptions};
use quotedesk_db::JsonFileQuoteRepository;

use super::{block_on, CommandResult, EXIT_CONFIG_INVALID, EXIT_STORAGE_FAILED};

/// Prints the stored collection in its on-disk order, optionally truncated.
/// A missing data file prints `[]` and is left absent.
pub fn run(limit: Option<usize>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "quotes",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG_INVALID,
            )
        }
    };

    let repository = JsonFileQuoteRepository::new(config.storage.data_file());
    let mut quotes = match block_on(repository.read_existing()) {
        Ok(Ok(quotes)) => quotes,
        Ok(Err(error)) => {
            return CommandResult::failure(
                "quotes",
                "storage",
                error.to_string(),
                EXIT_STORAGE_FAILED,
            )
        }
        Err(error) => {
            return CommandResult::failure("quotes", "runtime", error, EXIT_STORAGE_FAILED)
        }
    };

    if let Some(limit) = limit {
        quotes.truncate(limit);
    }

    match serde_json::to_string_pretty(&quotes) {
        Ok(output) => CommandResult::output(output),
        Err(error) => CommandResult::failure(
            "quotes",
            "serialization",
            error.to_string(),
            EXIT_STORAGE_FAILED,
        ),
    }
}
