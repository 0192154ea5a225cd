use std::env;
use std::fs;
use std::path::Path;

use quotedesk_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use super::{CommandResult, EXIT_CONFIG_INVALID};

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG_INVALID,
            )
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult::output(lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let admin_key = if config.admin.is_default_key() {
        "<redacted> (built-in default)".to_string()
    } else {
        redact_secret(config.admin.key.expose_secret())
    };
    let mail_password = config
        .mail
        .password
        .as_ref()
        .map(|password| redact_secret(password.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        Field {
            key_path: "admin.key",
            env_keys: &["QUOTEDESK_ADMIN_KEY", "ADMIN_KEY"],
            value: admin_key,
        },
        Field {
            key_path: "storage.data_dir",
            env_keys: &["QUOTEDESK_STORAGE_DATA_DIR", "DATA_DIR"],
            value: config.storage.data_dir.display().to_string(),
        },
        Field {
            key_path: "storage.file_name",
            env_keys: &["QUOTEDESK_STORAGE_FILE_NAME"],
            value: config.storage.file_name.clone(),
        },
        Field {
            key_path: "mail.username",
            env_keys: &["QUOTEDESK_MAIL_USERNAME", "EMAIL_USER"],
            value: unset_or(config.mail.username.as_deref()),
        },
        Field {
            key_path: "mail.password",
            env_keys: &["QUOTEDESK_MAIL_PASSWORD", "EMAIL_PASS"],
            value: mail_password,
        },
        Field {
            key_path: "mail.admin_email",
            env_keys: &["QUOTEDESK_MAIL_ADMIN_EMAIL", "ADMIN_EMAIL"],
            value: unset_or(config.mail.admin_email.as_deref()),
        },
        Field {
            key_path: "mail.smtp_host",
            env_keys: &["QUOTEDESK_MAIL_SMTP_HOST"],
            value: config.mail.smtp_host.clone(),
        },
        Field {
            key_path: "mail.sender_name",
            env_keys: &["QUOTEDESK_MAIL_SENDER_NAME"],
            value: config.mail.sender_name.clone(),
        },
        Field {
            key_path: "mail.timeout_secs",
            env_keys: &["QUOTEDESK_MAIL_TIMEOUT_SECS"],
            value: config.mail.timeout_secs.to_string(),
        },
        Field {
            key_path: "mail.queue_capacity",
            env_keys: &["QUOTEDESK_MAIL_QUEUE_CAPACITY"],
            value: config.mail.queue_capacity.to_string(),
        },
        Field {
            key_path: "server.bind_address",
            env_keys: &["QUOTEDESK_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        Field {
            key_path: "server.port",
            env_keys: &["QUOTEDESK_SERVER_PORT", "PORT"],
            value: config.server.port.to_string(),
        },
        Field {
            key_path: "server.graceful_shutdown_secs",
            env_keys: &["QUOTEDESK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            value: config.server.graceful_shutdown_secs.to_string(),
        },
        Field {
            key_path: "logging.level",
            env_keys: &["QUOTEDESK_LOGGING_LEVEL", "QUOTEDESK_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["QUOTEDESK_LOGGING_FORMAT", "QUOTEDESK_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    for env_key in env_keys {
        let set = env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false);
        if set {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn unset_or(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => "<unset>".to_string(),
    }
}

fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
