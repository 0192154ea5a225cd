use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shared secret used when no admin key is configured. Local use only.
pub const DEFAULT_ADMIN_KEY: &str = "anphat123";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub admin: AdminConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub key: SecretString,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub file_name: String,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub admin_email: Option<String>,
    pub smtp_host: String,
    pub sender_name: String,
    pub timeout_secs: u64,
    pub queue_capacity: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub admin_key: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub mail_username: Option<String>,
    pub mail_password: Option<String>,
    pub mail_admin_email: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin: AdminConfig { key: secret_value(DEFAULT_ADMIN_KEY.to_string()) },
            storage: StorageConfig {
                data_dir: PathBuf::from("."),
                file_name: "quotes.json".to_string(),
            },
            mail: MailConfig {
                username: None,
                password: None,
                admin_email: None,
                smtp_host: "smtp.gmail.com".to_string(),
                sender_name: "An Phát".to_string(),
                timeout_secs: 10,
                queue_capacity: 64,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 3001,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AdminConfig {
    pub fn is_default_key(&self) -> bool {
        self.key.expose_secret() == DEFAULT_ADMIN_KEY
    }
}

/// Sender and recipient needed to deliver a notification.
#[derive(Clone, Debug)]
pub struct MailCredentials {
    pub username: String,
    pub password: SecretString,
    pub admin_email: String,
}

impl MailConfig {
    /// Returns the credentials only when username, password, and recipient
    /// are all present and non-blank.
    pub fn credentials(&self) -> Option<MailCredentials> {
        let username = self.username.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        let password = self.password.as_ref().filter(|v| !v.expose_secret().trim().is_empty())?;
        let admin_email =
            self.admin_email.as_deref().map(str::trim).filter(|v| !v.is_empty())?;

        Some(MailCredentials {
            username: username.to_string(),
            password: password.clone(),
            admin_email: admin_email.to_string(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials().is_some()
    }

    /// Names of the notification settings that are still unset.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let blank = |value: Option<&str>| value.map(|v| v.trim().is_empty()).unwrap_or(true);
        let mut missing = Vec::new();
        if blank(self.username.as_deref()) {
            missing.push("mail.username");
        }
        if blank(self.password.as_ref().map(|v| v.expose_secret())) {
            missing.push("mail.password");
        }
        if blank(self.admin_email.as_deref()) {
            missing.push("mail.admin_email");
        }
        missing
    }
}

impl StorageConfig {
    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("quotedesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(admin) = patch.admin {
            if let Some(admin_key_value) = admin.key {
                self.admin.key = secret_value(admin_key_value);
            }
        }

        if let Some(storage) = patch.storage {
            if let Some(data_dir) = storage.data_dir {
                self.storage.data_dir = data_dir;
            }
            if let Some(file_name) = storage.file_name {
                self.storage.file_name = file_name;
            }
        }

        if let Some(mail) = patch.mail {
            if let Some(username) = mail.username {
                self.mail.username = Some(username);
            }
            if let Some(mail_password_value) = mail.password {
                self.mail.password = Some(secret_value(mail_password_value));
            }
            if let Some(admin_email) = mail.admin_email {
                self.mail.admin_email = Some(admin_email);
            }
            if let Some(smtp_host) = mail.smtp_host {
                self.mail.smtp_host = smtp_host;
            }
            if let Some(sender_name) = mail.sender_name {
                self.mail.sender_name = sender_name;
            }
            if let Some(timeout_secs) = mail.timeout_secs {
                self.mail.timeout_secs = timeout_secs;
            }
            if let Some(queue_capacity) = mail.queue_capacity {
                self.mail.queue_capacity = queue_capacity;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env_with_alias("QUOTEDESK_ADMIN_KEY", "ADMIN_KEY") {
            self.admin.key = secret_value(value);
        }

        if let Some(value) = read_env_with_alias("QUOTEDESK_STORAGE_DATA_DIR", "DATA_DIR") {
            self.storage.data_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("QUOTEDESK_STORAGE_FILE_NAME") {
            self.storage.file_name = value;
        }

        if let Some(value) = read_env_with_alias("QUOTEDESK_MAIL_USERNAME", "EMAIL_USER") {
            self.mail.username = Some(value);
        }
        if let Some(value) = read_env_with_alias("QUOTEDESK_MAIL_PASSWORD", "EMAIL_PASS") {
            self.mail.password = Some(secret_value(value));
        }
        if let Some(value) = read_env_with_alias("QUOTEDESK_MAIL_ADMIN_EMAIL", "ADMIN_EMAIL") {
            self.mail.admin_email = Some(value);
        }
        if let Some(value) = read_env("QUOTEDESK_MAIL_SMTP_HOST") {
            self.mail.smtp_host = value;
        }
        if let Some(value) = read_env("QUOTEDESK_MAIL_SENDER_NAME") {
            self.mail.sender_name = value;
        }
        if let Some(value) = read_env("QUOTEDESK_MAIL_TIMEOUT_SECS") {
            self.mail.timeout_secs = parse_u64("QUOTEDESK_MAIL_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("QUOTEDESK_MAIL_QUEUE_CAPACITY") {
            self.mail.queue_capacity = parse_usize("QUOTEDESK_MAIL_QUEUE_CAPACITY", &value)?;
        }

        if let Some(value) = read_env("QUOTEDESK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("QUOTEDESK_SERVER_PORT") {
            self.server.port = parse_u16("QUOTEDESK_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("PORT") {
            self.server.port = parse_u16("PORT", &value)?;
        }
        if let Some(value) = read_env("QUOTEDESK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("QUOTEDESK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("QUOTEDESK_LOGGING_LEVEL").or_else(|| read_env("QUOTEDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUOTEDESK_LOGGING_FORMAT").or_else(|| read_env("QUOTEDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(admin_key) = overrides.admin_key {
            self.admin.key = secret_value(admin_key);
        }
        if let Some(data_dir) = overrides.data_dir {
            self.storage.data_dir = data_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(username) = overrides.mail_username {
            self.mail.username = Some(username);
        }
        if let Some(mail_password) = overrides.mail_password {
            self.mail.password = Some(secret_value(mail_password));
        }
        if let Some(admin_email) = overrides.mail_admin_email {
            self.mail.admin_email = Some(admin_email);
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_admin(&self.admin)?;
        validate_storage(&self.storage)?;
        validate_mail(&self.mail)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("quotedesk.toml"), PathBuf::from("config/quotedesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_admin(admin: &AdminConfig) -> Result<(), ConfigError> {
    if admin.key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation("admin.key must not be blank".to_string()));
    }
    Ok(())
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    let file_name = storage.file_name.trim();
    if file_name.is_empty() {
        return Err(ConfigError::Validation("storage.file_name must not be blank".to_string()));
    }
    if file_name.contains('/') || file_name.contains('\\') {
        return Err(ConfigError::Validation(
            "storage.file_name must be a bare file name; use storage.data_dir for the directory"
                .to_string(),
        ));
    }
    if storage.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("storage.data_dir must not be empty".to_string()));
    }
    Ok(())
}

fn validate_mail(mail: &MailConfig) -> Result<(), ConfigError> {
    if mail.smtp_host.trim().is_empty() {
        return Err(ConfigError::Validation("mail.smtp_host must not be blank".to_string()));
    }

    if mail.timeout_secs == 0 || mail.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "mail.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if mail.queue_capacity == 0 {
        return Err(ConfigError::Validation(
            "mail.queue_capacity must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_with_alias(key: &str, alias: &str) -> Option<String> {
    read_env(key).or_else(|| read_env(alias))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    admin: Option<AdminPatch>,
    storage: Option<StoragePatch>,
    mail: Option<MailPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AdminPatch {
    key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    data_dir: Option<PathBuf>,
    file_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MailPatch {
    username: Option<String>,
    password: Option<String>,
    admin_email: Option<String>,
    smtp_host: Option<String>,
    sender_name: Option<String>,
    timeout_secs: Option<u64>,
    queue_capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
