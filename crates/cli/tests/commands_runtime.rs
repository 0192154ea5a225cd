use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use quotedesk_cli::commands::{config, doctor, quotes};
use serde_json::Value;
use tempfile::TempDir;

const STORED_QUOTES: &str = r#"[
  {"id": 3, "fullname": "Chi", "phone": "03", "email": "c@x.com", "message": "third", "createdAt": "2024-05-03T10:00:00.000Z"},
  {"id": 2, "fullname": "Binh", "phone": "02", "email": "b@x.com", "message": "second", "createdAt": "2024-05-02T10:00:00.000Z"},
  {"id": 1, "fullname": "Anna", "phone": "01", "email": "a@x.com", "message": "first", "createdAt": "2024-05-01T10:00:00.000Z"}
]"#;

#[test]
fn config_redacts_secrets_and_attributes_env_sources() {
    with_env(
        &[
            ("ADMIN_KEY", "super-secret-key"),
            ("EMAIL_PASS", "mail-password"),
            ("QUOTEDESK_SERVER_PORT", "4100"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);

            assert!(!result.output.contains("super-secret-key"));
            assert!(!result.output.contains("mail-password"));
            assert!(result
                .output
                .contains("- admin.key = <redacted> (source: env (ADMIN_KEY))"));
            assert!(result
                .output
                .contains("- mail.password = <redacted> (source: env (EMAIL_PASS))"));
            assert!(result
                .output
                .contains("- server.port = 4100 (source: env (QUOTEDESK_SERVER_PORT))"));
            assert!(result.output.contains("- mail.username = <unset> (source: default)"));
        },
    );
}

#[test]
fn config_flags_the_built_in_admin_key() {
    with_env(&[], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);
        assert!(result
            .output
            .contains("- admin.key = <redacted> (built-in default) (source: default)"));
    });
}

#[test]
fn config_reports_invalid_env_override() {
    with_env(&[("QUOTEDESK_SERVER_PORT", "not-a-port")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_passes_with_writable_data_dir_and_warns_on_disabled_mail() {
    let dir = TempDir::new().expect("temp dir");
    let data_dir = dir.path().to_string_lossy().to_string();

    with_env(&[("QUOTEDESK_STORAGE_DATA_DIR", data_dir.as_str())], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "doctor output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(check_status(&payload, "config_validation"), "pass");
        assert_eq!(check_status(&payload, "data_dir_writable"), "pass");
        assert_eq!(check_status(&payload, "data_file_readable"), "pass");
        assert_eq!(check_status(&payload, "notification_config"), "warn");
    });
}

#[test]
fn doctor_passes_notification_check_when_mail_is_configured() {
    let dir = TempDir::new().expect("temp dir");
    let data_dir = dir.path().to_string_lossy().to_string();

    with_env(
        &[
            ("QUOTEDESK_STORAGE_DATA_DIR", data_dir.as_str()),
            ("EMAIL_USER", "shop@example.com"),
            ("EMAIL_PASS", "app-password"),
            ("ADMIN_EMAIL", "owner@example.com"),
        ],
        || {
            let result = doctor::run(true);
            let payload = parse_payload(&result.output);
            assert_eq!(check_status(&payload, "notification_config"), "pass");
            assert!(!result.output.contains("app-password"));
        },
    );
}

#[test]
fn doctor_fails_on_corrupt_data_file() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("quotes.json"), "{ not json").expect("write corrupt file");
    let data_dir = dir.path().to_string_lossy().to_string();

    with_env(&[("QUOTEDESK_STORAGE_DATA_DIR", data_dir.as_str())], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] data_file_readable:"));
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("QUOTEDESK_LOG_LEVEL", "verbose")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(check_status(&payload, "config_validation"), "fail");
        assert_eq!(check_status(&payload, "data_dir_writable"), "skipped");
    });
}

#[test]
fn quotes_prints_stored_records_newest_first() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("quotes.json"), STORED_QUOTES).expect("write quotes");
    let data_dir = dir.path().to_string_lossy().to_string();

    with_env(&[("DATA_DIR", data_dir.as_str())], || {
        let result = quotes::run(None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let names: Vec<&str> = payload
            .as_array()
            .expect("array output")
            .iter()
            .filter_map(|quote| quote["fullname"].as_str())
            .collect();
        assert_eq!(names, vec!["Chi", "Binh", "Anna"]);
        assert_eq!(payload[2]["createdAt"], "2024-05-01T10:00:00.000Z");
    });
}

#[test]
fn quotes_honors_limit() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("quotes.json"), STORED_QUOTES).expect("write quotes");
    let data_dir = dir.path().to_string_lossy().to_string();

    with_env(&[("DATA_DIR", data_dir.as_str())], || {
        let result = quotes::run(Some(1));
        let payload = parse_payload(&result.output);
        assert_eq!(payload.as_array().map(Vec::len), Some(1));
        assert_eq!(payload[0]["id"], 3);
    });
}

#[test]
fn quotes_prints_empty_array_when_no_data_file_exists() {
    let dir = TempDir::new().expect("temp dir");
    let data_dir = dir.path().to_string_lossy().to_string();

    with_env(&[("DATA_DIR", data_dir.as_str())], || {
        let result = quotes::run(None);
        assert_eq!(result.exit_code, 0);
        assert_eq!(parse_payload(&result.output), Value::Array(Vec::new()));
    });

    assert!(!dir.path().join("quotes.json").exists(), "quotes must not create the data file");
}

#[test]
fn quotes_keeps_entries_it_cannot_decode() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("quotes.json"),
        r#"[{"id": 9, "fullname": "Legacy", "phone": 909123456, "email": null}]"#,
    )
    .expect("write quotes");
    let data_dir = dir.path().to_string_lossy().to_string();

    with_env(&[("DATA_DIR", data_dir.as_str())], || {
        let result = quotes::run(None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload[0]["phone"], 909123456);
        assert_eq!(payload[0]["email"], Value::Null);
    });
}

fn check_status(payload: &Value, name: &str) -> String {
    payload["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .and_then(|check| check["status"].as_str())
        .unwrap_or("missing")
        .to_string()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "QUOTEDESK_ADMIN_KEY",
        "ADMIN_KEY",
        "QUOTEDESK_STORAGE_DATA_DIR",
        "DATA_DIR",
        "QUOTEDESK_STORAGE_FILE_NAME",
        "QUOTEDESK_MAIL_USERNAME",
        "EMAIL_USER",
        "QUOTEDESK_MAIL_PASSWORD",
        "EMAIL_PASS",
        "QUOTEDESK_MAIL_ADMIN_EMAIL",
        "ADMIN_EMAIL",
        "QUOTEDESK_MAIL_SMTP_HOST",
        "QUOTEDESK_MAIL_SENDER_NAME",
        "QUOTEDESK_MAIL_TIMEOUT_SECS",
        "QUOTEDESK_MAIL_QUEUE_CAPACITY",
        "QUOTEDESK_SERVER_BIND_ADDRESS",
        "QUOTEDESK_SERVER_PORT",
        "PORT",
        "QUOTEDESK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "QUOTEDESK_LOGGING_LEVEL",
        "QUOTEDESK_LOGGING_FORMAT",
        "QUOTEDESK_LOG_LEVEL",
        "QUOTEDESK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
