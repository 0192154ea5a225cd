use std::fs;
use std::io::ErrorKind;

use quotedesk_core::config::{AppConfig, LoadOptions};
use quotedesk_db::probe_writable;
use serde::Serialize;
use serde_json::Value;

use super::{block_on, CommandResult, EXIT_CHECK_FAILED};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { EXIT_CHECK_FAILED } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_data_dir_writable(&config));
            checks.push(check_data_file_readable(&config));
            checks.push(check_notification_config(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["data_dir_writable", "data_file_readable", "notification_config"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks
        .iter()
        .any(|check| matches!(check.status, CheckStatus::Fail | CheckStatus::Skipped));
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_data_dir_writable(config: &AppConfig) -> DoctorCheck {
    let data_dir = &config.storage.data_dir;
    let result = block_on(probe_writable(data_dir))
        .and_then(|probe| probe.map_err(|error| error.to_string()));

    match result {
        Ok(()) => DoctorCheck {
            name: "data_dir_writable",
            status: CheckStatus::Pass,
            details: format!("data directory `{}` is writable", data_dir.display()),
        },
        Err(error) => DoctorCheck {
            name: "data_dir_writable",
            status: CheckStatus::Fail,
            details: format!("data directory `{}` is not writable: {error}", data_dir.display()),
        },
    }
}

fn check_data_file_readable(config: &AppConfig) -> DoctorCheck {
    let path = config.storage.data_file();

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return DoctorCheck {
                name: "data_file_readable",
                status: CheckStatus::Pass,
                details: format!("`{}` does not exist yet and will be created", path.display()),
            };
        }
        Err(error) => {
            return DoctorCheck {
                name: "data_file_readable",
                status: CheckStatus::Fail,
                details: format!("failed to read `{}`: {error}", path.display()),
            };
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(entries)) => DoctorCheck {
            name: "data_file_readable",
            status: CheckStatus::Pass,
            details: format!("`{}` holds {} quote request(s)", path.display(), entries.len()),
        },
        Ok(_) => DoctorCheck {
            name: "data_file_readable",
            status: CheckStatus::Fail,
            details: format!(
                "`{}` is not a JSON array; the server would treat it as empty",
                path.display()
            ),
        },
        Err(error) => DoctorCheck {
            name: "data_file_readable",
            status: CheckStatus::Fail,
            details: format!(
                "`{}` is not valid JSON ({error}); the server would treat it as empty",
                path.display()
            ),
        },
    }
}

fn check_notification_config(config: &AppConfig) -> DoctorCheck {
    if config.mail.is_enabled() {
        return DoctorCheck {
            name: "notification_config",
            status: CheckStatus::Pass,
            details: format!("notifications enabled via `{}`", config.mail.smtp_host),
        };
    }

    DoctorCheck {
        name: "notification_config",
        status: CheckStatus::Warn,
        details: format!(
            "notifications disabled, missing: {}",
            config.mail.missing_settings().join(", ")
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
