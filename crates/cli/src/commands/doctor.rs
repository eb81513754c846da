use formwork_core::config::{AppConfig, LoadOptions};
use formwork_relay::SubmissionRelay;
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
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

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
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
            checks.push(check_provider_credentials(&config));
            checks.push(check_delivery_route(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "provider_credentials",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "delivery_route",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Complete credentials and completely absent credentials are both healthy
/// states; a partial triple is the misconfiguration worth failing on.
fn check_provider_credentials(config: &AppConfig) -> DoctorCheck {
    if config.provider.credentials().is_some() {
        return DoctorCheck {
            name: "provider_credentials",
            status: CheckStatus::Pass,
            details: "credential triple is complete; provider delivery available".to_string(),
        };
    }

    let mut present = Vec::new();
    let mut missing = Vec::new();
    record_presence(
        &mut present,
        &mut missing,
        "service_id",
        config.provider.service_id.as_deref().is_some_and(|value| !value.trim().is_empty()),
    );
    record_presence(
        &mut present,
        &mut missing,
        "template_id",
        config.provider.template_id.as_deref().is_some_and(|value| !value.trim().is_empty()),
    );
    let has_user_key = [&config.provider.user_id, &config.provider.public_key]
        .into_iter()
        .flatten()
        .any(|secret| !secret.expose_secret().trim().is_empty());
    record_presence(&mut present, &mut missing, "user_id or public_key", has_user_key);

    if present.is_empty() {
        DoctorCheck {
            name: "provider_credentials",
            status: CheckStatus::Pass,
            details: "no credentials configured; submissions use the mailto fallback".to_string(),
        }
    } else {
        DoctorCheck {
            name: "provider_credentials",
            status: CheckStatus::Fail,
            details: format!(
                "partial credentials ({} set, {} missing); delivery will silently fall back",
                present.join(", "),
                missing.join(", ")
            ),
        }
    }
}

fn record_presence(
    present: &mut Vec<&'static str>,
    missing: &mut Vec<&'static str>,
    name: &'static str,
    is_present: bool,
) {
    if is_present {
        present.push(name);
    } else {
        missing.push(name);
    }
}

fn check_delivery_route(config: &AppConfig) -> DoctorCheck {
    let relay = SubmissionRelay::from_config(config);
    DoctorCheck {
        name: "delivery_route",
        status: CheckStatus::Pass,
        details: format!(
            "submissions to `{}` via {}",
            relay.recipient(),
            relay.route_kind().as_str()
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
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
