use std::fs;
use std::path::Path;

use formwork_core::config::{AppConfig, LoadOptions};
use formwork_core::{validate_step, SubmissionRecord, WizardStep};
use formwork_relay::{FlatSubmission, SubmissionRelay};

use crate::commands::CommandResult;

/// Parses a TOML intake file into a submission record, runs every step's
/// validation the way the wizard would, and delivers through the
/// configured relay. `--dry-run` stops after printing the flattened
/// payload.
pub fn run(input: &Path, dry_run: bool) -> CommandResult {
    let raw = match fs::read_to_string(input) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "submit",
                "read_input",
                format!("could not read `{}`: {error}", input.display()),
                1,
            );
        }
    };

    let record: SubmissionRecord = match toml::from_str(&raw) {
        Ok(record) => record,
        Err(error) => {
            return CommandResult::failure(
                "submit",
                "parse_input",
                format!("could not parse `{}`: {error}", input.display()),
                1,
            );
        }
    };

    let failures = collect_validation_failures(&record);
    if !failures.is_empty() {
        return CommandResult::failure("submit", "validation", failures.join("; "), 1);
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("submit", "config", error.to_string(), 1),
    };
    let relay = SubmissionRelay::from_config(&config);

    if dry_run {
        let flat = FlatSubmission::from_record(&record, relay.recipient());
        return CommandResult::success(
            "submit",
            format!(
                "dry run: would deliver via {}\n{}",
                relay.route_kind().as_str(),
                flat.body_lines()
            ),
        );
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "submit",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    match runtime.block_on(relay.deliver(&record)) {
        Ok(()) => CommandResult::success(
            "submit",
            format!("submission delivered via {}", relay.route_kind().as_str()),
        ),
        Err(error) => CommandResult::failure("submit", "delivery", error.to_string(), 1),
    }
}

fn collect_validation_failures(record: &SubmissionRecord) -> Vec<String> {
    WizardStep::ALL
        .into_iter()
        .filter(|step| !step.is_terminal())
        .flat_map(|step| validate_step(step, record))
        .map(|(field, message)| format!("{field}: {message}"))
        .collect()
}
