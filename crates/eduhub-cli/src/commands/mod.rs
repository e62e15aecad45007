//! Command handlers, one module per subcommand.

use std::{
    fs,
    io::{self, Read as _},
};

use serde_json::Value;
use tracing::debug;

use eduhub_adapters::JsonFileStore;
use eduhub_core::domain::ValidationReport;

use crate::{
    cli::InputArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli as _},
    output::OutputManager,
};

pub mod completions;
pub mod config;
pub mod course;
pub mod demo;
pub mod init;
pub mod setup;
pub mod validate;

/// Read the course record named by `--json`, `--file`, or standard input.
pub(crate) fn read_input(args: &InputArgs) -> CliResult<Value> {
    let text = match (&args.json, &args.file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CliError::NotFound { path: path.clone() },
            _ => CliError::IoError {
                message: format!("Failed to read '{}'", path.display()),
                source: e,
            },
        })?,
        (None, None) => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .with_cli_context(|| "Failed to read the course record from stdin")?;
            buf
        }
    };

    serde_json::from_str(&text).map_err(|e| CliError::InvalidInput {
        message: "the course record is not valid JSON".into(),
        source: Some(Box::new(e)),
    })
}

/// Open the configured snapshot store.
pub(crate) fn open_store(config: &AppConfig) -> CliResult<JsonFileStore> {
    let path = config.store_path();
    debug!(path = %path.display(), "Opening document store");
    Ok(JsonFileStore::open(path)?)
}

/// Print a validation report: a JSON object in JSON mode, otherwise one
/// `field: message` line per problem. Problem lines survive `--quiet`.
pub(crate) fn print_report(output: &OutputManager, report: &ValidationReport) -> io::Result<()> {
    if output.is_json() {
        return output.json(report);
    }
    if report.is_valid() {
        return output.success("Course record is valid");
    }

    output.header("Validation report:")?;
    for violation in report {
        output.error(&format!("{}: {}", violation.field, violation.message))?;
    }
    Ok(())
}
