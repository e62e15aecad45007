//! `eduhub validate` - check a course record without storing it.

use eduhub_core::{domain::DomainValidator, error::EduhubError};
use tracing::info;

use crate::{
    cli::InputArgs,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub fn execute(args: InputArgs, output: OutputManager) -> CliResult<()> {
    let value = super::read_input(&args)?;
    let report = DomainValidator::validate_course_value(&value).map_err(EduhubError::from)?;

    super::print_report(&output, &report)?;
    info!(valid = report.is_valid(), problems = report.len(), "Record validated");

    if report.is_valid() {
        Ok(())
    } else {
        Err(CliError::RecordRejected {
            report,
            duplicate: false,
        })
    }
}
