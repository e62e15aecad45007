//! `eduhub course` - validated inserts and listing.

use serde_json::{Value, json};

use eduhub_core::{
    application::{CourseService, SaveOutcome},
    domain::{Document, record_from_value},
    error::EduhubError,
};

use crate::{
    cli::{CourseCommands, InputArgs, ListArgs, ListFormat},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub fn execute(cmd: CourseCommands, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let store = super::open_store(&config)?;
    let service =
        CourseService::with_collection(Box::new(store), config.store.courses_collection.clone());

    match cmd {
        CourseCommands::Add(args) => add(&service, args, &output),
        CourseCommands::List(args) => list(&service, args, &output),
    }
}

fn add(service: &CourseService, args: InputArgs, output: &OutputManager) -> CliResult<()> {
    let record = record_from_value(super::read_input(&args)?).map_err(EduhubError::from)?;
    service.ensure_indexes()?;

    match service.save(record)? {
        SaveOutcome::Saved { id } => {
            if output.is_json() {
                output.json(&json!({ "_id": id }))?;
            } else {
                output.success(&format!(
                    "Course saved to '{}' with id {id}",
                    service.collection()
                ))?;
            }
            Ok(())
        }
        SaveOutcome::Invalid(report) => {
            super::print_report(output, &report)?;
            Err(CliError::RecordRejected {
                report,
                duplicate: false,
            })
        }
        SaveOutcome::Duplicate(report) => {
            super::print_report(output, &report)?;
            Err(CliError::RecordRejected {
                report,
                duplicate: true,
            })
        }
    }
}

fn list(service: &CourseService, args: ListArgs, output: &OutputManager) -> CliResult<()> {
    let courses = service.list()?;

    if args.format == ListFormat::Json || output.is_json() {
        let values: Vec<Value> = courses.iter().map(Document::to_value).collect();
        output.json(&values)?;
        return Ok(());
    }

    if courses.is_empty() {
        output.info(&format!("No courses stored in '{}'", service.collection()))?;
        return Ok(());
    }

    output.header(&format!(
        "Courses in '{}' ({}):",
        service.collection(),
        courses.len()
    ))?;
    for course in &courses {
        output.print(&table_row(course))?;
    }
    Ok(())
}

fn table_row(course: &Document) -> String {
    let text = |field: &str| course.get_str(field).unwrap_or("-").to_string();
    let price = course
        .get_ref("price")
        .map(Value::to_string)
        .unwrap_or_else(|| "-".into());

    format!(
        "  {}  {:<32} {:<12} {:>8}  {}",
        course.id,
        text("title"),
        text("level"),
        price,
        text("instructorEmail"),
    )
}
