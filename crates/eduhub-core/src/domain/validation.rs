use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::domain::{
    course::{CourseField, CourseLevel},
    document::{Record, ValueKind},
    error::DomainError,
    report::{ValidationReport, Violation, ViolationKind},
};

/// Email shape accepted for `instructorEmail`.
///
/// Deliberately loose: the TLD must be two or three word characters, so
/// `.info` and `.museum` addresses are rejected.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([\.-]?\w+)*@\w+([\.-]?\w+)*(\.\w{2,3})+$").expect("valid email regex")
});

/// Centralized domain validation.
///
/// All course rules live here. Validation never fails on bad data: every
/// broken rule becomes an entry in the returned [`ValidationReport`].
pub struct DomainValidator;

impl DomainValidator {
    /// Validate a candidate `courses` record.
    ///
    /// Presence is checked first. If any required field is missing or null,
    /// the report holds only those entries. Otherwise each field's type, range,
    /// enum and format rules run independently.
    pub fn validate_course(record: &Record) -> ValidationReport {
        let mut report = ValidationReport::new();

        for field in CourseField::REQUIRED {
            if matches!(record.get(field.as_str()), None | Some(Value::Null)) {
                report.record(Violation::new(
                    field.as_str(),
                    ViolationKind::MissingRequiredField,
                    format!("'{}' is a required field.", field),
                ));
            }
        }
        if !report.is_empty() {
            tracing::debug!(missing = report.len(), "course record missing required fields");
            return report;
        }

        // Presence was checked above, so every lookup below is Some.
        let value = |field: CourseField| record.get(field.as_str()).unwrap_or(&Value::Null);

        if let Some(v) = Self::check_title(value(CourseField::Title)) {
            report.record(v);
        }
        if let Some(v) = Self::check_price(value(CourseField::Price)) {
            report.record(v);
        }
        if let Some(v) = Self::check_level(value(CourseField::Level)) {
            report.record(v);
        }
        if let Some(v) = Self::check_instructor_email(value(CourseField::InstructorEmail)) {
            report.record(v);
        }

        tracing::debug!(violations = report.len(), "course record validated");
        report
    }

    /// Validate an arbitrary JSON value as a course record.
    ///
    /// Fails only when `value` is not an object.
    pub fn validate_course_value(value: &Value) -> Result<ValidationReport, DomainError> {
        match value {
            Value::Object(record) => Ok(Self::validate_course(record)),
            other => Err(DomainError::InvalidDocument(format!(
                "course record must be an object, found {}",
                ValueKind::of(other)
            ))),
        }
    }

    /// Whether `email` has an acceptable shape.
    pub fn is_valid_email(email: &str) -> bool {
        EMAIL_PATTERN.is_match(email)
    }

    fn check_title(title: &Value) -> Option<Violation> {
        (!title.is_string()).then(|| {
            Violation::new(
                CourseField::Title.as_str(),
                ViolationKind::TypeMismatch,
                "Course title must be a string.",
            )
        })
    }

    fn check_price(price: &Value) -> Option<Violation> {
        let field = CourseField::Price.as_str();
        let kind = ValueKind::of(price);
        if !kind.is_numeric() {
            return Some(Violation::new(
                field,
                ViolationKind::TypeMismatch,
                format!("Course price must be a number, not '{}'.", kind),
            ));
        }

        let negative = price.as_f64().is_some_and(|p| p < 0.0);
        negative.then(|| Violation::new(field, ViolationKind::Range, "Price cannot be negative."))
    }

    fn check_level(level: &Value) -> Option<Violation> {
        let field = CourseField::Level.as_str();
        let Some(level) = level.as_str() else {
            return Some(Violation::new(
                field,
                ViolationKind::TypeMismatch,
                "Course level must be a string.",
            ));
        };

        level.parse::<CourseLevel>().err().map(|_| {
            Violation::new(
                field,
                ViolationKind::Enum,
                format!(
                    "'{}' is not a supported course level. Must be one of {}.",
                    level,
                    CourseLevel::allowed_list()
                ),
            )
        })
    }

    fn check_instructor_email(email: &Value) -> Option<Violation> {
        let field = CourseField::InstructorEmail.as_str();
        let Some(email) = email.as_str() else {
            return Some(Violation::new(
                field,
                ViolationKind::TypeMismatch,
                "Instructor email must be a string.",
            ));
        };

        (!Self::is_valid_email(email)).then(|| {
            Violation::new(
                field,
                ViolationKind::Format,
                format!("'{}' is not a valid email format.", email),
            )
        })
    }
}
