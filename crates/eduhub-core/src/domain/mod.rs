//! Core domain layer for EduHub.
//!
//! Pure logic only: the course validator, the document model, and the value
//! types stores use to express queries, updates and indexes. No I/O happens
//! here; stores live behind the `DocumentStore` port in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or database calls
//! - **Values, not errors**: an invalid course record is a `ValidationReport`

pub mod course;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod report;
pub mod schema;
pub mod update;

mod validation;

pub use course::{CourseField, CourseLevel};
pub use document::{Document, DocumentId, ID_FIELD, Record, ValueKind, record_from_value};
pub use error::{DomainError, ErrorCategory};
pub use index::IndexSpec;
pub use query::{Condition, Filter};
pub use report::{ValidationReport, Violation, ViolationKind};
pub use schema::{CollectionSchema, FieldRule, FieldType};
pub use update::{Update, UpdateOp};
pub use validation::DomainValidator;
