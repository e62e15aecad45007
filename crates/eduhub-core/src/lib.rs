//! EduHub Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for EduHub: the
//! course-record validator, the JSON-like document model, and the use cases
//! that drive a document store through a port.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            eduhub-cli (CLI)             │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │ (CourseService, CatalogService, ...)    │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │          (Driven: DocumentStore)        │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     eduhub-adapters (Infrastructure)    │
//! │   (InMemoryDocumentStore, JsonFileStore)│
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (DomainValidator, ValidationReport,     │
//! │  Document, Filter, Update, IndexSpec)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use eduhub_core::domain::{DomainValidator, Record};
//! use serde_json::json;
//!
//! let record: Record = serde_json::from_value(json!({
//!     "price": 50,
//!     "instructorEmail": "chidi.o@eduhub.com",
//!     "level": "intermediate",
//! }))
//! .unwrap();
//!
//! let report = DomainValidator::validate_course(&record);
//! assert_eq!(report.message("title"), Some("'title' is a required field."));
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        AnalyticsService, CatalogService, CourseService, SaveOutcome,
        ports::{DocumentStore, UpdateResult},
    };
    pub use crate::domain::{
        CollectionSchema, CourseField, CourseLevel, Document, DocumentId, DomainValidator,
        FieldRule, FieldType, Filter, IndexSpec, Record, Update, ValidationReport, Violation,
        ViolationKind,
    };
    pub use crate::error::{EduhubError, EduhubResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
