//! Course Service - validated writes to the courses collection.
//!
//! Every save runs the validator first and writes only a clean record. The
//! store may still refuse the write on the unique `instructorEmail` index;
//! that refusal is folded into the same report shape the validator produces,
//! so callers handle one kind of rejection.

use tracing::{info, instrument, warn};

use crate::{
    application::{ApplicationError, ports::DocumentStore, services::collections},
    domain::{
        CourseField, Document, DocumentId, DomainValidator, Filter, IndexSpec,
        Record, ValidationReport,
    },
    error::{EduhubError, EduhubResult},
};

/// Result of [`CourseService::save`].
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved { id: DocumentId },
    /// The validator rejected the record; nothing was written.
    Invalid(ValidationReport),
    /// The store rejected the record on a unique index.
    Duplicate(ValidationReport),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    /// The rejection report, if the record was not saved.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Saved { .. } => None,
            Self::Invalid(report) | Self::Duplicate(report) => Some(report),
        }
    }
}

/// Service for course records.
pub struct CourseService {
    store: Box<dyn DocumentStore>,
    collection: String,
}

impl CourseService {
    /// Create a service writing to the default `courses` collection.
    pub fn new(store: Box<dyn DocumentStore>) -> Self {
        Self::with_collection(store, collections::COURSES)
    }

    pub fn with_collection(store: Box<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Make sure the unique index on `instructorEmail` exists.
    ///
    /// Duplicate detection depends on it; call once before saving.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub fn ensure_indexes(&self) -> EduhubResult<String> {
        let name = self.store.create_index(
            &self.collection,
            IndexSpec::on(CourseField::InstructorEmail.as_str()).unique(),
        )?;
        info!(index = %name, "Unique index ensured");
        Ok(name)
    }

    /// Validate without writing.
    pub fn validate(&self, record: &Record) -> ValidationReport {
        DomainValidator::validate_course(record)
    }

    /// Validate, then insert.
    ///
    /// A schema attached to the collection can still refuse the record; that
    /// is reported as [`SaveOutcome::Invalid`]. Store failures other than a
    /// duplicate key or schema refusal are returned as errors.
    #[instrument(skip_all, fields(collection = %self.collection))]
    pub fn save(&self, record: Record) -> EduhubResult<SaveOutcome> {
        let report = DomainValidator::validate_course(&record);
        if !report.is_valid() {
            info!(violations = report.len(), "Course record rejected by validation");
            return Ok(SaveOutcome::Invalid(report));
        }

        match self.store.insert_one(&self.collection, record) {
            Ok(id) => {
                info!(%id, "Course saved");
                Ok(SaveOutcome::Saved { id })
            }
            Err(EduhubError::Application(err @ ApplicationError::DuplicateKey { .. })) => {
                warn!(error = %err, "Course rejected by unique index");
                let report = err.to_report().unwrap_or_default();
                Ok(SaveOutcome::Duplicate(report))
            }
            Err(EduhubError::Application(ApplicationError::SchemaViolation { report, .. })) => {
                info!(violations = report.len(), "Course record rejected by collection schema");
                Ok(SaveOutcome::Invalid(report))
            }
            Err(e) => Err(e),
        }
    }

    /// Remove every course. Returns the number removed.
    pub fn clear(&self) -> EduhubResult<u64> {
        let removed = self.store.delete_many(&self.collection, &Filter::all())?;
        info!(removed, collection = %self.collection, "Collection cleared");
        Ok(removed)
    }

    pub fn list(&self) -> EduhubResult<Vec<Document>> {
        self.store.find(&self.collection, &Filter::all())
    }
}
