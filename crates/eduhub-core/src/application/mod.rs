//! Application layer for EduHub.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (CourseService, CatalogService, AnalyticsService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! course rules itself. All rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    AnalyticsService, CatalogService, CategoryStats, CompletionRate, CourseEnrollmentCount,
    CourseService, CourseWithInstructor, DuplicateEmail, Engagement, InstructorReach,
    MonthlyEnrollments, SaveOutcome, StudentAverage, collections,
};

// Re-export port traits (for adapter implementation)
pub use ports::{DocumentStore, UpdateResult};

pub use error::ApplicationError;
