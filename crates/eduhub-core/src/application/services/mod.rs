//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and the `DocumentStore` port to
//! accomplish use cases like "save a course" or "enroll a student".

pub mod analytics_service;
pub mod catalog_service;
pub mod course_service;

pub use analytics_service::{
    AnalyticsService, CategoryStats, CompletionRate, CourseEnrollmentCount, Engagement,
    InstructorReach, MonthlyEnrollments, StudentAverage,
};
pub use catalog_service::{CatalogService, CourseWithInstructor, DuplicateEmail, timestamp};
pub use course_service::{CourseService, SaveOutcome};

/// Collection names used by the services.
pub mod collections {
    pub const USERS: &str = "users";
    pub const COURSES: &str = "courses";
    pub const ENROLLMENTS: &str = "enrollments";
    pub const ASSIGNMENTS: &str = "assignments";
    pub const SUBMISSIONS: &str = "submissions";

    /// Every collection `setup` creates. Lessons live inside their course.
    pub const ALL: [&str; 5] = [USERS, COURSES, ENROLLMENTS, ASSIGNMENTS, SUBMISSIONS];
}
