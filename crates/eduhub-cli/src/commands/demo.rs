//! `eduhub demo` - the guided walkthrough, run against an in-memory store.
//!
//! The validation part saves six course records and shows what the
//! validator (or the unique index) says about each. The CRUD part attaches
//! the collection schemas, builds a small catalogue of users, courses,
//! enrollments, assignments and submissions, exercises every catalogue
//! operation, and ends with the analytics reports.

use std::io;

use chrono::{Duration, Utc};
use serde_json::{Map, Value, json};
use tracing::instrument;

use eduhub_adapters::InMemoryDocumentStore;
use eduhub_core::{
    application::{AnalyticsService, CatalogService, CourseService, SaveOutcome},
    domain::{Record, record_from_value},
    error::EduhubError,
};

use crate::{cli::DemoArgs, error::CliResult, output::OutputManager};

pub fn execute(args: DemoArgs, output: OutputManager) -> CliResult<()> {
    let demo = Demo {
        narrate: !output.is_json(),
        output: &output,
    };
    let mut summary = Map::new();

    if args.part.includes_validation() {
        summary.insert("validation".into(), demo.validation()?);
    }
    if args.part.includes_crud() {
        summary.insert("analytics".into(), demo.crud()?);
    }

    if !demo.narrate {
        output.json(&summary)?;
    }
    Ok(())
}

/// Course records for the validation walkthrough, in order.
fn scenarios() -> Vec<(&'static str, Value)> {
    vec![
        (
            "A valid course",
            json!({
                "title": "Python Backend Development",
                "price": 99.99,
                "instructorEmail": "tunde.a@eduhub.com",
                "level": "beginner",
                "isPublished": true,
            }),
        ),
        (
            "Missing title",
            json!({
                "price": 50,
                "instructorEmail": "chidi.o@eduhub.com",
                "level": "intermediate",
            }),
        ),
        (
            "Price is not a number",
            json!({
                "title": "NoSQL Fundamentals",
                "price": "one hundred",
                "instructorEmail": "bola.m@eduhub.com",
                "level": "intermediate",
            }),
        ),
        (
            "Instructor email already used",
            json!({
                "title": "Data Science with Python",
                "price": 199.99,
                "instructorEmail": "tunde.a@eduhub.com",
                "level": "expert",
            }),
        ),
        (
            "Unsupported level",
            json!({
                "title": "Advanced Go",
                "price": 150,
                "instructorEmail": "femi.k@eduhub.com",
                "level": "guru",
            }),
        ),
        (
            "Malformed email",
            json!({
                "title": "Introduction to Rust",
                "price": 120,
                "instructorEmail": "emeka.at.home",
                "level": "beginner",
            }),
        ),
    ]
}

struct Demo<'a> {
    output: &'a OutputManager,
    narrate: bool,
}

impl Demo<'_> {
    fn section(&self, title: &str) -> io::Result<()> {
        if !self.narrate {
            return Ok(());
        }
        self.output.print("")?;
        self.output.header(title)
    }

    fn say(&self, msg: &str) -> io::Result<()> {
        if self.narrate {
            self.output.print(msg)?;
        }
        Ok(())
    }

    fn done(&self, msg: &str) -> io::Result<()> {
        if self.narrate {
            self.output.success(msg)?;
        }
        Ok(())
    }

    fn refused(&self, msg: &str) -> io::Result<()> {
        if self.narrate {
            self.output.warning(msg)?;
        }
        Ok(())
    }

    #[instrument(skip_all)]
    fn validation(&self) -> CliResult<Value> {
        self.section("Course validation")?;

        let service = CourseService::new(Box::new(InMemoryDocumentStore::new()));
        service.ensure_indexes()?;

        let mut results = Vec::new();
        for (number, (name, record)) in scenarios().into_iter().enumerate() {
            self.say(&format!("Scenario {}: {name}", number + 1))?;

            let outcome = service.save(object(record)?)?;
            match &outcome {
                SaveOutcome::Saved { id } => self.done(&format!("  saved with id {id}"))?,
                SaveOutcome::Invalid(report) => {
                    for violation in report {
                        self.refused(&format!("  {}: {}", violation.field, violation.message))?;
                    }
                }
                SaveOutcome::Duplicate(report) => {
                    self.refused("  refused by the unique index")?;
                    for violation in report {
                        self.refused(&format!("  {}: {}", violation.field, violation.message))?;
                    }
                }
            }

            results.push(json!({
                "scenario": name,
                "saved": outcome.is_saved(),
                "report": outcome.report().cloned().unwrap_or_default(),
            }));
        }

        self.say(&format!("{} course(s) stored", service.list()?.len()))?;
        Ok(Value::Array(results))
    }

    #[instrument(skip_all)]
    fn crud(&self) -> CliResult<Value> {
        let store = InMemoryDocumentStore::new();
        let catalog = CatalogService::new(Box::new(store.clone()));
        let analytics = AnalyticsService::new(Box::new(store));

        self.section("Setup")?;
        catalog.create_collections()?;
        for collection in catalog.apply_schemas()? {
            self.done(&format!("schema on {collection}"))?;
        }

        let instructor = catalog.add_instructor("Dr. Smith", "smith@edu.com")?;
        let alice = catalog.add_student("Alice_Initial", "alice@student.com")?;
        let bola = catalog.add_student("Bola_Martins", "bola@student.com")?;
        catalog.add_student("Alice_Duplicate", "alice@student.com")?;
        let intro = catalog.create_course(
            "Introduction to Document Databases",
            instructor,
            "Programming",
        )?;
        catalog.add_lesson(intro, "Connecting to the store", "Opening a connection.")?;
        if let Some(enrollment) = catalog.enroll(alice, intro)? {
            catalog.record_grade(enrollment, "Quiz 1", 85.0)?;
        }
        self.done("seeded one instructor, three students and one course")?;

        for dup in catalog.remove_duplicate_emails()? {
            self.refused(&format!(
                "removed {} user(s) duplicating '{}'",
                dup.removed, dup.email
            ))?;
        }
        for (collection, index) in catalog.create_indexes()? {
            self.done(&format!("index {collection}.{index}"))?;
        }

        self.section("Create")?;
        let chinedu = catalog.add_student("Chinedu_Okafor", "chinedu@student.com")?;
        let advanced =
            catalog.create_course("Advanced Data Structures", instructor, "Programming")?;
        let statistics = catalog.create_course("Applied Statistics", instructor, "Data")?;
        let chinedu_enrollment = catalog.enroll(chinedu, advanced)?;
        if catalog.enroll(chinedu, advanced)?.is_none() {
            self.refused("Chinedu_Okafor is already enrolled in Advanced Data Structures")?;
        }
        let mut bola_enrollments = Vec::new();
        for (course, grades) in [(advanced, [72.0, 88.0]), (statistics, [91.0, 79.0])] {
            if let Some(enrollment) = catalog.enroll(bola, course)? {
                for (n, score) in grades.into_iter().enumerate() {
                    catalog.record_grade(enrollment, &format!("Assignment {}", n + 1), score)?;
                }
                bola_enrollments.push(enrollment);
            }
        }
        catalog.add_lesson(intro, "Working with Arrays", "Arrays of embedded objects.")?;

        let now = Utc::now();
        let linked_lists =
            catalog.create_assignment(advanced, "Linked lists", now + Duration::days(3))?;
        let regression =
            catalog.create_assignment(statistics, "Regression", now + Duration::days(10))?;
        catalog.submit_assignment(linked_lists, bola, Some(88.0))?;
        catalog.submit_assignment(regression, bola, None)?;
        catalog.submit_assignment(linked_lists, chinedu, Some(70.0))?;
        self.done("added a student, two courses, enrollments, a lesson, assignments and submissions")?;

        match catalog.add_student("Alice Again", "alice@student.com") {
            Ok(_) => self.refused("duplicate email was accepted")?,
            Err(err) => {
                let Some(report) = err.as_duplicate_key().and_then(|e| e.to_report()) else {
                    return Err(err.into());
                };
                self.refused(&format!("duplicate user refused: {report}"))?;
            }
        }
        match catalog.add_student("Bola Typo", "bola") {
            Ok(_) => self.refused("malformed email was accepted")?,
            Err(err) => {
                let Some(report) = err.as_schema_violation() else {
                    return Err(err.into());
                };
                self.refused(&format!("user refused by the schema: {report}"))?;
            }
        }

        self.section("Read")?;
        let active = catalog.find_active_students()?;
        self.say(&format!("{} active student(s)", active.len()))?;
        if let Some(joined) = catalog.course_with_instructor(intro)? {
            self.say(&format!(
                "'{}' is taught by {}",
                joined.title,
                joined.instructor_name.as_deref().unwrap_or("nobody"),
            ))?;
        }
        self.say(&format!(
            "{} course(s) in Programming",
            catalog.courses_by_category("Programming")?.len()
        ))?;
        let names: Vec<String> = catalog
            .students_in_course(advanced)?
            .iter()
            .filter_map(|s| s.get_str("username").map(str::to_string))
            .collect();
        self.say(&format!("enrolled in Advanced Data Structures: {}", names.join(", ")))?;
        let found = catalog.search_courses_by_title("data")?;
        self.say(&format!("{} course(s) match 'data'", found.len()))?;
        for (course, price) in [(intro, 30.0), (advanced, 120.0), (statistics, 80.0)] {
            catalog.set_price(course, price)?;
        }
        self.say(&format!(
            "{} course(s) priced between 50 and 200",
            catalog.courses_in_price_range(50.0, 200.0)?.len()
        ))?;
        self.say(&format!(
            "{} user(s) joined in the last 6 months",
            catalog.users_joined_since(now - Duration::days(183))?.len()
        ))?;
        self.say(&format!(
            "{} assignment(s) due in the next 7 days",
            catalog.assignments_due_between(now, now + Duration::days(7))?.len()
        ))?;

        self.section("Update")?;
        let profile = object(json!({ "major": "Software Engineering", "year": 2 }))?;
        catalog.update_profile(alice, &profile)?;
        catalog.publish_course(intro)?;
        if let Some(enrollment) = chinedu_enrollment {
            catalog.record_grade(enrollment, "Quiz 1", 64.0)?;
            catalog.update_grade(enrollment, "Quiz 1", 95.0)?;
        }
        catalog.add_tags(intro, &["Arrays", "Advanced", "Database"])?;
        if let Some(&enrollment) = bola_enrollments.last() {
            catalog.complete_enrollment(enrollment)?;
        }
        self.done("profile updated, course published, grade corrected, tags added")?;
        self.say(&format!(
            "{} course(s) tagged Database or Python",
            catalog.courses_with_any_tag(&["Database", "Python"])?.len()
        ))?;

        self.section("Delete")?;
        catalog.soft_delete_user(alice)?;
        if let Some(enrollment) = chinedu_enrollment {
            catalog.delete_enrollment(enrollment)?;
        }
        catalog.remove_lesson(intro, "Connecting to the store")?;
        self.done(&format!(
            "{} active student(s) after soft delete",
            catalog.find_active_students()?.len()
        ))?;

        self.section("Analytics")?;
        let per_course = analytics.enrollments_per_course()?;
        for row in &per_course {
            self.say(&format!("  {:<36} {}", row.course_title, row.total_enrollments))?;
        }
        let categories = analytics.category_stats()?;
        for row in &categories {
            self.say(&format!(
                "  {:<36} {} enrollment(s) across {} course(s)",
                row.category, row.total_enrollments, row.unique_course_count
            ))?;
        }
        let top = analytics.average_grade_per_student(5)?;
        for row in &top {
            self.say(&format!(
                "  {:<36} {:.2} over {} grade(s)",
                row.student_name, row.average_grade, row.grade_count
            ))?;
        }

        let completion = analytics.completion_rates()?;
        for row in &completion {
            self.say(&format!(
                "  {:<36} {:.2}% of {} completed",
                row.course_title, row.completion_rate, row.total_enrollments
            ))?;
        }
        let reach = analytics.students_per_instructor()?;
        for row in &reach {
            self.say(&format!(
                "  {:<36} {} student(s) over {} course(s)",
                row.instructor_name, row.unique_students, row.course_count
            ))?;
        }
        let trends = analytics.monthly_enrollment_trends()?;
        for row in &trends {
            self.say(&format!("  {:<36} {}", row.month, row.enrollments))?;
        }
        let engagement = analytics.engagement()?;
        self.say(&format!(
            "  {:.2} submission(s) per student across {} student(s)",
            engagement.average_submissions_per_student, engagement.students_with_submissions
        ))?;

        Ok(json!({
            "enrollmentsPerCourse": per_course,
            "categoryStats": categories,
            "topStudents": top,
            "completionRates": completion,
            "studentsPerInstructor": reach,
            "monthlyEnrollments": trends,
            "engagement": engagement,
        }))
    }
}

fn object(value: Value) -> Result<Record, EduhubError> {
    Ok(record_from_value(value)?)
}
