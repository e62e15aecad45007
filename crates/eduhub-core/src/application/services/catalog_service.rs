//! Catalog Service - CRUD over users, courses and enrollments.
//!
//! Documents reference each other by the string form of their `_id`
//! (`instructorId`, `studentId`, `courseId`). Joins are resolved here with
//! follow-up lookups rather than by the store.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{ports::DocumentStore, services::collections},
    domain::{
        CollectionSchema, Document, DocumentId, DomainError, FieldRule, FieldType, Filter,
        IndexSpec, Record, Update, record_from_value,
    },
    error::EduhubResult,
};

/// Users sharing an email, as removed by
/// [`CatalogService::remove_duplicate_emails`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateEmail {
    pub email: String,
    /// The oldest document, which is kept.
    pub kept: DocumentId,
    pub removed: u64,
}

/// A course joined with its instructor.
///
/// The instructor fields are empty when the referenced user does not exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithInstructor {
    pub id: DocumentId,
    pub title: String,
    pub category: Option<String>,
    pub is_published: bool,
    pub instructor_name: Option<String>,
    pub instructor_email: Option<String>,
}

/// Service for the tutorial catalog.
pub struct CatalogService {
    store: Box<dyn DocumentStore>,
}

impl CatalogService {
    pub fn new(store: Box<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // -------------------------------------------------------------------------
    // Schema
    // -------------------------------------------------------------------------

    /// Create every catalog collection.
    pub fn create_collections(&self) -> EduhubResult<()> {
        for name in collections::ALL {
            self.store.create_collection(name)?;
        }
        Ok(())
    }

    /// Drop every catalog collection. Returns how many existed.
    pub fn drop_collections(&self) -> EduhubResult<usize> {
        let mut dropped = 0;
        for name in collections::ALL {
            if self.store.drop_collection(name)? {
                dropped += 1;
            }
        }
        Ok(dropped)
    }

    /// Schemas the store enforces on catalog writes, by collection.
    ///
    /// Students and instructors share `users`; `role` tells them apart.
    pub fn schemas() -> Vec<(&'static str, CollectionSchema)> {
        let email = "^.+@.+$";
        vec![
            (
                collections::USERS,
                CollectionSchema::new()
                    .require(["username", "email", "role"])
                    .rule(FieldRule::new("username", FieldType::String))
                    .rule(FieldRule::new("email", FieldType::String).pattern(email))
                    .rule(
                        FieldRule::new("role", FieldType::String)
                            .one_of(["student", "instructor"]),
                    )
                    .rule(FieldRule::new("isActive", FieldType::Bool))
                    .rule(FieldRule::new("profile", FieldType::Object))
                    .rule(FieldRule::new("createdAt", FieldType::Date)),
            ),
            (
                collections::COURSES,
                CollectionSchema::new()
                    .require(["title"])
                    .rule(FieldRule::new("title", FieldType::String))
                    .rule(FieldRule::new("instructorId", FieldType::String))
                    .rule(FieldRule::new("category", FieldType::String))
                    .rule(FieldRule::new("price", FieldType::Number).at_least(0.0))
                    .rule(FieldRule::new("credits", FieldType::Int).between(1.0, 10.0))
                    .rule(FieldRule::new("tags", FieldType::Array).items(FieldType::String))
                    .rule(FieldRule::new("isPublished", FieldType::Bool)),
            ),
            (
                collections::ASSIGNMENTS,
                CollectionSchema::new()
                    .require(["courseId", "title", "dueDate"])
                    .rule(FieldRule::new("title", FieldType::String))
                    .rule(FieldRule::new("dueDate", FieldType::Date)),
            ),
        ]
    }

    /// Attach [`Self::schemas`] to their collections. Returns the collection
    /// names.
    #[instrument(skip(self))]
    pub fn apply_schemas(&self) -> EduhubResult<Vec<String>> {
        let mut applied = Vec::new();
        for (collection, schema) in Self::schemas() {
            self.store.set_schema(collection, Some(schema))?;
            debug!(collection, "Schema attached");
            applied.push(collection.to_string());
        }
        Ok(applied)
    }

    /// Delete users whose email is already taken by an older user, keeping
    /// the first one inserted. Run before creating the unique email index.
    #[instrument(skip(self))]
    pub fn remove_duplicate_emails(&self) -> EduhubResult<Vec<DuplicateEmail>> {
        let users = self.store.find(collections::USERS, &Filter::all())?;

        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<DocumentId>> = HashMap::new();
        for user in &users {
            let Some(email) = user.get_str("email") else {
                continue;
            };
            let ids = groups.entry(email.to_string()).or_insert_with(|| {
                order.push(email.to_string());
                Vec::new()
            });
            ids.push(user.id);
        }

        let mut removed = Vec::new();
        for email in order {
            let Some(ids) = groups.remove(&email) else {
                continue;
            };
            let [kept, extra @ ..] = ids.as_slice() else {
                continue;
            };
            if extra.is_empty() {
                continue;
            }
            let filter = Filter::all().is_in("_id", extra.iter().map(DocumentId::to_value));
            let count = self.store.delete_many(collections::USERS, &filter)?;
            warn!(email = %email, removed = count, "Duplicate users removed");
            removed.push(DuplicateEmail {
                email,
                kept: *kept,
                removed: count,
            });
        }
        Ok(removed)
    }

    /// Create the catalog's standard indexes. Returns `(collection, index)`
    /// pairs.
    #[instrument(skip(self))]
    pub fn create_indexes(&self) -> EduhubResult<Vec<(String, String)>> {
        let specs = [
            (collections::USERS, IndexSpec::on("email").unique()),
            (
                collections::COURSES,
                IndexSpec::ascending(["title", "category"]),
            ),
            (collections::ASSIGNMENTS, IndexSpec::on("dueDate")),
            (
                collections::ENROLLMENTS,
                IndexSpec::ascending(["studentId", "courseId"]),
            ),
        ];

        let mut created = Vec::with_capacity(specs.len());
        for (collection, spec) in specs {
            let name = self.store.create_index(collection, spec)?;
            debug!(collection, index = %name, "Index ready");
            created.push((collection.to_string(), name));
        }
        Ok(created)
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    pub fn add_student(&self, username: &str, email: &str) -> EduhubResult<DocumentId> {
        self.add_user(username, email, "student")
    }

    pub fn add_instructor(&self, username: &str, email: &str) -> EduhubResult<DocumentId> {
        self.add_user(username, email, "instructor")
    }

    fn add_user(&self, username: &str, email: &str, role: &str) -> EduhubResult<DocumentId> {
        let id = self.store.insert_one(
            collections::USERS,
            record_from_value(json!({
                "username": username,
                "email": email,
                "role": role,
                "isActive": true,
                "profile": {},
                "createdAt": timestamp(Utc::now()),
            }))?,
        )?;
        info!(%id, username, role, "User added");
        Ok(id)
    }

    pub fn create_course(
        &self,
        title: &str,
        instructor_id: DocumentId,
        category: &str,
    ) -> EduhubResult<DocumentId> {
        let id = self.store.insert_one(
            collections::COURSES,
            record_from_value(json!({
                "title": title,
                "instructorId": instructor_id.to_value(),
                "category": category,
                "isPublished": false,
                "lessons": [],
                "tags": [],
                "createdAt": timestamp(Utc::now()),
            }))?,
        )?;
        info!(%id, title, "Course created");
        Ok(id)
    }

    /// Enroll a student. Returns `None` when the student is already enrolled
    /// in the course.
    #[instrument(skip_all, fields(student = %student_id, course = %course_id))]
    pub fn enroll(
        &self,
        student_id: DocumentId,
        course_id: DocumentId,
    ) -> EduhubResult<Option<DocumentId>> {
        let existing = Filter::all()
            .eq("studentId", student_id.to_value())
            .eq("courseId", course_id.to_value());
        if self
            .store
            .find_one(collections::ENROLLMENTS, &existing)?
            .is_some()
        {
            info!("Student already enrolled in this course");
            return Ok(None);
        }

        let id = self.store.insert_one(
            collections::ENROLLMENTS,
            record_from_value(json!({
                "studentId": student_id.to_value(),
                "courseId": course_id.to_value(),
                "status": "active",
                "progress": 0,
                "grades": [],
                "enrollmentDate": timestamp(Utc::now()),
            }))?,
        )?;
        info!(enrollment = %id, "Student enrolled");
        Ok(Some(id))
    }

    /// Append a lesson to a course. Returns whether the course was found.
    pub fn add_lesson(&self, course_id: DocumentId, title: &str, content: &str) -> EduhubResult<bool> {
        let lesson = json!({
            "lessonId": DocumentId::new().to_value(),
            "title": title,
            "content": content,
        });
        self.modify(
            collections::COURSES,
            course_id,
            Update::new().push("lessons", lesson),
        )
    }

    /// Record a graded assignment on an enrollment.
    pub fn record_grade(
        &self,
        enrollment_id: DocumentId,
        assignment_name: &str,
        score: f64,
    ) -> EduhubResult<bool> {
        self.modify(
            collections::ENROLLMENTS,
            enrollment_id,
            Update::new().push(
                "grades",
                json!({ "assignmentName": assignment_name, "score": score }),
            ),
        )
    }

    /// Add an assignment to a course.
    pub fn create_assignment(
        &self,
        course_id: DocumentId,
        title: &str,
        due: DateTime<Utc>,
    ) -> EduhubResult<DocumentId> {
        let id = self.store.insert_one(
            collections::ASSIGNMENTS,
            record_from_value(json!({
                "courseId": course_id.to_value(),
                "title": title,
                "dueDate": timestamp(due),
                "createdAt": timestamp(Utc::now()),
            }))?,
        )?;
        info!(%id, title, "Assignment created");
        Ok(id)
    }

    /// Record a student's submission for an assignment, graded or not.
    pub fn submit_assignment(
        &self,
        assignment_id: DocumentId,
        student_id: DocumentId,
        grade: Option<f64>,
    ) -> EduhubResult<DocumentId> {
        let id = self.store.insert_one(
            collections::SUBMISSIONS,
            record_from_value(json!({
                "assignmentId": assignment_id.to_value(),
                "studentId": student_id.to_value(),
                "grade": grade,
                "submittedAt": timestamp(Utc::now()),
            }))?,
        )?;
        debug!(%id, %assignment_id, %student_id, "Submission recorded");
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Read
    // -------------------------------------------------------------------------

    pub fn find_active_students(&self) -> EduhubResult<Vec<Document>> {
        let students = self.store.find(
            collections::USERS,
            &Filter::all().eq("role", "student").eq("isActive", true),
        )?;
        debug!(count = students.len(), "Active students found");
        Ok(students)
    }

    pub fn course_with_instructor(
        &self,
        course_id: DocumentId,
    ) -> EduhubResult<Option<CourseWithInstructor>> {
        let Some(course) = self
            .store
            .find_one(collections::COURSES, &Filter::by_id(course_id))?
        else {
            return Ok(None);
        };

        let instructor = match reference(&course, "instructorId") {
            Some(id) => self.store.find_one(collections::USERS, &Filter::by_id(id))?,
            None => None,
        };

        let title = course
            .get_str("title")
            .ok_or_else(|| DomainError::MissingField {
                field: "title".into(),
            })?
            .to_string();

        Ok(Some(CourseWithInstructor {
            id: course.id,
            title,
            category: course.get_str("category").map(str::to_string),
            is_published: course
                .get_ref("isPublished")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            instructor_name: instructor
                .as_ref()
                .and_then(|u| u.get_str("username"))
                .map(str::to_string),
            instructor_email: instructor
                .as_ref()
                .and_then(|u| u.get_str("email"))
                .map(str::to_string),
        }))
    }

    pub fn courses_by_category(&self, category: &str) -> EduhubResult<Vec<Document>> {
        self.store
            .find(collections::COURSES, &Filter::all().eq("category", category))
    }

    /// Users enrolled in a course. Enrollments whose student no longer
    /// exists are skipped.
    pub fn students_in_course(&self, course_id: DocumentId) -> EduhubResult<Vec<Document>> {
        let enrollments = self.store.find(
            collections::ENROLLMENTS,
            &Filter::all().eq("courseId", course_id.to_value()),
        )?;

        let mut students = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            let Some(student_id) = reference(enrollment, "studentId") else {
                continue;
            };
            if let Some(student) = self
                .store
                .find_one(collections::USERS, &Filter::by_id(student_id))?
            {
                students.push(student);
            }
        }
        Ok(students)
    }

    /// Case-insensitive partial match on the title.
    pub fn search_courses_by_title(&self, term: &str) -> EduhubResult<Vec<Document>> {
        self.store.find(
            collections::COURSES,
            &Filter::all().contains_ignore_case("title", term),
        )
    }

    /// Courses whose price lies in `[min, max]`.
    pub fn courses_in_price_range(&self, min: f64, max: f64) -> EduhubResult<Vec<Document>> {
        self.store.find(
            collections::COURSES,
            &Filter::all().range("price", Some(json!(min)), Some(json!(max))),
        )
    }

    /// Users created at or after `since`.
    pub fn users_joined_since(&self, since: DateTime<Utc>) -> EduhubResult<Vec<Document>> {
        self.store.find(
            collections::USERS,
            &Filter::all().gte("createdAt", timestamp(since)),
        )
    }

    /// Courses carrying at least one of `tags`.
    pub fn courses_with_any_tag(&self, tags: &[&str]) -> EduhubResult<Vec<Document>> {
        self.store.find(
            collections::COURSES,
            &Filter::all().is_in("tags", tags.iter().copied()),
        )
    }

    /// Assignments due within `[from, to]`.
    pub fn assignments_due_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EduhubResult<Vec<Document>> {
        self.store.find(
            collections::ASSIGNMENTS,
            &Filter::all().range(
                "dueDate",
                Some(Value::String(timestamp(from))),
                Some(Value::String(timestamp(to))),
            ),
        )
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    pub fn set_price(&self, course_id: DocumentId, price: f64) -> EduhubResult<bool> {
        self.modify(
            collections::COURSES,
            course_id,
            Update::new().set("price", price),
        )
    }

    /// Mark an enrollment as completed.
    pub fn complete_enrollment(&self, enrollment_id: DocumentId) -> EduhubResult<bool> {
        self.modify(
            collections::ENROLLMENTS,
            enrollment_id,
            Update::new().set("status", "completed").set("progress", 100),
        )
    }

    /// Set keys inside the user's `profile` object, leaving other keys alone.
    pub fn update_profile(&self, user_id: DocumentId, updates: &Record) -> EduhubResult<bool> {
        let update = updates
            .iter()
            .fold(Update::new(), |u, (key, value)| {
                u.set(format!("profile.{}", key), value.clone())
            });
        if update.is_empty() {
            return Ok(false);
        }
        self.modify(collections::USERS, user_id, update)
    }

    pub fn publish_course(&self, course_id: DocumentId) -> EduhubResult<bool> {
        self.modify(
            collections::COURSES,
            course_id,
            Update::new().set("isPublished", true),
        )
    }

    /// Change the score of a named assignment in an enrollment's grades.
    /// Returns false when the enrollment or assignment is missing, or the
    /// score is unchanged.
    pub fn update_grade(
        &self,
        enrollment_id: DocumentId,
        assignment_name: &str,
        score: f64,
    ) -> EduhubResult<bool> {
        let Some(enrollment) = self
            .store
            .find_one(collections::ENROLLMENTS, &Filter::by_id(enrollment_id))?
        else {
            return Ok(false);
        };

        let position = enrollment
            .get_ref("grades")
            .and_then(Value::as_array)
            .and_then(|grades| {
                grades
                    .iter()
                    .position(|g| g.get("assignmentName").and_then(Value::as_str) == Some(assignment_name))
            });
        let Some(i) = position else {
            debug!(%enrollment_id, assignment_name, "Assignment not found");
            return Ok(false);
        };

        self.modify(
            collections::ENROLLMENTS,
            enrollment_id,
            Update::new().set(format!("grades.{}.score", i), score),
        )
    }

    /// Add tags, skipping any the course already has.
    pub fn add_tags(&self, course_id: DocumentId, tags: &[&str]) -> EduhubResult<bool> {
        self.modify(
            collections::COURSES,
            course_id,
            Update::new().add_to_set("tags", tags.iter().copied()),
        )
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------

    /// Deactivate a user without removing the document.
    pub fn soft_delete_user(&self, user_id: DocumentId) -> EduhubResult<bool> {
        self.modify(
            collections::USERS,
            user_id,
            Update::new().set("isActive", false),
        )
    }

    pub fn delete_enrollment(&self, enrollment_id: DocumentId) -> EduhubResult<bool> {
        let deleted = self
            .store
            .delete_one(collections::ENROLLMENTS, &Filter::by_id(enrollment_id))?;
        info!(%enrollment_id, deleted, "Enrollment delete");
        Ok(deleted > 0)
    }

    pub fn remove_lesson(&self, course_id: DocumentId, lesson_title: &str) -> EduhubResult<bool> {
        self.modify(
            collections::COURSES,
            course_id,
            Update::new().pull_where("lessons", "title", lesson_title),
        )
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    /// Update one document by id. Returns whether it changed.
    fn modify(&self, collection: &str, id: DocumentId, update: Update) -> EduhubResult<bool> {
        let result = self
            .store
            .update_one(collection, &Filter::by_id(id), &update)?;
        debug!(
            collection,
            %id,
            matched = result.matched,
            modified = result.modified,
            "Update applied"
        );
        Ok(result.modified)
    }
}

/// Stored timestamp format: UTC, whole seconds, `Z` suffix. Fixed width, so
/// string order is time order and range filters work on it.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Follow an id reference stored as a string field.
fn reference(doc: &Document, field: &str) -> Option<DocumentId> {
    doc.get_str(field).and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockDocumentStore;

    #[test]
    fn enroll_refuses_second_enrollment_of_same_pair() {
        let student = DocumentId::new();
        let course = DocumentId::new();
        let existing = Document::new(DocumentId::new(), Record::new());

        let mut store = MockDocumentStore::new();
        store
            .expect_find_one()
            .withf(|collection, filter| collection == "enrollments" && filter.clauses().len() == 2)
            .returning(move |_, _| Ok(Some(existing.clone())));
        store.expect_insert_one().never();

        let service = CatalogService::new(Box::new(store));
        assert_eq!(service.enroll(student, course).unwrap(), None);
    }

    fn user(email: &str) -> Document {
        Document::new(
            DocumentId::new(),
            record_from_value(json!({"username": "u", "email": email})).unwrap(),
        )
    }

    #[test]
    fn duplicate_emails_keep_the_first_user() {
        let users = vec![user("a@x.com"), user("b@x.com"), user("a@x.com"), user("a@x.com")];
        let first = users[0].id;
        let extra: Vec<Value> = vec![users[2].id.to_value(), users[3].id.to_value()];

        let mut store = MockDocumentStore::new();
        store
            .expect_find()
            .returning(move |_, _| Ok(users.clone()));
        store
            .expect_delete_many()
            .withf(move |collection, filter| {
                collection == "users"
                    && filter.clauses()
                        == [("_id".to_string(), crate::domain::Condition::In(extra.clone()))]
            })
            .times(1)
            .returning(|_, _| Ok(2));

        let service = CatalogService::new(Box::new(store));
        let removed = service.remove_duplicate_emails().unwrap();
        assert_eq!(
            removed,
            vec![DuplicateEmail {
                email: "a@x.com".into(),
                kept: first,
                removed: 2,
            }]
        );
    }

    #[test]
    fn unique_emails_delete_nothing() {
        let users = vec![user("a@x.com"), user("b@x.com")];
        let mut store = MockDocumentStore::new();
        store.expect_find().returning(move |_, _| Ok(users.clone()));
        store.expect_delete_many().never();

        let service = CatalogService::new(Box::new(store));
        assert!(service.remove_duplicate_emails().unwrap().is_empty());
    }

    #[test]
    fn catalog_schemas_are_attached_and_well_formed() {
        let mut store = MockDocumentStore::new();
        store
            .expect_set_schema()
            .withf(|_, schema| schema.as_ref().is_some_and(|s| s.validate_definition().is_ok()))
            .times(3)
            .returning(|_, _| Ok(()));

        let service = CatalogService::new(Box::new(store));
        assert_eq!(
            service.apply_schemas().unwrap(),
            vec!["users", "courses", "assignments"]
        );
    }

    #[test]
    fn users_schema_refuses_a_malformed_email() {
        let (_, schema) = CatalogService::schemas().remove(0);
        let record = record_from_value(json!({
            "username": "bola",
            "email": "bola",
            "role": "student",
        }))
        .unwrap();
        let report = schema.check(&record);
        assert_eq!(report.fields().collect::<Vec<_>>(), vec!["email"]);
    }

    #[test]
    fn new_users_are_written_as_complete_records() {
        let mut store = MockDocumentStore::new();
        store
            .expect_insert_one()
            .withf(|collection, record| {
                collection == "users"
                    && record["role"] == "student"
                    && record["isActive"] == true
                    && record["profile"] == json!({})
                    && record["createdAt"]
                        .as_str()
                        .is_some_and(|s| s.len() == 20 && s.ends_with('Z'))
            })
            .times(1)
            .returning(|_, _| Ok(DocumentId::new()));

        let service = CatalogService::new(Box::new(store));
        service.add_student("ada", "ada@edu.com").unwrap();
    }

    #[test]
    fn timestamps_sort_as_time() {
        let early = "2025-01-09T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        let late = "2025-01-10T00:00:00.250Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(timestamp(early), "2025-01-09T23:59:59Z");
        assert_eq!(timestamp(late), "2025-01-10T00:00:00Z");
        assert!(timestamp(early) < timestamp(late));
    }

    #[test]
    fn completing_an_enrollment_sets_status_and_progress() {
        let mut store = MockDocumentStore::new();
        store
            .expect_update_one()
            .withf(|collection, _, update| {
                collection == "enrollments"
                    && *update == Update::new().set("status", "completed").set("progress", 100)
            })
            .returning(|_, _, _| {
                Ok(crate::application::UpdateResult {
                    matched: true,
                    modified: true,
                })
            });

        let service = CatalogService::new(Box::new(store));
        assert!(service.complete_enrollment(DocumentId::new()).unwrap());
    }

    #[test]
    fn empty_profile_update_skips_the_store() {
        let mut store = MockDocumentStore::new();
        store.expect_update_one().never();

        let service = CatalogService::new(Box::new(store));
        assert!(!service.update_profile(DocumentId::new(), &Record::new()).unwrap());
    }
}
