//! Integration tests for eduhub-core services against the in-memory store.

use eduhub_adapters::InMemoryDocumentStore;
use eduhub_core::{
    application::{
        AnalyticsService, CatalogService, CourseService, SaveOutcome, collections,
        ports::DocumentStore,
    },
    domain::{Filter, Record, ViolationKind},
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

struct Fixture {
    store: InMemoryDocumentStore,
    catalog: CatalogService,
}

fn fixture() -> Fixture {
    let store = InMemoryDocumentStore::new();
    let catalog = CatalogService::new(Box::new(store.clone()));
    catalog.create_collections().unwrap();
    catalog.create_indexes().unwrap();
    Fixture { store, catalog }
}

#[test]
fn validation_scenarios_through_course_service() {
    let store = InMemoryDocumentStore::new();
    let courses = CourseService::new(Box::new(store.clone()));
    courses.ensure_indexes().unwrap();

    let saved = courses
        .save(record(json!({
            "title": "Python Backend Development",
            "price": 99.99,
            "instructorEmail": "tunde.a@eduhub.com",
            "level": "beginner",
            "isPublished": true,
        })))
        .unwrap();
    assert!(saved.is_saved());

    let missing = courses
        .save(record(json!({
            "price": 50,
            "instructorEmail": "chidi.o@eduhub.com",
            "level": "intermediate",
        })))
        .unwrap();
    assert!(matches!(missing, SaveOutcome::Invalid(_)));

    let duplicate = courses
        .save(record(json!({
            "title": "Data Science with Python",
            "price": 199.99,
            "instructorEmail": "tunde.a@eduhub.com",
            "level": "expert",
        })))
        .unwrap();
    let SaveOutcome::Duplicate(report) = &duplicate else {
        panic!("expected Duplicate, got {duplicate:?}");
    };
    assert_eq!(
        report.get("instructorEmail").map(|v| v.kind),
        Some(ViolationKind::DuplicateKey)
    );

    let bad_price = courses
        .save(record(json!({
            "title": "NoSQL Fundamentals",
            "price": "one hundred",
            "instructorEmail": "bola.m@eduhub.com",
            "level": "intermediate",
        })))
        .unwrap();
    assert_eq!(
        bad_price.report().and_then(|r| r.message("price")),
        Some("Course price must be a number, not 'string'.")
    );

    assert_eq!(courses.list().unwrap().len(), 1);
    assert_eq!(courses.clear().unwrap(), 1);
    assert_eq!(store.count("courses").unwrap(), 0);
}

#[test]
fn crud_walkthrough() {
    let Fixture { store, catalog } = fixture();

    let instructor = catalog.add_instructor("Dr. Smith", "smith@edu.com").unwrap();
    let alice = catalog.add_student("Alice_Initial", "alice@student.com").unwrap();
    let course = catalog
        .create_course("Introduction to Document Databases", instructor, "Programming")
        .unwrap();
    catalog
        .add_lesson(course, "Connecting to the store", "Opening a connection.")
        .unwrap();
    let enrollment = catalog.enroll(alice, course).unwrap().unwrap();
    catalog.record_grade(enrollment, "Quiz 1", 85.0).unwrap();

    // Create
    let chinedu = catalog
        .add_student("Chinedu_Okafor", "chinedu@student.com")
        .unwrap();
    let advanced = catalog
        .create_course("Advanced Data Structures", instructor, "Programming")
        .unwrap();
    let second = catalog.enroll(chinedu, advanced).unwrap();
    assert!(second.is_some());
    assert_eq!(catalog.enroll(chinedu, advanced).unwrap(), None);
    assert!(
        catalog
            .add_lesson(course, "Working with Arrays", "How arrays of objects work.")
            .unwrap()
    );

    // Duplicate user email is refused by the unique index.
    let dup = catalog.add_student("Alice Again", "alice@student.com");
    assert!(dup.unwrap_err().as_duplicate_key().is_some());

    // Read
    assert_eq!(catalog.find_active_students().unwrap().len(), 2);

    let joined = catalog.course_with_instructor(course).unwrap().unwrap();
    assert_eq!(joined.title, "Introduction to Document Databases");
    assert_eq!(joined.instructor_name.as_deref(), Some("Dr. Smith"));
    assert_eq!(joined.instructor_email.as_deref(), Some("smith@edu.com"));
    assert!(!joined.is_published);

    assert_eq!(catalog.courses_by_category("Programming").unwrap().len(), 2);

    let enrolled = catalog.students_in_course(advanced).unwrap();
    assert_eq!(enrolled.len(), 1);
    assert_eq!(enrolled[0].get_str("username"), Some("Chinedu_Okafor"));

    let found = catalog.search_courses_by_title("data").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get_str("title"), Some("Advanced Data Structures"));

    // Update
    assert!(
        catalog
            .update_profile(
                alice,
                &record(json!({"major": "Software Engineering", "year": 2026})),
            )
            .unwrap()
    );
    let alice_doc = store
        .find_one(collections::USERS, &Filter::by_id(alice))
        .unwrap()
        .unwrap();
    assert_eq!(alice_doc.get("profile.year"), Some(json!(2026)));

    assert!(catalog.publish_course(course).unwrap());
    assert!(!catalog.publish_course(course).unwrap());

    assert!(catalog.update_grade(enrollment, "Quiz 1", 95.0).unwrap());
    assert!(!catalog.update_grade(enrollment, "Final", 70.0).unwrap());

    assert!(
        catalog
            .add_tags(course, &["Arrays", "Advanced", "Database"])
            .unwrap()
    );
    assert!(!catalog.add_tags(course, &["Arrays"]).unwrap());

    // Delete
    assert!(catalog.soft_delete_user(alice).unwrap());
    assert_eq!(catalog.find_active_students().unwrap().len(), 1);

    assert!(catalog.delete_enrollment(second.unwrap()).unwrap());
    assert!(!catalog.delete_enrollment(second.unwrap()).unwrap());

    assert!(catalog.remove_lesson(course, "Connecting to the store").unwrap());
    assert!(!catalog.remove_lesson(course, "Connecting to the store").unwrap());
    let course_doc = store
        .find_one(collections::COURSES, &Filter::by_id(course))
        .unwrap()
        .unwrap();
    assert_eq!(
        course_doc.get("lessons").and_then(|l| l.as_array().map(Vec::len)),
        Some(1)
    );
}

#[test]
fn analytics_over_enrollments() {
    let Fixture { store, catalog } = fixture();
    let analytics = AnalyticsService::new(Box::new(store));

    let instructor = catalog.add_instructor("Dr. Smith", "smith@edu.com").unwrap();
    let rust = catalog.create_course("Rust", instructor, "Programming").unwrap();
    let go = catalog.create_course("Go", instructor, "Programming").unwrap();
    let sql = catalog.create_course("SQL", instructor, "Data").unwrap();

    let ada = catalog.add_student("ada", "ada@student.com").unwrap();
    let bo = catalog.add_student("bo", "bo@student.com").unwrap();

    let e1 = catalog.enroll(ada, rust).unwrap().unwrap();
    let e2 = catalog.enroll(bo, rust).unwrap().unwrap();
    catalog.enroll(ada, go).unwrap();
    catalog.enroll(bo, sql).unwrap();

    catalog.record_grade(e1, "Quiz 1", 90.0).unwrap();
    catalog.record_grade(e1, "Quiz 2", 81.0).unwrap();
    catalog.record_grade(e2, "Quiz 1", 70.0).unwrap();

    let per_course = analytics.enrollments_per_course().unwrap();
    assert_eq!(per_course[0].course_title, "Rust");
    assert_eq!(per_course[0].total_enrollments, 2);
    assert_eq!(per_course.len(), 3);

    let categories = analytics.category_stats().unwrap();
    assert_eq!(categories[0].category, "Programming");
    assert_eq!(categories[0].total_enrollments, 3);
    assert_eq!(categories[0].unique_course_count, 2);
    assert_eq!(categories[1].category, "Data");

    let averages = analytics.average_grade_per_student(10).unwrap();
    assert_eq!(averages.len(), 2);
    assert_eq!(averages[0].student_name, "ada");
    assert_eq!(averages[0].average_grade, 85.5);
    assert_eq!(averages[1].average_grade, 70.0);

    assert!(catalog.complete_enrollment(e1).unwrap());
    let completion = analytics.completion_rates().unwrap();
    assert_eq!(completion[0].course_title, "Rust");
    assert_eq!(completion[0].completion_rate, 50.0);
    assert_eq!(completion.len(), 3);

    let reach = analytics.students_per_instructor().unwrap();
    assert_eq!(reach.len(), 1);
    assert_eq!(reach[0].course_count, 3);
    assert_eq!(reach[0].unique_students, 2);

    let trends = analytics.monthly_enrollment_trends().unwrap();
    assert_eq!(trends.iter().map(|m| m.enrollments).sum::<u64>(), 4);

    let quiz = catalog
        .create_assignment(rust, "Ownership quiz", Utc::now() + Duration::days(2))
        .unwrap();
    catalog.submit_assignment(quiz, ada, Some(9.0)).unwrap();
    catalog.submit_assignment(quiz, ada, None).unwrap();
    catalog.submit_assignment(quiz, bo, Some(7.5)).unwrap();
    let engagement = analytics.engagement().unwrap();
    assert_eq!(engagement.students_with_submissions, 2);
    assert_eq!(engagement.average_submissions_per_student, 1.5);
}

#[test]
fn schemas_duplicate_cleanup_and_range_queries() {
    let store = InMemoryDocumentStore::new();
    let catalog = CatalogService::new(Box::new(store.clone()));
    catalog.create_collections().unwrap();
    catalog.apply_schemas().unwrap();

    let instructor = catalog.add_instructor("Dr. Smith", "smith@edu.com").unwrap();
    let ada = catalog.add_student("ada", "ada@student.com").unwrap();
    catalog.add_student("ada_again", "ada@student.com").unwrap();
    catalog.add_student("ada_third", "ada@student.com").unwrap();

    let removed = catalog.remove_duplicate_emails().unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].kept, ada);
    assert_eq!(removed[0].removed, 2);
    assert_eq!(store.count(collections::USERS).unwrap(), 2);

    // With the duplicates gone the unique index can be built.
    catalog.create_indexes().unwrap();

    let refused = catalog.add_student("bola", "bola").unwrap_err();
    let report = refused.as_schema_violation().unwrap();
    assert_eq!(report.fields().collect::<Vec<_>>(), vec!["email"]);

    let rust = catalog.create_course("Rust", instructor, "Programming").unwrap();
    let go = catalog.create_course("Go", instructor, "Programming").unwrap();
    let sql = catalog.create_course("SQL", instructor, "Data").unwrap();
    for (course, price) in [(rust, 120.0), (go, 50.0), (sql, 250.0)] {
        assert!(catalog.set_price(course, price).unwrap());
    }
    let negative = catalog.set_price(sql, -1.0).unwrap_err();
    assert!(negative.as_schema_violation().unwrap().contains("price"));

    let mut in_range: Vec<_> = catalog
        .courses_in_price_range(50.0, 200.0)
        .unwrap()
        .iter()
        .filter_map(|c| c.get_str("title").map(str::to_string))
        .collect();
    in_range.sort();
    assert_eq!(in_range, vec!["Go", "Rust"]);

    catalog.add_tags(rust, &["systems", "memory"]).unwrap();
    catalog.add_tags(sql, &["database"]).unwrap();
    assert_eq!(catalog.courses_with_any_tag(&["database", "memory"]).unwrap().len(), 2);
    assert!(catalog.courses_with_any_tag(&["cooking"]).unwrap().is_empty());

    let now = Utc::now();
    assert_eq!(catalog.users_joined_since(now - Duration::days(183)).unwrap().len(), 2);
    assert!(catalog.users_joined_since(now + Duration::days(1)).unwrap().is_empty());

    catalog.create_assignment(rust, "Borrowing", now + Duration::days(1)).unwrap();
    catalog.create_assignment(rust, "Lifetimes", now + Duration::days(6)).unwrap();
    catalog.create_assignment(go, "Goroutines", now + Duration::days(9)).unwrap();
    catalog.create_assignment(go, "Overdue", now - Duration::days(1)).unwrap();
    let due: Vec<_> = catalog
        .assignments_due_between(now, now + Duration::days(7))
        .unwrap()
        .iter()
        .filter_map(|a| a.get_str("title").map(str::to_string))
        .collect();
    assert_eq!(due, vec!["Borrowing", "Lifetimes"]);
}
