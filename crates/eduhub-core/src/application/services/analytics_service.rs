//! Analytics Service - enrollment and grade statistics.
//!
//! Aggregations are computed in memory over `find` results, joining
//! enrollments to courses and users by their id references.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    application::{ports::DocumentStore, services::collections},
    domain::{Document, DocumentId, Filter},
    error::EduhubResult,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEnrollmentCount {
    pub course_id: DocumentId,
    pub course_title: String,
    pub total_enrollments: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: String,
    pub total_enrollments: u64,
    pub unique_course_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAverage {
    pub student_id: DocumentId,
    pub student_name: String,
    /// Mean score, rounded to two decimals.
    pub average_grade: f64,
    pub grade_count: usize,
}

/// Share of a course's enrollments marked completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRate {
    pub course_id: DocumentId,
    pub course_title: String,
    pub total_enrollments: u64,
    pub completed: u64,
    /// Percentage, rounded to two decimals.
    pub completion_rate: f64,
}

/// Distinct students enrolled across an instructor's courses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorReach {
    pub instructor_id: DocumentId,
    pub instructor_name: String,
    pub course_count: usize,
    pub unique_students: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEnrollments {
    /// `YYYY-MM`.
    pub month: String,
    pub enrollments: u64,
}

/// Submission activity across all students.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub students_with_submissions: usize,
    pub total_submissions: u64,
    /// Rounded to two decimals; zero when nobody has submitted.
    pub average_submissions_per_student: f64,
}

pub struct AnalyticsService {
    store: Box<dyn DocumentStore>,
}

impl AnalyticsService {
    pub fn new(store: Box<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Enrollment count per course, highest first.
    ///
    /// Enrollments pointing at a missing course are not counted.
    #[instrument(skip(self))]
    pub fn enrollments_per_course(&self) -> EduhubResult<Vec<CourseEnrollmentCount>> {
        let courses = self.index_by_id(collections::COURSES)?;

        let mut counts: HashMap<DocumentId, u64> = HashMap::new();
        for enrollment in self.enrollments()? {
            if let Some(course_id) = reference(&enrollment, "courseId") {
                *counts.entry(course_id).or_default() += 1;
            }
        }

        let mut rows: Vec<CourseEnrollmentCount> = counts
            .into_iter()
            .filter_map(|(course_id, total)| {
                let course = courses.get(&course_id)?;
                Some(CourseEnrollmentCount {
                    course_id,
                    course_title: course.get_str("title").unwrap_or_default().to_string(),
                    total_enrollments: total,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_enrollments
                .cmp(&a.total_enrollments)
                .then_with(|| a.course_title.cmp(&b.course_title))
        });
        debug!(courses = rows.len(), "Enrollment counts computed");
        Ok(rows)
    }

    /// Enrollments grouped by course category, highest first.
    #[instrument(skip(self))]
    pub fn category_stats(&self) -> EduhubResult<Vec<CategoryStats>> {
        let courses = self.index_by_id(collections::COURSES)?;

        let mut groups: HashMap<String, (u64, HashSet<DocumentId>)> = HashMap::new();
        for enrollment in self.enrollments()? {
            let Some(course_id) = reference(&enrollment, "courseId") else {
                continue;
            };
            let Some(category) = courses.get(&course_id).and_then(|c| c.get_str("category"))
            else {
                continue;
            };
            let entry = groups.entry(category.to_string()).or_default();
            entry.0 += 1;
            entry.1.insert(course_id);
        }

        let mut rows: Vec<CategoryStats> = groups
            .into_iter()
            .map(|(category, (total, courses))| CategoryStats {
                category,
                total_enrollments: total,
                unique_course_count: courses.len(),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_enrollments
                .cmp(&a.total_enrollments)
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(rows)
    }

    /// Average assignment score per student across all enrollments, highest
    /// first, at most `limit` rows.
    #[instrument(skip(self))]
    pub fn average_grade_per_student(&self, limit: usize) -> EduhubResult<Vec<StudentAverage>> {
        let users = self.index_by_id(collections::USERS)?;

        let mut scores: HashMap<DocumentId, Vec<f64>> = HashMap::new();
        for enrollment in self.enrollments()? {
            let Some(student_id) = reference(&enrollment, "studentId") else {
                continue;
            };
            let grades = enrollment
                .get_ref("grades")
                .and_then(Value::as_array)
                .map(|g| g.as_slice())
                .unwrap_or_default();
            let numeric = grades
                .iter()
                .filter_map(|g| g.get("score").and_then(Value::as_f64));
            scores.entry(student_id).or_default().extend(numeric);
        }

        let mut rows: Vec<StudentAverage> = scores
            .into_iter()
            .filter(|(_, s)| !s.is_empty())
            .filter_map(|(student_id, s)| {
                let student = users.get(&student_id)?;
                let mean = s.iter().sum::<f64>() / s.len() as f64;
                Some(StudentAverage {
                    student_id,
                    student_name: student.get_str("username").unwrap_or_default().to_string(),
                    average_grade: round2(mean),
                    grade_count: s.len(),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.average_grade
                .total_cmp(&a.average_grade)
                .then_with(|| a.student_name.cmp(&b.student_name))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    /// Completion rate per course, highest first.
    #[instrument(skip(self))]
    pub fn completion_rates(&self) -> EduhubResult<Vec<CompletionRate>> {
        let courses = self.index_by_id(collections::COURSES)?;

        let mut tallies: HashMap<DocumentId, (u64, u64)> = HashMap::new();
        for enrollment in self.enrollments()? {
            let Some(course_id) = reference(&enrollment, "courseId") else {
                continue;
            };
            let tally = tallies.entry(course_id).or_default();
            tally.0 += 1;
            if enrollment.get_str("status") == Some("completed") {
                tally.1 += 1;
            }
        }

        let mut rows: Vec<CompletionRate> = tallies
            .into_iter()
            .filter_map(|(course_id, (total, completed))| {
                let course = courses.get(&course_id)?;
                Some(CompletionRate {
                    course_id,
                    course_title: course.get_str("title").unwrap_or_default().to_string(),
                    total_enrollments: total,
                    completed,
                    completion_rate: round2(completed as f64 * 100.0 / total as f64),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.completion_rate
                .total_cmp(&a.completion_rate)
                .then_with(|| a.course_title.cmp(&b.course_title))
        });
        Ok(rows)
    }

    /// Unique students taught per instructor, highest first. Instructors
    /// without enrollments are left out.
    #[instrument(skip(self))]
    pub fn students_per_instructor(&self) -> EduhubResult<Vec<InstructorReach>> {
        let courses = self.index_by_id(collections::COURSES)?;
        let users = self.index_by_id(collections::USERS)?;

        let mut reach: HashMap<DocumentId, (HashSet<DocumentId>, HashSet<DocumentId>)> =
            HashMap::new();
        for enrollment in self.enrollments()? {
            let (Some(course_id), Some(student_id)) = (
                reference(&enrollment, "courseId"),
                reference(&enrollment, "studentId"),
            ) else {
                continue;
            };
            let Some(instructor_id) = courses
                .get(&course_id)
                .and_then(|c| reference(c, "instructorId"))
            else {
                continue;
            };
            let entry = reach.entry(instructor_id).or_default();
            entry.0.insert(course_id);
            entry.1.insert(student_id);
        }

        let mut rows: Vec<InstructorReach> = reach
            .into_iter()
            .filter_map(|(instructor_id, (taught, students))| {
                let instructor = users.get(&instructor_id)?;
                Some(InstructorReach {
                    instructor_id,
                    instructor_name: instructor
                        .get_str("username")
                        .unwrap_or_default()
                        .to_string(),
                    course_count: taught.len(),
                    unique_students: students.len(),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.unique_students
                .cmp(&a.unique_students)
                .then_with(|| a.instructor_name.cmp(&b.instructor_name))
        });
        Ok(rows)
    }

    /// Enrollments per calendar month (UTC), oldest first. Enrollments
    /// without a parseable `enrollmentDate` are skipped.
    #[instrument(skip(self))]
    pub fn monthly_enrollment_trends(&self) -> EduhubResult<Vec<MonthlyEnrollments>> {
        let mut months: BTreeMap<String, u64> = BTreeMap::new();
        for enrollment in self.enrollments()? {
            let Some(at) = enrollment
                .get_str("enrollmentDate")
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            else {
                debug!(id = %enrollment.id, "Enrollment without a usable date");
                continue;
            };
            let month = at.with_timezone(&Utc).format("%Y-%m").to_string();
            *months.entry(month).or_default() += 1;
        }

        Ok(months
            .into_iter()
            .map(|(month, enrollments)| MonthlyEnrollments { month, enrollments })
            .collect())
    }

    /// Average number of submissions per student who submitted at least once.
    #[instrument(skip(self))]
    pub fn engagement(&self) -> EduhubResult<Engagement> {
        let submissions = self.store.find(collections::SUBMISSIONS, &Filter::all())?;

        let mut per_student: HashMap<DocumentId, u64> = HashMap::new();
        for submission in &submissions {
            if let Some(student_id) = reference(submission, "studentId") {
                *per_student.entry(student_id).or_default() += 1;
            }
        }

        let total: u64 = per_student.values().sum();
        let students = per_student.len();
        let average = if students == 0 {
            0.0
        } else {
            round2(total as f64 / students as f64)
        };
        Ok(Engagement {
            students_with_submissions: students,
            total_submissions: total,
            average_submissions_per_student: average,
        })
    }

    fn enrollments(&self) -> EduhubResult<Vec<Document>> {
        self.store.find(collections::ENROLLMENTS, &Filter::all())
    }

    fn index_by_id(&self, collection: &str) -> EduhubResult<HashMap<DocumentId, Document>> {
        Ok(self
            .store
            .find(collection, &Filter::all())?
            .into_iter()
            .map(|d| (d.id, d))
            .collect())
    }
}

fn reference(doc: &Document, field: &str) -> Option<DocumentId> {
    doc.get_str(field).and_then(|s| s.parse().ok())
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockDocumentStore;
    use serde_json::json;

    fn doc(id: DocumentId, value: Value) -> Document {
        let Value::Object(fields) = value else {
            panic!("object literal expected");
        };
        Document::new(id, fields)
    }

    #[test]
    fn averages_are_rounded_and_sorted() {
        let ada = DocumentId::new();
        let bo = DocumentId::new();
        let users = vec![
            doc(ada, json!({"username": "ada"})),
            doc(bo, json!({"username": "bo"})),
        ];
        let enrollments = vec![
            doc(
                DocumentId::new(),
                json!({"studentId": ada.to_string(), "grades": [{"score": 90}, {"score": 85}, {"score": 86}]}),
            ),
            doc(
                DocumentId::new(),
                json!({"studentId": bo.to_string(), "grades": [{"score": 99}]}),
            ),
        ];

        let mut store = MockDocumentStore::new();
        store.expect_find().returning(move |collection, _| {
            Ok(match collection {
                "users" => users.clone(),
                "enrollments" => enrollments.clone(),
                _ => Vec::new(),
            })
        });

        let service = AnalyticsService::new(Box::new(store));
        let rows = service.average_grade_per_student(10).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].student_name, "bo");
        assert_eq!(rows[1].average_grade, 87.0);
        assert_eq!(rows[1].grade_count, 3);

        assert_eq!(service.average_grade_per_student(1).unwrap().len(), 1);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(86.666_666), 86.67);
        assert_eq!(round2(70.0), 70.0);
    }

    #[test]
    fn empty_store_yields_no_rows() {
        let mut store = MockDocumentStore::new();
        store.expect_find().returning(|_, _| Ok(Vec::new()));

        let service = AnalyticsService::new(Box::new(store));
        assert!(service.enrollments_per_course().unwrap().is_empty());
        assert!(service.category_stats().unwrap().is_empty());
        assert!(service.completion_rates().unwrap().is_empty());
        assert!(service.students_per_instructor().unwrap().is_empty());
        assert!(service.monthly_enrollment_trends().unwrap().is_empty());
        assert_eq!(
            service.engagement().unwrap(),
            Engagement {
                students_with_submissions: 0,
                total_submissions: 0,
                average_submissions_per_student: 0.0,
            }
        );
    }

    fn service_over(data: Vec<(&'static str, Vec<Document>)>) -> AnalyticsService {
        let mut store = MockDocumentStore::new();
        store.expect_find().returning(move |collection, _| {
            Ok(data
                .iter()
                .find(|(name, _)| *name == collection)
                .map(|(_, docs)| docs.clone())
                .unwrap_or_default())
        });
        AnalyticsService::new(Box::new(store))
    }

    #[test]
    fn completion_rate_counts_completed_enrollments() {
        let rust = DocumentId::new();
        let go = DocumentId::new();
        let enrollment = |course: DocumentId, status: &str| {
            doc(
                DocumentId::new(),
                json!({"courseId": course.to_string(), "status": status}),
            )
        };

        let service = service_over(vec![
            (
                "courses",
                vec![
                    doc(rust, json!({"title": "Rust"})),
                    doc(go, json!({"title": "Go"})),
                ],
            ),
            (
                "enrollments",
                vec![
                    enrollment(rust, "completed"),
                    enrollment(rust, "active"),
                    enrollment(rust, "active"),
                    enrollment(go, "completed"),
                ],
            ),
        ]);

        let rows = service.completion_rates().unwrap();
        assert_eq!(rows[0].course_title, "Go");
        assert_eq!(rows[0].completion_rate, 100.0);
        assert_eq!(rows[1].total_enrollments, 3);
        assert_eq!(rows[1].completed, 1);
        assert_eq!(rows[1].completion_rate, 33.33);
    }

    #[test]
    fn students_are_counted_once_per_instructor() {
        let grace = DocumentId::new();
        let (c1, c2) = (DocumentId::new(), DocumentId::new());
        let (ada, bo) = (DocumentId::new(), DocumentId::new());
        let enrollment = |student: DocumentId, course: DocumentId| {
            doc(
                DocumentId::new(),
                json!({"studentId": student.to_string(), "courseId": course.to_string()}),
            )
        };

        let service = service_over(vec![
            ("users", vec![doc(grace, json!({"username": "grace"}))]),
            (
                "courses",
                vec![
                    doc(c1, json!({"title": "A", "instructorId": grace.to_string()})),
                    doc(c2, json!({"title": "B", "instructorId": grace.to_string()})),
                ],
            ),
            (
                "enrollments",
                vec![enrollment(ada, c1), enrollment(ada, c2), enrollment(bo, c2)],
            ),
        ]);

        let rows = service.students_per_instructor().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].instructor_name, "grace");
        assert_eq!(rows[0].course_count, 2);
        assert_eq!(rows[0].unique_students, 2);
    }

    #[test]
    fn monthly_trends_are_ordered_and_skip_bad_dates() {
        let on = |date: &str| doc(DocumentId::new(), json!({"enrollmentDate": date}));
        let service = service_over(vec![(
            "enrollments",
            vec![
                on("2025-03-14T09:00:00Z"),
                on("2024-12-31T23:30:00-02:00"),
                on("2025-03-01T00:00:00Z"),
                on("last week"),
            ],
        )]);

        let rows = service.monthly_enrollment_trends().unwrap();
        assert_eq!(
            rows,
            vec![
                MonthlyEnrollments { month: "2025-01".into(), enrollments: 1 },
                MonthlyEnrollments { month: "2025-03".into(), enrollments: 2 },
            ]
        );
    }

    #[test]
    fn engagement_averages_over_submitting_students() {
        let (ada, bo) = (DocumentId::new(), DocumentId::new());
        let by = |student: DocumentId| {
            doc(DocumentId::new(), json!({"studentId": student.to_string()}))
        };
        let service = service_over(vec![(
            "submissions",
            vec![by(ada), by(ada), by(bo)],
        )]);

        let stats = service.engagement().unwrap();
        assert_eq!(stats.students_with_submissions, 2);
        assert_eq!(stats.total_submissions, 3);
        assert_eq!(stats.average_submissions_per_student, 1.5);
    }
}
