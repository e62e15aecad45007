//! End-to-end tests for the `eduhub` binary.

use assert_cmd::{Command, cargo};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const VALID_COURSE: &str = r#"{"title": "Python Backend Development", "price": 99.99, "instructorEmail": "tunde.a@eduhub.com", "level": "beginner", "isPublished": true}"#;
const SAME_INSTRUCTOR: &str = r#"{"title": "Data Science with Python", "price": 199.99, "instructorEmail": "tunde.a@eduhub.com", "level": "expert"}"#;
const MISSING_TITLE: &str =
    r#"{"price": 50, "instructorEmail": "chidi.o@eduhub.com", "level": "intermediate"}"#;
const PRICE_AS_TEXT: &str = r#"{"title": "NoSQL Fundamentals", "price": "one hundred", "instructorEmail": "bola.m@eduhub.com", "level": "intermediate"}"#;

/// Every command runs with its own config, data and working directories.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let root = self.dir.path();
        let mut cmd = cargo::cargo_bin_cmd!("eduhub");
        cmd.current_dir(root)
            .env("HOME", root)
            .env("XDG_CONFIG_HOME", root.join("config"))
            .env("XDG_DATA_HOME", root.join("data"))
            .env("EDUHUB__STORE__DATA_DIR", root.join("store"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

// ── basics ────────────────────────────────────────────────────────────────────

#[test]
fn help_lists_commands() {
    Sandbox::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("course"))
        .stdout(predicate::str::contains("demo"));
}

#[test]
fn version_flag() {
    Sandbox::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn no_arguments_is_a_usage_error() {
    Sandbox::new().cmd().assert().code(2);
}

// ── validate ──────────────────────────────────────────────────────────────────

#[test]
fn valid_record_passes() {
    Sandbox::new()
        .cmd()
        .args(["validate", "--json", VALID_COURSE])
        .assert()
        .success()
        .stdout(predicate::str::contains("Course record is valid"));
}

#[test]
fn missing_title_is_reported_and_exits_two() {
    Sandbox::new()
        .cmd()
        .args(["validate", "--json", MISSING_TITLE])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "title: 'title' is a required field.",
        ))
        .stdout(predicate::str::contains("price").not())
        .stderr(predicate::str::contains("Course record rejected"));
}

#[test]
fn stdin_record_with_json_output() {
    let output = Sandbox::new()
        .cmd()
        .args(["--output-format", "json", "validate"])
        .write_stdin(PRICE_AS_TEXT)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let report = stdout_json(&output);
    assert_eq!(
        report,
        serde_json::json!({"price": "Course price must be a number, not 'string'."})
    );
}

#[test]
fn record_from_file() {
    let sandbox = Sandbox::new();
    let file = sandbox.path("course.json");
    std::fs::write(&file, r#"{"title": "Go", "price": -5, "instructorEmail": "a@edu.com", "level": "Beginner"}"#)
        .unwrap();

    sandbox
        .cmd()
        .args(["validate", "--file"])
        .arg(&file)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("price: Price cannot be negative."))
        .stdout(predicate::str::contains("level").not());
}

#[test]
fn malformed_json_is_invalid_input() {
    Sandbox::new()
        .cmd()
        .args(["validate", "--json", "{oops"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn non_object_record_is_refused() {
    Sandbox::new()
        .cmd()
        .args(["validate", "--json", "[1, 2]"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("must be an object"));
}

#[test]
fn missing_file_exits_three() {
    Sandbox::new()
        .cmd()
        .args(["validate", "--file", "nope.json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("File not found"));
}

// ── course ────────────────────────────────────────────────────────────────────

#[test]
fn add_list_and_duplicate_instructor() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["course", "add", "--json", VALID_COURSE])
        .assert()
        .success()
        .stdout(predicate::str::contains("Course saved to 'courses'"));
    assert!(sandbox.path("store/eduhub_db.json").exists());

    sandbox
        .cmd()
        .args(["course", "add", "--json", SAME_INSTRUCTOR])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "Field 'instructorEmail' with value 'tunde.a@eduhub.com' already exists.",
        ))
        .stderr(predicate::str::contains("eduhub course list"));

    let output = sandbox
        .cmd()
        .args(["course", "list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let courses = stdout_json(&output);
    let courses = courses.as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["title"], "Python Backend Development");
    assert!(courses[0]["_id"].is_string());
}

#[test]
fn invalid_record_is_not_stored() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["course", "add", "--json", MISSING_TITLE])
        .assert()
        .code(2);

    sandbox
        .cmd()
        .args(["course", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No courses stored"));
}

// ── setup ─────────────────────────────────────────────────────────────────────

#[test]
fn setup_creates_indexes_and_reset_clears_courses() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .arg("setup")
        .assert()
        .success()
        .stdout(predicate::str::contains("users.email_1"))
        .stdout(predicate::str::contains("courses.title_1_category_1"))
        .stdout(predicate::str::contains("courses.instructorEmail_1"))
        .stdout(predicate::str::contains("enrollments.studentId_1_courseId_1"));

    sandbox
        .cmd()
        .args(["course", "add", "--json", VALID_COURSE])
        .assert()
        .success();

    sandbox.cmd().args(["setup", "--reset"]).assert().success();

    sandbox
        .cmd()
        .args(["course", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No courses stored"));
}

#[test]
fn setup_attaches_schemas_that_course_add_honours() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .arg("setup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Schemas:"))
        .stdout(predicate::str::contains("  assignments"));

    sandbox
        .cmd()
        .args([
            "course",
            "add",
            "--json",
            r#"{"title": "Rust", "price": 10, "instructorEmail": "kemi@eduhub.com", "level": "beginner", "tags": ["systems", 7]}"#,
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "tags: 'tags' items must be of type 'string'.",
        ));

    sandbox
        .cmd()
        .args(["course", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No courses stored"));
}

// ── demo ──────────────────────────────────────────────────────────────────────

#[test]
fn demo_validation_walkthrough() {
    Sandbox::new()
        .cmd()
        .args(["demo", "--part", "validation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scenario 6: Malformed email"))
        .stdout(predicate::str::contains(
            "'guru' is not a supported course level.",
        ))
        .stdout(predicate::str::contains(
            "'emeka.at.home' is not a valid email format.",
        ));
}

#[test]
fn demo_json_summary() {
    let output = Sandbox::new()
        .cmd()
        .args(["--output-format", "json", "demo"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary = stdout_json(&output);
    let scenarios = summary["validation"].as_array().unwrap();
    assert_eq!(scenarios.len(), 6);
    assert_eq!(scenarios[0]["saved"], true);
    assert_eq!(
        scenarios[3]["report"]["instructorEmail"],
        "Field 'instructorEmail' with value 'tunde.a@eduhub.com' already exists."
    );
    assert!(
        !summary["analytics"]["topStudents"]
            .as_array()
            .unwrap()
            .is_empty()
    );

    let analytics = &summary["analytics"];
    let completion = analytics["completionRates"].as_array().unwrap();
    assert_eq!(completion[0]["courseTitle"], "Applied Statistics");
    assert_eq!(completion[0]["completionRate"], 100.0);
    assert_eq!(analytics["studentsPerInstructor"][0]["instructorName"], "Dr. Smith");
    assert_eq!(analytics["studentsPerInstructor"][0]["uniqueStudents"], 2);
    assert_eq!(analytics["monthlyEnrollments"].as_array().unwrap().len(), 1);
    assert_eq!(analytics["engagement"]["totalSubmissions"], 3);
    assert_eq!(analytics["engagement"]["averageSubmissionsPerStudent"], 1.5);
}

#[test]
fn demo_crud_walkthrough_covers_queries_and_cleanup() {
    Sandbox::new()
        .cmd()
        .args(["demo", "--part", "crud"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "removed 1 user(s) duplicating 'alice@student.com'",
        ))
        .stdout(predicate::str::contains("user refused by the schema"))
        .stdout(predicate::str::contains("2 course(s) priced between 50 and 200"))
        .stdout(predicate::str::contains("1 assignment(s) due in the next 7 days"))
        .stdout(predicate::str::contains("1 course(s) tagged Database or Python"));
}

// ── config ────────────────────────────────────────────────────────────────────

#[test]
fn init_writes_config_once() {
    let sandbox = Sandbox::new();
    let config = sandbox.path("eduhub.toml");

    sandbox
        .cmd()
        .arg("--config")
        .arg(&config)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration created"));

    let text = std::fs::read_to_string(&config).unwrap();
    assert!(text.contains("[store]"));
    assert!(text.contains("eduhub_db"));

    sandbox
        .cmd()
        .arg("--config")
        .arg(&config)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn config_get_reads_file_and_environment() {
    let sandbox = Sandbox::new();
    let config = sandbox.path("eduhub.toml");
    std::fs::write(&config, "[store]\ndatabase = \"school\"\n").unwrap();

    sandbox
        .cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "store.database"])
        .assert()
        .success()
        .stdout(predicate::str::contains("school"));

    sandbox
        .cmd()
        .env("EDUHUB__STORE__DATABASE", "campus")
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "store.database"])
        .assert()
        .success()
        .stdout(predicate::str::contains("campus"));
}

#[test]
fn missing_explicit_config_exits_four() {
    Sandbox::new()
        .cmd()
        .args(["--config", "absent.toml", "config", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn unknown_config_key_exits_four() {
    Sandbox::new()
        .cmd()
        .args(["config", "get", "store.colour"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn completions_for_bash() {
    Sandbox::new()
        .cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("eduhub"));
}
