//! Course vocabulary: the validated fields and the supported levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

// ── CourseField ──────────────────────────────────────────────────────────────

/// A field of a course record that the validator has rules for.
///
/// Any other key in a record passes through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseField {
    Title,
    Price,
    InstructorEmail,
    Level,
}

impl CourseField {
    /// Required fields, in the order presence is checked.
    pub const REQUIRED: [CourseField; 4] = [
        Self::Title,
        Self::Price,
        Self::InstructorEmail,
        Self::Level,
    ];

    /// Wire name of the field.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Price => "price",
            Self::InstructorEmail => "instructorEmail",
            Self::Level => "level",
        }
    }
}

impl fmt::Display for CourseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── CourseLevel ──────────────────────────────────────────────────────────────

/// Difficulty level of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl CourseLevel {
    pub const ALL: [CourseLevel; 3] = [Self::Beginner, Self::Intermediate, Self::Expert];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
        }
    }

    /// Allowed values rendered as a list literal, e.g. `['beginner', 'expert']`.
    pub fn allowed_list() -> String {
        let quoted: Vec<String> = Self::ALL
            .iter()
            .map(|l| format!("'{}'", l.as_str()))
            .collect();
        format!("[{}]", quoted.join(", "))
    }
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseLevel {
    type Err = DomainError;

    /// Case-insensitive: `"Beginner"` and `"BEGINNER"` both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "expert" => Ok(Self::Expert),
            _ => Err(DomainError::UnknownLevel(s.to_string())),
        }
    }
}
