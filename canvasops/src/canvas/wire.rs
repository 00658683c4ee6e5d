//! Canvas JSON payloads, reduced to the fields the scanner reads.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::types::{CourseDescriptor, EnrollmentTerm};

/// Canvas ids arrive as numbers, or as strings when the
/// `Accept: application/json+canvas-string-ids` header is used.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected id value: {}", other))),
    }
}

fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("unexpected id value: {}", other))),
    }
}

#[derive(Debug, Deserialize)]
pub struct Course {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub workflow_state: Option<String>,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub enrollment_term_id: Option<String>,
    #[serde(default)]
    pub syllabus_body: Option<String>,
}

impl From<Course> for CourseDescriptor {
    fn from(course: Course) -> Self {
        CourseDescriptor {
            id: course.id,
            name: course.name.unwrap_or_else(|| "Unknown".to_string()),
            workflow_state: course.workflow_state,
            enrollment_term_id: course.enrollment_term_id,
        }
    }
}

/// Entry of `GET courses/{id}/pages`; bodies are not included in the listing
#[derive(Debug, Deserialize)]
pub struct PageSummary {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    pub url: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Assignments and quizzes both keep their HTML in `description`
#[derive(Debug, Deserialize)]
pub struct Described {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Discussion topics and announcements
#[derive(Debug, Deserialize)]
pub struct Topic {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TermList {
    #[serde(default)]
    pub enrollment_terms: Vec<Term>,
}

#[derive(Debug, Deserialize)]
pub struct Term {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub workflow_state: Option<String>,
}

impl From<Term> for EnrollmentTerm {
    fn from(term: Term) -> Self {
        EnrollmentTerm {
            id: term.id,
            name: term.name.unwrap_or_default(),
            workflow_state: term.workflow_state,
        }
    }
}
