use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::{Host, Url};

use super::error::{CanvasOpsError, Result};

/// Canvas origin plus bearer token for one run. Never persisted.
#[derive(Clone)]
pub struct CredentialContext {
    pub base_url: String,
    pub api_token: String,
}

impl CredentialContext {
    /// Build a credential context, normalising the base URL.
    ///
    /// A bare host gets an `https://` prefix, an explicit scheme is kept,
    /// and trailing slashes are dropped. With `beta` set, production
    /// `*.instructure.com` hosts are pointed at their beta instance.
    pub fn new(base_url: &str, api_token: &str, beta: bool) -> Result<Self> {
        let base_url = base_url.trim();
        let api_token = api_token.trim();
        if base_url.is_empty() || api_token.is_empty() {
            return Err(CanvasOpsError::validation("missing Canvas credentials"));
        }

        let mut normalized = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url.to_string()
        } else {
            format!("https://{}", base_url)
        };
        while normalized.ends_with('/') {
            normalized.pop();
        }

        if beta && !normalized.contains(".beta.instructure.com") {
            normalized = normalized.replace(".instructure.com", ".beta.instructure.com");
        }

        let parsed = Url::parse(&normalized).map_err(|e| {
            CanvasOpsError::validation(format!("invalid Canvas base URL '{}': {}", base_url, e))
        })?;
        if parsed.host_str().is_none() {
            return Err(CanvasOpsError::validation(format!(
                "invalid Canvas base URL '{}': no host",
                base_url
            )));
        }
        if sends_token_in_cleartext(&parsed) {
            tracing::warn!(
                "Canvas base URL {} is not HTTPS; the API token will be sent unencrypted",
                normalized
            );
        }

        Ok(Self {
            base_url: normalized,
            api_token: api_token.to_string(),
        })
    }

    /// `{base_url}/api/v1`
    pub fn api_root(&self) -> String {
        format!("{}/api/v1", self.base_url)
    }
}

/// Plain `http://` to anything other than a loopback host
fn sends_token_in_cleartext(url: &Url) -> bool {
    if url.scheme() != "http" {
        return false;
    }
    match url.host() {
        Some(Host::Domain(domain)) => !domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => !addr.is_loopback(),
        Some(Host::Ipv6(addr)) => !addr.is_loopback(),
        None => false,
    }
}

impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// One find/replace pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMapping {
    #[serde(rename = "old")]
    pub old_value: String,
    #[serde(rename = "new")]
    pub new_value: String,
}

impl UrlMapping {
    pub fn new(old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }

    /// Both sides non-empty
    pub fn is_active(&self) -> bool {
        !self.old_value.is_empty() && !self.new_value.is_empty()
    }
}

impl FromStr for UrlMapping {
    type Err = CanvasOpsError;

    /// Parse `OLD=NEW`. Splits on the first `=` followed by a scheme or on the
    /// last `=` otherwise, so query strings survive on the old side.
    fn from_str(s: &str) -> Result<Self> {
        let split_at = s
            .match_indices('=')
            .map(|(i, _)| i)
            .find(|&i| {
                let rest = &s[i + 1..];
                rest.starts_with("http://") || rest.starts_with("https://")
            })
            .or_else(|| s.rfind('='));

        match split_at {
            Some(i) => Ok(Self::new(&s[..i], &s[i + 1..])),
            None => Err(CanvasOpsError::validation(format!(
                "mapping '{}' must have the form OLD=NEW",
                s
            ))),
        }
    }
}

/// Canvas content collections that can be scanned, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Syllabus,
    Page,
    Assignment,
    Quiz,
    Discussion,
    Announcement,
}

impl ContentType {
    /// Fixed processing order within a course
    pub const ALL: [ContentType; 6] = [
        ContentType::Syllabus,
        ContentType::Page,
        ContentType::Assignment,
        ContentType::Quiz,
        ContentType::Discussion,
        ContentType::Announcement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Syllabus => "syllabus",
            ContentType::Page => "page",
            ContentType::Assignment => "assignment",
            ContentType::Quiz => "quiz",
            ContentType::Discussion => "discussion",
            ContentType::Announcement => "announcement",
        }
    }

    /// Human-facing label for reports
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Syllabus => "Syllabus",
            ContentType::Page => "Page",
            ContentType::Assignment => "Assignment",
            ContentType::Quiz => "Quiz",
            ContentType::Discussion => "Discussion",
            ContentType::Announcement => "Announcement",
        }
    }

    /// Sort and de-duplicate a selection into processing order
    pub fn in_processing_order(selection: &[ContentType]) -> Vec<ContentType> {
        ContentType::ALL
            .iter()
            .copied()
            .filter(|t| selection.contains(t))
            .collect()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = CanvasOpsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "syllabus" => Ok(ContentType::Syllabus),
            "page" | "pages" => Ok(ContentType::Page),
            "assignment" | "assignments" => Ok(ContentType::Assignment),
            "quiz" | "quizzes" => Ok(ContentType::Quiz),
            "discussion" | "discussions" => Ok(ContentType::Discussion),
            "announcement" | "announcements" => Ok(ContentType::Announcement),
            other => Err(CanvasOpsError::validation(format!(
                "unknown content type '{}'",
                other
            ))),
        }
    }
}

/// One fetched piece of course content. Transient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub course_id: String,
    pub content_type: ContentType,
    /// Page url slug or numeric id; `None` for the syllabus
    pub item_id: Option<String>,
    pub body: String,
    pub location_url: String,
}

/// Course metadata needed for scanning and reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_term_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentTerm {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Record findings only
    Preview,
    /// Record findings and write changed bodies back to Canvas
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingStatus {
    Preview,
    Updated,
}

impl FindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingStatus::Preview => "Preview",
            FindingStatus::Updated => "Updated",
        }
    }
}

impl From<ExecutionMode> for FindingStatus {
    fn from(mode: ExecutionMode) -> Self {
        match mode {
            ExecutionMode::Preview => FindingStatus::Preview,
            ExecutionMode::Live => FindingStatus::Updated,
        }
    }
}

/// One mapping that matched inside one content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub course_id: String,
    pub course_name: String,
    pub content_type: ContentType,
    pub location_url: String,
    pub old_value: String,
    pub new_value: String,
    pub status: FindingStatus,
}

/// Filters for a subaccount course query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub term_id: Option<String>,
    pub workflow_states: Vec<String>,
}

/// Which courses a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    SingleCourse(String),
    CourseList(Vec<String>),
    Subaccount {
        subaccount_id: String,
        filter: CourseFilter,
    },
}
