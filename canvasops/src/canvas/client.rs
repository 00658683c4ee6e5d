use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

use super::pagination::next_page;
use super::wire;
use super::{CanvasApi, DEFAULT_WORKFLOW_STATES};
use crate::config::HttpConfig;
use crate::core::error::{CanvasOpsError, Result};
use crate::core::types::{
    ContentItem, ContentType, CourseDescriptor, CourseFilter, CredentialContext, EnrollmentTerm,
};

/// Longest slice of an error response body carried into an error message
const ERROR_BODY_LIMIT: usize = 200;

/// reqwest-backed Canvas client. Performs no retries.
pub struct CanvasClient {
    client: Client,
    credentials: CredentialContext,
    per_page: u32,
}

impl CanvasClient {
    pub fn new(credentials: CredentialContext, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()
            .map_err(|e| CanvasOpsError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            per_page: http.per_page,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.credentials.api_root(), path)
    }

    /// Send a request, mapping transport failures and non-2xx statuses to
    /// [`CanvasOpsError::Upstream`]
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let response = request
            .bearer_auth(&self.credentials.api_token)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("request timed out: {}", e)
                } else if e.is_connect() {
                    format!("connection failed: {}", e)
                } else {
                    format!("network error: {}", e)
                };
                CanvasOpsError::upstream(None, context, message)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let reason = status.canonical_reason().unwrap_or("Unknown error");
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            reason.to_string()
        } else {
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            format!("{}: {}", reason, snippet.trim())
        };
        Err(CanvasOpsError::upstream(Some(status.as_u16()), context, message))
    }

    async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| CanvasOpsError::upstream(None, context, format!("invalid response body: {}", e)))
    }

    /// Single-object GET
    async fn get_object<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<T> {
        let request = self.client.get(self.endpoint(path)).query(query);
        let response = self.send(request, context).await?;
        Self::decode(response, context).await
    }

    /// Collection GET, following `Link: rel="next"` until exhausted. The
    /// next URL already carries the query, so parameters go on page one only.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<Vec<T>> {
        let mut first_query: Vec<(&str, String)> = query.to_vec();
        first_query.push(("per_page", self.per_page.to_string()));

        let mut request = self.client.get(self.endpoint(path)).query(&first_query);
        let mut results = Vec::new();
        let mut pages = 0usize;

        loop {
            let response = self.send(request, context).await?;
            let next = next_page(response.headers());
            let page: Vec<T> = Self::decode(response, context).await?;
            pages += 1;
            results.extend(page);

            match next {
                Some(url) => request = self.client.get(url),
                None => break,
            }
        }

        tracing::debug!("{}: {} item(s) over {} page(s)", context, results.len(), pages);
        Ok(results)
    }

    fn fallback_location(&self, course_id: &str, segment: &str, item_id: &str) -> String {
        format!("{}/courses/{}/{}/{}", self.credentials.base_url, course_id, segment, item_id)
    }

    async fn fetch_syllabus(&self, course_id: &str, context: &str) -> Result<Vec<ContentItem>> {
        let course: wire::Course = self
            .get_object(
                &format!("courses/{}", course_id),
                &[("include[]", "syllabus_body".to_string())],
                context,
            )
            .await?;

        Ok(course
            .syllabus_body
            .filter(|body| !body.is_empty())
            .map(|body| ContentItem {
                course_id: course_id.to_string(),
                content_type: ContentType::Syllabus,
                item_id: None,
                body,
                location_url: format!(
                    "{}/courses/{}/assignments/syllabus",
                    self.credentials.base_url, course_id
                ),
            })
            .into_iter()
            .collect())
    }

    async fn fetch_pages(&self, course_id: &str, context: &str) -> Result<Vec<ContentItem>> {
        let summaries: Vec<wire::PageSummary> = self
            .get_paginated(&format!("courses/{}/pages", course_id), &[], context)
            .await?;

        let mut items = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let page: wire::Page = self
                .get_object(&format!("courses/{}/pages/{}", course_id, summary.url), &[], context)
                .await?;

            let Some(body) = page.body.filter(|b| !b.is_empty()) else {
                continue;
            };
            let location_url = page
                .html_url
                .unwrap_or_else(|| self.fallback_location(course_id, "pages", &page.url));
            items.push(ContentItem {
                course_id: course_id.to_string(),
                content_type: ContentType::Page,
                item_id: Some(page.url),
                body,
                location_url,
            });
        }
        Ok(items)
    }

    async fn fetch_described(
        &self,
        course_id: &str,
        content_type: ContentType,
        segment: &str,
        context: &str,
    ) -> Result<Vec<ContentItem>> {
        let records: Vec<wire::Described> = self
            .get_paginated(&format!("courses/{}/{}", course_id, segment), &[], context)
            .await?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let body = record.description.filter(|b| !b.is_empty())?;
                let location_url = record
                    .html_url
                    .unwrap_or_else(|| self.fallback_location(course_id, segment, &record.id));
                Some(ContentItem {
                    course_id: course_id.to_string(),
                    content_type,
                    item_id: Some(record.id),
                    body,
                    location_url,
                })
            })
            .collect())
    }

    async fn fetch_topics(
        &self,
        course_id: &str,
        content_type: ContentType,
        context: &str,
    ) -> Result<Vec<ContentItem>> {
        let query: Vec<(&str, String)> = if content_type == ContentType::Announcement {
            vec![("only_announcements", "true".to_string())]
        } else {
            Vec::new()
        };
        let topics: Vec<wire::Topic> = self
            .get_paginated(&format!("courses/{}/discussion_topics", course_id), &query, context)
            .await?;

        Ok(topics
            .into_iter()
            .filter_map(|topic| {
                let body = topic.message.filter(|b| !b.is_empty())?;
                let location_url = topic.html_url.unwrap_or_else(|| {
                    self.fallback_location(course_id, "discussion_topics", &topic.id)
                });
                Some(ContentItem {
                    course_id: course_id.to_string(),
                    content_type,
                    item_id: Some(topic.id),
                    body,
                    location_url,
                })
            })
            .collect())
    }
}

/// Update path and JSON payload for a write-back
fn write_target(
    course_id: &str,
    content_type: ContentType,
    item_id: Option<&str>,
    new_body: &str,
) -> Result<(String, Value)> {
    let require_id = || {
        item_id.filter(|id| !id.is_empty()).ok_or_else(|| {
            CanvasOpsError::validation(format!("{} write-back requires an item id", content_type))
        })
    };

    let target = match content_type {
        ContentType::Syllabus => (
            format!("courses/{}", course_id),
            json!({ "course": { "syllabus_body": new_body } }),
        ),
        ContentType::Page => (
            format!("courses/{}/pages/{}", course_id, require_id()?),
            json!({ "wiki_page": { "body": new_body } }),
        ),
        ContentType::Assignment => (
            format!("courses/{}/assignments/{}", course_id, require_id()?),
            json!({ "assignment": { "description": new_body } }),
        ),
        ContentType::Quiz => (
            format!("courses/{}/quizzes/{}", course_id, require_id()?),
            json!({ "quiz": { "description": new_body } }),
        ),
        ContentType::Discussion | ContentType::Announcement => (
            format!("courses/{}/discussion_topics/{}", course_id, require_id()?),
            json!({ "message": new_body }),
        ),
    };
    Ok(target)
}

#[async_trait]
impl CanvasApi for CanvasClient {
    async fn fetch_course(&self, course_id: &str) -> Result<CourseDescriptor> {
        let context = format!("course {}", course_id);
        let course: wire::Course = self
            .get_object(&format!("courses/{}", course_id), &[], &context)
            .await?;
        Ok(course.into())
    }

    async fn fetch_collection(
        &self,
        course_id: &str,
        content_type: ContentType,
    ) -> Result<Vec<ContentItem>> {
        let context = format!("course {} / {}", course_id, content_type);
        match content_type {
            ContentType::Syllabus => self.fetch_syllabus(course_id, &context).await,
            ContentType::Page => self.fetch_pages(course_id, &context).await,
            ContentType::Assignment => {
                self.fetch_described(course_id, content_type, "assignments", &context)
                    .await
            }
            ContentType::Quiz => {
                self.fetch_described(course_id, content_type, "quizzes", &context)
                    .await
            }
            ContentType::Discussion | ContentType::Announcement => {
                self.fetch_topics(course_id, content_type, &context).await
            }
        }
    }

    async fn fetch_courses_in_subaccount(
        &self,
        subaccount_id: &str,
        filter: &CourseFilter,
    ) -> Result<Vec<CourseDescriptor>> {
        let context = format!("subaccount {}", subaccount_id);

        let mut query: Vec<(&str, String)> = Vec::new();
        if filter.workflow_states.is_empty() {
            query.extend(DEFAULT_WORKFLOW_STATES.iter().map(|s| ("state[]", s.to_string())));
        } else {
            query.extend(filter.workflow_states.iter().map(|s| ("state[]", s.clone())));
        }
        if let Some(term_id) = &filter.term_id {
            query.push(("enrollment_term_id", term_id.clone()));
        }

        let courses: Vec<wire::Course> = self
            .get_paginated(&format!("accounts/{}/courses", subaccount_id), &query, &context)
            .await?;
        Ok(courses.into_iter().map(CourseDescriptor::from).collect())
    }

    async fn fetch_terms(&self, account_id: &str) -> Result<Vec<EnrollmentTerm>> {
        let context = format!("account {} terms", account_id);
        let terms: wire::TermList = self
            .get_object(
                &format!("accounts/{}/terms", account_id),
                &[("per_page", self.per_page.to_string())],
                &context,
            )
            .await?;
        Ok(terms.enrollment_terms.into_iter().map(EnrollmentTerm::from).collect())
    }

    async fn write_back(
        &self,
        course_id: &str,
        content_type: ContentType,
        item_id: Option<&str>,
        new_body: &str,
    ) -> Result<()> {
        let (path, payload) = write_target(course_id, content_type, item_id, new_body)?;
        let context = format!(
            "course {} / {} {}",
            course_id,
            content_type,
            item_id.unwrap_or("-")
        );

        tracing::debug!("PUT {}", path);
        let request = self.client.put(self.endpoint(&path)).json(&payload);
        self.send(request, &context).await?;
        Ok(())
    }
}
