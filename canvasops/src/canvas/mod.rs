//! Access to the Canvas REST API.
//!
//! [`CanvasApi`] is the seam the scan orchestrator talks to; [`CanvasClient`]
//! is the reqwest-backed implementation. Tests substitute an in-memory double.

pub mod client;
pub mod pagination;
mod wire;

pub use client::CanvasClient;

use crate::core::error::Result;
use crate::core::types::{ContentItem, ContentType, CourseDescriptor, CourseFilter, EnrollmentTerm};
use async_trait::async_trait;

/// Workflow states requested when a subaccount query carries no state filter
pub const DEFAULT_WORKFLOW_STATES: [&str; 4] = ["available", "unpublished", "completed", "created"];

#[async_trait]
pub trait CanvasApi: Send + Sync {
    /// `GET courses/{id}`
    async fn fetch_course(&self, course_id: &str) -> Result<CourseDescriptor>;

    /// Every item of one content type in a course, following pagination.
    /// Items with an empty body are omitted.
    async fn fetch_collection(
        &self,
        course_id: &str,
        content_type: ContentType,
    ) -> Result<Vec<ContentItem>>;

    /// `GET accounts/{id}/courses` with optional term and workflow-state filters
    async fn fetch_courses_in_subaccount(
        &self,
        subaccount_id: &str,
        filter: &CourseFilter,
    ) -> Result<Vec<CourseDescriptor>>;

    /// `GET accounts/{id}/terms`
    async fn fetch_terms(&self, account_id: &str) -> Result<Vec<EnrollmentTerm>>;

    /// Replace the whole body field of one item. No retries.
    async fn write_back(
        &self,
        course_id: &str,
        content_type: ContentType,
        item_id: Option<&str>,
        new_body: &str,
    ) -> Result<()>;
}
