use indicatif::{ProgressBar, ProgressStyle};

use super::mapping::MappingEngine;
use super::ScanOutcome;
use crate::canvas::CanvasApi;
use crate::core::error::{CanvasOpsError, Result};
use crate::core::types::{
    ContentItem, ContentType, CourseDescriptor, ExecutionMode, Finding, FindingStatus, Scope,
    UrlMapping,
};

/// One user-submitted find & replace job
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub scope: Scope,
    pub content_types: Vec<ContentType>,
    pub mappings: Vec<UrlMapping>,
    pub mode: ExecutionMode,
}

impl ScanRequest {
    /// Pre-flight checks; nothing here touches the network
    fn validate(&self) -> Result<MappingEngine> {
        let engine = MappingEngine::new(self.mappings.clone())?;

        if self.content_types.is_empty() {
            return Err(CanvasOpsError::validation("no content types selected"));
        }

        let missing_target = match &self.scope {
            Scope::SingleCourse(id) => id.trim().is_empty(),
            Scope::CourseList(ids) => ids.is_empty() || ids.iter().any(|id| id.trim().is_empty()),
            Scope::Subaccount { subaccount_id, .. } => subaccount_id.trim().is_empty(),
        };
        if missing_target {
            return Err(CanvasOpsError::validation("missing target id"));
        }

        Ok(engine)
    }
}

/// Drives fetch, substitute and (in live mode) write-back, strictly in sequence
pub struct Scanner<'a> {
    api: &'a dyn CanvasApi,
    show_progress: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(api: &'a dyn CanvasApi) -> Self {
        Self {
            api,
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr when more than one course is scanned
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn run(&self, request: &ScanRequest) -> Result<ScanOutcome> {
        let engine = request.validate()?;
        let content_types = ContentType::in_processing_order(&request.content_types);

        let courses = self.resolve_courses(&request.scope).await?;
        tracing::info!(
            "Scanning {} course(s) for {} mapping(s) in {:?} mode",
            courses.len(),
            engine.mappings().len(),
            request.mode
        );

        let progress = self.progress_bar(courses.len());
        let mut outcome = ScanOutcome::new(request.mode);

        for course in &courses {
            if let Some(bar) = &progress {
                bar.set_message(course.name.clone());
            }
            self.scan_course(course, &content_types, &engine, request.mode, &mut outcome)
                .await?;
            outcome.courses_processed += 1;
            if let Some(bar) = &progress {
                bar.inc(1);
            }
        }

        if let Some(bar) = progress {
            bar.finish_and_clear();
        }

        tracing::info!(
            "Run complete: {} finding(s), {} item(s) skipped",
            outcome.total_applied,
            outcome.skipped
        );
        Ok(outcome)
    }

    async fn resolve_courses(&self, scope: &Scope) -> Result<Vec<CourseDescriptor>> {
        match scope {
            Scope::SingleCourse(id) => Ok(vec![self.api.fetch_course(id.trim()).await?]),
            Scope::CourseList(ids) => {
                let mut courses = Vec::with_capacity(ids.len());
                for id in ids {
                    courses.push(self.api.fetch_course(id.trim()).await?);
                }
                Ok(courses)
            }
            Scope::Subaccount {
                subaccount_id,
                filter,
            } => {
                self.api
                    .fetch_courses_in_subaccount(subaccount_id.trim(), filter)
                    .await
            }
        }
    }

    async fn scan_course(
        &self,
        course: &CourseDescriptor,
        content_types: &[ContentType],
        engine: &MappingEngine,
        mode: ExecutionMode,
        outcome: &mut ScanOutcome,
    ) -> Result<()> {
        tracing::info!("Processing course {} ({})", course.id, course.name);

        for &content_type in content_types {
            let items = self.api.fetch_collection(&course.id, content_type).await?;
            tracing::info!("Course {}: {} {} item(s)", course.id, items.len(), content_type);

            for item in items {
                outcome.items_scanned += 1;
                self.process_item(course, item, engine, mode, outcome).await;
            }
        }

        Ok(())
    }

    /// Write-back failures are logged and counted, never propagated
    async fn process_item(
        &self,
        course: &CourseDescriptor,
        item: ContentItem,
        engine: &MappingEngine,
        mode: ExecutionMode,
        outcome: &mut ScanOutcome,
    ) {
        let substitution = engine.apply(&item.body);
        if !substitution.changed() {
            return;
        }

        let item_label = item.item_id.as_deref().unwrap_or("syllabus");
        tracing::debug!(
            "Course {} {} {}: {} mapping(s) matched",
            course.id,
            item.content_type,
            item_label,
            substitution.applied.len()
        );

        if mode == ExecutionMode::Live {
            if let Err(e) = self
                .api
                .write_back(
                    &item.course_id,
                    item.content_type,
                    item.item_id.as_deref(),
                    &substitution.body,
                )
                .await
            {
                tracing::error!(
                    "Write-back failed for course {} {} {}: {}",
                    course.id,
                    item.content_type,
                    item_label,
                    e
                );
                outcome.add_skip(format!(
                    "course {} {} {}: {}",
                    course.id, item.content_type, item_label, e
                ));
                return;
            }
        }

        let status = FindingStatus::from(mode);
        outcome.add_findings(substitution.applied.into_iter().map(|mapping| Finding {
            course_id: course.id.clone(),
            course_name: course.name.clone(),
            content_type: item.content_type,
            location_url: item.location_url.clone(),
            old_value: mapping.old_value,
            new_value: mapping.new_value,
            status,
        }));
    }

    fn progress_bar(&self, courses: usize) -> Option<ProgressBar> {
        if !self.show_progress || courses <= 1 {
            return None;
        }
        let bar = ProgressBar::new(courses as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} courses {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        Some(bar)
    }
}
