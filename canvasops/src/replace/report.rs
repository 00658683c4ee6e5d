use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use super::ScanOutcome;
use crate::core::types::{ExecutionMode, Finding};

/// `"Preview: Would replace N URL(s) across M course(s)"` or
/// `"Replaced N URL(s) across M course(s)"`, counting distinct course ids
pub fn summarize(findings: &[Finding], mode: ExecutionMode) -> String {
    let courses: HashSet<&str> = findings.iter().map(|f| f.course_id.as_str()).collect();
    let verb = match mode {
        ExecutionMode::Preview => "Preview: Would replace",
        ExecutionMode::Live => "Replaced",
    };
    format!(
        "{} {} URL(s) across {} course(s)",
        verb,
        findings.len(),
        courses.len()
    )
}

/// One line of the detail table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub course: String,
    pub content_type: String,
    pub location: String,
    pub old_value: String,
    pub new_value: String,
    pub status: String,
}

/// Findings as table rows, same order, no de-duplication
pub fn to_table(findings: &[Finding]) -> Vec<ReportRow> {
    findings
        .iter()
        .map(|f| ReportRow {
            course: format!("{} ({})", f.course_name, f.course_id),
            content_type: f.content_type.label().to_string(),
            location: f.location_url.clone(),
            old_value: f.old_value.clone(),
            new_value: f.new_value.clone(),
            status: f.status.as_str().to_string(),
        })
        .collect()
}

/// Exportable report for one run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub mode: ExecutionMode,
    pub summary: String,
    pub courses_processed: usize,
    pub items_scanned: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn from_outcome(outcome: &ScanOutcome) -> Self {
        Self {
            generated_at: Utc::now(),
            mode: outcome.mode,
            summary: outcome.summary(),
            courses_processed: outcome.courses_processed,
            items_scanned: outcome.items_scanned,
            skipped: outcome.skipped,
            errors: outcome.errors.clone(),
            rows: to_table(&outcome.findings),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering for the terminal
    pub fn render_text(&self) -> String {
        let mut output = String::new();

        output.push_str("========================================\n");
        output.push_str(match self.mode {
            ExecutionMode::Preview => "          FIND & REPLACE PREVIEW\n",
            ExecutionMode::Live => "          FIND & REPLACE RESULTS\n",
        });
        output.push_str("========================================\n\n");
        output.push_str(&format!("{}\n", self.summary));
        output.push_str(&format!(
            "Courses scanned: {}, items scanned: {}\n",
            self.courses_processed, self.items_scanned
        ));
        if self.skipped > 0 {
            output.push_str(&format!("Items skipped: {}\n", self.skipped));
        }

        for (i, row) in self.rows.iter().enumerate() {
            if i == 0 {
                output.push('\n');
            }
            output.push_str(&format!("[{}] {} - {}\n", row.status, row.course, row.content_type));
            output.push_str(&format!("  {}\n", row.location));
            output.push_str(&format!("  - {}\n", row.old_value));
            output.push_str(&format!("  + {}\n", row.new_value));
        }

        if !self.errors.is_empty() {
            output.push_str("\nErrors:\n");
            for error in &self.errors {
                output.push_str(&format!("  ! {}\n", error));
            }
        }

        output.push_str("\n========================================\n");
        output
    }

    pub fn render_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str("# Find & Replace Report\n\n");
        output.push_str(&format!("**{}**\n\n", self.summary));
        output.push_str(&format!(
            "Generated {} | courses scanned: {} | items scanned: {} | skipped: {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.courses_processed,
            self.items_scanned,
            self.skipped
        ));

        if !self.rows.is_empty() {
            output.push_str("| Course | Content Type | Location | Old Value | New Value | Status |\n");
            output.push_str("|--------|--------------|----------|-----------|-----------|--------|\n");
            for row in &self.rows {
                output.push_str(&format!(
                    "| {} | {} | {} | `{}` | `{}` | {} |\n",
                    escape_cell(&row.course),
                    row.content_type,
                    escape_cell(&row.location),
                    escape_cell(&row.old_value),
                    escape_cell(&row.new_value),
                    row.status
                ));
            }
        }

        if !self.errors.is_empty() {
            output.push_str("\n## Errors\n\n");
            for error in &self.errors {
                output.push_str(&format!("- {}\n", error));
            }
        }

        output
    }
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ContentType, FindingStatus};
    use pretty_assertions::assert_eq;

    fn finding(course_id: &str, old: &str, status: FindingStatus) -> Finding {
        Finding {
            course_id: course_id.to_string(),
            course_name: format!("Course {}", course_id),
            content_type: ContentType::Page,
            location_url: format!("https://c.test/courses/{}/pages/p", course_id),
            old_value: old.to_string(),
            new_value: "https://new".to_string(),
            status,
        }
    }

    #[test]
    fn test_summarize_counts_distinct_courses() {
        let findings = vec![
            finding("101", "a", FindingStatus::Preview),
            finding("101", "b", FindingStatus::Preview),
            finding("202", "a", FindingStatus::Preview),
        ];
        assert_eq!(
            summarize(&findings, ExecutionMode::Preview),
            "Preview: Would replace 3 URL(s) across 2 course(s)"
        );
        assert_eq!(
            summarize(&findings, ExecutionMode::Live),
            "Replaced 3 URL(s) across 2 course(s)"
        );
        assert_eq!(
            summarize(&[], ExecutionMode::Preview),
            "Preview: Would replace 0 URL(s) across 0 course(s)"
        );
    }

    #[test]
    fn test_table_preserves_order_and_duplicates() {
        let findings = vec![
            finding("202", "z", FindingStatus::Updated),
            finding("101", "a", FindingStatus::Updated),
            finding("101", "a", FindingStatus::Updated),
        ];
        let rows = to_table(&findings);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].course, "Course 202 (202)");
        assert_eq!(rows[1], rows[2]);
        assert_eq!(
            rows[0],
            ReportRow {
                course: "Course 202 (202)".to_string(),
                content_type: "Page".to_string(),
                location: "https://c.test/courses/202/pages/p".to_string(),
                old_value: "z".to_string(),
                new_value: "https://new".to_string(),
                status: "Updated".to_string(),
            }
        );
    }

    #[test]
    fn test_report_renderings() {
        let mut outcome = ScanOutcome::new(ExecutionMode::Live);
        outcome.add_findings(vec![finding("101", "http://old|x", FindingStatus::Updated)]);
        outcome.courses_processed = 1;
        outcome.items_scanned = 4;
        outcome.add_skip("course 101 page p2: Canvas API error (HTTP 500)".to_string());

        let report = Report::from_outcome(&outcome);
        assert_eq!(report.summary, "Replaced 1 URL(s) across 1 course(s)");
        assert_eq!(report.skipped, 1);

        let text = report.render_text();
        assert!(text.contains("FIND & REPLACE RESULTS"));
        assert!(text.contains("Items skipped: 1"));
        assert!(text.contains("- http://old|x"));

        let markdown = report.render_markdown();
        assert!(markdown.contains("| Course | Content Type |"));
        assert!(markdown.contains("http://old\\|x"));
        assert!(markdown.contains("## Errors"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["mode"], "Live");
        assert_eq!(json["rows"][0]["status"], "Updated");
    }
}
