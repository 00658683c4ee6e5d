use crate::core::types::{CourseDescriptor, EnrollmentTerm};
use crate::replace::Report;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a report without printing it, e.g. for `--output`
    pub fn render_report(&self, report: &Report) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => report.to_json()?,
            OutputFormat::Text => report.render_text(),
            OutputFormat::Markdown => report.render_markdown(),
        })
    }

    pub fn write_report(&self, report: &Report) -> Result<()> {
        println!("{}", self.render_report(report)?);
        Ok(())
    }

    /// Save the rendered report to `path`, replacing any existing file
    pub fn export_report(&self, report: &Report, path: &Path) -> Result<()> {
        fs::write(path, self.render_report(report)?)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }

    pub fn write_courses(&self, courses: &[CourseDescriptor]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(courses)?);
            }
            OutputFormat::Text => {
                println!("Found {} course(s)", courses.len());
                for (state, count) in state_tally(courses) {
                    println!("  {}: {}", state, count);
                }
                println!();
                for course in courses {
                    println!(
                        "{}\t{}\t{}",
                        course.id,
                        course.workflow_state.as_deref().unwrap_or("unknown"),
                        course.name
                    );
                }
            }
            OutputFormat::Markdown => {
                println!("# Courses\n");
                println!("| ID | Name | State | Term |");
                println!("|----|------|-------|------|");
                for course in courses {
                    println!(
                        "| {} | {} | {} | {} |",
                        course.id,
                        course.name,
                        course.workflow_state.as_deref().unwrap_or("unknown"),
                        course.enrollment_term_id.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Ok(())
    }

    pub fn write_terms(&self, terms: &[EnrollmentTerm]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(terms)?);
            }
            OutputFormat::Text => {
                for term in terms {
                    println!("{}\t{}", term.id, term.name);
                }
            }
            OutputFormat::Markdown => {
                println!("# Enrollment Terms\n");
                for term in terms {
                    println!("- **{}** `{}`", term.name, term.id);
                }
            }
        }
        Ok(())
    }

    pub fn write_error(&self, error: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                #[derive(Serialize)]
                struct ErrorResponse {
                    error: String,
                }
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ErrorResponse {
                        error: error.to_string()
                    })?
                );
            }
            OutputFormat::Text | OutputFormat::Markdown => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

/// Course count per workflow state
pub fn state_tally(courses: &[CourseDescriptor]) -> BTreeMap<String, usize> {
    let mut tally = BTreeMap::new();
    for course in courses {
        let state = course.workflow_state.clone().unwrap_or_else(|| "unknown".to_string());
        *tally.entry(state).or_insert(0) += 1;
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ContentType, ExecutionMode, Finding, FindingStatus};
    use crate::replace::ScanOutcome;
    use tempfile::TempDir;

    fn sample_report() -> Report {
        let mut outcome = ScanOutcome::new(ExecutionMode::Preview);
        outcome.add_findings(vec![Finding {
            course_id: "101".to_string(),
            course_name: "Biology".to_string(),
            content_type: ContentType::Assignment,
            location_url: "https://c.test/courses/101/assignments/7".to_string(),
            old_value: "http://old.example.com".to_string(),
            new_value: "https://new.example.com".to_string(),
            status: FindingStatus::Preview,
        }]);
        outcome.courses_processed = 1;
        outcome.items_scanned = 3;
        Report::from_outcome(&outcome)
    }

    #[test]
    fn test_export_report_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.json");
        let report = sample_report();

        OutputWriter::new(OutputFormat::Json)
            .export_report(&report, &path)
            .unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["summary"], "Preview: Would replace 1 URL(s) across 1 course(s)");
        assert_eq!(saved["items_scanned"], 3);
        assert_eq!(saved["rows"][0]["course"], "Biology (101)");
        assert_eq!(saved["rows"][0]["old_value"], "http://old.example.com");
        assert_eq!(saved["rows"][0]["status"], "Preview");
    }

    #[test]
    fn test_export_report_markdown_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.md");
        fs::write(&path, "stale").unwrap();
        let report = sample_report();

        let writer = OutputWriter::new(OutputFormat::Markdown);
        writer.export_report(&report, &path).unwrap();

        let saved = fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("stale"));
        assert_eq!(saved, writer.render_report(&report).unwrap());
        assert!(saved.contains("| Course | Content Type |"));
        assert!(saved.contains("Biology (101)"));
        assert!(saved.contains("https://new.example.com"));
    }

    #[test]
    fn test_export_report_missing_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("report.txt");

        let err = OutputWriter::new(OutputFormat::Text)
            .export_report(&sample_report(), &path)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to write report"));
    }

    #[test]
    fn test_state_tally() {
        let course = |id: &str, state: Option<&str>| CourseDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            workflow_state: state.map(str::to_string),
            enrollment_term_id: None,
        };
        let tally = state_tally(&[
            course("1", Some("available")),
            course("2", Some("available")),
            course("3", None),
        ]);
        assert_eq!(tally.get("available"), Some(&2));
        assert_eq!(tally.get("unknown"), Some(&1));
    }
}
