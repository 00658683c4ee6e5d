mod mapping;
mod report;
mod scan;

pub use mapping::{apply_mappings, MappingEngine, Substitution};
pub use report::{summarize, to_table, Report, ReportRow};
pub use scan::{ScanRequest, Scanner};

use crate::core::types::{ExecutionMode, Finding};

/// Result of one scan-and-replace run
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanOutcome {
    pub mode: ExecutionMode,

    /// Findings in course, content-type, then fetch order
    pub findings: Vec<Finding>,

    /// Equal to `findings.len()`
    pub total_applied: usize,

    /// Courses resolved and scanned
    pub courses_processed: usize,

    /// Content items examined
    pub items_scanned: usize,

    /// Items whose write-back failed; their findings are not recorded
    pub skipped: usize,

    /// One message per skipped item
    pub errors: Vec<String>,
}

impl ScanOutcome {
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            findings: Vec::new(),
            total_applied: 0,
            courses_processed: 0,
            items_scanned: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }

    pub fn add_findings(&mut self, findings: impl IntoIterator<Item = Finding>) {
        let before = self.findings.len();
        self.findings.extend(findings);
        self.total_applied += self.findings.len() - before;
    }

    pub fn add_skip(&mut self, error: String) {
        self.skipped += 1;
        self.errors.push(error);
    }

    pub fn summary(&self) -> String {
        summarize(&self.findings, self.mode)
    }
}
