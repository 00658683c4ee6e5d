// canvasops/src/lib.rs
pub mod canvas;
pub mod config;
pub mod core;
pub mod replace;

// Re-export key types
pub use crate::canvas::{CanvasApi, CanvasClient};
pub use crate::core::error::CanvasOpsError;
pub use crate::core::types::{
    ContentItem, ContentType, CourseDescriptor, CourseFilter, CredentialContext, EnrollmentTerm,
    ExecutionMode, Finding, FindingStatus, Scope, UrlMapping,
};
pub use crate::replace::{ScanOutcome, ScanRequest, Scanner};
