use anyhow::{Context, Result};

use canvasops::config::Config;
use canvasops::core::output::{OutputFormat, OutputWriter};
use canvasops::{CanvasApi, CourseFilter};

pub async fn run(
    subaccount: String,
    term: Option<String>,
    states: Vec<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let client = super::client(config)?;
    let filter = CourseFilter {
        term_id: term,
        workflow_states: states,
    };

    let courses = client
        .fetch_courses_in_subaccount(&subaccount, &filter)
        .await
        .with_context(|| format!("Failed to list courses in subaccount {}", subaccount))?;
    tracing::info!("Found {} course(s) in subaccount {}", courses.len(), subaccount);

    OutputWriter::new(format).write_courses(&courses)
}
