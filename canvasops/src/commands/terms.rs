use anyhow::{Context, Result};

use canvasops::config::Config;
use canvasops::core::output::{OutputFormat, OutputWriter};
use canvasops::CanvasApi;

pub async fn run(account: String, config: &Config, format: OutputFormat) -> Result<()> {
    let client = super::client(config)?;
    let terms = client
        .fetch_terms(&account)
        .await
        .with_context(|| format!("Failed to list terms for account {}", account))?;

    OutputWriter::new(format).write_terms(&terms)
}
