use anyhow::{bail, Result};
use std::path::PathBuf;

use canvasops::config::Config;

pub fn run(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(Config::project_config_path);
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }

    Config::create_default_config(&path)?;
    println!("✓ Wrote default config to {}", path.display());
    println!("  Set CANVAS_API_TOKEN in your environment rather than storing the token in the file.");
    Ok(())
}
