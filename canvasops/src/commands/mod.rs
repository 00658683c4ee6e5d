pub mod config_init;
pub mod courses;
pub mod find_replace;
pub mod terms;

use anyhow::Result;
use canvasops::config::Config;
use canvasops::CanvasClient;

/// Build an API client from resolved configuration
pub fn client(config: &Config) -> Result<CanvasClient> {
    let credentials = config.credentials()?;
    tracing::debug!("Using {:?}", credentials);
    Ok(CanvasClient::new(credentials, &config.http)?)
}
