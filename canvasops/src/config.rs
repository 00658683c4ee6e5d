use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::types::{CredentialContext, UrlMapping};

pub const ENV_BASE_URL: &str = "CANVAS_BASE_URL";
pub const ENV_API_TOKEN: &str = "CANVAS_API_TOKEN";

/// Main configuration structure for canvasops
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub canvas: CanvasConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Canvas instance and credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Canvas origin, e.g. "school.instructure.com"
    #[serde(default)]
    pub base_url: Option<String>,

    /// API bearer token. Prefer the CANVAS_API_TOKEN environment variable.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Target the beta instance of an instructure.com host
    #[serde(default)]
    pub beta: bool,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size requested from collection endpoints
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_per_page() -> u32 {
    100 // Canvas maximum
}

fn default_user_agent() -> String {
    format!("canvasops/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            per_page: default_per_page(),
            user_agent: default_user_agent(),
        }
    }
}

/// Values given on the command line; these win over everything else
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub beta: bool,
}

impl Config {
    /// Load configuration.
    ///
    /// **Priority (highest to lowest):**
    /// 1. `explicit` path, if given (replaces both file layers)
    /// 2. `./canvasops.toml`
    /// 3. `~/.config/canvasops/config.toml`
    /// 4. Hardcoded defaults
    ///
    /// Environment variables are applied afterwards by [`Config::apply_env`].
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::info!("Loading config from: {}", path.display());
            return Self::load_from_file(path);
        }

        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                tracing::info!("Loading global config from: {}", global_path.display());
                config = Self::load_from_file(&global_path)?;
            }
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            tracing::info!("Loading project config from: {}", project_path.display());
            config = Self::merge_configs(config, Self::load_from_file(&project_path)?);
        }

        Ok(config)
    }

    /// Load config from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Field-level merge of the `[canvas]` section; `[http]` is taken whole
    fn merge_configs(base: Config, override_config: Config) -> Config {
        Config {
            canvas: CanvasConfig {
                base_url: override_config.canvas.base_url.or(base.canvas.base_url),
                api_token: override_config.canvas.api_token.or(base.canvas.api_token),
                beta: override_config.canvas.beta || base.canvas.beta,
            },
            http: override_config.http,
        }
    }

    /// Overlay `CANVAS_BASE_URL` / `CANVAS_API_TOKEN` when set and non-empty
    pub fn apply_env(&mut self) {
        if let Some(url) = non_empty_env(ENV_BASE_URL) {
            self.canvas.base_url = Some(url);
        }
        if let Some(token) = non_empty_env(ENV_API_TOKEN) {
            self.canvas.api_token = Some(token);
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.base_url {
            self.canvas.base_url = Some(url.clone());
        }
        if let Some(token) = &overrides.api_token {
            self.canvas.api_token = Some(token.clone());
        }
        if overrides.beta {
            self.canvas.beta = true;
        }
    }

    /// Resolve the credential context for a run
    pub fn credentials(&self) -> crate::core::error::Result<CredentialContext> {
        CredentialContext::new(
            self.canvas.base_url.as_deref().unwrap_or_default(),
            self.canvas.api_token.as_deref().unwrap_or_default(),
            self.canvas.beta,
        )
    }

    /// ~/.config/canvasops/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("canvasops").join("config.toml"))
    }

    /// ./canvasops.toml
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("canvasops.toml")
    }

    /// Create a default config file at the specified path
    pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let toml_string = toml::to_string_pretty(&config)
            .context("Failed to serialize default config")?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        fs::write(path.as_ref(), toml_string)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }
}

/// Mapping file layout: `[[mapping]]` tables with `old` and `new` keys
#[derive(Debug, Default, Deserialize)]
struct MappingFile {
    #[serde(default)]
    mapping: Vec<UrlMapping>,
}

/// Load find/replace pairs from a TOML mapping file, in file order
pub fn load_mappings_file(path: &Path) -> Result<Vec<UrlMapping>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mappings file: {}", path.display()))?;
    let file: MappingFile = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse mappings file: {}", path.display()))?;
    Ok(file.mapping)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.canvas.base_url, None);
        assert_eq!(config.canvas.api_token, None);
        assert!(!config.canvas.beta);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.per_page, 100);
        assert!(config.http.user_agent.starts_with("canvasops/"));
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
            [canvas]
            base_url = "school.instructure.com"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.canvas.base_url.as_deref(), Some("school.instructure.com"));
        assert_eq!(config.http.per_page, 100);
    }

    #[test]
    fn test_invalid_toml() {
        let toml_str = r#"
            [canvas
            base_url = "missing bracket"
        "#;

        let result: Result<Config, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_and_reload_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("canvasops.toml");

        Config::create_default_config(&config_path).unwrap();
        assert!(config_path.exists());

        let config = Config::load(Some(config_path.as_path())).unwrap();
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_merge_keeps_base_credentials() {
        let base = Config {
            canvas: CanvasConfig {
                base_url: Some("global.instructure.com".into()),
                api_token: Some("global-token".into()),
                beta: false,
            },
            http: HttpConfig::default(),
        };
        let project = Config {
            canvas: CanvasConfig {
                base_url: Some("project.instructure.com".into()),
                api_token: None,
                beta: true,
            },
            http: HttpConfig::default(),
        };

        let merged = Config::merge_configs(base, project);
        assert_eq!(merged.canvas.base_url.as_deref(), Some("project.instructure.com"));
        assert_eq!(merged.canvas.api_token.as_deref(), Some("global-token"));
        assert!(merged.canvas.beta);
    }

    #[test]
    fn test_overrides_win() {
        let mut config = Config::default();
        config.canvas.base_url = Some("a.instructure.com".into());
        config.apply_overrides(&ConfigOverrides {
            base_url: Some("b.instructure.com".into()),
            api_token: Some("tok".into()),
            beta: true,
        });

        let creds = config.credentials().unwrap();
        assert_eq!(creds.base_url, "https://b.beta.instructure.com");
        assert_eq!(creds.api_token, "tok");
    }

    #[test]
    fn test_credentials_missing() {
        let err = Config::default().credentials().unwrap_err();
        assert!(err.to_string().contains("missing Canvas credentials"));
    }

    #[test]
    fn test_load_mappings_file_keeps_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mappings.toml");
        fs::write(
            &path,
            r#"
[[mapping]]
old = "http://old.example.com"
new = "https://new.example.com"

[[mapping]]
old = "http://legacy.example.com/lib"
new = "https://library.example.com"
"#,
        )
        .unwrap();

        let mappings = load_mappings_file(&path).unwrap();
        assert_eq!(
            mappings,
            vec![
                UrlMapping::new("http://old.example.com", "https://new.example.com"),
                UrlMapping::new("http://legacy.example.com/lib", "https://library.example.com"),
            ]
        );
    }

    #[test]
    fn test_load_mappings_file_missing() {
        let err = load_mappings_file(Path::new("/nonexistent/mappings.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read mappings file"));
    }

    #[test]
    #[serial]
    fn test_env_overlay() {
        std::env::set_var(ENV_BASE_URL, "env.instructure.com");
        std::env::set_var(ENV_API_TOKEN, "env-token");

        let mut config = Config::default();
        config.apply_env();

        std::env::remove_var(ENV_BASE_URL);
        std::env::remove_var(ENV_API_TOKEN);

        assert_eq!(config.canvas.base_url.as_deref(), Some("env.instructure.com"));
        assert_eq!(config.canvas.api_token.as_deref(), Some("env-token"));
    }

    #[test]
    #[serial]
    fn test_empty_env_is_ignored() {
        std::env::set_var(ENV_API_TOKEN, "   ");

        let mut config = Config::default();
        config.canvas.api_token = Some("file-token".into());
        config.apply_env();

        std::env::remove_var(ENV_API_TOKEN);

        assert_eq!(config.canvas.api_token.as_deref(), Some("file-token"));
    }
}
