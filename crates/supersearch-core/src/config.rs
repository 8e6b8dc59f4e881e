use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SearchError};

/// Top-level configuration for the supersearch application.
///
/// Loaded from `~/.supersearch/config.toml` by default. Each section
/// corresponds to one subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub structured: StructuredConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field invariants that serde defaults cannot express.
    fn validate(&self) -> Result<()> {
        if self.routing.max_depth == 0 {
            return Err(SearchError::Config(
                "routing.max_depth must be at least 1".to_string(),
            ));
        }
        if self.routing.fallback_text.trim().is_empty() {
            return Err(SearchError::Config(
                "routing.fallback_text must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database and the API token file.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.supersearch/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Supervisor routing loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Maximum responder hops per request before the fallback path is
    /// forced. Must be >= 1.
    pub max_depth: u32,
    /// Hop budget granted to the fallback re-entry. Kept small so the
    /// fallback cannot re-trigger the limit it is recovering from.
    pub fallback_depth: u32,
    /// Fixed user-facing text returned when even the fallback responder
    /// produces nothing usable.
    pub fallback_text: String,
    /// Number of most recent turns handed to the router per request.
    pub context_turns: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            fallback_depth: 1,
            fallback_text:
                "Sorry, I couldn't put together an answer this time. Please try rephrasing \
                 your question."
                    .to_string(),
            context_turns: 10,
        }
    }
}

/// Structured knowledge-base responder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredConfig {
    /// Whether the structured responder is registered at all.
    pub enabled: bool,
    /// Maximum rows returned per query.
    pub top_k: usize,
    /// Tables the responder is allowed to read.
    pub tables: Vec<String>,
}

impl Default for StructuredConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: 5,
            tables: vec!["scholarships".to_string(), "universities".to_string()],
        }
    }
}

/// Web-search responder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Whether the web responder is registered.
    pub enabled: bool,
    /// Search API endpoint.
    pub endpoint: String,
    /// API key for the search backend. Opaque to the routing core; when
    /// absent the application falls back to an offline backend.
    pub api_key: Option<String>,
    /// Maximum hits requested from the backend.
    pub max_results: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.tavily.com/search".to_string(),
            api_key: None,
            max_results: 5,
            timeout_secs: 20,
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Port to bind on 127.0.0.1.
    pub port: u16,
    /// Maximum chat message length in characters.
    pub max_message_len: usize,
    /// Requests allowed per second across protected routes.
    pub rate_limit_per_sec: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            max_message_len: 2000,
            rate_limit_per_sec: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.general.data_dir, "~/.supersearch/data");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.routing.max_depth, 10);
        assert_eq!(config.routing.fallback_depth, 1);
        assert_eq!(config.routing.context_turns, 10);
        assert!(!config.routing.fallback_text.is_empty());
        assert!(config.structured.enabled);
        assert_eq!(config.structured.top_k, 5);
        assert_eq!(config.structured.tables, vec!["scholarships", "universities"]);
        assert!(config.web.enabled);
        assert_eq!(config.web.endpoint, "https://api.tavily.com/search");
        assert!(config.web.api_key.is_none());
        assert_eq!(config.web.max_results, 5);
        assert_eq!(config.api.port, 3030);
        assert_eq!(config.api.max_message_len, 2000);
        assert_eq!(config.api.rate_limit_per_sec, 100);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
data_dir = "/custom/data"
log_level = "debug"

[routing]
max_depth = 3
fallback_text = "Nothing found."

[web]
endpoint = "https://search.example.com/api"
api_key = "secret"
max_results = 2
"#;
        let file = create_temp_config(content);
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/custom/data");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.routing.max_depth, 3);
        assert_eq!(config.routing.fallback_text, "Nothing found.");
        assert_eq!(config.web.endpoint, "https://search.example.com/api");
        assert_eq!(config.web.api_key.as_deref(), Some("secret"));
        assert_eq!(config.web.max_results, 2);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"
"#;
        let file = create_temp_config(content);
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        // Remaining fields use defaults
        assert_eq!(config.routing.max_depth, 10);
        assert_eq!(config.api.port, 3030);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.supersearch/data");
    }

    #[test]
    fn test_zero_max_depth_rejected() {
        let content = r#"
[routing]
max_depth = 0
"#;
        let file = create_temp_config(content);
        let result = AppConfig::load(file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_depth"));
    }

    #[test]
    fn test_blank_fallback_text_rejected() {
        let content = r#"
[routing]
fallback_text = "   "
"#;
        let file = create_temp_config(content);
        assert!(AppConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let content = r#"
[routing]
max_depth = 0
"#;
        let file = create_temp_config(content);
        let config = AppConfig::load_or_default(file.path());
        assert_eq!(config.routing.max_depth, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::default();
        config.save(&path).unwrap();

        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.data_dir, config.general.data_dir);
        assert_eq!(reloaded.routing.max_depth, config.routing.max_depth);
        assert_eq!(reloaded.web.endpoint, config.web.endpoint);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("dir").join("config.toml");

        AppConfig::default().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.routing.fallback_text, config.routing.fallback_text);
        assert_eq!(deserialized.structured.tables, config.structured.tables);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.routing.max_depth, 10);
        assert_eq!(config.structured.top_k, 5);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(AppConfig::load(file.path()).is_err());
    }
}
