//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for gutcheck
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model to use for both the worker and the evaluator
    pub model: Option<String>,
    /// Default success criteria applied to every turn
    pub criteria: Option<String>,
    /// Worker steps per turn before handing back to the user
    pub max_steps: Option<u32>,
    /// API keys (alternative to environment variables)
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub serper: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gutcheck")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for GUTCHECK_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("GUTCHECK_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some(gutcheck_ai::client::DEFAULT_MODEL.to_string()),
            criteria: None,
            max_steps: None,
            api_keys: ApiKeys::default(),
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get an API key, checking config then env
    pub fn get_api_key(&self, service: &str) -> Option<String> {
        let from_config = match service {
            "openai" => self.api_keys.openai.clone(),
            "serper" => self.api_keys.serper.clone(),
            _ => None,
        };

        if from_config.is_some() {
            return from_config;
        }

        let env_var = match service {
            "openai" => "OPENAI_API_KEY",
            "serper" => "SERPER_API_KEY",
            _ => return None,
        };

        std::env::var(env_var).ok()
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# gutcheck configuration file
# Place at ~/.config/gutcheck/config.toml (Linux/Mac) or %APPDATA%\gutcheck\config.toml (Windows)

# Model for both the worker and the evaluator
model = "gpt-4o-mini"

# Default success criteria applied to every turn (optional)
# criteria = "Analyze product safety. Calculate average score. Keep summary under 1 sentence."

# Worker steps per turn before the loop hands back to the user
# max_steps = 8

# API keys (optional - can also use environment variables)
# It's recommended to use environment variables instead for security
[api_keys]
# openai = "sk-..."
# serper = "..."
"#
}
