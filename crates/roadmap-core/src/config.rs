//! Configuration types for the roadmap planner.
//!
//! Configuration is read from an optional `roadmap.json` file. Every field has
//! a default, unknown fields are ignored, and a missing file yields the
//! defaults. The API credential itself is never stored here; the config only
//! names the environment variable the binary reads it from.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "roadmap.json";

/// Environment variable consulted when the configured one is unset.
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// Default model identifier.
fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

/// Default sampling temperature for tutor replies.
const fn default_tutor_temperature() -> f32 {
    0.7
}

/// Default base URL of the generative-language service.
fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

/// Default environment variable holding the API key.
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

/// Default session-context label passed along with tutor questions.
fn default_tutor_context() -> String {
    "TOEIC Study Session - General Help".to_string()
}

/// Main configuration for the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for free-form tutor replies.
    #[serde(default = "default_tutor_temperature")]
    pub tutor_temperature: f32,

    /// Base URL of the generative-language REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Session-context label used by the tutor when the caller supplies none.
    #[serde(default = "default_tutor_context")]
    pub tutor_context: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            tutor_temperature: default_tutor_temperature(),
            api_base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            tutor_context: default_tutor_context(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `roadmap.json` exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            PlannerError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `roadmap.json` inside a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `PlannerError::Io` if the file exists but cannot be read,
    /// `PlannerError::ConfigParseError` if it is not valid JSON, and
    /// `PlannerError::ConfigValidationError` if a value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| PlannerError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// - `model` must not be empty
    /// - `tutorTemperature` must be within `0.0..=2.0`
    /// - `apiBaseUrl` must be an `http(s)` URL
    /// - `apiKeyEnv` must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(PlannerError::config_validation(
                "model must not be empty",
                "Set model to a generative model identifier in your roadmap.json",
            ));
        }

        if !(0.0..=2.0).contains(&self.tutor_temperature) {
            return Err(PlannerError::config_validation(
                format!(
                    "tutorTemperature must be between 0.0 and 2.0 (got {})",
                    self.tutor_temperature
                ),
                "Set tutorTemperature to a value such as 0.7 in your roadmap.json",
            ));
        }

        let base = self.api_base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(PlannerError::config_validation(
                format!("apiBaseUrl must be an http(s) URL (got '{base}')"),
                "Set apiBaseUrl to e.g. https://generativelanguage.googleapis.com in your roadmap.json",
            ));
        }

        if self.api_key_env.trim().is_empty() {
            return Err(PlannerError::config_validation(
                "apiKeyEnv must not be empty",
                "Set apiKeyEnv to the name of the environment variable holding your API key",
            ));
        }

        Ok(())
    }

    /// Resolves the API key from the environment.
    ///
    /// Reads the variable named by `api_key_env`, then [`FALLBACK_API_KEY_ENV`].
    /// Blank values count as unset.
    pub fn resolve_api_key(&self) -> Result<String> {
        [self.api_key_env.as_str(), FALLBACK_API_KEY_ENV]
            .iter()
            .find_map(|var| {
                std::env::var(var)
                    .ok()
                    .filter(|value| !value.trim().is_empty())
            })
            .ok_or_else(|| PlannerError::missing_credential(&self.api_key_env))
    }
}
