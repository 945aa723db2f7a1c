// src/config/classifier.rs
use serde::{Deserialize, Serialize};
use std::env;

use crate::config::ConfigError;

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.5
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub enabled: bool,
    /// "openai" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClassifierConfig {
    /// Lowercase the provider and keep temperature inside the API's 0..=2 range.
    pub(crate) fn normalize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = default_temperature();
        }
    }

    /// Literal key, or the provider's env var when configured as "ENV".
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if !self.api_key.trim().eq_ignore_ascii_case("env") {
            return Ok(self.api_key.trim().to_string());
        }
        match self.provider.as_str() {
            "openai" => env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or(ConfigError::MissingEnv("OPENAI_API_KEY")),
            "mock" => Ok(String::new()),
            other => Err(ConfigError::Invalid(format!(
                "unsupported classifier provider: {other}"
            ))),
        }
    }
}
