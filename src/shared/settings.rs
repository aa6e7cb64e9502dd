use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::core::storage::{KeyValueStore, SETTINGS_KEY};
use crate::shared::error::{AppError, AppResult};

/// Environment variable consulted when no API key is stored
pub const API_KEY_ENV: &str = "LAYER_TRANSLATOR_API_KEY";

pub const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL_NAME: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings.ts")]
pub enum Provider {
    #[default]
    OpenAi,
    DeepSeek,
    Custom,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::DeepSeek => "deepseek",
            Provider::Custom => "custom",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings.ts")]
pub struct AiSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub api_endpoint: String,
    #[serde(default = "default_model")]
    pub model_name: String,
    #[serde(default)]
    pub provider: Provider,
}

fn default_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_endpoint: default_endpoint(),
            model_name: default_model(),
            provider: Provider::OpenAi,
        }
    }
}

/// Everything one translation call needs, resolved at call time
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationConfig {
    pub api_key: String,
    pub api_endpoint: String,
    pub model_name: String,
    pub provider: Provider,
    pub target_language: String,
}

impl AiSettings {
    /// Validate the settings and bind them to a target language
    pub fn to_config(&self, target_language: &str) -> AppResult<TranslationConfig> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Configuration("Please configure an API key first".to_string()));
        }
        if self.api_endpoint.trim().is_empty() {
            return Err(AppError::Configuration("Please configure an API endpoint first".to_string()));
        }
        if self.model_name.trim().is_empty() {
            return Err(AppError::Configuration("Please configure a model name first".to_string()));
        }

        let target = target_language.trim().to_ascii_lowercase();
        if isolang::Language::from_639_1(&target).is_none() {
            return Err(AppError::Configuration(format!(
                "Unknown target language: {}",
                target_language
            )));
        }

        Ok(TranslationConfig {
            api_key: self.api_key.trim().to_string(),
            api_endpoint: self.api_endpoint.trim().to_string(),
            model_name: self.model_name.trim().to_string(),
            provider: self.provider,
            target_language: target,
        })
    }
}

/// Loads and saves [`AiSettings`] through the client key-value store
pub struct SettingsService<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> SettingsService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Stored settings, or defaults when nothing usable is stored
    pub fn load(&self) -> AiSettings {
        let mut settings = match self.store.get(SETTINGS_KEY) {
            Ok(Some(value)) => match serde_json::from_value::<AiSettings>(value) {
                Ok(settings) => {
                    tracing::debug!("[Settings] Loaded settings (provider: {})", settings.provider);
                    settings
                }
                Err(e) => {
                    tracing::warn!("[Settings] Stored settings are unreadable, using defaults: {}", e);
                    AiSettings::default()
                }
            },
            Ok(None) => {
                tracing::debug!("[Settings] No saved settings found, using defaults");
                AiSettings::default()
            }
            Err(e) => {
                tracing::error!("[Settings] Failed to load settings: {}", e);
                AiSettings::default()
            }
        };

        if settings.api_key.trim().is_empty() {
            if let Ok(env_key) = std::env::var(API_KEY_ENV) {
                if !env_key.trim().is_empty() {
                    settings.api_key = env_key;
                }
            }
        }

        settings
    }

    pub fn save(&self, settings: &AiSettings) -> AppResult<()> {
        let value = serde_json::to_value(settings)?;
        self.store.set(SETTINGS_KEY, &value).map_err(|e| {
            tracing::error!("[Settings] Failed to save settings: {}", e);
            AppError::Storage("Failed to save settings".to_string())
        })
    }
}
