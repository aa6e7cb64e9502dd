use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::settings::AiSettings;
use super::types::{SupportedLanguage, TranslateMode, TranslationRecord};

/// Messages sent from the plugin UI to the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "kebab-case")]
#[ts(export, export_to = "bindings.ts")]
pub enum UiMessage {
    LoadSettings,

    SaveSettings {
        settings: AiSettings,
    },

    Translate {
        #[serde(default)]
        mode: TranslateMode,
        #[serde(rename = "targetLanguage", default = "default_target_language")]
        target_language: String,
    },

    GetHistory,

    SearchHistory {
        query: String,
    },

    ClearHistory,

    RegenerateTranslation {
        record: TranslationRecord,
    },

    GetSupportedLanguages,
}

fn default_target_language() -> String {
    "en".to_string()
}

/// Messages sent from the core to the plugin UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "kebab-case")]
#[ts(export, export_to = "bindings.ts")]
pub enum AppEvent {
    TranslationProgress {
        /// Whole percent, 0..=100
        progress: u32,
        message: String,
        #[ts(type = "number")]
        timestamp: i64,
    },

    TranslationComplete {
        #[ts(type = "number")]
        timestamp: i64,
    },

    SettingsLoaded {
        settings: AiSettings,
    },

    SettingsSaved,

    HistoryLoaded {
        records: Vec<TranslationRecord>,
    },

    HistorySearched {
        records: Vec<TranslationRecord>,
    },

    HistoryCleared,

    SupportedLanguages {
        languages: Vec<SupportedLanguage>,
    },

    /// Toast shown by the host
    Notify {
        message: String,
        error: bool,
    },
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::TranslationProgress { .. } => "translation-progress",
            AppEvent::TranslationComplete { .. } => "translation-complete",
            AppEvent::SettingsLoaded { .. } => "settings-loaded",
            AppEvent::SettingsSaved => "settings-saved",
            AppEvent::HistoryLoaded { .. } => "history-loaded",
            AppEvent::HistorySearched { .. } => "history-searched",
            AppEvent::HistoryCleared => "history-cleared",
            AppEvent::SupportedLanguages { .. } => "supported-languages",
            AppEvent::Notify { .. } => "notify",
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        AppEvent::Notify {
            message: message.into(),
            error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        AppEvent::Notify {
            message: message.into(),
            error: true,
        }
    }
}
