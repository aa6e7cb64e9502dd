//! Command dispatcher for UI messages
//!
//! Each inbound [`UiMessage`] maps to one handler. Handlers report their
//! results as outbound [`AppEvent`]s; a handler error becomes an error
//! notification instead of reaching the adapter.
//!
//! ## Architecture
//!
//! - `translate`: translation passes and the language list
//! - `settings`: settings persistence
//! - `history`: history queries and regeneration

pub mod history;
pub mod settings;
pub mod translate;

use std::sync::Arc;
use std::time::Duration;

use crate::core::features::translator::{BatchOptions, HistoryStore, RegenerateOptions, TranslationInvoker};
use crate::core::host::SceneHost;
use crate::core::storage::KeyValueStore;
use crate::shared::emit::{emit_event, EventSink};
use crate::shared::error::AppResult;
use crate::shared::events::{AppEvent, UiMessage};
use crate::shared::settings::SettingsService;

pub struct CommandDispatcher<H: ?Sized, I: ?Sized, S: KeyValueStore, E: ?Sized> {
    host: Arc<H>,
    invoker: Arc<I>,
    sink: Arc<E>,
    settings: SettingsService<S>,
    history: HistoryStore<S>,
    batch_options: BatchOptions,
    regenerate_options: RegenerateOptions,
}

impl<H, I, S, E> CommandDispatcher<H, I, S, E>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    S: KeyValueStore,
    E: EventSink + ?Sized,
{
    pub fn new(host: Arc<H>, invoker: Arc<I>, store: Arc<S>, sink: Arc<E>) -> Self {
        Self {
            host,
            invoker,
            sink,
            settings: SettingsService::new(store.clone()),
            history: HistoryStore::new(store),
            batch_options: BatchOptions::default(),
            regenerate_options: RegenerateOptions::default(),
        }
    }

    /// Pause between a batch's final progress event and its completion event
    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.batch_options.completion_delay = delay;
        self
    }

    pub fn with_regenerate_options(mut self, options: RegenerateOptions) -> Self {
        self.regenerate_options = options;
        self
    }

    pub fn settings(&self) -> &SettingsService<S> {
        &self.settings
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    /// Handle one message, turning failures into an error notification
    pub async fn dispatch(&self, message: UiMessage) {
        let name = message_name(&message);
        if let Err(e) = self.handle(message).await {
            tracing::error!("[Commands] {} failed: {}", name, e);
            emit_event(self.sink.as_ref(), AppEvent::error(e.message()));
        }
    }

    /// Parse a raw JSON message from the UI and dispatch it
    pub async fn dispatch_json(&self, raw: &str) {
        match serde_json::from_str::<UiMessage>(raw) {
            Ok(message) => self.dispatch(message).await,
            Err(e) => {
                tracing::warn!("[Commands] Ignoring malformed message: {}", e);
                emit_event(
                    self.sink.as_ref(),
                    AppEvent::error(format!("Unrecognized message: {}", e)),
                );
            }
        }
    }

    pub async fn handle(&self, message: UiMessage) -> AppResult<()> {
        tracing::debug!("[Commands] Handling {}", message_name(&message));
        match message {
            UiMessage::LoadSettings => settings::load_settings(self),
            UiMessage::SaveSettings { settings: new_settings } => settings::save_settings(self, &new_settings),
            UiMessage::Translate { mode, target_language } => {
                translate::translate(self, mode, &target_language).await.map(|_| ())
            }
            UiMessage::GetHistory => history::get_history(self),
            UiMessage::SearchHistory { query } => history::search_history(self, &query),
            UiMessage::ClearHistory => history::clear_history(self),
            UiMessage::RegenerateTranslation { record } => {
                history::regenerate(self, &record).await.map(|_| ())
            }
            UiMessage::GetSupportedLanguages => translate::get_supported_languages(self),
        }
    }

    fn emit(&self, event: AppEvent) {
        emit_event(self.sink.as_ref(), event);
    }
}

fn message_name(message: &UiMessage) -> &'static str {
    match message {
        UiMessage::LoadSettings => "load-settings",
        UiMessage::SaveSettings { .. } => "save-settings",
        UiMessage::Translate { .. } => "translate",
        UiMessage::GetHistory => "get-history",
        UiMessage::SearchHistory { .. } => "search-history",
        UiMessage::ClearHistory => "clear-history",
        UiMessage::RegenerateTranslation { .. } => "regenerate-translation",
        UiMessage::GetSupportedLanguages => "get-supported-languages",
    }
}
