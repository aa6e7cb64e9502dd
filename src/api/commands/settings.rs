//! Settings command module
//!
//! Handles AI settings persistence.

use super::CommandDispatcher;
use crate::core::features::translator::TranslationInvoker;
use crate::core::host::SceneHost;
use crate::core::storage::KeyValueStore;
use crate::shared::emit::EventSink;
use crate::shared::error::AppResult;
use crate::shared::events::AppEvent;
use crate::shared::settings::AiSettings;

/// Send the current settings to the UI
pub(super) fn load_settings<H, I, S, E>(dispatcher: &CommandDispatcher<H, I, S, E>) -> AppResult<()>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    S: KeyValueStore,
    E: EventSink + ?Sized,
{
    let settings = dispatcher.settings.load();
    dispatcher.emit(AppEvent::SettingsLoaded { settings });
    Ok(())
}

/// Save settings sent by the UI
pub(super) fn save_settings<H, I, S, E>(
    dispatcher: &CommandDispatcher<H, I, S, E>,
    settings: &AiSettings,
) -> AppResult<()>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    S: KeyValueStore,
    E: EventSink + ?Sized,
{
    dispatcher.settings.save(settings)?;
    tracing::info!("[Settings] Saved settings (provider: {})", settings.provider);
    dispatcher.emit(AppEvent::SettingsSaved);
    dispatcher.emit(AppEvent::info("Settings saved"));
    Ok(())
}
