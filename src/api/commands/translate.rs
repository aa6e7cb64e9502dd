//! Translate command module

use super::CommandDispatcher;
use crate::core::features::translator::{
    supported_languages, BatchOptions, BatchOrchestrator, BatchOutcome, TranslationInvoker,
};
use crate::core::host::{NodeId, SceneHost};
use crate::core::storage::KeyValueStore;
use crate::shared::emit::EventSink;
use crate::shared::error::{AppError, AppResult};
use crate::shared::events::AppEvent;
use crate::shared::types::TranslateMode;

fn require_selection<H: SceneHost + ?Sized>(host: &H) -> AppResult<NodeId> {
    host.selection()
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Selection("Please select a layer to translate".to_string()))
}

/// Translate the first selected layer
///
/// Settings are read fresh for every call, so a save takes effect on the next
/// translation without any restart.
pub(super) async fn translate<H, I, S, E>(
    dispatcher: &CommandDispatcher<H, I, S, E>,
    mode: TranslateMode,
    target_language: &str,
) -> AppResult<BatchOutcome>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    S: KeyValueStore,
    E: EventSink + ?Sized,
{
    let root = require_selection(dispatcher.host.as_ref())?;
    let config = dispatcher.settings.load().to_config(target_language)?;
    let options = BatchOptions {
        copy_to_clone: mode == TranslateMode::Copy,
        ..dispatcher.batch_options.clone()
    };

    let outcome = BatchOrchestrator::new(
        dispatcher.host.as_ref(),
        dispatcher.invoker.as_ref(),
        &dispatcher.history,
        dispatcher.sink.as_ref(),
    )
    .run_batch(&root, &config, &options)
    .await?;

    dispatcher.emit(AppEvent::info(format!(
        "Translated {} text layers",
        outcome.translated_count
    )));
    Ok(outcome)
}

pub(super) fn get_supported_languages<H, I, S, E>(dispatcher: &CommandDispatcher<H, I, S, E>) -> AppResult<()>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    S: KeyValueStore,
    E: EventSink + ?Sized,
{
    dispatcher.emit(AppEvent::SupportedLanguages {
        languages: supported_languages(),
    });
    Ok(())
}
