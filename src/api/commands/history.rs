//! History command module
//!
//! Listing, searching and clearing stored batches, and replaying one.

use super::CommandDispatcher;
use crate::core::features::translator::{RegenerateOutcome, Regenerator, TranslationInvoker};
use crate::core::host::SceneHost;
use crate::core::storage::KeyValueStore;
use crate::shared::emit::EventSink;
use crate::shared::error::AppResult;
use crate::shared::events::AppEvent;
use crate::shared::types::TranslationRecord;

pub(super) fn get_history<H, I, S, E>(dispatcher: &CommandDispatcher<H, I, S, E>) -> AppResult<()>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    S: KeyValueStore,
    E: EventSink + ?Sized,
{
    let records = dispatcher.history.list();
    dispatcher.emit(AppEvent::HistoryLoaded { records });
    Ok(())
}

pub(super) fn search_history<H, I, S, E>(dispatcher: &CommandDispatcher<H, I, S, E>, query: &str) -> AppResult<()>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    S: KeyValueStore,
    E: EventSink + ?Sized,
{
    let records = dispatcher.history.search(query);
    dispatcher.emit(AppEvent::HistorySearched { records });
    Ok(())
}

pub(super) fn clear_history<H, I, S, E>(dispatcher: &CommandDispatcher<H, I, S, E>) -> AppResult<()>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    S: KeyValueStore,
    E: EventSink + ?Sized,
{
    dispatcher.history.clear()?;
    dispatcher.emit(AppEvent::HistoryCleared);
    dispatcher.emit(AppEvent::info("History cleared"));
    Ok(())
}

pub(super) async fn regenerate<H, I, S, E>(
    dispatcher: &CommandDispatcher<H, I, S, E>,
    record: &TranslationRecord,
) -> AppResult<RegenerateOutcome>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    S: KeyValueStore,
    E: EventSink + ?Sized,
{
    let outcome = Regenerator::with_options(dispatcher.host.as_ref(), dispatcher.regenerate_options.clone())
        .regenerate(record)
        .await?;

    dispatcher.emit(AppEvent::info(format!(
        "Regenerated {} of {} translations",
        outcome.applied,
        record.translations.len()
    )));
    Ok(outcome)
}
