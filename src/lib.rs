//! Text layer translation for a design tool
//!
//! The host design tool is reached through [`SceneHost`]; everything else is
//! set up here. [`run`] builds a [`TranslatorPlugin`] over the default on-disk
//! store and the HTTP translation client, and hands back the receiver the
//! host adapter drains to forward events to the UI.

pub mod api;
pub mod core;
pub mod logging;
pub mod shared;

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

pub use crate::api::commands::CommandDispatcher;
pub use crate::core::features::translator::{
    BatchOptions, BatchOrchestrator, BatchOutcome, ChatCompletionClient, HistoryStore, RegenerateOptions,
    RegenerateOutcome, Regenerator, TranslationInvoker,
};
pub use crate::core::host::{MemoryScene, NodeId, SceneHost, SceneNode};
pub use crate::core::storage::{KeyValueStore, MemoryStore, RedbStore, StorageBackend};
pub use crate::core::traverse::{traverse, NodeVisitor};
pub use crate::logging::{init_logging, LoggingConfig};
pub use crate::shared::emit::{ChannelSink, EventSink};
pub use crate::shared::error::{AppError, AppResult};
pub use crate::shared::events::{AppEvent, UiMessage};

/// Dispatcher wired to the stock store, client and event channel
pub type TranslatorPlugin<H> = CommandDispatcher<H, ChatCompletionClient, StorageBackend, ChannelSink>;

pub fn run<H>(host: Arc<H>, logging: &LoggingConfig) -> AppResult<(TranslatorPlugin<H>, UnboundedReceiver<AppEvent>)>
where
    H: SceneHost,
{
    init_logging(logging)?;

    let store = Arc::new(StorageBackend::open_default());
    let invoker = Arc::new(ChatCompletionClient::new()?);
    let (sink, events) = ChannelSink::new();

    tracing::info!("Layer translator ready");
    Ok((CommandDispatcher::new(host, invoker, store, Arc::new(sink)), events))
}
