use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::error::{AppError, AppResult};
use super::events::AppEvent;

/// Outbound side of the UI message bus
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AppEvent) -> AppResult<()>;
}

/// Emit an event, logging instead of failing when the UI is gone
pub fn emit_event<E: EventSink + ?Sized>(sink: &E, event: AppEvent) {
    let name = event.name();
    if let Err(e) = sink.emit(event) {
        tracing::error!("Failed to emit {}: {}", name, e);
    }
}

/// Sink backed by an unbounded tokio channel; the adapter drains the receiver
#[derive(Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<AppEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: AppEvent) -> AppResult<()> {
        self.tx
            .send(event)
            .map_err(|e| AppError::Host(format!("UI channel closed: {}", e.0.name())))
    }
}

/// Drain every event currently buffered in a receiver
pub fn drain(rx: &mut UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
