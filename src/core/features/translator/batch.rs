//! Batch translation over a selected subtree
//!
//! One pass counts the text nodes, optionally clones the root, then walks the
//! working root and translates every text node in traversal order. A node that
//! fails is reported and skipped; the pass itself only fails when the root
//! cannot be read, cloned or placed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::history::HistoryStore;
use super::invoker::TranslationInvoker;
use crate::core::host::{load_fonts, NodeId, SceneHost, SceneNode};
use crate::core::storage::KeyValueStore;
use crate::core::traverse::{count_text_nodes, traverse, NodeVisitor};
use crate::shared::emit::{emit_event, EventSink};
use crate::shared::error::{AppError, AppResult};
use crate::shared::events::AppEvent;
use crate::shared::settings::TranslationConfig;
use crate::shared::types::{Position, TranslationItem, TranslationRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Translate a clone placed next to the root instead of the root itself
    pub copy_to_clone: bool,
    /// Horizontal gap between the root and its clone
    pub clone_margin: f64,
    /// Pause between the final progress event and the completion event
    pub completion_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            copy_to_clone: true,
            clone_margin: 100.0,
            completion_delay: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub translated_count: usize,
    pub failed_count: usize,
    pub items: Vec<TranslationItem>,
    /// The clone in copy mode, the root otherwise
    pub working_root: NodeId,
    /// `None` when nothing was translated
    pub record: Option<TranslationRecord>,
}

/// Whole-percent progress that never goes backwards
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: usize,
    processed: usize,
    last: u32,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            last: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Count one processed node and return the resulting percentage
    pub fn advance(&mut self) -> u32 {
        self.processed += 1;
        let percent = if self.total == 0 {
            100
        } else {
            ((self.processed as f64 / self.total as f64) * 100.0).round().min(100.0) as u32
        };
        self.last = self.last.max(percent);
        self.last
    }

    pub fn finish(&mut self) -> u32 {
        self.last = 100;
        self.last
    }
}

fn progress_event(progress: u32, message: String) -> AppEvent {
    AppEvent::TranslationProgress {
        progress,
        message,
        timestamp: Utc::now().timestamp_millis(),
    }
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 20;
    if text.chars().count() > MAX_CHARS {
        format!("{}...", text.chars().take(MAX_CHARS).collect::<String>())
    } else {
        text.to_string()
    }
}

struct TranslateVisitor<'a, H: ?Sized, I: ?Sized, E: ?Sized> {
    host: &'a H,
    invoker: &'a I,
    sink: &'a E,
    config: &'a TranslationConfig,
    progress: ProgressTracker,
    items: Vec<TranslationItem>,
    failed: usize,
}

impl<'a, H, I, E> TranslateVisitor<'a, H, I, E>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    E: EventSink + ?Sized,
{
    /// Translate one text node. `Ok(None)` when the node was left unchanged.
    async fn translate_node(&self, node: &SceneNode, source_text: &str) -> AppResult<Option<TranslationItem>> {
        load_fonts(self.host, self.host.fonts_in_text(&node.id)?).await?;

        let translated = self.invoker.translate(source_text, self.config).await?;
        if translated.is_empty() || translated == source_text {
            tracing::debug!("[Batch] Node {} unchanged, skipping", node.id);
            return Ok(None);
        }

        self.host.set_characters(&node.id, &translated)?;

        let current = self
            .host
            .node(&node.id)
            .ok_or_else(|| AppError::NotFound(format!("Node {} vanished during translation", node.id)))?;

        Ok(Some(TranslationItem {
            source_text: source_text.to_string(),
            translated_text: translated,
            element_id: current.id.to_string(),
            element_type: current.node_type.clone(),
            target_language: Some(self.config.target_language.clone()),
            position: current.position(),
            style: Some(current.style.clone()),
            size: current.size(),
        }))
    }
}

#[async_trait]
impl<'a, H, I, E> NodeVisitor for TranslateVisitor<'a, H, I, E>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    E: EventSink + ?Sized,
{
    async fn visit(&mut self, node: &SceneNode) -> AppResult<()> {
        let Some(source_text) = node.characters.clone() else {
            return Ok(());
        };

        let percent = self.progress.advance();
        emit_event(
            self.sink,
            progress_event(
                percent,
                format!(
                    "Translating text layer {}/{}",
                    self.progress.processed(),
                    self.progress.total()
                ),
            ),
        );

        if source_text.trim().is_empty() {
            return Ok(());
        }

        match self.translate_node(node, &source_text).await {
            Ok(Some(item)) => self.items.push(item),
            Ok(None) => {}
            Err(e) => {
                self.failed += 1;
                tracing::warn!("[Batch] Failed to translate node {}: {}", node.id, e);
                emit_event(
                    self.sink,
                    AppEvent::error(format!("Failed to translate \"{}\": {}", preview(&source_text), e.message())),
                );
            }
        }
        Ok(())
    }
}

/// Drives one translation pass
pub struct BatchOrchestrator<'a, H: ?Sized, I: ?Sized, S: KeyValueStore, E: ?Sized> {
    host: &'a H,
    invoker: &'a I,
    history: &'a HistoryStore<S>,
    sink: &'a E,
}

impl<'a, H, I, S, E> BatchOrchestrator<'a, H, I, S, E>
where
    H: SceneHost + ?Sized,
    I: TranslationInvoker + ?Sized,
    S: KeyValueStore,
    E: EventSink + ?Sized,
{
    pub fn new(host: &'a H, invoker: &'a I, history: &'a HistoryStore<S>, sink: &'a E) -> Self {
        Self {
            host,
            invoker,
            history,
            sink,
        }
    }

    pub async fn run_batch(
        &self,
        root: &NodeId,
        config: &TranslationConfig,
        options: &BatchOptions,
    ) -> AppResult<BatchOutcome> {
        let root_node = self
            .host
            .node(root)
            .ok_or_else(|| AppError::NotFound(format!("Node {} does not exist", root)))?;

        let total = count_text_nodes(self.host, root).await?;
        tracing::info!(
            "[Batch] Translating {} text nodes under {} to {}",
            total,
            root_node.name,
            config.target_language
        );
        emit_event(
            self.sink,
            progress_event(0, format!("Preparing to translate {} text layers...", total)),
        );

        let working_root = if options.copy_to_clone {
            self.host.clone_node(root)?
        } else {
            root.clone()
        };

        let mut visitor = TranslateVisitor {
            host: self.host,
            invoker: self.invoker,
            sink: self.sink,
            config,
            progress: ProgressTracker::new(total),
            items: Vec::new(),
            failed: 0,
        };
        traverse(self.host, &working_root, &mut visitor).await?;

        let TranslateVisitor {
            mut progress,
            items,
            failed,
            ..
        } = visitor;

        if options.copy_to_clone {
            if let Some(geometry) = root_node.geometry {
                self.host.set_position(
                    &working_root,
                    Position::new(geometry.x + geometry.width + options.clone_margin, geometry.y),
                )?;
            }
            self.host.set_selection(std::slice::from_ref(&working_root))?;
        }

        let record = if items.is_empty() {
            None
        } else {
            Some(self.history.add_batch(root_node.snapshot(), items.clone()))
        };

        tracing::info!("[Batch] Finished: {} translated, {} failed", items.len(), failed);
        emit_event(
            self.sink,
            progress_event(progress.finish(), format!("Finished translating {} text layers!", total)),
        );

        if !options.completion_delay.is_zero() {
            tokio::time::sleep(options.completion_delay).await;
        }
        emit_event(
            self.sink,
            AppEvent::TranslationComplete {
                timestamp: Utc::now().timestamp_millis(),
            },
        );

        Ok(BatchOutcome {
            translated_count: items.len(),
            failed_count: failed,
            items,
            working_root,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::features::translator::invoker::fake::{config, MapInvoker};
    use crate::core::host::MemoryScene;
    use crate::core::storage::MemoryStore;
    use crate::shared::emit::{drain, ChannelSink};
    use crate::shared::types::{FontName, Geometry, TextStyle};

    fn inter() -> TextStyle {
        TextStyle {
            font_name: Some(FontName::new("Inter", "Regular")),
            font_size: Some(14.0),
            ..Default::default()
        }
    }

    fn in_place() -> BatchOptions {
        BatchOptions {
            copy_to_clone: false,
            completion_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn card(texts: &[&str]) -> (MemoryScene, NodeId) {
        let scene = MemoryScene::new();
        let root = scene.add_frame(None, "Card", Geometry::new(0.0, 0.0, 200.0, 100.0)).unwrap();
        for (i, text) in texts.iter().enumerate() {
            scene
                .add_text(Some(&root), text, Geometry::new(10.0, 10.0 + 20.0 * i as f64, 80.0, 16.0), inter())
                .unwrap();
        }
        (scene, root)
    }

    fn progress_values(events: &[AppEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e {
                AppEvent::TranslationProgress { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_unchanged_text_is_not_recorded() {
        let (scene, root) = card(&["Hello"]);
        let invoker = MapInvoker::new();
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        let (sink, _rx) = ChannelSink::new();

        let outcome = BatchOrchestrator::new(&scene, &invoker, &history, &sink)
            .run_batch(&root, &config(), &in_place())
            .await
            .unwrap();

        assert_eq!(outcome.translated_count, 0);
        assert!(outcome.items.is_empty());
        assert!(outcome.record.is_none());
        assert!(history.list().is_empty());
        let text = scene.node(&root).unwrap().children.unwrap()[0].clone();
        assert_eq!(scene.characters(&text), Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_failed_node_does_not_abort_batch() {
        let (scene, root) = card(&["一", "二", "三"]);
        let invoker = MapInvoker::new()
            .answer("一", "One")
            .fail("二", AppError::TranslationApi("Translation API error: 500".to_string()))
            .answer("三", "Three");
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        let (sink, mut rx) = ChannelSink::new();

        let outcome = BatchOrchestrator::new(&scene, &invoker, &history, &sink)
            .run_batch(&root, &config(), &in_place())
            .await
            .unwrap();

        assert_eq!(outcome.translated_count, 2);
        assert_eq!(outcome.failed_count, 1);
        let translated: Vec<_> = outcome.items.iter().map(|i| i.translated_text.as_str()).collect();
        assert_eq!(translated, vec!["One", "Three"]);

        let events = drain(&mut rx);
        assert!(events.contains(&AppEvent::error(
            "Failed to translate \"二\": Translation API error: 500"
        )));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_100() {
        let (scene, root) = card(&["一", "二", "三"]);
        let invoker = MapInvoker::new().answer("一", "One");
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        let (sink, mut rx) = ChannelSink::new();

        BatchOrchestrator::new(&scene, &invoker, &history, &sink)
            .run_batch(&root, &config(), &in_place())
            .await
            .unwrap();

        let events = drain(&mut rx);
        let values = progress_values(&events);
        assert_eq!(values, vec![0, 33, 67, 100, 100]);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert!(matches!(events.last(), Some(AppEvent::TranslationComplete { .. })));
    }

    #[tokio::test]
    async fn test_no_text_nodes_goes_straight_to_100() {
        let (scene, root) = card(&[]);
        let invoker = MapInvoker::new();
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        let (sink, mut rx) = ChannelSink::new();

        let outcome = BatchOrchestrator::new(&scene, &invoker, &history, &sink)
            .run_batch(&root, &config(), &in_place())
            .await
            .unwrap();

        assert_eq!(outcome.translated_count, 0);
        assert_eq!(progress_values(&drain(&mut rx)), vec![0, 100]);
    }

    #[tokio::test]
    async fn test_copy_mode_translates_clone_beside_original() {
        let (scene, root) = card(&["确认"]);
        let invoker = MapInvoker::new().answer("确认", "Confirm");
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        let (sink, _rx) = ChannelSink::new();
        let options = BatchOptions {
            completion_delay: Duration::ZERO,
            ..BatchOptions::default()
        };

        let outcome = BatchOrchestrator::new(&scene, &invoker, &history, &sink)
            .run_batch(&root, &config(), &options)
            .await
            .unwrap();

        assert_ne!(outcome.working_root, root);
        let original_text = scene.node(&root).unwrap().children.unwrap()[0].clone();
        assert_eq!(scene.characters(&original_text), Some("确认".to_string()));

        let clone = scene.node(&outcome.working_root).unwrap();
        assert_eq!(clone.position(), Some(Position::new(300.0, 0.0)));
        assert_eq!(scene.selection(), vec![outcome.working_root.clone()]);

        let item = &outcome.items[0];
        assert_eq!(item.element_id, clone.children.unwrap()[0].to_string());
        assert_eq!(item.position, Some(Position::new(10.0, 10.0)));
        assert_eq!(item.style.as_ref().and_then(|s| s.font_size), Some(14.0));

        let record = outcome.record.unwrap();
        assert_eq!(record.parent_node.id, root.to_string());
        assert_eq!(history.list(), vec![record]);
    }

    #[tokio::test]
    async fn test_missing_font_fails_only_that_node() {
        let (scene, root) = card(&["一"]);
        let serif = TextStyle {
            font_name: Some(FontName::new("Songti", "Bold")),
            ..Default::default()
        };
        scene.add_text(Some(&root), "二", Geometry::new(0.0, 50.0, 80.0, 16.0), serif).unwrap();
        scene.mark_font_missing(FontName::new("Songti", "Bold"));

        let invoker = MapInvoker::new().answer("一", "One").answer("二", "Two");
        let history = HistoryStore::new(Arc::new(MemoryStore::new()));
        let (sink, _rx) = ChannelSink::new();

        let outcome = BatchOrchestrator::new(&scene, &invoker, &history, &sink)
            .run_batch(&root, &config(), &in_place())
            .await
            .unwrap();

        assert_eq!(outcome.translated_count, 1);
        assert_eq!(outcome.failed_count, 1);
        assert_eq!(*invoker.calls.lock().unwrap(), vec!["一".to_string()]);
    }

    #[test]
    fn test_tracker_rounds_and_clamps() {
        let mut tracker = ProgressTracker::new(3);
        assert_eq!(tracker.advance(), 33);
        assert_eq!(tracker.advance(), 67);
        assert_eq!(tracker.advance(), 100);
        assert_eq!(tracker.advance(), 100);
        assert_eq!(ProgressTracker::new(0).advance(), 100);
    }
}
