//! Replaying a stored batch
//!
//! The record's root is re-resolved in the live tree and cloned next to the
//! original. Each recorded item is then matched to one text node of the clone
//! and rewritten with the recorded translation, style and geometry. A matched
//! node leaves the candidate pool, so two items never land on the same node.
//!
//! Unlike a batch pass, any failure while rewriting a node aborts the whole
//! replay.

use crate::core::host::{load_fonts, NodeId, SceneHost, SceneNode};
use crate::core::traverse::collect_text_nodes;
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{Position, TranslationItem, TranslationRecord};

/// Which rule of the fallback chain claimed a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Position,
    SourceText,
    SizeAndFont,
    Font,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegenerateOptions {
    pub clone_margin: f64,
    pub name_suffix: String,
    pub position_tolerance: f64,
    pub size_tolerance: f64,
}

impl Default for RegenerateOptions {
    fn default() -> Self {
        Self {
            clone_margin: 100.0,
            name_suffix: " (Regenerated)".to_string(),
            position_tolerance: 1.0,
            size_tolerance: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegenerateOutcome {
    /// The clone the record was replayed onto
    pub root: NodeId,
    pub applied: usize,
    pub skipped: usize,
}

/// Pick the best unclaimed candidate for `item`, first rule that hits wins
pub fn find_match(
    item: &TranslationItem,
    candidates: &[SceneNode],
    options: &RegenerateOptions,
) -> Option<(usize, MatchRule)> {
    if candidates.is_empty() {
        return None;
    }

    if let Some(position) = item.position {
        if let Some(index) = candidates.iter().position(|node| {
            node.position()
                .is_some_and(|p| p.is_near(&position, options.position_tolerance))
        }) {
            return Some((index, MatchRule::Position));
        }
    }

    if let Some(index) = candidates
        .iter()
        .position(|node| node.characters.as_deref() == Some(item.source_text.as_str()))
    {
        return Some((index, MatchRule::SourceText));
    }

    if let Some(font) = item.font_name() {
        if let Some(size) = item.size {
            if let Some(index) = candidates.iter().position(|node| {
                node.style.font_name.as_ref() == Some(font)
                    && node.size().is_some_and(|s| s.is_near(&size, options.size_tolerance))
            }) {
                return Some((index, MatchRule::SizeAndFont));
            }
        }

        if let Some(index) = candidates
            .iter()
            .position(|node| node.style.font_name.as_ref() == Some(font))
        {
            return Some((index, MatchRule::Font));
        }
    }

    Some((0, MatchRule::Fallback))
}

fn update_error(node: &SceneNode, err: AppError) -> AppError {
    AppError::NodeUpdate(format!(
        "Failed to update text layer \"{}\" ({}): {}",
        node.name,
        node.id,
        err.message()
    ))
}

pub struct Regenerator<'a, H: ?Sized> {
    host: &'a H,
    options: RegenerateOptions,
}

impl<'a, H> Regenerator<'a, H>
where
    H: SceneHost + ?Sized,
{
    pub fn new(host: &'a H) -> Self {
        Self::with_options(host, RegenerateOptions::default())
    }

    pub fn with_options(host: &'a H, options: RegenerateOptions) -> Self {
        Self { host, options }
    }

    pub async fn regenerate(&self, record: &TranslationRecord) -> AppResult<RegenerateOutcome> {
        let original_id = NodeId::new(record.parent_node.id.clone());
        let original = self.host.node(&original_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "The original layer \"{}\" no longer exists",
                record.parent_node.name
            ))
        })?;

        let geometry = match original.geometry {
            Some(geometry) if original.can_clone => geometry,
            _ => {
                return Err(AppError::UnsupportedNode(format!(
                    "Layer \"{}\" ({}) cannot be regenerated",
                    original.name, original.node_type
                )))
            }
        };

        let root = self.host.clone_node(&original_id)?;
        self.host
            .set_name(&root, &format!("{}{}", original.name, self.options.name_suffix))?;
        self.host.set_position(
            &root,
            Position::new(geometry.x + geometry.width + self.options.clone_margin, geometry.y),
        )?;

        let fonts: Vec<_> = record
            .translations
            .iter()
            .filter_map(|item| item.font_name().cloned())
            .collect();
        load_fonts(self.host, fonts)
            .await
            .map_err(|e| AppError::NodeUpdate(format!("Failed to load fonts: {}", e.message())))?;

        let mut candidates = collect_text_nodes(self.host, &root).await?;
        let mut applied = 0;
        let mut skipped = 0;

        for item in &record.translations {
            let Some((index, rule)) = find_match(item, &candidates, &self.options) else {
                tracing::warn!(
                    "[Regenerate] No text layer left for \"{}\", skipping",
                    item.source_text
                );
                skipped += 1;
                continue;
            };

            let node = candidates.remove(index);
            tracing::debug!("[Regenerate] \"{}\" -> {} ({:?})", item.source_text, node.id, rule);
            self.apply(&node, item).await.map_err(|e| update_error(&node, e))?;
            applied += 1;
        }

        let selection = [root.clone()];
        if let Err(e) = self.host.set_selection(&selection) {
            tracing::warn!("[Regenerate] Failed to select regenerated layer: {}", e);
        }
        if let Err(e) = self.host.scroll_into_view(&selection) {
            tracing::warn!("[Regenerate] Failed to scroll to regenerated layer: {}", e);
        }

        tracing::info!(
            "[Regenerate] Replayed record {}: {} applied, {} skipped",
            record.id,
            applied,
            skipped
        );
        Ok(RegenerateOutcome { root, applied, skipped })
    }

    /// Font first, then the remaining style, text and geometry
    async fn apply(&self, node: &SceneNode, item: &TranslationItem) -> AppResult<()> {
        load_fonts(self.host, self.host.fonts_in_text(&node.id)?).await?;

        if let Some(font) = item.font_name() {
            self.host.set_font_name(&node.id, font)?;
        }
        if let Some(style) = &item.style {
            let rest = style.without_font();
            if !rest.is_empty() {
                self.host.apply_style(&node.id, &rest)?;
            }
        }

        self.host.set_characters(&node.id, &item.translated_text)?;

        if let Some(position) = item.position {
            self.host.set_position(&node.id, position)?;
        }
        if let Some(size) = item.size {
            self.host.resize(&node.id, size)?;
        }
        Ok(())
    }
}
