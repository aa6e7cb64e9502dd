//! In-memory scene graph
//!
//! A self-contained [`SceneHost`] used by the test suite and by embedders that
//! drive the translator without a live design tool. It enforces the same font
//! precondition the real host does: text can only be rewritten once every font
//! it uses has been loaded.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{NodeId, SceneHost, SceneNode};
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{FontName, Geometry, Position, Size, TextStyle, TEXT_NODE_TYPE};

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    node_type: String,
    geometry: Option<Geometry>,
    characters: Option<String>,
    style: TextStyle,
    children: Option<Vec<NodeId>>,
    parent: Option<NodeId>,
    can_clone: bool,
}

#[derive(Debug, Default)]
struct SceneState {
    nodes: HashMap<NodeId, NodeData>,
    roots: Vec<NodeId>,
    selection: Vec<NodeId>,
    viewport: Vec<NodeId>,
    loaded_fonts: HashSet<FontName>,
    missing_fonts: HashSet<FontName>,
    failing_texts: HashSet<String>,
    next_id: u64,
}

impl SceneState {
    fn allocate_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(format!("{}:{}", 1, self.next_id))
    }

    fn data(&self, id: &NodeId) -> AppResult<&NodeData> {
        self.nodes
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Node {} does not exist", id)))
    }

    fn data_mut(&mut self, id: &NodeId) -> AppResult<&mut NodeData> {
        let data = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Node {} does not exist", id)))?;
        if data.characters.as_ref().is_some_and(|t| self.failing_texts.contains(t)) {
            return Err(AppError::Host(format!("Node {} rejected the update", id)));
        }
        Ok(data)
    }

    fn insert(&mut self, parent: Option<&NodeId>, data: NodeData) -> AppResult<NodeId> {
        let id = self.allocate_id();
        self.attach(parent, id.clone(), None)?;
        let mut data = data;
        data.parent = parent.cloned();
        self.nodes.insert(id.clone(), data);
        Ok(id)
    }

    /// Link `id` under `parent` (or as a root), optionally right after `after`
    fn attach(&mut self, parent: Option<&NodeId>, id: NodeId, after: Option<&NodeId>) -> AppResult<()> {
        let siblings = match parent {
            Some(p) => self
                .nodes
                .get_mut(p)
                .ok_or_else(|| AppError::NotFound(format!("Parent {} does not exist", p)))?
                .children
                .as_mut()
                .ok_or_else(|| AppError::Host(format!("Node {} cannot have children", p)))?,
            None => &mut self.roots,
        };
        let index = after
            .and_then(|a| siblings.iter().position(|s| s == a))
            .map(|i| i + 1)
            .unwrap_or(siblings.len());
        siblings.insert(index, id);
        Ok(())
    }

    fn copy_subtree(&mut self, id: &NodeId, parent: Option<NodeId>) -> AppResult<NodeId> {
        let mut data = self.data(id)?.clone();
        let new_id = self.allocate_id();
        let children = data.children.take();
        data.parent = parent;

        let copied_children = match children {
            Some(children) => {
                let mut copied = Vec::with_capacity(children.len());
                for child in &children {
                    copied.push(self.copy_subtree(child, Some(new_id.clone()))?);
                }
                Some(copied)
            }
            None => None,
        };
        data.children = copied_children;
        self.nodes.insert(new_id.clone(), data);
        Ok(new_id)
    }

    fn require_fonts_loaded(&self, id: &NodeId) -> AppResult<()> {
        let data = self.data(id)?;
        if let Some(font) = &data.style.font_name {
            if !self.loaded_fonts.contains(font) {
                return Err(AppError::Host(format!(
                    "Cannot write to node {} with unloaded font \"{}\"",
                    id, font
                )));
            }
        }
        Ok(())
    }
}

/// Scene graph held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryScene {
    state: RwLock<SceneState>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, SceneState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("[MemoryScene] Lock poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, SceneState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("[MemoryScene] Lock poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }

    /// Add a container node (frame, group). `parent = None` adds a page-level node.
    pub fn add_frame(&self, parent: Option<&NodeId>, name: &str, geometry: Geometry) -> AppResult<NodeId> {
        self.write().insert(
            parent,
            NodeData {
                name: name.to_string(),
                node_type: "FRAME".to_string(),
                geometry: Some(geometry),
                characters: None,
                style: TextStyle::default(),
                children: Some(Vec::new()),
                parent: None,
                can_clone: true,
            },
        )
    }

    pub fn add_text(
        &self,
        parent: Option<&NodeId>,
        text: &str,
        geometry: Geometry,
        style: TextStyle,
    ) -> AppResult<NodeId> {
        self.write().insert(
            parent,
            NodeData {
                name: text.to_string(),
                node_type: TEXT_NODE_TYPE.to_string(),
                geometry: Some(geometry),
                characters: Some(text.to_string()),
                style,
                children: None,
                parent: None,
                can_clone: true,
            },
        )
    }

    /// Add a node with no geometry that cannot be cloned (a page, a slice)
    pub fn add_plain(&self, parent: Option<&NodeId>, name: &str, node_type: &str) -> AppResult<NodeId> {
        self.write().insert(
            parent,
            NodeData {
                name: name.to_string(),
                node_type: node_type.to_string(),
                geometry: None,
                characters: None,
                style: TextStyle::default(),
                children: Some(Vec::new()),
                parent: None,
                can_clone: false,
            },
        )
    }

    pub fn remove(&self, id: &NodeId) {
        let mut guard = self.write();
        let state = &mut *guard;
        let parent = state.nodes.get(id).and_then(|d| d.parent.clone());
        let siblings = match parent {
            Some(p) => state.nodes.get_mut(&p).and_then(|d| d.children.as_mut()),
            None => Some(&mut state.roots),
        };
        if let Some(siblings) = siblings {
            siblings.retain(|s| s != id);
        }
        let mut pending = vec![id.clone()];
        while let Some(next) = pending.pop() {
            if let Some(data) = state.nodes.remove(&next) {
                pending.extend(data.children.unwrap_or_default());
            }
        }
    }

    /// Fonts that `load_font` can never resolve
    pub fn mark_font_missing(&self, font: FontName) {
        self.write().missing_fonts.insert(font);
    }

    /// Make every mutation of a node currently showing `text` fail with a host
    /// error. Applies to clones made later as well.
    pub fn fail_updates_on_text(&self, text: &str) {
        self.write().failing_texts.insert(text.to_string());
    }

    pub fn roots(&self) -> Vec<NodeId> {
        self.read().roots.clone()
    }

    pub fn viewport(&self) -> Vec<NodeId> {
        self.read().viewport.clone()
    }

    pub fn is_font_loaded(&self, font: &FontName) -> bool {
        self.read().loaded_fonts.contains(font)
    }

    pub fn characters(&self, id: &NodeId) -> Option<String> {
        self.read().nodes.get(id).and_then(|d| d.characters.clone())
    }
}

#[async_trait]
impl SceneHost for MemoryScene {
    fn selection(&self) -> Vec<NodeId> {
        self.read().selection.clone()
    }

    fn set_selection(&self, nodes: &[NodeId]) -> AppResult<()> {
        let mut state = self.write();
        for id in nodes {
            state.data(id)?;
        }
        state.selection = nodes.to_vec();
        Ok(())
    }

    fn scroll_into_view(&self, nodes: &[NodeId]) -> AppResult<()> {
        self.write().viewport = nodes.to_vec();
        Ok(())
    }

    fn node(&self, id: &NodeId) -> Option<SceneNode> {
        let state = self.read();
        state.nodes.get(id).map(|data| SceneNode {
            id: id.clone(),
            name: data.name.clone(),
            node_type: data.node_type.clone(),
            geometry: data.geometry,
            characters: data.characters.clone(),
            style: data.style.clone(),
            children: data.children.clone(),
            can_clone: data.can_clone,
        })
    }

    fn clone_node(&self, id: &NodeId) -> AppResult<NodeId> {
        let mut state = self.write();
        let source = state.data(id)?;
        if !source.can_clone {
            return Err(AppError::UnsupportedNode(format!("Node {} cannot be cloned", id)));
        }
        let parent = source.parent.clone();
        let copy = state.copy_subtree(id, parent.clone())?;
        state.attach(parent.as_ref(), copy.clone(), Some(id))?;
        Ok(copy)
    }

    fn set_name(&self, id: &NodeId, name: &str) -> AppResult<()> {
        self.write().data_mut(id)?.name = name.to_string();
        Ok(())
    }

    fn set_characters(&self, id: &NodeId, text: &str) -> AppResult<()> {
        let mut state = self.write();
        state.require_fonts_loaded(id)?;
        let data = state.data_mut(id)?;
        if data.characters.is_none() {
            return Err(AppError::Host(format!("Node {} has no text content", id)));
        }
        data.characters = Some(text.to_string());
        Ok(())
    }

    fn set_position(&self, id: &NodeId, position: Position) -> AppResult<()> {
        let mut state = self.write();
        let node = state.data_mut(id)?;
        let geometry = node
            .geometry
            .as_mut()
            .ok_or_else(|| AppError::UnsupportedNode(format!("Node {} has no position", id)))?;
        geometry.x = position.x;
        geometry.y = position.y;
        Ok(())
    }

    fn resize(&self, id: &NodeId, size: Size) -> AppResult<()> {
        let mut state = self.write();
        let node = state.data_mut(id)?;
        let geometry = node
            .geometry
            .as_mut()
            .ok_or_else(|| AppError::UnsupportedNode(format!("Node {} cannot be resized", id)))?;
        geometry.width = size.width;
        geometry.height = size.height;
        Ok(())
    }

    fn set_font_name(&self, id: &NodeId, font: &FontName) -> AppResult<()> {
        let mut state = self.write();
        if !state.loaded_fonts.contains(font) {
            return Err(AppError::Host(format!("Font \"{}\" is not loaded", font)));
        }
        state.data_mut(id)?.style.font_name = Some(font.clone());
        Ok(())
    }

    fn apply_style(&self, id: &NodeId, style: &TextStyle) -> AppResult<()> {
        let mut state = self.write();
        state.require_fonts_loaded(id)?;
        let current = &mut state.data_mut(id)?.style;
        if let Some(size) = style.font_size {
            current.font_size = Some(size);
        }
        if let Some(align) = style.text_align_horizontal {
            current.text_align_horizontal = Some(align);
        }
        if let Some(align) = style.text_align_vertical {
            current.text_align_vertical = Some(align);
        }
        if let Some(fills) = &style.fills {
            current.fills = Some(fills.clone());
        }
        if let Some(effects) = &style.effects {
            current.effects = Some(effects.clone());
        }
        if let Some(constraints) = style.constraints {
            current.constraints = Some(constraints);
        }
        Ok(())
    }

    fn fonts_in_text(&self, id: &NodeId) -> AppResult<Vec<FontName>> {
        let state = self.read();
        Ok(state.data(id)?.style.font_name.iter().cloned().collect())
    }

    async fn load_font(&self, font: &FontName) -> AppResult<()> {
        let mut state = self.write();
        if state.missing_fonts.contains(font) {
            return Err(AppError::Host(format!("Font \"{}\" is not available", font)));
        }
        state.loaded_fonts.insert(font.clone());
        Ok(())
    }
}
