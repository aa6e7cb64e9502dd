//! Node capability model
//!
//! The scene graph is owned by the host design tool. This module describes the
//! subset of it the translator needs: reading a node snapshot, cloning, and
//! rewriting text, style and geometry. Nodes are addressed by [`NodeId`]; a
//! [`SceneNode`] is a copy of a node's attributes at the moment it was read,
//! never a live reference.
//!
//! All methods take `&self`. The host is a single-writer resource and
//! implementations synchronize internally.

pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppResult;
use crate::shared::types::{FontName, Geometry, ParentNodeSnapshot, Position, Size, TextStyle};

pub use memory::MemoryScene;

/// Host-assigned node identifier. Durable only while the node exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Attributes of one node as read from the host
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub node_type: String,
    /// `None` for nodes without a bounding box (pages, documents)
    pub geometry: Option<Geometry>,
    /// `Some` for every node that exposes editable text content
    pub characters: Option<String>,
    pub style: TextStyle,
    /// `None` for leaf node kinds, `Some(vec![])` for empty containers
    pub children: Option<Vec<NodeId>>,
    pub can_clone: bool,
}

impl SceneNode {
    pub fn is_text(&self) -> bool {
        self.characters.is_some()
    }

    pub fn position(&self) -> Option<Position> {
        self.geometry.map(|g| g.position())
    }

    pub fn size(&self) -> Option<Size> {
        self.geometry.map(|g| g.size())
    }

    pub fn snapshot(&self) -> ParentNodeSnapshot {
        ParentNodeSnapshot {
            id: self.id.to_string(),
            name: self.name.clone(),
            node_type: self.node_type.clone(),
        }
    }
}

#[async_trait]
pub trait SceneHost: Send + Sync {
    /// Current selection, in the host's order
    fn selection(&self) -> Vec<NodeId>;

    fn set_selection(&self, nodes: &[NodeId]) -> AppResult<()>;

    /// Bring nodes into the viewport. Hosts without a viewport ignore this.
    fn scroll_into_view(&self, _nodes: &[NodeId]) -> AppResult<()> {
        Ok(())
    }

    /// Read a node, `None` when it no longer exists
    fn node(&self, id: &NodeId) -> Option<SceneNode>;

    /// Duplicate a node and its subtree. The copy gets fresh identifiers.
    fn clone_node(&self, id: &NodeId) -> AppResult<NodeId>;

    fn set_name(&self, id: &NodeId, name: &str) -> AppResult<()>;

    /// Replace text content. Every font used by the node must be loaded.
    fn set_characters(&self, id: &NodeId, text: &str) -> AppResult<()>;

    fn set_position(&self, id: &NodeId, position: Position) -> AppResult<()>;

    fn resize(&self, id: &NodeId, size: Size) -> AppResult<()>;

    /// Set the font of the whole text range. The font must be loaded.
    fn set_font_name(&self, id: &NodeId, font: &FontName) -> AppResult<()>;

    /// Apply the present fields of `style`, except the font reference
    fn apply_style(&self, id: &NodeId, style: &TextStyle) -> AppResult<()>;

    /// Every distinct font used across the node's character range
    fn fonts_in_text(&self, id: &NodeId) -> AppResult<Vec<FontName>>;

    async fn load_font(&self, font: &FontName) -> AppResult<()>;
}

/// Load a set of fonts, each distinct font once, in first-seen order
pub async fn load_fonts<H, I>(host: &H, fonts: I) -> AppResult<()>
where
    H: SceneHost + ?Sized,
    I: IntoIterator<Item = FontName>,
{
    let mut seen = HashSet::new();
    for font in fonts {
        if seen.insert(font.clone()) {
            host.load_font(&font).await?;
        }
    }
    Ok(())
}
