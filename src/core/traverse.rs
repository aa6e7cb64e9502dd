//! Depth-first scene traversal
//!
//! Pre-order, siblings in stored order, one visit at a time. Each visit is
//! awaited before the walk moves on, so side effects of one visit are complete
//! before the next node is read. Children are read after the visit returns.
//!
//! Visitor errors are not caught here; the walk stops at the first failure.
//! A caller that wants to continue past a bad node handles it inside `visit`.

use async_trait::async_trait;

use crate::core::host::{NodeId, SceneHost, SceneNode};
use crate::shared::error::{AppError, AppResult};

#[async_trait]
pub trait NodeVisitor: Send {
    async fn visit(&mut self, node: &SceneNode) -> AppResult<()>;
}

pub async fn traverse<H, V>(host: &H, root: &NodeId, visitor: &mut V) -> AppResult<()>
where
    H: SceneHost + ?Sized,
    V: NodeVisitor + ?Sized,
{
    if host.node(root).is_none() {
        return Err(AppError::NotFound(format!("Node {} does not exist", root)));
    }

    // Explicit stack instead of recursion: children are pushed in reverse so
    // the first child is popped first. Nodes are read only when popped.
    let mut pending: Vec<NodeId> = vec![root.clone()];
    while let Some(id) = pending.pop() {
        let Some(node) = host.node(&id) else {
            tracing::warn!("[Traverse] Node {} vanished, skipping", id);
            continue;
        };
        visitor.visit(&node).await?;

        let children = host.node(&id).and_then(|n| n.children).unwrap_or_default();
        pending.extend(children.into_iter().rev());
    }

    Ok(())
}

struct TextCounter {
    count: usize,
}

#[async_trait]
impl NodeVisitor for TextCounter {
    async fn visit(&mut self, node: &SceneNode) -> AppResult<()> {
        if node.is_text() {
            self.count += 1;
        }
        Ok(())
    }
}

/// Number of nodes under `root` (inclusive) that expose text content
pub async fn count_text_nodes<H>(host: &H, root: &NodeId) -> AppResult<usize>
where
    H: SceneHost + ?Sized,
{
    let mut counter = TextCounter { count: 0 };
    traverse(host, root, &mut counter).await?;
    Ok(counter.count)
}

struct TextCollector {
    nodes: Vec<SceneNode>,
}

#[async_trait]
impl NodeVisitor for TextCollector {
    async fn visit(&mut self, node: &SceneNode) -> AppResult<()> {
        if node.is_text() {
            self.nodes.push(node.clone());
        }
        Ok(())
    }
}

/// Text nodes under `root` (inclusive) in traversal order
pub async fn collect_text_nodes<H>(host: &H, root: &NodeId) -> AppResult<Vec<SceneNode>>
where
    H: SceneHost + ?Sized,
{
    let mut collector = TextCollector { nodes: Vec::new() };
    traverse(host, root, &mut collector).await?;
    Ok(collector.nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::MemoryScene;
    use crate::shared::types::{Geometry, TextStyle};

    struct Recorder {
        names: Vec<String>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl NodeVisitor for Recorder {
        async fn visit(&mut self, node: &SceneNode) -> AppResult<()> {
            self.names.push(node.name.clone());
            if self.fail_on.as_deref() == Some(node.name.as_str()) {
                return Err(AppError::Host(format!("visit failed on {}", node.name)));
            }
            Ok(())
        }
    }

    fn sample_tree() -> (MemoryScene, NodeId) {
        let scene = MemoryScene::new();
        let geometry = Geometry::new(0.0, 0.0, 10.0, 10.0);
        let r = scene.add_frame(None, "R", geometry).unwrap();
        let a = scene.add_frame(Some(&r), "A", geometry).unwrap();
        scene.add_frame(Some(&a), "C", geometry).unwrap();
        scene.add_frame(Some(&r), "B", geometry).unwrap();
        (scene, r)
    }

    #[tokio::test]
    async fn test_pre_order_depth_first() {
        let (scene, root) = sample_tree();
        let mut recorder = Recorder { names: Vec::new(), fail_on: None };

        traverse(&scene, &root, &mut recorder).await.unwrap();
        assert_eq!(recorder.names, vec!["R", "A", "C", "B"]);
    }

    #[tokio::test]
    async fn test_visitor_error_stops_walk() {
        let (scene, root) = sample_tree();
        let mut recorder = Recorder { names: Vec::new(), fail_on: Some("A".to_string()) };

        let result = traverse(&scene, &root, &mut recorder).await;
        assert!(matches!(result, Err(AppError::Host(_))));
        assert_eq!(recorder.names, vec!["R", "A"]);
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found() {
        let scene = MemoryScene::new();
        let mut recorder = Recorder { names: Vec::new(), fail_on: None };

        let result = traverse(&scene, &NodeId::from("9:9"), &mut recorder).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    /// Rewrites a later sibling while visiting an earlier one
    struct SiblingEditor<'a> {
        scene: &'a MemoryScene,
        target: NodeId,
        seen: Vec<String>,
    }

    #[async_trait]
    impl NodeVisitor for SiblingEditor<'_> {
        async fn visit(&mut self, node: &SceneNode) -> AppResult<()> {
            if let Some(text) = &node.characters {
                self.seen.push(text.clone());
            }
            if node.name == "A" {
                self.scene.set_characters(&self.target, "edited")?;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_node_is_read_after_earlier_visits() {
        let scene = MemoryScene::new();
        let geometry = Geometry::new(0.0, 0.0, 10.0, 10.0);
        let root = scene.add_frame(None, "R", geometry).unwrap();
        scene.add_frame(Some(&root), "A", geometry).unwrap();
        let target = scene.add_text(Some(&root), "original", geometry, TextStyle::default()).unwrap();

        let mut editor = SiblingEditor { scene: &scene, target, seen: Vec::new() };
        traverse(&scene, &root, &mut editor).await.unwrap();
        assert_eq!(editor.seen, vec!["edited"]);
    }

    #[tokio::test]
    async fn test_counts_and_collects_text_in_order() {
        let scene = MemoryScene::new();
        let geometry = Geometry::new(0.0, 0.0, 10.0, 10.0);
        let root = scene.add_frame(None, "Root", geometry).unwrap();
        let group = scene.add_frame(Some(&root), "Group", geometry).unwrap();
        scene.add_text(Some(&group), "first", geometry, TextStyle::default()).unwrap();
        scene.add_text(Some(&root), "second", geometry, TextStyle::default()).unwrap();

        assert_eq!(count_text_nodes(&scene, &root).await.unwrap(), 2);
        let texts: Vec<_> = collect_text_nodes(&scene, &root)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|n| n.characters)
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }
}
