//! Scene-graph sink and the in-memory reference scene.
//!
//! The engine never renders. It describes scene changes as [`SceneMutation`]s
//! and hands them to a [`SceneSink`]; a platform layer implements the sink on
//! top of its renderer, tests use [`SceneGraph`].

use std::fmt;
use std::sync::Arc;

use decor_core::{Aabb, CursorPlacement, Mat4, ObjectId, VirtualObject};
use parking_lot::RwLock;

/// Identifier of a scene node. Nodes for virtual objects reuse the object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl From<ObjectId> for NodeId {
    fn from(id: ObjectId) -> Self {
        Self(id.get())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A node to be attached to the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Node identifier.
    pub id: NodeId,
    /// Display name (the asset name for virtual objects).
    pub name: String,
    /// World transform.
    pub transform: Mat4,
    /// Local-space bounds of the node content.
    pub bounds: Option<Aabb>,
}

impl SceneNode {
    /// Builds the node that represents a loaded virtual object.
    pub fn for_object(object: &VirtualObject) -> Self {
        Self {
            id: object.id().into(),
            name: object.asset().to_string(),
            transform: object.transform().to_matrix(),
            bounds: object.bounds(),
        }
    }
}

/// A single change to the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneMutation {
    /// Attach a node to the world.
    AddNode(SceneNode),
    /// Detach a node. Unknown ids are ignored.
    RemoveNode(NodeId),
    /// Move a node. Unknown ids are ignored.
    SetTransform(NodeId, Mat4),
    /// Move, re-parent or hide the placement cursor.
    PlaceCursor(CursorPlacement),
}

/// Receiver of scene mutations.
///
/// Only the scene mutation queue's worker calls into a sink, so
/// implementations never see concurrent calls.
pub trait SceneSink: Send {
    /// Attaches a node to the world.
    fn add_node(&mut self, node: SceneNode);

    /// Detaches a node. Must tolerate unknown ids.
    fn remove_node(&mut self, id: NodeId);

    /// Moves a node. Must tolerate unknown ids.
    fn set_transform(&mut self, id: NodeId, transform: Mat4);

    /// Updates the placement cursor.
    fn place_cursor(&mut self, placement: CursorPlacement);

    /// Applies one mutation.
    fn apply(&mut self, mutation: SceneMutation) {
        match mutation {
            SceneMutation::AddNode(node) => self.add_node(node),
            SceneMutation::RemoveNode(id) => self.remove_node(id),
            SceneMutation::SetTransform(id, transform) => self.set_transform(id, transform),
            SceneMutation::PlaceCursor(placement) => self.place_cursor(placement),
        }
    }
}

/// In-memory scene graph.
///
/// Nodes are kept in attach order. Every applied mutation is also appended
/// to a journal so callers can check what the scene observed and in which order.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    cursor: Option<CursorPlacement>,
    journal: Vec<SceneMutation>,
}

impl SceneGraph {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a node by id.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Checks if a node is attached.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Returns an iterator over attached nodes in attach order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter()
    }

    /// Returns the number of attached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no nodes are attached.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the last cursor placement, if the cursor was ever placed.
    pub fn cursor(&self) -> Option<CursorPlacement> {
        self.cursor
    }

    /// Returns every mutation applied so far, oldest first.
    pub fn journal(&self) -> &[SceneMutation] {
        &self.journal
    }

    /// Returns how many `AddNode` mutations targeted `id`.
    pub fn times_added(&self, id: NodeId) -> usize {
        self.journal
            .iter()
            .filter(|m| matches!(m, SceneMutation::AddNode(node) if node.id == id))
            .count()
    }

    /// Removes all nodes and forgets the journal.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.cursor = None;
        self.journal.clear();
    }
}

impl SceneSink for SceneGraph {
    fn add_node(&mut self, node: SceneNode) {
        self.journal.push(SceneMutation::AddNode(node.clone()));
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.id == node.id) {
            log::warn!("{} attached twice, replacing", node.id);
            *existing = node;
        } else {
            self.nodes.push(node);
        }
    }

    fn remove_node(&mut self, id: NodeId) {
        self.journal.push(SceneMutation::RemoveNode(id));
        self.nodes.retain(|n| n.id != id);
    }

    fn set_transform(&mut self, id: NodeId, transform: Mat4) {
        self.journal.push(SceneMutation::SetTransform(id, transform));
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            node.transform = transform;
        }
    }

    fn place_cursor(&mut self, placement: CursorPlacement) {
        self.journal.push(SceneMutation::PlaceCursor(placement));
        self.cursor = Some(placement);
    }
}

/// A [`SceneGraph`] shared between the mutation queue (writer) and readers.
#[derive(Debug, Clone, Default)]
pub struct SharedScene {
    inner: Arc<RwLock<SceneGraph>>,
}

impl SharedScene {
    /// Creates an empty shared scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the scene for reading.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SceneGraph) -> R,
    {
        f(&self.inner.read())
    }
}

impl SceneSink for SharedScene {
    fn add_node(&mut self, node: SceneNode) {
        self.inner.write().add_node(node);
    }

    fn remove_node(&mut self, id: NodeId) {
        self.inner.write().remove_node(id);
    }

    fn set_transform(&mut self, id: NodeId, transform: Mat4) {
        self.inner.write().set_transform(id, transform);
    }

    fn place_cursor(&mut self, placement: CursorPlacement) {
        self.inner.write().place_cursor(placement);
    }
}
