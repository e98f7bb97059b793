use glam::{Mat4, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::errors::{Result, StippleError};
use crate::scene::node::{InstanceId, InstanceKind, Node};
use crate::scene::transform_system;
use crate::scene::wrapper::SceneNode;
use crate::scene::NodeHandle;

/// The scene graph.
///
/// Nodes live in a generation-checked arena; `root_nodes` lists the
/// top-level ones and every other node is reachable through exactly one
/// parent's `children`. Instance ids are allocated from a per-scene
/// counter, so independent scenes never interfere.
#[derive(Debug)]
pub struct Scene {
    pub(crate) nodes: SlotMap<NodeHandle, Node>,
    pub(crate) root_nodes: Vec<NodeHandle>,

    ids: FxHashMap<InstanceId, NodeHandle>,
    /// Greater than every id handed out or loaded, until it reaches
    /// `InstanceId::RESERVED`.
    next_id: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            ids: FxHashMap::default(),
            next_id: 1,
        }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    fn allocate_id(&mut self) -> InstanceId {
        if self.next_id < InstanceId::RESERVED.0 {
            let id = InstanceId(self.next_id);
            self.next_id += 1;
            return id;
        }

        // Counter exhausted: hand out the lowest free id instead
        let free = (1..InstanceId::RESERVED.0)
            .map(InstanceId)
            .find(|id| !self.ids.contains_key(id))
            .unwrap_or(InstanceId(0));
        log::warn!("Instance id counter exhausted; reusing free id {free}");
        free
    }

    /// The id the next spawned node will receive, unless the counter has
    /// reached `InstanceId::RESERVED`.
    #[must_use]
    pub fn next_id(&self) -> InstanceId {
        InstanceId(self.next_id)
    }

    /// Spawns a root-level node at the world origin.
    pub fn spawn(&mut self, kind: InstanceKind, name: impl Into<String>) -> NodeHandle {
        self.spawn_at(kind, name, Vec3::ZERO)
    }

    /// Spawns a root-level node at `position`.
    pub fn spawn_at(&mut self, kind: InstanceKind, name: impl Into<String>, position: Vec3) -> NodeHandle {
        let id = self.allocate_id();
        let mut node = Node::new(id, kind, name);
        node.transform.position = position;
        node.world_position = position;

        let handle = self.nodes.insert(node);
        self.ids.insert(id, handle);
        self.root_nodes.push(handle);
        log::debug!("Spawned instance {id}");
        handle
    }

    /// Inserts a node that already carries an id (scene loading).
    ///
    /// The node lands at root level with its hierarchy links cleared; the
    /// id counter is moved past the node's id. `InstanceId::RESERVED` is
    /// rejected.
    pub fn insert_loaded(&mut self, mut node: Node) -> Result<NodeHandle> {
        if node.id == InstanceId::RESERVED {
            return Err(StippleError::IdOutOfRange(node.id));
        }
        if self.ids.contains_key(&node.id) {
            return Err(StippleError::DuplicateId(node.id));
        }
        node.parent = None;
        node.children.clear();

        let id = node.id;
        let handle = self.nodes.insert(node);
        self.ids.insert(id, handle);
        self.root_nodes.push(handle);
        self.next_id = self.next_id.max(id.0 + 1);
        Ok(handle)
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Makes `child` the last child of `parent`.
    ///
    /// The child is first removed from whichever list currently holds it.
    /// Attaching a node to itself or to one of its descendants is rejected.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) -> Result<()> {
        if child == parent {
            return Err(StippleError::InvalidHierarchy(
                "cannot attach a node to itself".to_string(),
            ));
        }
        if !self.nodes.contains_key(child) {
            return Err(StippleError::NodeNotFound(format!("child {child:?}")));
        }
        if !self.nodes.contains_key(parent) {
            return Err(StippleError::NodeNotFound(format!("parent {parent:?}")));
        }
        if self.is_ancestor(child, parent) {
            return Err(StippleError::InvalidHierarchy(format!(
                "{child:?} is an ancestor of {parent:?}"
            )));
        }

        // 1. Detach from old container
        self.unlink(child);

        // 2. Attach to new
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        Ok(())
    }

    /// Unparents `node`: it leaves its parent and becomes a root-level node.
    ///
    /// Its own children come along. Detaching a root-level node is a no-op.
    pub fn detach(&mut self, node: NodeHandle) -> Result<()> {
        let Some(n) = self.nodes.get(node) else {
            return Err(StippleError::NodeNotFound(format!("{node:?}")));
        };
        if n.parent.is_none() {
            return Ok(());
        }
        self.unlink(node);
        self.root_nodes.push(node);
        Ok(())
    }

    /// Removes `node` from its parent's children (or the root list) and
    /// clears its parent pointer. Leaves it in neither list.
    fn unlink(&mut self, node: NodeHandle) {
        let old_parent = self.nodes.get(node).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(parent) = self.nodes.get_mut(p)
                && let Some(i) = parent.children.iter().position(|&x| x == node)
            {
                parent.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == node) {
            self.root_nodes.remove(i);
        }

        if let Some(n) = self.nodes.get_mut(node) {
            n.parent = None;
        }
    }

    /// Destroys `node` and its whole subtree.
    ///
    /// Returns the handles that were removed, parent first.
    pub fn destroy_subtree(&mut self, node: NodeHandle) -> Vec<NodeHandle> {
        if !self.nodes.contains_key(node) {
            return Vec::new();
        }
        self.unlink(node);

        let removed = transform_system::depth_first(&self.nodes, &[node]);
        for &handle in &removed {
            if let Some(n) = self.nodes.remove(handle) {
                self.ids.remove(&n.id);
            }
        }
        removed
    }

    /// Destroys every node. The id counter is kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root_nodes.clear();
        self.ids.clear();
    }

    /// `true` if `ancestor` appears on the parent chain of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        let mut steps = 0usize;
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.nodes.get(h).and_then(|n| n.parent);
        }
        false
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Chainable editing wrapper for one node.
    pub fn node(&mut self, handle: NodeHandle) -> SceneNode<'_> {
        SceneNode::new(self, handle)
    }

    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    #[must_use]
    pub fn handle_of(&self, id: InstanceId) -> Option<NodeHandle> {
        self.ids.get(&id).copied()
    }

    #[must_use]
    pub fn find_by_id(&self, id: InstanceId) -> Option<&Node> {
        self.handle_of(id).and_then(|h| self.nodes.get(h))
    }

    /// First node with the given display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find_map(|(handle, node)| (node.name == name).then_some(handle))
    }

    #[must_use]
    pub fn root_nodes(&self) -> &[NodeHandle] {
        &self.root_nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.nodes.iter()
    }

    /// All handles in depth-first pre-order over the root list.
    #[must_use]
    pub fn depth_first(&self) -> Vec<NodeHandle> {
        transform_system::depth_first(&self.nodes, &self.root_nodes)
    }

    /// Largest live instance id.
    #[must_use]
    pub fn max_id(&self) -> Option<InstanceId> {
        self.ids.keys().max().copied()
    }

    // ========================================================================
    // World transforms
    // ========================================================================

    /// World matrix of one node, walking up to its root.
    #[must_use]
    pub fn world_matrix(&self, handle: NodeHandle) -> Mat4 {
        transform_system::world_matrix(&self.nodes, handle)
    }

    /// World matrix of the node's parent, `None` for root-level nodes.
    #[must_use]
    pub fn parent_world_matrix(&self, handle: NodeHandle) -> Option<Mat4> {
        transform_system::parent_world_matrix(&self.nodes, handle)
    }

    /// Visits every node depth-first with its world matrix.
    pub fn for_each_world_transform<F>(&self, visit: F)
    where
        F: FnMut(NodeHandle, &Node, &Mat4),
    {
        transform_system::for_each_world_transform(&self.nodes, &self.root_nodes, visit);
    }

    /// Refreshes the derived `world_position` of every node.
    pub fn update_world_positions(&mut self) {
        transform_system::update_world_positions(&mut self.nodes, &self.root_nodes);
    }

    /// Moves every animated light to its orbit position at time `t`.
    pub fn animate_lights(&mut self, t: f32) {
        for (_, node) in &mut self.nodes {
            if let Some(position) = node.light.as_ref().and_then(|light| light.animated_position(t)) {
                node.transform.position = position;
            }
        }
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// Checks the hierarchy invariants.
    ///
    /// - parent pointers and children lists agree
    /// - every node is in exactly one of {root list, one parent's children}
    /// - no node is its own ancestor
    /// - the id index matches the arena and the counter is past every id
    pub fn validate(&self) -> Result<()> {
        let mut seen: FxHashSet<NodeHandle> = FxHashSet::default();

        for &root in &self.root_nodes {
            let Some(node) = self.nodes.get(root) else {
                return Err(violation(format!("root list holds stale handle {root:?}")));
            };
            if node.parent.is_some() {
                return Err(violation(format!("root {root:?} has a parent")));
            }
            if !seen.insert(root) {
                return Err(violation(format!("{root:?} listed twice at root level")));
            }
        }

        for (handle, node) in &self.nodes {
            for &child in &node.children {
                let Some(c) = self.nodes.get(child) else {
                    return Err(violation(format!("{handle:?} lists stale child {child:?}")));
                };
                if c.parent != Some(handle) {
                    return Err(violation(format!(
                        "{child:?} is listed under {handle:?} but points at {:?}",
                        c.parent
                    )));
                }
                if !seen.insert(child) {
                    return Err(violation(format!("{child:?} is held by more than one list")));
                }
            }
        }

        if seen.len() != self.nodes.len() {
            return Err(violation(format!(
                "{} node(s) are in neither the root list nor a children list",
                self.nodes.len() - seen.len()
            )));
        }

        // Every node reached from the roots exactly once means no cycles
        if self.depth_first().len() != self.nodes.len() {
            return Err(violation("hierarchy contains a cycle".to_string()));
        }

        if self.ids.len() != self.nodes.len() {
            return Err(violation("id index out of sync with arena".to_string()));
        }
        for (id, &handle) in &self.ids {
            if self.nodes.get(handle).map(|n| n.id) != Some(*id) {
                return Err(violation(format!("id {id} indexes the wrong node")));
            }
            if id.0 >= self.next_id {
                return Err(violation(format!("id {id} is not below the counter")));
            }
        }

        Ok(())
    }
}

fn violation(message: String) -> StippleError {
    StippleError::InvariantViolated(message)
}
