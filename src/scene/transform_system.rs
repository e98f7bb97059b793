//! World-transform evaluation.
//!
//! Operates on the node arena and root list only, so callers can hold other
//! parts of the scene while it runs. Nothing is cached between passes: the
//! graph may change at any time, so every call recomputes from the local
//! transforms.
//!
//! Two shapes of evaluation exist:
//! - [`for_each_world_transform`] walks every root depth-first and hands each
//!   node its world matrix, passing the parent's result down the stack.
//! - [`world_matrix`] walks from one node up to its root. Used by the gizmo
//!   bridge, which only needs the selected node each frame.

use glam::{Mat4, Vec3};
use slotmap::SlotMap;

use crate::scene::NodeHandle;
use crate::scene::node::Node;

/// Depth-first pre-order traversal computing world matrices incrementally.
///
/// `visit` receives each node after its parent. Stale handles in child
/// lists are skipped.
pub fn for_each_world_transform<F>(nodes: &SlotMap<NodeHandle, Node>, roots: &[NodeHandle], mut visit: F)
where
    F: FnMut(NodeHandle, &Node, &Mat4),
{
    // (node, parent world matrix)
    let mut stack: Vec<(NodeHandle, Mat4)> = Vec::with_capacity(64);
    for &root in roots.iter().rev() {
        stack.push((root, Mat4::IDENTITY));
    }

    while let Some((handle, parent_world)) = stack.pop() {
        let Some(node) = nodes.get(handle) else {
            continue;
        };

        let world = parent_world * node.transform.local_matrix();
        visit(handle, node, &world);

        // Reverse so children pop in declaration order
        for &child in node.children.iter().rev() {
            stack.push((child, world));
        }
    }
}

/// World matrix of a single node, recomputed root-ward.
///
/// Returns identity for a stale handle. The walk is bounded by the arena
/// size so a corrupted parent chain cannot loop forever.
#[must_use]
pub fn world_matrix(nodes: &SlotMap<NodeHandle, Node>, handle: NodeHandle) -> Mat4 {
    let mut world = Mat4::IDENTITY;
    let mut current = Some(handle);
    let mut steps = 0usize;

    while let Some(h) = current {
        let Some(node) = nodes.get(h) else {
            break;
        };
        world = node.transform.local_matrix() * world;
        current = node.parent;

        steps += 1;
        if steps > nodes.len() {
            log::error!("Parent chain of {handle:?} loops; world matrix truncated");
            break;
        }
    }

    world
}

/// World matrix of a node's parent, or identity for root-level nodes.
#[must_use]
pub fn parent_world_matrix(nodes: &SlotMap<NodeHandle, Node>, handle: NodeHandle) -> Option<Mat4> {
    let parent = nodes.get(handle)?.parent?;
    Some(world_matrix(nodes, parent))
}

/// Recomputes `world_position` for every reachable node.
pub fn update_world_positions(nodes: &mut SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) {
    let mut positions: Vec<(NodeHandle, Vec3)> = Vec::with_capacity(nodes.len());
    for_each_world_transform(nodes, roots, |handle, _, world| {
        positions.push((handle, world.w_axis.truncate()));
    });

    for (handle, position) in positions {
        if let Some(node) = nodes.get_mut(handle) {
            node.world_position = position;
        }
    }
}

/// Handles of every reachable node in depth-first pre-order.
#[must_use]
pub fn depth_first(nodes: &SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) -> Vec<NodeHandle> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut stack: Vec<NodeHandle> = roots.iter().rev().copied().collect();

    while let Some(handle) = stack.pop() {
        let Some(node) = nodes.get(handle) else {
            continue;
        };
        order.push(handle);
        stack.extend(node.children.iter().rev().copied());
    }

    order
}
