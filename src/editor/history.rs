//! Undo/redo history.
//!
//! Commands are boxed trait objects on two stacks. Executing a new command
//! clears the redo stack. Only transform edits are recorded; parenting and
//! deletion are not undoable.

use std::collections::VecDeque;
use std::fmt;

use glam::Vec3;

use crate::scene::{NodeHandle, Scene, TransformChannel};

/// A reversible edit on the scene.
pub trait Command: fmt::Debug {
    fn execute(&mut self, scene: &mut Scene);
    fn undo(&mut self, scene: &mut Scene);

    /// Node the command edits, if it targets a single node.
    fn target(&self) -> Option<NodeHandle> {
        None
    }

    fn label(&self) -> String;
}

/// Sets one transform channel of one node.
///
/// Replaying against a destroyed node does nothing: the generation check
/// on the handle fails and the edit is skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformCommand {
    pub target: NodeHandle,
    pub channel: TransformChannel,
    pub old: Vec3,
    pub new: Vec3,
}

impl TransformCommand {
    #[must_use]
    pub fn new(target: NodeHandle, channel: TransformChannel, old: Vec3, new: Vec3) -> Self {
        Self {
            target,
            channel,
            old,
            new,
        }
    }

    #[must_use]
    pub fn moved(target: NodeHandle, old: Vec3, new: Vec3) -> Self {
        Self::new(target, TransformChannel::Position, old, new)
    }

    /// Rotation values are radians.
    #[must_use]
    pub fn rotated(target: NodeHandle, old: Vec3, new: Vec3) -> Self {
        Self::new(target, TransformChannel::Rotation, old, new)
    }

    #[must_use]
    pub fn scaled(target: NodeHandle, old: Vec3, new: Vec3) -> Self {
        Self::new(target, TransformChannel::Scale, old, new)
    }

    fn apply(&self, scene: &mut Scene, value: Vec3) {
        match scene.get_node_mut(self.target) {
            Some(node) => node.transform.set(self.channel, value),
            None => log::debug!("{} skipped: node {:?} no longer exists", self.label(), self.target),
        }
    }
}

impl Command for TransformCommand {
    fn execute(&mut self, scene: &mut Scene) {
        self.apply(scene, self.new);
    }

    fn undo(&mut self, scene: &mut Scene) {
        self.apply(scene, self.old);
    }

    fn target(&self) -> Option<NodeHandle> {
        Some(self.target)
    }

    fn label(&self) -> String {
        match self.channel {
            TransformChannel::Position => "Move".to_string(),
            TransformChannel::Rotation => "Rotate".to_string(),
            TransformChannel::Scale => "Scale".to_string(),
        }
    }
}

/// Undo and redo stacks.
#[derive(Debug, Default)]
pub struct CommandStack {
    undo: VecDeque<Box<dyn Command>>,
    redo: Vec<Box<dyn Command>>,
    /// `0` keeps everything.
    max_history: usize,
}

impl CommandStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack that evicts its oldest entries beyond `max_history`.
    #[must_use]
    pub fn with_capacity_limit(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    /// Runs `command`, records it and clears the redo stack.
    pub fn execute(&mut self, mut command: Box<dyn Command>, scene: &mut Scene) {
        command.execute(scene);
        log::debug!("Executed {}", command.label());
        self.undo.push_back(command);
        self.redo.clear();

        if self.max_history > 0 {
            while self.undo.len() > self.max_history {
                self.undo.pop_front();
            }
        }
    }

    /// Reverts the last command. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        let Some(mut command) = self.undo.pop_back() else {
            return false;
        };
        command.undo(scene);
        log::debug!("Undid {}", command.label());
        self.redo.push(command);
        true
    }

    /// Re-applies the last undone command. Returns `false` if there was none.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        let Some(mut command) = self.redo.pop() else {
            return false;
        };
        command.execute(scene);
        log::debug!("Redid {}", command.label());
        self.undo.push_back(command);
        true
    }

    /// Drops every command that targets one of `removed`.
    pub fn prune(&mut self, removed: &[NodeHandle]) {
        if removed.is_empty() {
            return;
        }
        let keep = |command: &dyn Command| command.target().is_none_or(|t| !removed.contains(&t));
        let before = self.undo.len() + self.redo.len();
        self.undo.retain(|c| keep(c.as_ref()));
        self.redo.retain(|c| keep(c.as_ref()));
        let dropped = before - self.undo.len() - self.redo.len();
        if dropped > 0 {
            log::debug!("Pruned {dropped} command(s) targeting removed nodes");
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Label of the command `undo` would revert.
    #[must_use]
    pub fn undo_label(&self) -> Option<String> {
        self.undo.back().map(|c| c.label())
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
