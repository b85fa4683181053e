//! Transform stack for nested instance coordinate systems.

use crate::error::{ExportError, Result};
use glam::DMat4;

/// Composes nested affine transforms as the traversal enters and leaves
/// instance/link nodes.
///
/// The stack starts empty; [`start`](TransformStack::start) seeds it with
/// identity. Reading or popping an empty stack is a host protocol violation
/// and fails with [`ExportError::TransformStackUnderflow`].
#[derive(Debug, Clone, Default)]
pub struct TransformStack {
    stack: Vec<DMat4>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to a single identity transform. Called once at traversal start.
    pub fn start(&mut self) {
        self.stack.clear();
        self.stack.push(DMat4::IDENTITY);
    }

    /// Push the composition of the current transform with `transform`.
    pub fn push(&mut self, transform: DMat4) -> Result<()> {
        let composed = *self.current()? * transform;
        self.stack.push(composed);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<DMat4> {
        self.stack
            .pop()
            .ok_or(ExportError::TransformStackUnderflow(
                "pop without matching push",
            ))
    }

    /// The composed transform of all instances entered so far.
    pub fn current(&self) -> Result<&DMat4> {
        self.stack
            .last()
            .ok_or(ExportError::TransformStackUnderflow(
                "current() before start() or after unbalanced pops",
            ))
    }

    /// Stack depth, including the identity seeded by `start`.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
