use std::collections::HashSet;

use alloc::vec::Vec;
use mingle_core::{IdPath, Identifier};

/// Bookkeeping for an open map or struct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapTracker {
    /// The field whose value is being awaited, if any.
    pub pending: Option<Identifier>,
    /// Every field started so far.
    pub seen: HashSet<Identifier>,
}

/// One frame of the structural stack.
#[derive(Clone, Debug, PartialEq)]
pub enum StackFrame {
    /// An open map or struct.
    Map(MapTracker),
    /// An open list and the index of its latest element, if it has one yet.
    List(Option<usize>),
    /// A field whose value has not completed.
    Field(Identifier),
}

/// The nesting implied by an event stream: one frame per open map, list and
/// pending field, innermost last.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventStack {
    frames: Vec<StackFrame>,
}

impl EventStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// The frames, outermost first.
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// True when nothing is open.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The innermost frame.
    pub fn peek(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    pub(crate) fn peek_mut(&mut self) -> Option<&mut StackFrame> {
        self.frames.last_mut()
    }

    pub(crate) fn push(&mut self, frame: StackFrame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<StackFrame> {
        self.frames.pop()
    }

    /// Advances the index of the innermost frame if it is a list: a new
    /// element is about to arrive.
    pub(crate) fn prepare_list_val(&mut self) {
        if let Some(StackFrame::List(idx)) = self.frames.last_mut() {
            *idx = Some(idx.map_or(0, |i| i + 1));
        }
    }

    /// Appends the path this stack describes onto `prefix`. Fields become
    /// field segments, lists become index segments once they have an
    /// element; maps contribute nothing.
    pub fn append_path(&self, prefix: &IdPath) -> IdPath {
        let mut path = prefix.clone();
        for frame in &self.frames {
            match frame {
                StackFrame::Field(fld) => path.push_field(fld.clone()),
                StackFrame::List(Some(idx)) => path.push_index(*idx),
                StackFrame::List(None) | StackFrame::Map(_) => {}
            }
        }
        path
    }

    /// The path described by the stack alone.
    pub fn path(&self) -> IdPath {
        self.append_path(&IdPath::root())
    }
}
