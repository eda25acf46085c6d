//! Test doubles shared by the unit tests of the anchoring modules

use std::ops::Range;

use crate::anchoring::{EditingSurface, Listener, TrackedPosition};

/// Position that never moves; edits are exercised through the workspace host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPosition(pub usize);

impl TrackedPosition for FixedPosition {
    fn offset(&self) -> usize {
        self.0
    }
}

/// Editing surface that records every resize command it receives
#[derive(Debug, Clone)]
pub struct FakeSurface {
    pub id: u32,
    pub document: u32,
    pub caret: usize,
    pub selection: Option<Range<usize>>,
    pub rectangular: bool,
    pub resizes: Vec<(usize, usize, bool)>,
}

impl FakeSurface {
    pub fn new(id: u32, document: u32) -> Self {
        Self {
            id,
            document,
            caret: 0,
            selection: None,
            rectangular: false,
            resizes: Vec::new(),
        }
    }

    pub fn with_caret(mut self, caret: usize) -> Self {
        self.caret = caret;
        self
    }

    pub fn with_selection(mut self, selection: Range<usize>, caret: usize) -> Self {
        self.selection = Some(selection);
        self.caret = caret;
        self
    }

    /// Plain caret move: collapses the selection like a native caret command
    pub fn move_caret(&mut self, caret: usize) {
        self.caret = caret;
        self.selection = None;
    }
}

impl EditingSurface for FakeSurface {
    type SurfaceId = u32;
    type DocumentId = u32;
    type Position = FixedPosition;

    fn id(&self) -> u32 {
        self.id
    }

    fn document(&self) -> u32 {
        self.document
    }

    fn caret(&self) -> usize {
        self.caret
    }

    fn selection_at(&self, offset: usize) -> Option<Range<usize>> {
        self.selection
            .clone()
            .filter(|selection| selection.start <= offset && offset <= selection.end)
    }

    fn is_rectangular_selection(&self) -> bool {
        self.rectangular
    }

    fn track(&self, offset: usize) -> FixedPosition {
        FixedPosition(offset)
    }

    fn resize_selection(&mut self, fixed: usize, moving: usize, rectangular: bool) {
        self.resizes.push((fixed, moving, rectangular));
        self.selection = (fixed != moving).then(|| fixed.min(moving)..fixed.max(moving));
        self.caret = moving;
    }
}

/// Listener that logs every attach and detach call
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub added: Vec<u32>,
    pub removed: Vec<u32>,
}

impl Listener<u32> for RecordingListener {
    fn add_listener(&mut self, target: &u32) {
        self.added.push(*target);
    }

    fn remove_listener(&mut self, target: &u32) {
        self.removed.push(*target);
    }
}
