use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use xi_rope::delta::Transformer;
use xi_rope::{Delta, RopeInfo};

use crate::anchoring::EditingSurface;
use crate::workspace::{Buffer, BufferId, Position};

/// Identifier of a view within a workspace
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct ViewId(pub u32);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Editing surface showing one buffer
///
/// Caret and selection changes are not dispatched directly; they are queued
/// as pending caret events and drained by the workspace, which mirrors how a
/// host reports caret updates after a command has run.
pub struct View {
    id: ViewId,
    buffer: Rc<RefCell<Buffer>>,
    buffer_id: BufferId,
    caret: usize,
    selection: Option<Range<usize>>,
    rectangular: bool,
    pending_caret_events: usize,
    resize_count: usize,
}

impl View {
    pub(crate) fn new(id: ViewId, buffer: Rc<RefCell<Buffer>>) -> Self {
        let buffer_id = buffer.borrow().id();
        Self {
            id,
            buffer,
            buffer_id,
            caret: 0,
            selection: None,
            rectangular: false,
            pending_caret_events: 0,
            resize_count: 0,
        }
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer_id
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    pub fn is_rectangular(&self) -> bool {
        self.rectangular
    }

    /// Number of resize commands this view has received
    pub fn resize_count(&self) -> usize {
        self.resize_count
    }

    pub fn selected_text(&self) -> Option<String> {
        let selection = self.selection.clone()?;
        let buffer = self.buffer.borrow();
        buffer.slice(selection).ok().map(|text| text.into_owned())
    }

    pub(crate) fn shared_buffer(&self) -> &Rc<RefCell<Buffer>> {
        &self.buffer
    }

    /// Show another buffer; the caret lands at its start
    ///
    /// Leaves exactly one caret event pending so that an anchor kept for the
    /// new buffer is applied to the reset caret.
    pub(crate) fn set_buffer(&mut self, buffer: Rc<RefCell<Buffer>>) {
        self.buffer_id = buffer.borrow().id();
        self.buffer = buffer;
        self.caret = 0;
        self.selection = None;
        self.pending_caret_events = 1;
    }

    /// Plain caret move: drops the selection like a native caret command
    pub(crate) fn move_caret(&mut self, offset: usize) {
        self.update(offset, None);
    }

    pub(crate) fn select(&mut self, selection: Range<usize>, caret: usize) {
        let selection = (!selection.is_empty()).then_some(selection);
        self.update(caret, selection);
    }

    pub(crate) fn set_rectangular(&mut self, rectangular: bool) {
        self.rectangular = rectangular;
    }

    /// Pop one pending caret event
    pub(crate) fn take_caret_event(&mut self) -> bool {
        if self.pending_caret_events == 0 {
            return false;
        }
        self.pending_caret_events -= 1;
        true
    }

    pub(crate) fn queue_caret_event(&mut self) {
        self.pending_caret_events += 1;
    }

    /// Move caret and selection through an edit of the shown buffer
    pub(crate) fn apply_delta(&mut self, delta: &Delta<RopeInfo>) {
        let mut transformer = Transformer::new(delta);
        let caret = transformer.transform(self.caret, true);
        let selection = self.selection.clone().and_then(|selection| {
            let start = transformer.transform(selection.start, true);
            let end = transformer.transform(selection.end, false);
            (start < end).then_some(start..end)
        });
        self.update(caret, selection);
    }

    fn update(&mut self, caret: usize, selection: Option<Range<usize>>) {
        if caret != self.caret || selection != self.selection {
            self.caret = caret;
            self.selection = selection;
            self.queue_caret_event();
        }
    }
}

impl EditingSurface for View {
    type SurfaceId = ViewId;
    type DocumentId = BufferId;
    type Position = Position;

    fn id(&self) -> ViewId {
        self.id
    }

    fn document(&self) -> BufferId {
        self.buffer_id
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

    fn track(&self, offset: usize) -> Position {
        self.buffer.borrow_mut().track(offset)
    }

    fn resize_selection(&mut self, fixed: usize, moving: usize, rectangular: bool) {
        self.resize_count += 1;
        self.rectangular = rectangular;
        let selection = (fixed != moving).then(|| fixed.min(moving)..fixed.max(moving));
        self.update(moving, selection);
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("buffer", &self.buffer_id)
            .field("caret", &self.caret)
            .field("selection", &self.selection)
            .field("rectangular", &self.rectangular)
            .finish()
    }
}
