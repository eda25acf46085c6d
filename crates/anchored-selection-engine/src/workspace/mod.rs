//! In-memory host for the anchoring core
//!
//! Buffers hold their text in an xi-rope `Rope` and move tracked positions
//! through every edit delta. Views are the editing surfaces. The workspace
//! owns both, routes caret and pre-removal events to the `AnchorController`
//! for the targets it subscribed to, and drains caret events until no view
//! has one pending.

pub mod buffer;
pub mod bus;
pub mod view;

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::ops::Range;
use std::rc::Rc;

use xi_rope::{Delta, Rope, RopeInfo};

use crate::anchoring::{AnchorController, AnchorObserver, EditingSurface, FollowState};

pub use buffer::{Buffer, BufferId, Position};
pub use bus::{BusStats, CaretListener, EditListener, EventBus};
pub use view::{View, ViewId};

/// Anchor controller wired to the workspace event bus
pub type WorkspaceController = AnchorController<View, CaretListener, EditListener>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Unknown view: {0}")]
    UnknownView(ViewId),
    #[error("Unknown buffer: {0}")]
    UnknownBuffer(BufferId),
    #[error("Buffer {0} is still shown in a view")]
    BufferInUse(BufferId),
    #[error("Offset {offset} is outside the buffer (length {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("Range {start}..{end} is outside the buffer (length {len})")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
    #[error("Offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
}

/// Caret motions understood by [`Workspace::move_caret_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    DocumentStart,
    DocumentEnd,
}

pub struct Workspace {
    buffers: BTreeMap<BufferId, Rc<RefCell<Buffer>>>,
    views: Vec<View>,
    bus: EventBus,
    controller: WorkspaceController,
    next_id: u32,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        let bus = EventBus::new();
        let controller = AnchorController::new(bus.caret_listener(), bus.edit_listener());
        Self {
            buffers: BTreeMap::new(),
            views: Vec::new(),
            bus,
            controller,
            next_id: 1,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn AnchorObserver<ViewId>>) {
        self.controller.add_observer(observer);
    }

    pub fn controller(&self) -> &WorkspaceController {
        &self.controller
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // ============ Buffers and views ============

    pub fn open_buffer(&mut self, name: impl Into<String>, text: &str) -> BufferId {
        let id = BufferId(self.allocate_id());
        let buffer = Buffer::new(id, name, text);
        self.buffers.insert(id, Rc::new(RefCell::new(buffer)));
        log::debug!("Opened {id}");
        id
    }

    pub fn open_view(&mut self, buffer: BufferId) -> Result<ViewId, EditError> {
        let shared = Rc::clone(self.shared_buffer(buffer)?);
        let id = ViewId(self.allocate_id());
        self.views.push(View::new(id, shared));
        log::debug!("Opened {id} on {buffer}");
        Ok(id)
    }

    /// Show another buffer in a view
    pub fn switch_buffer(&mut self, view: ViewId, buffer: BufferId) -> Result<(), EditError> {
        let shared = Rc::clone(self.shared_buffer(buffer)?);
        let index = self.view_index(view)?;
        self.views[index].set_buffer(shared);
        self.controller.handle_document_switched(&self.views[index]);
        self.dispatch_caret_events(index);
        Ok(())
    }

    pub fn close_view(&mut self, view: ViewId) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        self.views.remove(index);
        self.bus.drop_view(view);
        self.controller.on_surface_closed(view);
        log::debug!("Closed {view}");
        Ok(())
    }

    /// Close a buffer that no view shows anymore
    pub fn close_buffer(&mut self, buffer: BufferId) -> Result<(), EditError> {
        self.shared_buffer(buffer)?;
        if self.views.iter().any(|view| view.buffer_id() == buffer) {
            return Err(EditError::BufferInUse(buffer));
        }
        self.buffers.remove(&buffer);
        self.bus.drop_buffer(buffer);
        self.controller.on_document_closed(buffer);
        log::debug!("Closed {buffer}");
        Ok(())
    }

    pub fn view(&self, view: ViewId) -> Result<&View, EditError> {
        self.views
            .iter()
            .find(|candidate| candidate.id() == view)
            .ok_or(EditError::UnknownView(view))
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn buffer(&self, buffer: BufferId) -> Result<Ref<'_, Buffer>, EditError> {
        Ok(self.shared_buffer(buffer)?.borrow())
    }

    pub fn buffer_text(&self, buffer: BufferId) -> Result<String, EditError> {
        Ok(self.buffer(buffer)?.text())
    }

    // ============ Caret and selection ============

    pub fn move_caret(&mut self, view: ViewId, offset: usize) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        self.views[index].shared_buffer().borrow().check_offset(offset)?;
        self.views[index].move_caret(offset);
        self.dispatch_caret_events(index);
        Ok(())
    }

    pub fn move_caret_by(&mut self, view: ViewId, motion: Motion) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        let target = {
            let view = &self.views[index];
            let buffer = view.shared_buffer().borrow();
            motion_target(buffer.rope(), view.caret(), motion)
        };
        self.views[index].move_caret(target);
        self.dispatch_caret_events(index);
        Ok(())
    }

    /// Select `range`, with the caret at its start or end
    pub fn select(
        &mut self,
        view: ViewId,
        range: Range<usize>,
        caret_at_start: bool,
    ) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        self.views[index]
            .shared_buffer()
            .borrow()
            .check_range(&range)?;
        let caret = if caret_at_start { range.start } else { range.end };
        self.views[index].select(range, caret);
        self.dispatch_caret_events(index);
        Ok(())
    }

    /// Native selecting caret move: extends the selection from its far end
    ///
    /// Like most hosts this reports two caret updates, one for the caret and
    /// one for the selection. While the caret listener is attached the first
    /// one is skipped so the synchronizer only sees the settled selection.
    pub fn extend_selection_to(&mut self, view: ViewId, offset: usize) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        self.views[index]
            .shared_buffer()
            .borrow()
            .check_offset(offset)?;
        let surface = &mut self.views[index];
        if self.bus.is_caret_subscribed(surface.id()) {
            self.controller.skip_next_caret_update(surface);
        }
        let fixed = surface
            .selection_at(surface.caret())
            .map(|selection| {
                if selection.start == surface.caret() {
                    selection.end
                } else {
                    selection.start
                }
            })
            .unwrap_or(surface.caret());
        surface.queue_caret_event();
        surface.select(fixed.min(offset)..fixed.max(offset), offset);
        self.dispatch_caret_events(index);
        Ok(())
    }

    /// Selecting variant of [`Workspace::move_caret_by`]
    pub fn extend_selection_by(&mut self, view: ViewId, motion: Motion) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        let target = {
            let view = &self.views[index];
            let buffer = view.shared_buffer().borrow();
            motion_target(buffer.rope(), view.caret(), motion)
        };
        self.extend_selection_to(view, target)
    }

    pub fn set_rectangular_selection(
        &mut self,
        view: ViewId,
        rectangular: bool,
    ) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        self.views[index].set_rectangular(rectangular);
        Ok(())
    }

    // ============ Editing ============

    /// Insert text at the caret of a view
    pub fn insert(&mut self, view: ViewId, text: &str) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        let (buffer, caret) = {
            let view = &self.views[index];
            (view.buffer_id(), view.caret())
        };
        self.insert_at(buffer, caret, text)
    }

    pub fn insert_at(&mut self, buffer: BufferId, at: usize, text: &str) -> Result<(), EditError> {
        let shared = Rc::clone(self.shared_buffer(buffer)?);
        let delta = shared.borrow_mut().insert(at, text)?;
        self.after_edit(buffer, &delta);
        Ok(())
    }

    /// Delete a range, notifying pre-removal listeners first
    pub fn delete(&mut self, buffer: BufferId, range: Range<usize>) -> Result<(), EditError> {
        let shared = Rc::clone(self.shared_buffer(buffer)?);
        shared.borrow().check_range(&range)?;
        if range.is_empty() {
            return Ok(());
        }
        if self.bus.is_edit_subscribed(buffer) {
            let surfaces: Vec<_> = self
                .views
                .iter()
                .map(|view| (view.id(), view.buffer_id()))
                .collect();
            self.controller
                .handle_pre_content_removed(buffer, range.start, range.len(), surfaces);
        }
        let delta = shared.borrow_mut().delete(range)?;
        self.after_edit(buffer, &delta);
        Ok(())
    }

    /// Delete the selection, or the character before the caret
    pub fn backspace(&mut self, view: ViewId) -> Result<(), EditError> {
        self.delete_at_caret(view, Motion::Left)
    }

    /// Delete the selection, or the character after the caret
    pub fn delete_forward(&mut self, view: ViewId) -> Result<(), EditError> {
        self.delete_at_caret(view, Motion::Right)
    }

    fn delete_at_caret(&mut self, view: ViewId, motion: Motion) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        let (buffer, range) = {
            let view = &self.views[index];
            let range = match view.selection() {
                Some(selection) => selection,
                None => {
                    let buffer = view.shared_buffer().borrow();
                    let target = motion_target(buffer.rope(), view.caret(), motion);
                    target.min(view.caret())..target.max(view.caret())
                }
            };
            (view.buffer_id(), range)
        };
        self.delete(buffer, range)
    }

    // ============ Anchored selection ============

    pub fn begin_anchor(&mut self, view: ViewId) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        self.controller.begin_anchor(&self.views[index]);
        Ok(())
    }

    pub fn end_anchor(&mut self, view: ViewId) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        self.controller.end_anchor(&self.views[index]);
        Ok(())
    }

    /// Toggle anchored mode; returns the new state
    pub fn toggle_anchor(&mut self, view: ViewId) -> Result<bool, EditError> {
        let index = self.view_index(view)?;
        Ok(self.controller.toggle(&self.views[index]))
    }

    pub fn is_anchored(&self, view: ViewId) -> Result<bool, EditError> {
        Ok(self.controller.is_anchored(self.view(view)?))
    }

    pub fn anchor_state(&self, view: ViewId) -> Result<FollowState, EditError> {
        Ok(self.controller.state(self.view(view)?))
    }

    pub fn anchor_offset(&self, view: ViewId) -> Result<Option<usize>, EditError> {
        Ok(self.controller.anchor_offset(self.view(view)?))
    }

    /// Report the anchored state of a view that just got focus
    pub fn focus(&mut self, view: ViewId) -> Result<(), EditError> {
        let index = self.view_index(view)?;
        self.controller.refresh(&self.views[index]);
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }

    // ============ Internals ============

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn view_index(&self, view: ViewId) -> Result<usize, EditError> {
        self.views
            .iter()
            .position(|candidate| candidate.id() == view)
            .ok_or(EditError::UnknownView(view))
    }

    fn shared_buffer(&self, buffer: BufferId) -> Result<&Rc<RefCell<Buffer>>, EditError> {
        self.buffers
            .get(&buffer)
            .ok_or(EditError::UnknownBuffer(buffer))
    }

    fn after_edit(&mut self, buffer: BufferId, delta: &Delta<RopeInfo>) {
        for index in 0..self.views.len() {
            if self.views[index].buffer_id() == buffer {
                self.views[index].apply_delta(delta);
                self.dispatch_caret_events(index);
            }
        }
    }

    /// Deliver pending caret events of a view until none is left
    ///
    /// A resize issued by the controller queues another event, which is
    /// delivered in the same loop before control returns to the caller.
    fn dispatch_caret_events(&mut self, index: usize) {
        let view = &mut self.views[index];
        while view.take_caret_event() {
            if self.bus.is_caret_subscribed(view.id()) {
                self.controller.handle_caret_update(view);
            }
        }
    }
}

/// Offset reached from `caret` by `motion`
fn motion_target(rope: &Rope, caret: usize, motion: Motion) -> usize {
    match motion {
        Motion::Left => rope.prev_codepoint_offset(caret).unwrap_or(0),
        Motion::Right => rope.next_codepoint_offset(caret).unwrap_or(rope.len()),
        Motion::Up | Motion::Down => {
            let line = rope.line_of_offset(caret);
            let column = caret - rope.offset_of_line(line);
            let last_line = rope.line_of_offset(rope.len());
            let target_line = match motion {
                Motion::Up if line == 0 => return 0,
                Motion::Up => line - 1,
                _ if line == last_line => return rope.len(),
                _ => line + 1,
            };
            let start = rope.offset_of_line(target_line);
            let end = line_end(rope, target_line);
            snap_to_char_boundary(rope, (start + column).min(end))
        }
        Motion::LineStart => rope.offset_of_line(rope.line_of_offset(caret)),
        Motion::LineEnd => line_end(rope, rope.line_of_offset(caret)),
        Motion::DocumentStart => 0,
        Motion::DocumentEnd => rope.len(),
    }
}

/// Offset of the end of `line`, before its newline
fn line_end(rope: &Rope, line: usize) -> usize {
    if line >= rope.line_of_offset(rope.len()) {
        rope.len()
    } else {
        rope.offset_of_line(line + 1) - 1
    }
}

fn snap_to_char_boundary(rope: &Rope, mut offset: usize) -> usize {
    // UTF-8 continuation bytes are 0b10xx_xxxx
    while offset > 0 && offset < rope.len() && (rope.byte_at(offset) as i8) < -0x40 {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::left(Motion::Left, 5, 4)]
    #[case::left_at_start(Motion::Left, 0, 0)]
    #[case::right(Motion::Right, 5, 6)]
    #[case::right_at_end(Motion::Right, 17, 17)]
    #[case::up(Motion::Up, 10, 4)]
    #[case::up_first_line(Motion::Up, 2, 0)]
    #[case::down(Motion::Down, 4, 10)]
    #[case::down_clamps_to_short_line(Motion::Down, 10, 15)]
    #[case::down_last_line(Motion::Down, 16, 17)]
    #[case::line_start(Motion::LineStart, 9, 6)]
    #[case::line_end(Motion::LineEnd, 7, 11)]
    #[case::document_end(Motion::DocumentEnd, 3, 17)]
    fn test_motion_target(#[case] motion: Motion, #[case] caret: usize, #[case] expected: usize) {
        // Lines start at 0, 6, 12 and 16
        let rope = Rope::from("alpha\nbravo\nxyz\nz");

        assert_eq!(motion_target(&rope, caret, motion), expected);
    }

    #[test]
    fn test_motion_skips_multibyte_characters() {
        let rope = Rope::from("a\u{e9}b");

        assert_eq!(motion_target(&rope, 1, Motion::Right), 3);
        assert_eq!(motion_target(&rope, 3, Motion::Left), 1);
    }

    #[test]
    fn test_unknown_ids_are_reported() {
        let mut workspace = Workspace::new();

        assert_eq!(
            workspace.open_view(BufferId(42)).unwrap_err(),
            EditError::UnknownBuffer(BufferId(42))
        );
        assert_eq!(
            workspace.move_caret(ViewId(7), 0).unwrap_err(),
            EditError::UnknownView(ViewId(7))
        );
    }

    #[test]
    fn test_close_buffer_in_use_is_rejected() {
        let mut workspace = Workspace::new();
        let buffer = workspace.open_buffer("a", "text");
        let view = workspace.open_view(buffer).unwrap();

        assert_eq!(
            workspace.close_buffer(buffer).unwrap_err(),
            EditError::BufferInUse(buffer)
        );

        workspace.close_view(view).unwrap();
        workspace.close_buffer(buffer).unwrap();
        assert!(workspace.buffer(buffer).is_err());
    }

    #[test]
    fn test_edits_move_carets_of_every_view() {
        let mut workspace = Workspace::new();
        let buffer = workspace.open_buffer("a", "hello world");
        let first = workspace.open_view(buffer).unwrap();
        let second = workspace.open_view(buffer).unwrap();
        workspace.move_caret(second, 6).unwrap();

        workspace.move_caret(first, 0).unwrap();
        workspace.insert(first, ">> ").unwrap();

        assert_eq!(workspace.view(first).unwrap().caret(), 3);
        assert_eq!(workspace.view(second).unwrap().caret(), 9);
        assert_eq!(workspace.buffer_text(buffer).unwrap(), ">> hello world");
    }

    #[test]
    fn test_backspace_deletes_selection_first() {
        let mut workspace = Workspace::new();
        let buffer = workspace.open_buffer("a", "hello world");
        let view = workspace.open_view(buffer).unwrap();

        workspace.select(view, 5..11, false).unwrap();
        workspace.backspace(view).unwrap();
        assert_eq!(workspace.buffer_text(buffer).unwrap(), "hello");

        workspace.backspace(view).unwrap();
        assert_eq!(workspace.buffer_text(buffer).unwrap(), "hell");
        assert_eq!(workspace.view(view).unwrap().caret(), 4);
    }
}
