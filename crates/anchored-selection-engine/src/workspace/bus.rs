use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::anchoring::Listener;
use crate::workspace::{BufferId, ViewId};

/// Attach and detach calls seen by the bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub caret_attached: usize,
    pub caret_detached: usize,
    pub edit_attached: usize,
    pub edit_detached: usize,
}

#[derive(Debug, Default)]
struct Subscriptions {
    caret: HashSet<ViewId>,
    edits: HashSet<BufferId>,
    stats: BusStats,
}

/// Subscriptions for caret and pre-removal events of the workspace
///
/// The workspace dispatches an event only to targets subscribed here.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscriptions: Rc<RefCell<Subscriptions>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn caret_listener(&self) -> CaretListener {
        CaretListener { bus: self.clone() }
    }

    pub fn edit_listener(&self) -> EditListener {
        EditListener { bus: self.clone() }
    }

    pub fn is_caret_subscribed(&self, view: ViewId) -> bool {
        self.subscriptions.borrow().caret.contains(&view)
    }

    pub fn is_edit_subscribed(&self, buffer: BufferId) -> bool {
        self.subscriptions.borrow().edits.contains(&buffer)
    }

    pub fn stats(&self) -> BusStats {
        self.subscriptions.borrow().stats
    }

    /// Drop subscriptions of a view that has been closed
    pub(crate) fn drop_view(&self, view: ViewId) {
        self.subscriptions.borrow_mut().caret.remove(&view);
    }

    /// Drop subscriptions of a buffer that has been closed
    pub(crate) fn drop_buffer(&self, buffer: BufferId) {
        self.subscriptions.borrow_mut().edits.remove(&buffer);
    }
}

/// Caret listener of the anchor controller
#[derive(Debug)]
pub struct CaretListener {
    bus: EventBus,
}

impl Listener<ViewId> for CaretListener {
    fn add_listener(&mut self, target: &ViewId) {
        let mut subscriptions = self.bus.subscriptions.borrow_mut();
        subscriptions.caret.insert(*target);
        subscriptions.stats.caret_attached += 1;
    }

    fn remove_listener(&mut self, target: &ViewId) {
        let mut subscriptions = self.bus.subscriptions.borrow_mut();
        subscriptions.caret.remove(target);
        subscriptions.stats.caret_detached += 1;
    }
}

/// Pre-removal listener of the anchor controller
#[derive(Debug)]
pub struct EditListener {
    bus: EventBus,
}

impl Listener<BufferId> for EditListener {
    fn add_listener(&mut self, target: &BufferId) {
        let mut subscriptions = self.bus.subscriptions.borrow_mut();
        subscriptions.edits.insert(*target);
        subscriptions.stats.edit_attached += 1;
    }

    fn remove_listener(&mut self, target: &BufferId) {
        let mut subscriptions = self.bus.subscriptions.borrow_mut();
        subscriptions.edits.remove(target);
        subscriptions.stats.edit_detached += 1;
    }
}
