use crate::anchoring::{
    AnchorObserver, AnchorStore, EditingSurface, FollowState, Listener, ListenerRegistry,
    SelectionSynchronizer, SurfaceStatus,
};

/// Entry point for starting and ending anchored selection mode
///
/// One controller serves every surface and document of a host. It owns the
/// anchor store, the synchronizer and both listener registries, and forwards
/// anchored-state transitions to registered observers. The host routes its
/// caret and pre-removal events to [`handle_caret_update`] and
/// [`handle_pre_content_removed`] for the targets the registries attached to.
///
/// [`handle_caret_update`]: AnchorController::handle_caret_update
/// [`handle_pre_content_removed`]: AnchorController::handle_pre_content_removed
pub struct AnchorController<S, C, E>
where
    S: EditingSurface,
{
    store: AnchorStore<S>,
    synchronizer: SelectionSynchronizer<S>,
    caret_listeners: ListenerRegistry<S::SurfaceId, C>,
    edit_listeners: ListenerRegistry<S::DocumentId, E>,
    observers: Vec<Box<dyn AnchorObserver<S::SurfaceId>>>,
}

impl<S, C, E> AnchorController<S, C, E>
where
    S: EditingSurface,
    C: Listener<S::SurfaceId>,
    E: Listener<S::DocumentId>,
{
    pub fn new(caret_listener: C, edit_listener: E) -> Self {
        Self {
            store: AnchorStore::new(),
            synchronizer: SelectionSynchronizer::new(),
            caret_listeners: ListenerRegistry::new(caret_listener),
            edit_listeners: ListenerRegistry::new(edit_listener),
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn AnchorObserver<S::SurfaceId>>) {
        self.observers.push(observer);
    }

    /// Start anchored selection mode
    ///
    /// The anchor is the caret, unless the caret touches a selection: then
    /// the selection end away from the caret becomes the anchor.
    pub fn begin_anchor(&mut self, surface: &S) {
        let anchor = anchor_offset_for(surface);
        self.store.set(surface, anchor);
        self.caret_listeners.listen_to(&surface.id());
        self.edit_listeners.listen_to(&surface.document());
        log::debug!(
            "Anchor dropped at {anchor} in {:?} of {:?}",
            surface.document(),
            surface.id()
        );
        self.notify(surface.id(), true);
    }

    /// End anchored selection mode
    ///
    /// The edit listener of the document stays attached while another
    /// surface still anchors it.
    pub fn end_anchor(&mut self, surface: &S) {
        let id = surface.id();
        let document = surface.document();
        self.store.remove(surface);
        self.caret_listeners.remove_from(&id);
        self.synchronizer.forget_surface(id);
        if !self.store.contains_document(document) {
            self.edit_listeners.remove_from(&document);
        }
        log::debug!("Anchor raised in {document:?} of {id:?}");
        self.notify(id, false);
    }

    pub fn is_anchored(&self, surface: &S) -> bool {
        self.store.contains(surface)
    }

    /// Flip anchored mode; returns the new state
    pub fn toggle(&mut self, surface: &S) -> bool {
        let anchored = !self.is_anchored(surface);
        self.set_anchored(surface, anchored);
        anchored
    }

    pub fn set_anchored(&mut self, surface: &S, anchored: bool) {
        if anchored {
            self.begin_anchor(surface);
        } else {
            self.end_anchor(surface);
        }
    }

    pub fn state(&self, surface: &S) -> FollowState {
        self.synchronizer.state(&self.store, surface)
    }

    /// Resolved anchor offset for the surface's current document
    pub fn anchor_offset(&self, surface: &S) -> Option<usize> {
        self.store.get(surface)
    }

    /// Ignore the next caret event of `surface`
    ///
    /// For host commands that report two caret updates for one gesture,
    /// such as a selecting caret move.
    pub fn skip_next_caret_update(&mut self, surface: &S) {
        self.synchronizer.skip_next_caret_update(surface.id());
    }

    /// Caret listener callback; returns `true` if the selection was resized
    pub fn handle_caret_update(&mut self, surface: &mut S) -> bool {
        self.synchronizer.handle_caret_update(&self.store, surface)
    }

    /// Pre-removal listener callback for `document`
    ///
    /// `surfaces` lists every open surface with its current document so that
    /// all of them can be refreshed.
    pub fn handle_pre_content_removed<I>(
        &mut self,
        document: S::DocumentId,
        offset: usize,
        length: usize,
        surfaces: I,
    ) where
        I: IntoIterator<Item = (S::SurfaceId, S::DocumentId)>,
    {
        let statuses = self.synchronizer.handle_pre_content_removed(
            &mut self.store,
            &mut self.caret_listeners,
            &mut self.edit_listeners,
            document,
            offset,
            length,
            surfaces,
        );
        for SurfaceStatus { surface, anchored } in statuses {
            self.notify(surface, anchored);
        }
    }

    /// The surface now shows another document
    ///
    /// Anchors are per document, so the caret listener follows whether the
    /// new document is anchored in this surface.
    pub fn handle_document_switched(&mut self, surface: &S) {
        let id = surface.id();
        let anchored = self.is_anchored(surface);
        if anchored {
            self.caret_listeners.listen_to(&id);
        } else {
            self.caret_listeners.remove_from(&id);
            self.synchronizer.forget_surface(id);
        }
        self.notify(id, anchored);
    }

    /// Report the current state again, e.g. when another surface got focus
    pub fn refresh(&mut self, surface: &S) {
        let anchored = self.is_anchored(surface);
        self.notify(surface.id(), anchored);
    }

    /// Purge everything kept for a surface that has been closed
    pub fn on_surface_closed(&mut self, surface: S::SurfaceId) {
        let documents = self.store.remove_surface(surface);
        self.caret_listeners.forget(&surface);
        self.synchronizer.forget_surface(surface);
        for document in documents {
            if !self.store.contains_document(document) {
                self.edit_listeners.remove_from(&document);
            }
        }
    }

    /// Purge everything kept for a document that has been closed
    ///
    /// Surfaces that showed the document are expected to be switched away
    /// from it through [`handle_document_switched`].
    ///
    /// [`handle_document_switched`]: AnchorController::handle_document_switched
    pub fn on_document_closed(&mut self, document: S::DocumentId) {
        let surfaces = self.store.remove_document(document);
        self.edit_listeners.forget(&document);
        if !surfaces.is_empty() {
            log::debug!("Closing {document:?} dropped anchors of {surfaces:?}");
        }
    }

    /// Detach every listener, e.g. when the host unloads the feature
    ///
    /// Anchors and pending suppression flags go too, so no surface is left
    /// reported as following without a caret listener.
    pub fn shutdown(&mut self) {
        self.caret_listeners.remove_all();
        self.edit_listeners.remove_all();
        self.store.clear();
        self.synchronizer.clear();
    }

    pub fn store(&self) -> &AnchorStore<S> {
        &self.store
    }

    pub fn caret_listeners(&self) -> &ListenerRegistry<S::SurfaceId, C> {
        &self.caret_listeners
    }

    pub fn edit_listeners(&self) -> &ListenerRegistry<S::DocumentId, E> {
        &self.edit_listeners
    }

    fn notify(&mut self, surface: S::SurfaceId, anchored: bool) {
        for observer in &mut self.observers {
            observer.anchor_state_changed(surface, anchored);
        }
    }
}

/// Pick the anchor for a surface about to enter anchored mode
fn anchor_offset_for<S: EditingSurface>(surface: &S) -> usize {
    let caret = surface.caret();
    match surface.selection_at(caret) {
        Some(selection) if selection.start == caret => selection.end,
        Some(selection) => selection.start,
        None => caret,
    }
}
