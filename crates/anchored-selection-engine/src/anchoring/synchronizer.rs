use std::collections::HashSet;
use std::ops::Range;

use crate::anchoring::{
    AnchorStore, EditingSurface, FollowState, Listener, ListenerRegistry, SurfaceStatus,
};

/// Reconciles caret motion and document edits against stored anchors
///
/// Resizing the selection makes the host report a caret event of its own.
/// Before issuing the resize the surface is marked in `skip_caret_update`,
/// and the first caret event seen for a marked surface only clears the mark.
pub struct SelectionSynchronizer<S: EditingSurface> {
    skip_caret_update: HashSet<S::SurfaceId>,
}

impl<S: EditingSurface> Default for SelectionSynchronizer<S> {
    fn default() -> Self {
        Self {
            skip_caret_update: HashSet::new(),
        }
    }
}

impl<S: EditingSurface> SelectionSynchronizer<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore the next caret event of `surface`
    pub fn skip_next_caret_update(&mut self, surface: S::SurfaceId) {
        self.skip_caret_update.insert(surface);
    }

    pub fn is_suppressed(&self, surface: S::SurfaceId) -> bool {
        self.skip_caret_update.contains(&surface)
    }

    /// Clear a pending skip, e.g. once no caret events will arrive anymore
    pub fn forget_surface(&mut self, surface: S::SurfaceId) {
        self.skip_caret_update.remove(&surface);
    }

    /// Drop every pending suppression flag
    pub fn clear(&mut self) {
        self.skip_caret_update.clear();
    }

    pub fn state(&self, store: &AnchorStore<S>, surface: &S) -> FollowState {
        if store.contains(surface) {
            FollowState::Following
        } else {
            FollowState::Idle
        }
    }

    /// Re-set the selection from the anchor to the new caret position
    ///
    /// Nothing happens for a self-induced event, for a surface without an
    /// anchor in its current document, or when the selection already spans
    /// anchor to caret. Returns `true` if a resize command was issued.
    pub fn handle_caret_update(&mut self, store: &AnchorStore<S>, surface: &mut S) -> bool {
        let id = surface.id();
        if self.skip_caret_update.remove(&id) {
            log::trace!("Skipping self-induced caret update of {id:?}");
            return false;
        }
        let Some(anchor) = store.get(surface) else {
            return false;
        };
        let caret = surface.caret();
        let bounds = anchor.min(caret)..anchor.max(caret);
        if selection_matches(surface.selection_at(caret), &bounds) {
            return false;
        }

        // The resize fires a caret update which must be ignored
        self.skip_caret_update.insert(id);
        let rectangular = surface.is_rectangular_selection();
        log::trace!("Resizing selection of {id:?} to {anchor}..{caret}");
        surface.resize_selection(anchor, caret, rectangular);
        true
    }

    /// Drop anchors doomed by a pending deletion and settle listeners
    ///
    /// Called before `length` bytes at `offset` are removed from `document`.
    /// `surfaces` lists every open surface with the document it currently
    /// shows; each gets a status report, and surfaces left without an anchor
    /// lose their caret listener.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pre_content_removed<C, E, I>(
        &mut self,
        store: &mut AnchorStore<S>,
        caret_listeners: &mut ListenerRegistry<S::SurfaceId, C>,
        edit_listeners: &mut ListenerRegistry<S::DocumentId, E>,
        document: S::DocumentId,
        offset: usize,
        length: usize,
        surfaces: I,
    ) -> Vec<SurfaceStatus<S::SurfaceId>>
    where
        C: Listener<S::SurfaceId>,
        E: Listener<S::DocumentId>,
        I: IntoIterator<Item = (S::SurfaceId, S::DocumentId)>,
    {
        let removed = store.remove_in_range(document, offset, length);
        if !removed.is_empty() {
            log::debug!(
                "Deletion of {offset}+{length} in {document:?} removed anchors of {removed:?}"
            );
        }
        if !store.contains_document(document) {
            edit_listeners.remove_from(&document);
        }

        surfaces
            .into_iter()
            .map(|(surface, current)| {
                let anchored = store.contains_key(surface, current);
                if !anchored {
                    caret_listeners.remove_from(&surface);
                    self.skip_caret_update.remove(&surface);
                }
                SurfaceStatus { surface, anchored }
            })
            .collect()
    }
}

/// Whether the live selection already spans `bounds`
///
/// An empty span matches a surface without a selection, since resizing to a
/// zero-width selection leaves none behind.
fn selection_matches(selection: Option<Range<usize>>, bounds: &Range<usize>) -> bool {
    match selection {
        Some(selection) => selection == *bounds,
        None => bounds.is_empty(),
    }
}
