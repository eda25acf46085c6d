use std::collections::HashMap;

use crate::anchoring::{EditingSurface, TrackedPosition};

/// Anchor positions keyed by (surface, document)
///
/// A surface can hold one anchor per document it has shown, so switching
/// documents and back finds the old anchor again. Keys are identifiers only;
/// entries are purged through [`remove_surface`] and [`remove_document`] when
/// the host closes either side.
///
/// [`remove_surface`]: AnchorStore::remove_surface
/// [`remove_document`]: AnchorStore::remove_document
pub struct AnchorStore<S: EditingSurface> {
    anchors: HashMap<S::SurfaceId, HashMap<S::DocumentId, S::Position>>,
}

impl<S: EditingSurface> Default for AnchorStore<S> {
    fn default() -> Self {
        Self {
            anchors: HashMap::new(),
        }
    }
}

impl<S: EditingSurface> AnchorStore<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the anchor for a key pair
    ///
    /// The position must belong to `document`; when coming from a surface it
    /// has to be created while the surface shows that document.
    pub fn insert(
        &mut self,
        surface: S::SurfaceId,
        document: S::DocumentId,
        position: S::Position,
    ) -> Option<S::Position> {
        self.anchors
            .entry(surface)
            .or_default()
            .insert(document, position)
    }

    /// Anchor the surface's current document at `offset`
    pub fn set(&mut self, surface: &S, offset: usize) {
        let position = surface.track(offset);
        self.insert(surface.id(), surface.document(), position);
    }

    /// Anchor the surface's current document at its caret
    pub fn set_at_caret(&mut self, surface: &S) {
        self.set(surface, surface.caret());
    }

    /// Resolved anchor offset for the surface's current document
    pub fn get(&self, surface: &S) -> Option<usize> {
        self.get_key(surface.id(), surface.document())
    }

    pub fn get_key(&self, surface: S::SurfaceId, document: S::DocumentId) -> Option<usize> {
        self.anchors
            .get(&surface)
            .and_then(|by_document| by_document.get(&document))
            .map(TrackedPosition::offset)
    }

    /// Drop the anchor for the surface's current document
    pub fn remove(&mut self, surface: &S) -> bool {
        let id = surface.id();
        let Some(by_document) = self.anchors.get_mut(&id) else {
            return false;
        };
        let removed = by_document.remove(&surface.document()).is_some();
        if by_document.is_empty() {
            self.anchors.remove(&id);
        }
        removed
    }

    /// Drop every anchor in `document` lying within `[start, start + length]`
    ///
    /// Both boundaries count as inside: a deletion that touches the anchor
    /// removes it, one that merely ends before or starts after it does not.
    /// Returns the surfaces that lost their anchor.
    pub fn remove_in_range(
        &mut self,
        document: S::DocumentId,
        start: usize,
        length: usize,
    ) -> Vec<S::SurfaceId> {
        let end = start.saturating_add(length);
        let mut removed = Vec::new();
        self.anchors.retain(|surface, by_document| {
            let doomed = by_document
                .get(&document)
                .map(TrackedPosition::offset)
                .is_some_and(|offset| start <= offset && offset <= end);
            if doomed {
                by_document.remove(&document);
                removed.push(*surface);
            }
            !by_document.is_empty()
        });
        removed
    }

    /// Whether the surface has an anchor in its current document
    pub fn contains(&self, surface: &S) -> bool {
        self.contains_key(surface.id(), surface.document())
    }

    pub fn contains_key(&self, surface: S::SurfaceId, document: S::DocumentId) -> bool {
        self.anchors
            .get(&surface)
            .is_some_and(|by_document| by_document.contains_key(&document))
    }

    /// Whether any surface has an anchor in `document`
    pub fn contains_document(&self, document: S::DocumentId) -> bool {
        self.anchors
            .values()
            .any(|by_document| by_document.contains_key(&document))
    }

    /// Forget a closed surface; returns the documents it had anchors in
    pub fn remove_surface(&mut self, surface: S::SurfaceId) -> Vec<S::DocumentId> {
        self.anchors
            .remove(&surface)
            .map(|by_document| by_document.into_keys().collect())
            .unwrap_or_default()
    }

    /// Forget a closed document; returns the surfaces that had an anchor in it
    pub fn remove_document(&mut self, document: S::DocumentId) -> Vec<S::SurfaceId> {
        let mut removed = Vec::new();
        self.anchors.retain(|surface, by_document| {
            if by_document.remove(&document).is_some() {
                removed.push(*surface);
            }
            !by_document.is_empty()
        });
        removed
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
    }

    /// Number of anchors across all surfaces and documents
    pub fn len(&self) -> usize {
        self.anchors.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
