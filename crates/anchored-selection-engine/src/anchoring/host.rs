use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Range;

/// Offset that the host keeps valid across edits of its document
///
/// Text inserted or removed before the position shifts it; the anchor core
/// never re-indexes positions itself, it only resolves them when needed.
pub trait TrackedPosition {
    /// Resolve the position to a plain byte offset at call time
    fn offset(&self) -> usize;
}

/// One view of a document as seen by the anchor core
///
/// The surface owns the caret, the live selection and the command that
/// resizes it. Identifiers are plain `Copy` keys so that nothing the core
/// stores can keep a surface or a document alive.
pub trait EditingSurface {
    type SurfaceId: Copy + Eq + Hash + Debug;
    type DocumentId: Copy + Eq + Hash + Debug;
    type Position: TrackedPosition;

    fn id(&self) -> Self::SurfaceId;

    /// Document currently shown by this surface
    fn document(&self) -> Self::DocumentId;

    fn caret(&self) -> usize;

    /// Selection touching `offset` (inclusive at both ends), if any
    fn selection_at(&self, offset: usize) -> Option<Range<usize>>;

    /// Whether rectangular (block) selection mode is active
    fn is_rectangular_selection(&self) -> bool;

    /// Create a tracked position in the current document
    fn track(&self, offset: usize) -> Self::Position;

    /// Resize the active selection so that it spans `fixed`..`moving`
    ///
    /// `fixed` stays put and the caret ends up at `moving`. Hosts usually
    /// report the resulting caret movement as a new caret event.
    fn resize_selection(&mut self, fixed: usize, moving: usize, rectangular: bool);
}

/// Per-surface state of the selection synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowState {
    /// No anchor for the surface's current document
    Idle,
    /// Caret motion extends the selection from the anchor
    Following,
}

/// Receives anchored-state transitions, e.g. a status bar indicator
pub trait AnchorObserver<S> {
    fn anchor_state_changed(&mut self, surface: S, anchored: bool);
}

impl<S, F> AnchorObserver<S> for F
where
    F: FnMut(S, bool),
{
    fn anchor_state_changed(&mut self, surface: S, anchored: bool) {
        self(surface, anchored)
    }
}

/// Anchored state reported for one surface after a document edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceStatus<S> {
    pub surface: S,
    pub anchored: bool,
}
