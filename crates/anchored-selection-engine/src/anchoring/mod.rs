/*!
 * # Anchoring Core
 *
 * Anchored selection keeps a remembered position, the **anchor**, and
 * reinterprets every caret movement as extending a selection from the anchor
 * to the new caret, whatever selection gesture the host command performed.
 *
 * ## Components
 *
 * - **`listeners`**: `ListenerRegistry`, paired attach/detach of one
 *   listener instance per target
 * - **`store`**: `AnchorStore`, tracked anchor positions keyed by
 *   (surface, document)
 * - **`synchronizer`**: `SelectionSynchronizer`, the caret and pre-removal
 *   handlers plus the one-shot suppression of self-induced caret events
 * - **`controller`**: `AnchorController`, begin/end/toggle and observer
 *   notification
 * - **`host`**: traits the host editor implements (`EditingSurface`,
 *   `TrackedPosition`, `AnchorObserver`)
 *
 * ## Event Flow
 *
 * ```text
 * caret event ──► handle_caret_update ──► AnchorStore::get
 *                        │
 *                        └─► EditingSurface::resize_selection ──► caret event (skipped)
 *
 * pre-removal ──► handle_pre_content_removed ──► AnchorStore::remove_in_range
 *                        └─► detach listeners, notify observers
 * ```
 *
 * Everything runs on the host's dispatch thread. The only hazard is
 * reentrancy: a resize issued from the caret handler reports a caret event of
 * its own, which the synchronizer swallows exactly once.
 */

pub mod controller;
pub mod host;
pub mod listeners;
pub mod store;
pub mod synchronizer;

pub use controller::AnchorController;
pub use host::{AnchorObserver, EditingSurface, FollowState, SurfaceStatus, TrackedPosition};
pub use listeners::{Listener, ListenerRegistry};
pub use store::AnchorStore;
pub use synchronizer::SelectionSynchronizer;
