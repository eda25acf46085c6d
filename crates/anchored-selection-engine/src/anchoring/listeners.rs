use std::collections::HashSet;
use std::hash::Hash;

/// Host-side hook that attaches one listener instance to a target
pub trait Listener<T> {
    fn add_listener(&mut self, target: &T);
    fn remove_listener(&mut self, target: &T);
}

/// Registry that keeps attach and detach calls strictly paired
///
/// Targets are remembered by key only, so membership never keeps a target
/// alive. A target that disappears on its own is dropped with [`forget`],
/// which skips the detach call.
///
/// [`forget`]: ListenerRegistry::forget
#[derive(Debug)]
pub struct ListenerRegistry<T, L> {
    listener: L,
    listening_to: HashSet<T>,
}

impl<T, L> ListenerRegistry<T, L>
where
    T: Clone + Eq + Hash,
    L: Listener<T>,
{
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            listening_to: HashSet::new(),
        }
    }

    /// Attach the listener unless the target is already being listened to
    ///
    /// Returns `true` if an attach call was made.
    pub fn listen_to(&mut self, target: &T) -> bool {
        if self.listening_to.contains(target) {
            return false;
        }
        self.listener.add_listener(target);
        self.listening_to.insert(target.clone());
        true
    }

    /// Detach the listener if the target is being listened to
    ///
    /// Returns `true` if a detach call was made.
    pub fn remove_from(&mut self, target: &T) -> bool {
        if self.listening_to.remove(target) {
            self.listener.remove_listener(target);
            true
        } else {
            false
        }
    }

    /// Detach from every target that is listened to
    pub fn remove_all(&mut self) {
        for target in self.listening_to.drain() {
            self.listener.remove_listener(&target);
        }
    }

    /// Drop membership of a target that no longer exists, without detaching
    pub fn forget(&mut self, target: &T) -> bool {
        self.listening_to.remove(target)
    }

    pub fn is_listening_to(&self, target: &T) -> bool {
        self.listening_to.contains(target)
    }

    pub fn len(&self) -> usize {
        self.listening_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listening_to.is_empty()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::RecordingListener;
    use pretty_assertions::assert_eq;

    fn registry() -> ListenerRegistry<u32, RecordingListener> {
        ListenerRegistry::new(RecordingListener::default())
    }

    #[test]
    fn test_listen_to_twice_attaches_once() {
        let mut registry = registry();

        assert!(registry.listen_to(&7));
        assert!(!registry.listen_to(&7));

        assert_eq!(registry.listener().added, vec![7]);
        assert!(registry.is_listening_to(&7));
    }

    #[test]
    fn test_remove_from_detaches_once() {
        let mut registry = registry();
        registry.listen_to(&7);
        registry.listen_to(&7);

        assert!(registry.remove_from(&7));
        assert!(!registry.remove_from(&7));

        assert_eq!(registry.listener().removed, vec![7]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_from_unknown_target_is_noop() {
        let mut registry = registry();

        assert!(!registry.remove_from(&3));

        assert!(registry.listener().removed.is_empty());
    }

    #[test]
    fn test_remove_all_detaches_every_target() {
        let mut registry = registry();
        for target in [1, 2, 3] {
            registry.listen_to(&target);
        }

        registry.remove_all();

        let mut removed = registry.listener().removed.clone();
        removed.sort();
        assert_eq!(removed, vec![1, 2, 3]);
        assert!(registry.is_empty());

        // Nothing left to detach
        registry.remove_all();
        assert_eq!(registry.listener().removed.len(), 3);
    }

    #[test]
    fn test_forget_skips_detach_and_allows_reattach() {
        let mut registry = registry();
        registry.listen_to(&4);

        assert!(registry.forget(&4));
        assert!(registry.listener().removed.is_empty());

        assert!(registry.listen_to(&4));
        assert_eq!(registry.listener().added, vec![4, 4]);
        assert_eq!(registry.len(), 1);
    }
}
