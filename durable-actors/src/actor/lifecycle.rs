//! Persistence lifecycle marker of an actor instance.

/// Where an instance stands relative to its store.
///
/// # State Transitions
///
/// ```text
/// Uninitialized → Loaded → Persisted
///                   ↑          │
///                   │          ↓
///                   └──── Destroyed
/// ```
///
/// Any state may move to `Destroyed`. The first request after a destroy
/// returns the marker to `Loaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateLifecycle {
    /// Constructed, nothing read from the store yet.
    #[default]
    Uninitialized,

    /// Fields overlaid from the store.
    Loaded,

    /// Every persistable field written at least once since loading.
    Persisted,

    /// Store wiped by a destroy.
    Destroyed,
}

impl StateLifecycle {
    /// Check if transition to next state is valid.
    pub fn can_transition_to(&self, next: StateLifecycle) -> bool {
        use StateLifecycle::*;
        matches!(
            (self, next),
            (Uninitialized, Loaded)
                | (Loaded, Loaded)
                | (Loaded, Persisted)
                | (Persisted, Persisted)
                | (Persisted, Loaded)
                | (Destroyed, Loaded)
                | (_, Destroyed)
        )
    }

    /// Whether the in-memory state reflects data read from the store.
    pub fn is_loaded(&self) -> bool {
        matches!(self, StateLifecycle::Loaded | StateLifecycle::Persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use StateLifecycle::*;
        assert!(Uninitialized.can_transition_to(Loaded));
        assert!(Loaded.can_transition_to(Persisted));
        assert!(Persisted.can_transition_to(Destroyed));
        assert!(Destroyed.can_transition_to(Loaded));
        assert!(Uninitialized.can_transition_to(Destroyed));
    }

    #[test]
    fn test_invalid_transitions() {
        use StateLifecycle::*;
        assert!(!Uninitialized.can_transition_to(Persisted));
        assert!(!Destroyed.can_transition_to(Persisted));
        assert!(!Loaded.can_transition_to(Uninitialized));
    }

    #[test]
    fn test_is_loaded() {
        assert!(!StateLifecycle::default().is_loaded());
        assert!(StateLifecycle::Loaded.is_loaded());
        assert!(StateLifecycle::Persisted.is_loaded());
        assert!(!StateLifecycle::Destroyed.is_loaded());
    }
}
