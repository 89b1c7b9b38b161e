#![forbid(unsafe_code)]

//! One state transition: an optional previous value and the current one.

/// A state transition delivered by a [`Transceiver`](crate::Transceiver).
///
/// `old` is `None` only for the replay pulse a receiver gets when it first
/// subscribes. Emission does not imply `old != new`; use
/// [`Channel::changes`](crate::Channel::changes) to drop repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mutation<T> {
    pub old: Option<T>,
    pub new: T,
}

impl<T> Mutation<T> {
    /// A transition from `old` to `new`.
    #[must_use]
    pub fn new(old: Option<T>, new: T) -> Self {
        Self { old, new }
    }

    /// The replay pulse: no previous value.
    #[must_use]
    pub fn replay(new: T) -> Self {
        Self { old: None, new }
    }

    /// Whether this is a replay pulse.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        self.old.is_none()
    }

    /// Apply `f` to both sides.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Mutation<U> {
        Mutation {
            old: self.old.map(&mut f),
            new: f(self.new),
        }
    }

    /// Borrow both sides.
    pub fn by_ref(&self) -> Mutation<&T> {
        Mutation {
            old: self.old.as_ref(),
            new: &self.new,
        }
    }
}

impl<T: PartialEq> Mutation<T> {
    /// Whether the value actually changed. Replay pulses count as changes.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.old.as_ref() != Some(&self.new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_has_no_old() {
        let m = Mutation::replay(3);
        assert!(m.is_replay());
        assert!(m.is_change());
    }

    #[test]
    fn map_preserves_missing_old() {
        let m = Mutation::replay(2).map(|v| v * 10);
        assert_eq!(m, Mutation::new(None, 20));
        let m = Mutation::new(Some(1), 2).map(|v| v * 10);
        assert_eq!(m, Mutation::new(Some(10), 20));
    }

    #[test]
    fn identical_sides_are_not_a_change() {
        assert!(!Mutation::new(Some(5), 5).is_change());
        assert!(Mutation::new(Some(5), 6).is_change());
    }
}
