/// Provenance of a register's current contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterState {
    /// Contents do not reflect the device.
    #[default]
    Unknown,
    /// Loaded from a stored configuration.
    FromFile,
    /// Changed locally and not yet written.
    Edited,
    /// Read back from the device.
    Read,
    /// Written to the device.
    Stored,
    /// Device contents differ from the local copy.
    Diff,
}

impl RegisterState {
    /// Merge priority: higher ranks win when combining register states.
    ///
    /// `Read` and `Stored` rank below every other state.
    #[inline]
    pub const fn rank(self) -> u8 {
        match self {
            RegisterState::Read | RegisterState::Stored => 0,
            RegisterState::FromFile => 1,
            RegisterState::Edited => 2,
            RegisterState::Diff => 3,
            RegisterState::Unknown => 4,
        }
    }

    /// Returns true if a register in this state holds a change to sync.
    #[inline]
    pub const fn is_changed(self) -> bool {
        matches!(self, RegisterState::Edited | RegisterState::Unknown)
    }
}

/// Combines register states into one aggregate state.
///
/// The first state is taken as-is; each later state replaces it only if it
/// strictly outranks it. Returns `None` for an empty input.
///
/// # Example
/// ```
/// use split_cv::split::{RegisterState::*, merge_states};
///
/// assert_eq!(merge_states([FromFile, Edited, FromFile]), Some(Edited));
/// assert_eq!(merge_states([Read]), Some(Read));
/// ```
pub fn merge_states(states: impl IntoIterator<Item = RegisterState>) -> Option<RegisterState> {
    states.into_iter().fold(None, |acc, state| match acc {
        Some(current) if current.rank() >= state.rank() => Some(current),
        _ => Some(state),
    })
}

#[cfg(test)]
mod tests {
    use super::RegisterState::*;
    use super::*;

    #[test]
    fn priority_order() {
        assert!(FromFile.rank() < Edited.rank());
        assert!(Edited.rank() < Diff.rank());
        assert!(Diff.rank() < Unknown.rank());
        assert!(Read.rank() < FromFile.rank());
        assert_eq!(Read.rank(), Stored.rank());
    }

    #[test]
    fn highest_rank_wins() {
        assert_eq!(merge_states([FromFile, Edited, FromFile]), Some(Edited));
        assert_eq!(merge_states([Edited, Diff, FromFile]), Some(Diff));
        assert_eq!(merge_states([Read, Read, Unknown]), Some(Unknown));
        assert_eq!(merge_states([Unknown, Diff]), Some(Unknown));
    }

    #[test]
    fn single_register_taken_directly() {
        for state in [Unknown, FromFile, Edited, Read, Stored, Diff] {
            assert_eq!(merge_states([state]), Some(state));
        }
    }

    #[test]
    fn ties_keep_first() {
        assert_eq!(merge_states([Read, Stored]), Some(Read));
        assert_eq!(merge_states([Stored, Read]), Some(Stored));
    }

    #[test]
    fn empty_has_no_state() {
        assert_eq!(merge_states([] as [RegisterState; 0]), None);
    }

    #[test]
    fn changed_states() {
        assert!(Edited.is_changed());
        assert!(Unknown.is_changed());
        assert!(!FromFile.is_changed());
        assert!(!Read.is_changed());
        assert!(!Stored.is_changed());
        assert!(!Diff.is_changed());
    }
}
