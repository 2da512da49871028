use crate::split::RegisterState;

/// Property change reported by a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    /// An operation started (`true`) or finished (`false`).
    Busy(bool),
    /// Provenance changed.
    State(RegisterState),
    /// Contents changed.
    Value(u64),
}

/// The shared set of registers that logical values are built from.
///
/// Registers are addressed by id and may be shared by several logical values,
/// each owning disjoint bits. [`read`](RegisterBank::read) and
/// [`write`](RegisterBank::write) only start an operation: completion is
/// reported later as a [`Notification::Busy`]`(false)` after which
/// [`state`](RegisterState) tells success (`Read` / `Stored`) from failure.
pub trait RegisterBank {
    /// Register address.
    type Id: Copy + PartialEq;

    /// Current contents of register `id`.
    fn value(&self, id: Self::Id) -> u64;
    /// Replaces the contents of register `id`, reporting a `Value` change.
    fn set_value(&mut self, id: Self::Id, value: u64);
    fn state(&self, id: Self::Id) -> RegisterState;
    fn set_state(&mut self, id: Self::Id, state: RegisterState);
    /// Starts reading register `id` from the device.
    fn read(&mut self, id: Self::Id);
    /// Starts writing register `id` to the device.
    fn write(&mut self, id: Self::Id);

    /// Returns true if register `id` is flagged for reading.
    fn is_to_read(&self, _id: Self::Id) -> bool {
        false
    }

    /// Returns true if register `id` is flagged for writing.
    fn is_to_write(&self, _id: Self::Id) -> bool {
        false
    }

    /// Returns true if register `id` exists.
    fn contains(&self, _id: Self::Id) -> bool {
        true
    }
}
