use bitmaps::{Bitmap, Bits, BitsImpl};
use heapless::Deque;

use crate::split::{Notification, RegisterBank, RegisterState, SplitError};

/// Register operation waiting for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendingOp {
    Read(u16),
    Write(u16),
}

#[derive(Debug, Clone, Copy)]
struct CvSlot {
    value: u64,
    state: RegisterState,
    to_read: bool,
    to_write: bool,
}

impl CvSlot {
    const EMPTY: CvSlot = CvSlot {
        value: 0,
        state: RegisterState::Unknown,
        to_read: false,
        to_write: false,
    };
}

/// In-memory register bank addressed by CV number `0..N`.
///
/// Register operations are queued for a transport, which reports back with
/// [`CvTable::complete_read`] and [`CvTable::complete_write`]. Every change is
/// queued as a notification and handed out by [`CvTable::dispatch`].
///
/// # Const Generics
/// - `N`: Number of registers
/// - `Q`: Depth of the operation queue and of the notification queue
pub struct CvTable<const N: usize, const Q: usize>
where
    BitsImpl<N>: Bits,
{
    slots: [CvSlot; N],
    busy: Bitmap<N>,
    pending: Deque<PendingOp, Q>,
    events: Deque<(u16, Notification), Q>,
    overrun: bool,
}

impl<const N: usize, const Q: usize> core::fmt::Debug for CvTable<N, Q>
where
    BitsImpl<N>: Bits,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CvTable")
            .field("pending", &self.pending.len())
            .field("events", &self.events.len())
            .field("overrun", &self.overrun)
            .finish_non_exhaustive()
    }
}

impl<const N: usize, const Q: usize> CvTable<N, Q>
where
    BitsImpl<N>: Bits,
{
    pub fn new() -> Self {
        Self {
            slots: [CvSlot::EMPTY; N],
            busy: Bitmap::new(),
            pending: Deque::new(),
            events: Deque::new(),
            overrun: false,
        }
    }

    fn slot(&self, cv: u16) -> Option<&CvSlot> {
        self.slots.get(cv as usize)
    }

    fn slot_mut(&mut self, cv: u16) -> Option<&mut CvSlot> {
        self.slots.get_mut(cv as usize)
    }

    fn push_event(&mut self, cv: u16, note: Notification) {
        if self.events.push_back((cv, note)).is_err() {
            self.overrun = true;
        }
    }

    fn push_op(&mut self, op: PendingOp) {
        if self.pending.push_back(op).is_err() {
            self.overrun = true;
        }
    }

    fn store_value(&mut self, cv: u16, value: u64) {
        let Some(slot) = self.slot_mut(cv) else {
            return;
        };
        if slot.value != value {
            slot.value = value;
            self.push_event(cv, Notification::Value(value));
        }
    }

    fn finish(&mut self, cv: u16, state: RegisterState) {
        self.set_state(cv, state);
        self.busy.set(cv as usize, false);
        self.push_event(cv, Notification::Busy(false));
    }

    /// Seeds a register as loaded from file, without notifications.
    ///
    /// # Errors
    /// * [`SplitError::UnknownRegister`] - if `cv >= N`
    pub fn load(&mut self, cv: u16, value: u64) -> Result<(), SplitError> {
        let slot = self
            .slot_mut(cv)
            .ok_or(SplitError::UnknownRegister(cv as usize))?;
        slot.value = value;
        slot.state = RegisterState::FromFile;
        Ok(())
    }

    /// Returns true if an operation on `cv` is outstanding.
    pub fn is_busy(&self, cv: u16) -> bool {
        (cv as usize) < N && self.busy.get(cv as usize)
    }

    /// Returns true if any operation is outstanding.
    pub fn any_busy(&self) -> bool {
        !self.busy.is_empty()
    }

    pub fn mark_to_read(&mut self, cv: u16, flag: bool) {
        if let Some(slot) = self.slot_mut(cv) {
            slot.to_read = flag;
        }
    }

    pub fn mark_to_write(&mut self, cv: u16, flag: bool) {
        if let Some(slot) = self.slot_mut(cv) {
            slot.to_write = flag;
        }
    }

    /// Takes the oldest operation for the transport.
    pub fn next_op(&mut self) -> Option<PendingOp> {
        self.pending.pop_front()
    }

    /// Transport report for a read: `Some(value)` on success.
    pub fn complete_read(&mut self, cv: u16, result: Option<u64>) {
        match result {
            Some(value) => {
                self.store_value(cv, value);
                self.finish(cv, RegisterState::Read);
            }
            None => self.finish(cv, RegisterState::Unknown),
        }
    }

    /// Transport report for a write.
    pub fn complete_write(&mut self, cv: u16, stored: bool) {
        let state = if stored {
            RegisterState::Stored
        } else {
            RegisterState::Unknown
        };
        self.finish(cv, state);
    }

    /// Takes the oldest notification.
    pub fn pop_event(&mut self) -> Option<(u16, Notification)> {
        self.events.pop_front()
    }

    /// Hands every queued notification to `f`, including ones queued by `f`.
    pub fn dispatch(&mut self, mut f: impl FnMut(&mut Self, u16, Notification)) {
        while let Some((cv, note)) = self.pop_event() {
            f(self, cv, note);
        }
    }

    /// Returns and clears the queue overflow flag.
    pub fn take_overrun(&mut self) -> bool {
        core::mem::take(&mut self.overrun)
    }
}

impl<const N: usize, const Q: usize> Default for CvTable<N, Q>
where
    BitsImpl<N>: Bits,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const Q: usize> RegisterBank for CvTable<N, Q>
where
    BitsImpl<N>: Bits,
{
    type Id = u16;

    fn value(&self, cv: u16) -> u64 {
        self.slot(cv).map_or(0, |slot| slot.value)
    }

    fn set_value(&mut self, cv: u16, value: u64) {
        if self.slot(cv).is_some_and(|slot| slot.value != value) {
            self.store_value(cv, value);
            self.set_state(cv, RegisterState::Edited);
        }
    }

    fn state(&self, cv: u16) -> RegisterState {
        self.slot(cv).map_or(RegisterState::Unknown, |slot| slot.state)
    }

    fn set_state(&mut self, cv: u16, state: RegisterState) {
        let Some(slot) = self.slot_mut(cv) else {
            return;
        };
        if slot.state != state {
            slot.state = state;
            self.push_event(cv, Notification::State(state));
        }
    }

    fn read(&mut self, cv: u16) {
        let Some(slot) = self.slot_mut(cv) else {
            return;
        };
        slot.to_read = false;
        self.busy.set(cv as usize, true);
        self.push_event(cv, Notification::Busy(true));
        self.push_op(PendingOp::Read(cv));
    }

    fn write(&mut self, cv: u16) {
        let Some(slot) = self.slot_mut(cv) else {
            return;
        };
        slot.to_write = false;
        self.busy.set(cv as usize, true);
        self.push_event(cv, Notification::Busy(true));
        self.push_op(PendingOp::Write(cv));
    }

    fn is_to_read(&self, cv: u16) -> bool {
        self.slot(cv).is_some_and(|slot| slot.to_read)
    }

    fn is_to_write(&self, cv: u16) -> bool {
        self.slot(cv).is_some_and(|slot| slot.to_write)
    }

    fn contains(&self, cv: u16) -> bool {
        (cv as usize) < N
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::test_support::TestTable;

    fn drain(table: &mut TestTable) -> heapless::Vec<(u16, Notification), 16> {
        let mut seen = heapless::Vec::new();
        table.dispatch(|_, cv, note| {
            let _ = seen.push((cv, note));
        });
        seen
    }

    #[test]
    fn load_is_silent() {
        let mut table = TestTable::new();
        table.load(3, 0x42).unwrap();
        assert_eq!(table.value(3), 0x42);
        assert_eq!(table.state(3), RegisterState::FromFile);
        assert!(table.pop_event().is_none());
        assert_eq!(table.load(99, 1), Err(SplitError::UnknownRegister(99)));
    }

    #[test]
    fn set_value_marks_edited_once() {
        let mut table = TestTable::new();
        table.load(1, 5).unwrap();
        table.set_value(1, 7);
        table.set_value(1, 7);

        assert_eq!(table.state(1), RegisterState::Edited);
        assert_eq!(
            drain(&mut table).as_slice(),
            &[
                (1, Notification::Value(7)),
                (1, Notification::State(RegisterState::Edited)),
            ]
        );
    }

    #[test]
    fn read_round_trip() {
        let mut table = TestTable::new();
        table.mark_to_read(2, true);
        table.read(2);
        assert!(table.is_busy(2));
        assert!(!table.is_to_read(2));
        assert_eq!(table.next_op(), Some(PendingOp::Read(2)));
        assert_eq!(table.next_op(), None);

        table.complete_read(2, Some(0x1A));
        assert!(!table.is_busy(2));
        assert_eq!(table.value(2), 0x1A);
        assert_eq!(table.state(2), RegisterState::Read);
        assert_eq!(
            drain(&mut table).as_slice(),
            &[
                (2, Notification::Busy(true)),
                (2, Notification::Value(0x1A)),
                (2, Notification::State(RegisterState::Read)),
                (2, Notification::Busy(false)),
            ]
        );
    }

    #[test]
    fn failed_operations_leave_unknown() {
        let mut table = TestTable::new();
        table.load(0, 9).unwrap();
        table.read(0);
        table.complete_read(0, None);
        assert_eq!(table.state(0), RegisterState::Unknown);
        assert_eq!(table.value(0), 9);

        table.write(0);
        table.complete_write(0, true);
        assert_eq!(table.state(0), RegisterState::Stored);
        table.write(0);
        table.complete_write(0, false);
        assert_eq!(table.state(0), RegisterState::Unknown);
        assert!(!table.any_busy());
    }

    #[test]
    fn out_of_range_registers_ignored() {
        let mut table = TestTable::new();
        table.set_value(200, 1);
        table.read(200);
        assert!(!table.contains(200));
        assert_eq!(table.value(200), 0);
        assert_eq!(table.state(200), RegisterState::Unknown);
        assert!(table.pop_event().is_none());
        assert!(table.next_op().is_none());
    }

    #[test]
    fn overflow_latches_overrun() {
        let mut table: CvTable<4, 2> = CvTable::new();
        table.set_value(0, 1); // Value + State
        assert!(!table.take_overrun());
        table.set_value(1, 1); // queue full
        assert!(table.take_overrun());
        assert!(!table.take_overrun());
    }

    #[test]
    fn dispatch_delivers_events_queued_during_dispatch() {
        let mut table = TestTable::new();
        table.set_state(0, RegisterState::Diff);
        let mut count = 0;
        table.dispatch(|table, cv, note| {
            count += 1;
            if note == Notification::State(RegisterState::Diff) {
                table.set_state(cv + 1, RegisterState::Diff);
            }
        });
        // Each Diff state change triggers one on the next register until the end
        assert_eq!(count, 8);
    }
}
