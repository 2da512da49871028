//! Test support utilities - only compiled in test builds.

use bitmaps::{Bits, BitsImpl};
use heapless::Vec;

use crate::split::{
    AcceptAll, CvTable, EntryPolicy, Mask, Notification, PendingOp, RegisterBank, RegisterState,
    SplitValue, SplitValueBuilder, ValueListener,
};

/// Standard test configuration: 8 registers, 32-deep queues
pub type TestTable = CvTable<8, 32>;

/// Value over CV 1 (mask 0x0F) and CV 2 (mask 0xFF), recording its events
pub type TestValue = SplitValue<u16, AcceptAll, RecordingListener, 4>;

/// Outward change recorded by [`RecordingListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Value(i64, i64),
    State(RegisterState),
    Busy(bool),
}

/// Listener that keeps every change it sees.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<Event, 32>,
}

impl RecordingListener {
    /// Value changes only, in order.
    pub fn values(&self) -> Vec<(i64, i64), 32> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Value(old, new) => Some((*old, *new)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl ValueListener for RecordingListener {
    fn value_changed(&mut self, old: i64, new: i64) {
        let _ = self.events.push(Event::Value(old, new));
    }

    fn state_changed(&mut self, state: RegisterState) {
        let _ = self.events.push(Event::State(state));
    }

    fn busy_changed(&mut self, busy: bool) {
        let _ = self.events.push(Event::Busy(busy));
    }
}

/// Helper to create the two-register nibble + byte value
pub fn nibble_byte_value() -> TestValue {
    SplitValueBuilder::new()
        .capacity::<4>()
        .split_masks(&[1, 2], &[Mask::new(0x0F).unwrap(), Mask::BYTE])
        .unwrap()
        .unit_scale()
        .accept_all()
        .listener(RecordingListener::default())
        .build()
}

/// Device behind a [`TestTable`] that answers queued operations.
///
/// Reads return the device's copy of the register; successful writes copy
/// the table's register into the device. Failures are injected per register.
#[derive(Debug, Default)]
pub struct ScriptedDevice {
    pub registers: [u64; 8],
    failures: [u8; 8],
    pub ops: Vec<PendingOp, 64>,
}

impl ScriptedDevice {
    pub fn with_registers(registers: [u64; 8]) -> Self {
        Self {
            registers,
            ..Self::default()
        }
    }

    /// Fails the next `times` operations on `cv`; `u8::MAX` fails forever.
    pub fn fail(&mut self, cv: u16, times: u8) {
        self.failures[cv as usize] = times;
    }

    fn attempt(&mut self, cv: u16) -> bool {
        let left = &mut self.failures[cv as usize];
        match *left {
            0 => true,
            u8::MAX => false,
            _ => {
                *left -= 1;
                false
            }
        }
    }

    /// Dispatches notifications to `value` and answers operations until the
    /// table has nothing left to do.
    pub fn pump<P, L, const N: usize>(
        &mut self,
        table: &mut TestTable,
        value: &mut SplitValue<u16, P, L, N>,
    ) where
        P: EntryPolicy,
        L: ValueListener,
        BitsImpl<N>: Bits,
    {
        self.pump_with(table, |table, cv, note| value.on_notify(table, cv, note));
    }

    /// Like [`ScriptedDevice::pump`], handing notifications to `route`.
    pub fn pump_with(
        &mut self,
        table: &mut TestTable,
        mut route: impl FnMut(&mut TestTable, u16, Notification),
    ) {
        loop {
            table.dispatch(&mut route);
            let Some(op) = table.next_op() else {
                break;
            };
            self.ops.push(op).unwrap();
            match op {
                PendingOp::Read(cv) => {
                    let result = self.attempt(cv).then(|| self.registers[cv as usize]);
                    table.complete_read(cv, result);
                }
                PendingOp::Write(cv) => {
                    let stored = self.attempt(cv);
                    if stored {
                        self.registers[cv as usize] = table.value(cv);
                    }
                    table.complete_write(cv, stored);
                }
            }
        }
    }

    /// Operations seen so far, as register numbers with `true` for writes.
    pub fn trace(&self) -> Vec<(u16, bool), 64> {
        self.ops
            .iter()
            .map(|op| match *op {
                PendingOp::Read(cv) => (cv, false),
                PendingOp::Write(cv) => (cv, true),
            })
            .collect()
    }
}

/// Seeds `table` from `(cv, value)` pairs as loaded from file.
pub fn load_table(table: &mut TestTable, registers: &[(u16, u64)]) {
    for &(cv, value) in registers {
        table.load(cv, value).unwrap();
    }
}

/// Asserts every listed register is in `state`.
pub fn assert_states(table: &TestTable, cvs: &[u16], state: RegisterState) {
    for &cv in cvs {
        assert_eq!(table.state(cv), state, "state of CV {cv}");
    }
}
