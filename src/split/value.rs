//! One logical value spread over bit-fields of several registers.
//!
//! A [`SplitValue`] holds register ids, never the registers: every operation
//! borrows the shared [`RegisterBank`]. Whoever owns the bank routes each
//! register [`Notification`] to the values that [`watch`](SplitValue::watches)
//! that register, by calling [`SplitValue::on_notify`].
//!
//! The value keeps two copies of itself in user units: the displayed value,
//! which is cleared while a read is in flight, and the last committed value,
//! which user entry is compared against and reverted to.

use core::fmt::Write as _;

use bitmaps::{Bitmap, Bits, BitsImpl};
use heapless::String;

use crate::split::{
    EditOrder, EntryPolicy, FieldLayout, LinearScale, Notification, Outcome, RegisterBank,
    RegisterSequencer, RegisterState, SplitError, Step, Transaction, ValueListener, combine,
    merge_states,
};

/// Length of the longest value text, `u64::MAX` in decimal.
pub const TEXT_CAPACITY: usize = 20;

/// A logical value assembled from register fields.
///
/// Construct with [`SplitValueBuilder`](crate::split::SplitValueBuilder).
///
/// # Type Parameters
/// - `I`: Register id of the bank
/// - `P`: Policy for user-entered values
/// - `L`: Listener for value, state and busy changes
///
/// # Const Generics
/// - `N`: Maximum number of registers
pub struct SplitValue<I, P, L, const N: usize>
where
    BitsImpl<N>: Bits,
{
    layout: FieldLayout<I, N>,
    scale: LinearScale,
    policy: P,
    listener: L,
    sequencer: RegisterSequencer,
    // None while cleared for a read
    display: Option<u64>,
    committed: u64,
    state: RegisterState,
    busy: bool,
    read_only: bool,
    field_shrink: bool,
    // Register values that changed mid-transaction
    deferred: Bitmap<N>,
    disposed: bool,
}

impl<I, P, L, const N: usize> core::fmt::Debug for SplitValue<I, P, L, N>
where
    BitsImpl<N>: Bits,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SplitValue")
            .field("display", &self.display)
            .field("committed", &self.committed)
            .field("state", &self.state)
            .field("transaction", &self.sequencer.transaction())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl<I, P, L, const N: usize> SplitValue<I, P, L, N>
where
    I: Copy + PartialEq,
    P: EntryPolicy,
    L: ValueListener,
    BitsImpl<N>: Bits,
{
    pub(crate) fn new(
        layout: FieldLayout<I, N>,
        scale: LinearScale,
        policy: P,
        listener: L,
        read_only: bool,
        field_shrink: bool,
    ) -> Self {
        let initial = scale.to_user(0) as u64;
        Self {
            sequencer: RegisterSequencer::new(layout.len()),
            layout,
            scale,
            policy,
            listener,
            display: Some(initial),
            committed: initial,
            state: RegisterState::Unknown,
            busy: false,
            read_only,
            field_shrink,
            deferred: Bitmap::new(),
            disposed: false,
        }
    }

    #[inline]
    pub fn layout(&self) -> &FieldLayout<I, N> {
        &self.layout
    }

    #[inline]
    pub fn scale(&self) -> LinearScale {
        self.scale
    }

    #[inline]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    #[inline]
    pub fn listener(&self) -> &L {
        &self.listener
    }

    #[inline]
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Aggregate state of the registers, as last merged.
    #[inline]
    pub fn state(&self) -> RegisterState {
        self.state
    }

    /// Returns true while a read or write transaction is in flight.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[inline]
    pub fn transaction(&self) -> Transaction {
        self.sequencer.transaction()
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Selects ascending edit order for values whose fields shrank.
    pub fn set_field_shrink(&mut self, field_shrink: bool) {
        self.field_shrink = field_shrink;
    }

    /// Returns true if notifications of register `id` belong to this value.
    pub fn watches(&self, id: I) -> bool {
        !self.disposed && self.layout.contains(id)
    }

    /// Binds the value to its registers.
    ///
    /// Every register is marked [`RegisterState::FromFile`] and the value is
    /// decoded from the registers' current contents.
    ///
    /// # Errors
    /// * [`SplitError::Disposed`] - if the value was disposed
    /// * [`SplitError::UnknownRegister`] - with the layout position of the
    ///   first register missing from `bank`; nothing is changed
    pub fn attach<B>(&mut self, bank: &mut B) -> Result<(), SplitError>
    where
        B: RegisterBank<Id = I>,
    {
        if self.disposed {
            return Err(SplitError::Disposed);
        }
        if let Some(position) = self.layout.ids().position(|id| !bank.contains(id)) {
            #[cfg(feature = "defmt")]
            defmt::warn!("register at position {} missing from bank", position);
            return Err(SplitError::UnknownRegister(position));
        }
        for id in self.layout.ids() {
            bank.set_state(id, RegisterState::FromFile);
        }
        let raw = self.decode(bank);
        self.load_decoded(raw);
        self.refresh_state(bank);
        Ok(())
    }

    /// Stops tracking the registers.
    ///
    /// Later notifications are ignored, including the completion of an
    /// in-flight transaction, and new transactions are refused.
    pub fn dispose(&mut self) {
        #[cfg(feature = "defmt")]
        {
            if !self.sequencer.is_idle() {
                defmt::debug!("disposed during {}", self.sequencer.transaction());
            }
        }
        self.disposed = true;
    }

    /// Current value in device units.
    pub fn long_value(&self) -> u64 {
        self.raw_of(self.display.unwrap_or(self.committed))
    }

    /// Current value in device units, truncated to 32 bits.
    pub fn int_value(&self) -> i32 {
        let raw = self.long_value();
        if raw > u64::from(u32::MAX) {
            #[cfg(feature = "defmt")]
            defmt::error!("value {} truncated to 32 bits", raw);
        }
        raw as i32
    }

    /// Displayed value in user units; empty while a read is in flight.
    pub fn value_string(&self) -> String<TEXT_CAPACITY> {
        let mut text = String::new();
        if let Some(user) = self.display {
            // Any u64 fits in TEXT_CAPACITY digits
            let _ = write!(text, "{user}");
        }
        text
    }

    /// Sets the value in device units and applies it to the registers.
    ///
    /// Listeners see the old value in device units and the new value in user
    /// units. The registers are only edited when the value changed or the
    /// aggregate state is [`RegisterState::Unknown`]. A value rejected by the
    /// entry policy is neither applied nor reported.
    pub fn set_long_value<B>(&mut self, bank: &mut B, raw: u64)
    where
        B: RegisterBank<Id = I>,
    {
        let old = self.long_value();
        self.display = Some(self.user_of(raw));
        if old != raw || self.state == RegisterState::Unknown {
            if let Err(_err) = self.commit_display(bank) {
                #[cfg(feature = "defmt")]
                defmt::warn!("value {} not applied: {}", raw, _err);
                return;
            }
        }
        self.fire_value(old as i64, self.scale.to_user(raw as i64));
    }

    /// Sets the value in device units from a signed 32-bit integer.
    pub fn set_int_value<B>(&mut self, bank: &mut B, raw: i32)
    where
        B: RegisterBank<Id = I>,
    {
        self.set_long_value(bank, i64::from(raw) as u64);
    }

    /// Parses `text` as an unsigned decimal value in device units.
    ///
    /// # Errors
    /// * [`SplitError::InvalidNumber`] - if `text` is not a number; nothing is
    ///   changed
    pub fn set_value_str<B>(&mut self, bank: &mut B, text: &str) -> Result<(), SplitError>
    where
        B: RegisterBank<Id = I>,
    {
        let Ok(raw) = text.trim().parse::<u64>() else {
            #[cfg(feature = "defmt")]
            defmt::warn!("ignoring malformed value {=str}", text);
            return Err(SplitError::InvalidNumber);
        };
        self.set_long_value(bank, raw);
        Ok(())
    }

    /// User entry of `text` in user units.
    ///
    /// Text equal to the committed value is a no-op. Otherwise the value is
    /// applied to the registers and listeners see old and new in device units.
    ///
    /// # Errors
    /// * [`SplitError::InvalidNumber`] - if `text` is not an unsigned number
    /// * [`SplitError::OutOfRange`] - if the entry policy rejects the value
    ///
    /// On error the display reverts to the committed value.
    pub fn enter_text<B>(&mut self, bank: &mut B, text: &str) -> Result<(), SplitError>
    where
        B: RegisterBank<Id = I>,
    {
        let Ok(user) = text.trim().parse::<u64>() else {
            #[cfg(feature = "defmt")]
            defmt::warn!("reverting malformed entry {=str}", text);
            self.display = Some(self.committed);
            return Err(SplitError::InvalidNumber);
        };
        let old_raw = self.raw_of(self.committed);
        self.display = Some(user);
        self.commit_display(bank)?;
        self.fire_value(old_raw as i64, self.raw_of(user) as i64);
        Ok(())
    }

    /// Writes the current value into the registers' fields.
    ///
    /// Each register is combined with its field and only set if its contents
    /// change, so bits outside the value's masks are preserved. Registers are
    /// visited last to first, or first to last for a shrinking field. Returns
    /// the layout positions of the registers that were set.
    pub fn apply_edit<B>(&self, bank: &mut B) -> Bitmap<N>
    where
        B: RegisterBank<Id = I>,
    {
        let fields = self.layout.encode_fields(self.long_value());
        let order = EditOrder::for_edit(self.field_shrink);
        let len = self.layout.len();
        let mut mutated = Bitmap::new();
        for step in 0..len {
            let position = order.position(step, len);
            let (Some(item), Some(&field)) = (self.layout.item(position), fields.get(position))
            else {
                continue;
            };
            let old = bank.value(item.id());
            let new = combine(old, field, item.mask());
            if new != old {
                bank.set_value(item.id(), new);
                mutated.set(position, true);
            }
        }
        mutated
    }

    /// Starts reading every register, first to last.
    ///
    /// All registers are marked [`RegisterState::Unknown`] and the display is
    /// cleared until the read completes.
    ///
    /// # Errors
    /// * [`SplitError::Disposed`] - if the value was disposed
    /// * [`SplitError::TransactionActive`] - if a transaction is in flight
    pub fn read_all<B>(&mut self, bank: &mut B) -> Result<(), SplitError>
    where
        B: RegisterBank<Id = I>,
    {
        if self.disposed {
            return Err(SplitError::Disposed);
        }
        let step = self.sequencer.begin_read().inspect_err(|_err| {
            #[cfg(feature = "defmt")]
            defmt::warn!("read dropped: {}", _err);
        })?;
        self.set_busy(true);
        self.display = None;
        for id in self.layout.ids() {
            bank.set_state(id, RegisterState::Unknown);
        }
        self.refresh_state(bank);
        self.run(bank, step);
        Ok(())
    }

    /// Starts writing every register, last to first.
    ///
    /// The current value is applied to the registers first. Every register is
    /// written, changed or not.
    ///
    /// # Errors
    /// * [`SplitError::Disposed`] - if the value was disposed
    /// * [`SplitError::ReadOnly`] - if the value is read-only
    /// * [`SplitError::TransactionActive`] - if a transaction is in flight
    pub fn write_all<B>(&mut self, bank: &mut B) -> Result<(), SplitError>
    where
        B: RegisterBank<Id = I>,
    {
        if self.disposed {
            return Err(SplitError::Disposed);
        }
        if self.read_only {
            #[cfg(feature = "defmt")]
            defmt::error!("write requested on read-only value");
            return Err(SplitError::ReadOnly);
        }
        if !self.sequencer.is_idle() {
            #[cfg(feature = "defmt")]
            defmt::warn!("write dropped during {}", self.sequencer.transaction());
            return Err(SplitError::TransactionActive);
        }
        self.apply_edit(bank);
        let step = self.sequencer.begin_write()?;
        self.set_busy(true);
        self.run(bank, step);
        Ok(())
    }

    /// Reads the registers if any is changed or flagged for reading.
    ///
    /// Returns true if a read was started.
    ///
    /// # Errors
    /// As for [`SplitValue::read_all`].
    pub fn read_changes<B>(&mut self, bank: &mut B) -> Result<bool, SplitError>
    where
        B: RegisterBank<Id = I>,
    {
        if self.is_changed(bank) || self.is_to_read(bank) {
            self.read_all(bank)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Writes the registers if any is changed or flagged for writing.
    ///
    /// Returns true if a write was started.
    ///
    /// # Errors
    /// As for [`SplitValue::write_all`].
    pub fn write_changes<B>(&mut self, bank: &mut B) -> Result<bool, SplitError>
    where
        B: RegisterBank<Id = I>,
    {
        if self.is_changed(bank) || self.is_to_write(bank) {
            self.write_all(bank)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Returns true if any register holds a change to sync.
    pub fn is_changed<B>(&self, bank: &B) -> bool
    where
        B: RegisterBank<Id = I>,
    {
        self.layout.ids().any(|id| bank.state(id).is_changed())
    }

    pub fn is_to_read<B>(&self, bank: &B) -> bool
    where
        B: RegisterBank<Id = I>,
    {
        self.layout.ids().any(|id| bank.is_to_read(id))
    }

    pub fn is_to_write<B>(&self, bank: &B) -> bool
    where
        B: RegisterBank<Id = I>,
    {
        self.layout.ids().any(|id| bank.is_to_write(id))
    }

    /// Sets every register to `state`.
    pub fn set_register_state<B>(&mut self, bank: &mut B, state: RegisterState)
    where
        B: RegisterBank<Id = I>,
    {
        for id in self.layout.ids() {
            bank.set_state(id, state);
        }
        self.refresh_state(bank);
    }

    /// Handles a notification from register `id`.
    ///
    /// Only a `Busy(false)` from the register of the operation in flight
    /// advances a transaction. Value changes while idle are decoded at once;
    /// during a transaction they are decoded when it ends.
    pub fn on_notify<B>(&mut self, bank: &mut B, id: I, note: Notification)
    where
        B: RegisterBank<Id = I>,
    {
        if self.disposed {
            return;
        }
        let Some(position) = self.layout.position(id) else {
            return;
        };
        match note {
            Notification::Busy(true) => {}
            Notification::Busy(false) => self.on_idle(bank, id),
            Notification::State(_) => self.refresh_state(bank),
            Notification::Value(_) => {
                if self.sequencer.is_idle() {
                    let raw = self.decode(bank);
                    self.load_decoded(raw);
                } else {
                    self.deferred.set(position, true);
                }
                self.refresh_state(bank);
            }
        }
    }

    fn on_idle<B>(&mut self, bank: &mut B, id: I)
    where
        B: RegisterBank<Id = I>,
    {
        let Some(position) = self.sequencer.in_flight() else {
            #[cfg(feature = "defmt")]
            defmt::debug!("idle notification outside a transaction");
            return;
        };
        if self.layout.item(position).map(|item| item.id()) != Some(id) {
            return;
        }
        let expected = match self.sequencer.transaction() {
            Transaction::Reading(_) => RegisterState::Read,
            Transaction::Writing(_) => RegisterState::Stored,
            Transaction::Idle => return,
        };
        let outcome = if bank.state(id) == expected {
            Outcome::Success
        } else {
            Outcome::Failure
        };
        #[cfg(feature = "defmt")]
        defmt::debug!("position {} finished: {}", position, outcome);
        let step = self.sequencer.complete(outcome);
        self.run(bank, step);
    }

    fn run<B>(&mut self, bank: &mut B, step: Step)
    where
        B: RegisterBank<Id = I>,
    {
        match step {
            Step::Read(position) => {
                if let Some(item) = self.layout.item(position) {
                    #[cfg(feature = "defmt")]
                    {
                        if self.sequencer.retries() > 0 {
                            defmt::debug!(
                                "retry {} of position {}",
                                self.sequencer.retries(),
                                position
                            );
                        }
                    }
                    bank.read(item.id());
                }
            }
            Step::Write(position) => {
                if let Some(item) = self.layout.item(position) {
                    bank.write(item.id());
                }
            }
            Step::ReadComplete => {
                self.deferred = Bitmap::new();
                let raw = self.decode(bank);
                self.load_decoded(raw);
                self.finish(bank);
            }
            Step::ReadAborted => {
                #[cfg(feature = "defmt")]
                defmt::warn!("read abandoned after {} retries", crate::split::RETRY_LIMIT);
                // Partial reads are not decoded
                self.deferred = Bitmap::new();
                for id in self.layout.ids() {
                    bank.set_state(id, RegisterState::Unknown);
                }
                self.display = Some(self.committed);
                self.finish(bank);
            }
            Step::WriteComplete | Step::WriteAborted => {
                #[cfg(feature = "defmt")]
                {
                    if step == Step::WriteAborted {
                        defmt::warn!("write abandoned");
                    }
                }
                if !self.deferred.is_empty() {
                    self.deferred = Bitmap::new();
                    let raw = self.decode(bank);
                    self.load_decoded(raw);
                }
                self.finish(bank);
            }
            Step::Ignored => {}
        }
    }

    fn finish<B>(&mut self, bank: &mut B)
    where
        B: RegisterBank<Id = I>,
    {
        self.set_busy(false);
        self.refresh_state(bank);
    }

    /// Takes a value decoded from the registers as committed.
    ///
    /// The entry policy does not apply and the registers are left alone.
    fn load_decoded(&mut self, raw: u64) {
        let old = self.long_value();
        let user = self.user_of(raw);
        self.display = Some(user);
        self.committed = user;
        self.fire_value(old as i64, self.scale.to_user(raw as i64));
    }

    /// Accepts the displayed value as committed and edits the registers.
    fn commit_display<B>(&mut self, bank: &mut B) -> Result<(), SplitError>
    where
        B: RegisterBank<Id = I>,
    {
        let Some(user) = self.display else {
            return Ok(());
        };
        if user == self.committed {
            return Ok(());
        }
        if !self.policy.accepts(user) {
            self.display = Some(self.committed);
            return Err(SplitError::OutOfRange);
        }
        self.committed = user;
        self.apply_edit(bank);
        Ok(())
    }

    fn decode<B>(&self, bank: &B) -> u64
    where
        B: RegisterBank<Id = I>,
    {
        self.layout.decode_with(|id| bank.value(id))
    }

    fn refresh_state<B>(&mut self, bank: &B)
    where
        B: RegisterBank<Id = I>,
    {
        let merged = merge_states(self.layout.ids().map(|id| bank.state(id)))
            .unwrap_or(RegisterState::Unknown);
        if merged != self.state {
            self.state = merged;
            self.listener.state_changed(merged);
        }
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy = busy;
            self.listener.busy_changed(busy);
        }
    }

    fn fire_value(&mut self, old: i64, new: i64) {
        if old != new {
            self.listener.value_changed(old, new);
        }
    }

    #[inline]
    fn user_of(&self, raw: u64) -> u64 {
        self.scale.to_user(raw as i64) as u64
    }

    #[inline]
    fn raw_of(&self, user: u64) -> u64 {
        self.scale.to_raw(user as i64) as u64
    }
}
