//! Ordered, one-register-at-a-time transactions.
//!
//! The [`RegisterSequencer`] only decides what happens next; the caller issues
//! the register operation named by each [`Step`] and reports its [`Outcome`].
//!
//! Reads walk the layout from position 0 upward and retry a failed register
//! up to [`RETRY_LIMIT`] times. Writes walk from the last position down to 0
//! and stop at the first failure.

use crate::split::SplitError;

/// Retries of one register before a read transaction is abandoned.
pub const RETRY_LIMIT: u8 = 2;

/// State of the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transaction {
    #[default]
    Idle,
    /// Reading the register at this layout position.
    Reading(usize),
    /// Writing the register at this layout position.
    Writing(usize),
}

/// Result of one register operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Success,
    Failure,
}

/// What the caller must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Issue a read of the register at this position.
    Read(usize),
    /// Issue a write of the register at this position.
    Write(usize),
    /// Every register was read; decode the value.
    ReadComplete,
    /// Every register was written.
    WriteComplete,
    /// A register kept failing; the read is abandoned.
    ReadAborted,
    /// A register write failed; the remaining registers were not written.
    WriteAborted,
    /// No transaction is in flight.
    Ignored,
}

/// Order in which an edit is applied to the registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EditOrder {
    /// Lowest position first.
    Ascending,
    /// Highest position first, the same order as a write transaction.
    #[default]
    Descending,
}

impl EditOrder {
    /// Selects the order for an edit; a shrinking field is applied ascending.
    #[inline]
    pub const fn for_edit(field_shrink: bool) -> Self {
        if field_shrink {
            EditOrder::Ascending
        } else {
            EditOrder::Descending
        }
    }

    /// Layout position visited at `step` of `len`.
    #[inline]
    pub const fn position(self, step: usize, len: usize) -> usize {
        match self {
            EditOrder::Ascending => step,
            EditOrder::Descending => len - 1 - step,
        }
    }
}

/// Read/write transaction state machine over a layout of `len` registers.
#[derive(Debug, Clone)]
pub struct RegisterSequencer {
    len: usize,
    state: Transaction,
    retries: u8,
}

impl RegisterSequencer {
    pub const fn new(len: usize) -> Self {
        Self {
            len,
            state: Transaction::Idle,
            retries: 0,
        }
    }

    #[inline]
    pub fn transaction(&self) -> Transaction {
        self.state
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == Transaction::Idle
    }

    /// Position of the register whose operation is outstanding.
    pub fn in_flight(&self) -> Option<usize> {
        match self.state {
            Transaction::Idle => None,
            Transaction::Reading(i) | Transaction::Writing(i) => Some(i),
        }
    }

    /// Retries spent on the register currently being read.
    #[inline]
    pub fn retries(&self) -> u8 {
        self.retries
    }

    /// Starts a read transaction at position 0.
    ///
    /// # Errors
    /// * [`SplitError::TransactionActive`] - if not idle
    pub fn begin_read(&mut self) -> Result<Step, SplitError> {
        if !self.is_idle() {
            return Err(SplitError::TransactionActive);
        }
        if self.len == 0 {
            return Ok(Step::ReadComplete);
        }
        self.retries = 0;
        self.state = Transaction::Reading(0);
        Ok(Step::Read(0))
    }

    /// Starts a write transaction at the last position.
    ///
    /// # Errors
    /// * [`SplitError::TransactionActive`] - if not idle
    pub fn begin_write(&mut self) -> Result<Step, SplitError> {
        if !self.is_idle() {
            return Err(SplitError::TransactionActive);
        }
        if self.len == 0 {
            return Ok(Step::WriteComplete);
        }
        let last = self.len - 1;
        self.state = Transaction::Writing(last);
        Ok(Step::Write(last))
    }

    /// Advances on completion of the outstanding register operation.
    pub fn complete(&mut self, outcome: Outcome) -> Step {
        let (next_state, step) = match (self.state, outcome) {
            (Transaction::Idle, _) => return Step::Ignored,
            (Transaction::Reading(i), Outcome::Success) => {
                self.retries = 0;
                if i + 1 < self.len {
                    (Transaction::Reading(i + 1), Step::Read(i + 1))
                } else {
                    (Transaction::Idle, Step::ReadComplete)
                }
            }
            (Transaction::Reading(i), Outcome::Failure) if self.retries < RETRY_LIMIT => {
                self.retries += 1;
                (Transaction::Reading(i), Step::Read(i))
            }
            (Transaction::Reading(_), Outcome::Failure) => {
                self.retries = 0;
                (Transaction::Idle, Step::ReadAborted)
            }
            (Transaction::Writing(0), Outcome::Success) => (Transaction::Idle, Step::WriteComplete),
            (Transaction::Writing(i), Outcome::Success) => {
                (Transaction::Writing(i - 1), Step::Write(i - 1))
            }
            (Transaction::Writing(_), Outcome::Failure) => (Transaction::Idle, Step::WriteAborted),
        };
        self.state = next_state;
        step
    }
}
