//! A `no_std`, no-alloc engine for configuration values split across registers.
//!
//! Some device settings do not fit in one register. A 14-bit address might
//! keep its low six bits in one register and the high eight in another, each
//! sharing its register with unrelated settings. This crate models such a
//! *logical value* as an ordered list of bit-fields, one per register, and
//! drives the one-register-at-a-time transactions needed to read or commit it
//! over a narrow command channel.
//!
//! # Features
//!
//! - **Bit-field codec** - Split a `u64` into per-register fields and back
//! - **Read-modify-write** - Bits outside a field are never disturbed
//! - **Transaction sequencer** - Ordered reads with bounded retry, ordered writes
//! - **State aggregation** - One provenance state for the whole value
//! - **Zero heap allocation** - Register lists and queues are fixed capacity
//!
//! # Architecture
//!
//! Registers are shared: several logical values may own disjoint bits of the
//! same register. Values therefore hold register *ids* and borrow the
//! [`RegisterBank`](split::RegisterBank) on every call, and the bank's owner
//! routes register notifications back to each value that watches them.
//!
//! ```text
//! ┌───────────────────┐  read()/write()   ┌──────────────────────┐
//! │   SplitValue      │──────────────────▶│   RegisterBank       │
//! │                   │                   │   (CvTable)          │
//! │  layout + codec   │   Busy/State/     │                      │──▶ transport
//! │  sequencer        │◀──────────────────│   notifications      │◀── completions
//! │  state merge      │   Value           │                      │
//! └───────────────────┘                   └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use split_cv::prelude::*;
//!
//! // Low nibble of CV 1, whole of CV 2: a 12-bit value
//! let mut table: CvTable<8, 16> = CvTable::new();
//! let mut value = SplitValueBuilder::new()
//!     .capacity::<4>()
//!     .split_masks(&[1u16, 2], &[Mask::new(0x0F).unwrap(), Mask::new(0xFF).unwrap()])
//!     .unwrap()
//!     .unit_scale()
//!     .accept_all()
//!     .no_listener()
//!     .build();
//! value.attach(&mut table).unwrap();
//!
//! value.read_all(&mut table).unwrap();
//! loop {
//!     // Deliver notifications to the value, which issues the next read
//!     table.dispatch(|table, cv, note| value.on_notify(table, cv, note));
//!     match table.next_op() {
//!         // Talk to the device here...
//!         Some(PendingOp::Read(cv)) => table.complete_read(cv, Some(0x1A)),
//!         Some(PendingOp::Write(cv)) => table.complete_write(cv, true),
//!         None => break,
//!     }
//! }
//! assert_eq!(value.long_value(), 0x1AA);
//! ```

#![deny(unsafe_code)]
#![no_std]

pub mod split;

pub mod prelude {
    pub use crate::split::prelude::*;
}
