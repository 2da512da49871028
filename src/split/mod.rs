pub mod builder;
pub mod codec;
pub mod error;
pub mod layout;
pub mod listener;
pub mod mask;
pub mod policy;
pub mod register;
pub mod scale;
pub mod sequencer;
pub mod state;
pub mod storage;
pub mod table;
pub mod value;

#[cfg(test)]
mod test_support;

pub use builder::SplitValueBuilder;
pub use codec::combine;
pub use error::SplitError;
pub use layout::{FieldItem, FieldLayout, RegisterRef, VALUE_BITS};
pub use listener::{NoListener, ValueListener};
pub use mask::Mask;
pub use policy::{AcceptAll, EntryPolicy, RangePolicy};
pub use register::{Notification, RegisterBank};
pub use scale::LinearScale;
pub use sequencer::{EditOrder, Outcome, RETRY_LIMIT, RegisterSequencer, Step, Transaction};
pub use state::{RegisterState, merge_states};
pub use storage::CvStorage;
pub use table::{CvTable, PendingOp};
pub use value::{SplitValue, TEXT_CAPACITY};

pub mod prelude {
    pub use super::{
        AcceptAll, CvStorage, CvTable, EditOrder, EntryPolicy, FieldLayout, LinearScale, Mask,
        NoListener, Notification, PendingOp, RangePolicy, RegisterBank, RegisterRef,
        RegisterState, SplitError, SplitValue, SplitValueBuilder, Transaction, ValueListener,
    };
}
