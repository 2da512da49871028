#![allow(unsafe_code)]

use core::cell::UnsafeCell;

use bitmaps::{Bits, BitsImpl};

use crate::split::CvTable;

/// A [`CvTable`] shared between the application loop and a transport
/// interrupt.
///
/// Both sides borrow the table through [`CvStorage::with_table`], which holds
/// a critical section for the duration of the closure.
///
/// # Const Generics
/// - `N`: Number of registers
/// - `Q`: Depth of the operation and notification queues
pub struct CvStorage<const N: usize, const Q: usize>
where
    BitsImpl<N>: Bits,
{
    table: UnsafeCell<CvTable<N, Q>>,
}

impl<const N: usize, const Q: usize> CvStorage<N, Q>
where
    BitsImpl<N>: Bits,
{
    pub fn new(table: CvTable<N, Q>) -> Self {
        Self {
            table: UnsafeCell::new(table),
        }
    }

    /// Runs `f` with exclusive access to the table inside a critical section.
    pub fn with_table<R>(&self, f: impl FnOnce(&mut CvTable<N, Q>) -> R) -> R {
        critical_section::with(|_| unsafe { self.with_table_unchecked(f) })
    }

    /// # Safety
    /// This function is unsafe because it requires exclusive access to the table.
    /// You must ensure that no other code is accessing the storage at the same time,
    /// for example from an interrupt that cannot preempt the caller.
    pub unsafe fn with_table_unchecked<R>(&self, f: impl FnOnce(&mut CvTable<N, Q>) -> R) -> R {
        let table = unsafe { &mut *self.table.get() };
        f(table)
    }

    /// Consumes the storage, returning the table.
    pub fn into_inner(self) -> CvTable<N, Q> {
        self.table.into_inner()
    }
}

impl<const N: usize, const Q: usize> Default for CvStorage<N, Q>
where
    BitsImpl<N>: Bits,
{
    fn default() -> Self {
        Self::new(CvTable::new())
    }
}
