//! Conversion between a logical value and its per-register fields.

use heapless::Vec;

use crate::split::{FieldLayout, Mask};

/// Read-modify-write of one field into an existing register value.
///
/// Bits of `old` outside `mask` belong to other values and are preserved
/// exactly; bits of `field` beyond the mask width are dropped.
#[inline]
pub const fn combine(old: u64, field: u64, mask: Mask) -> u64 {
    mask.insert(old, field)
}

impl<I: Copy, const N: usize> FieldLayout<I, N> {
    /// Splits `logical` into right-aligned field values, one per register.
    pub fn encode_fields(&self, logical: u64) -> Vec<u64, N> {
        self.items()
            .iter()
            .map(|item| (logical >> item.start_offset()) & item.mask().field_mask())
            .collect()
    }

    /// Splits `logical` into per-register values with each field placed at
    /// its mask's position and all other register bits clear.
    ///
    /// Bits of `logical` above [`FieldLayout::total_width`] are dropped.
    pub fn encode(&self, logical: u64) -> Vec<u64, N> {
        self.items()
            .iter()
            .map(|item| {
                let field = (logical >> item.start_offset()) & item.mask().field_mask();
                field << item.mask().shift()
            })
            .collect()
    }

    /// Reassembles the logical value from whole register values.
    ///
    /// Bits outside each register's mask are ignored. Extra values beyond the
    /// layout length are ignored; missing ones contribute nothing.
    pub fn decode(&self, values: &[u64]) -> u64 {
        self.items()
            .iter()
            .zip(values)
            .fold(0, |acc, (item, &value)| {
                acc | (item.mask().extract(value) << item.start_offset())
            })
    }

    /// Like [`FieldLayout::decode`], fetching each register's value by id.
    pub fn decode_with(&self, mut value_of: impl FnMut(I) -> u64) -> u64 {
        self.items().iter().fold(0, |acc, item| {
            acc | (item.mask().extract(value_of(item.id())) << item.start_offset())
        })
    }
}
