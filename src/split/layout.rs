use heapless::Vec;

use crate::split::{Mask, SplitError};

/// Bit capacity of a logical value.
pub const VALUE_BITS: u32 = u64::BITS;

/// One physical register and the bits of it this value occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterRef<I> {
    pub id: I,
    pub mask: Mask,
}

impl<I> RegisterRef<I> {
    pub const fn new(id: I, mask: Mask) -> Self {
        Self { id, mask }
    }
}

/// A register's field within the logical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldItem<I> {
    register: RegisterRef<I>,
    start_offset: u32,
}

impl<I: Copy> FieldItem<I> {
    /// Register address.
    #[inline]
    pub fn id(&self) -> I {
        self.register.id
    }

    #[inline]
    pub fn mask(&self) -> Mask {
        self.register.mask
    }

    /// Bit position of this field within the logical value.
    #[inline]
    pub fn start_offset(&self) -> u32 {
        self.start_offset
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.register.mask.width()
    }
}

/// Ordered registers of one logical value with their cumulative bit offsets.
///
/// The first register holds the least significant field. Built once and never
/// mutated afterwards.
///
/// # Const Generics
/// - `N`: Maximum number of registers
#[derive(Debug, Clone)]
pub struct FieldLayout<I, const N: usize> {
    items: Vec<FieldItem<I>, N>,
    total_width: u32,
}

impl<I: Copy, const N: usize> FieldLayout<I, N> {
    /// Builds a layout from registers listed least significant first.
    ///
    /// # Errors
    /// * [`SplitError::NoRegisters`] - if `registers` is empty
    /// * [`SplitError::TooManyRegisters`] - if more than `N` registers are given
    /// * [`SplitError::WidthOverflow`] - if the fields need more than
    ///   [`VALUE_BITS`] bits
    pub fn build(registers: &[RegisterRef<I>]) -> Result<Self, SplitError> {
        if registers.is_empty() {
            return Err(SplitError::NoRegisters);
        }
        if registers.len() > N {
            return Err(SplitError::TooManyRegisters {
                count: registers.len(),
                capacity: N,
            });
        }

        let mut items = Vec::new();
        let mut offset = 0u32;
        for &register in registers {
            items
                .push(FieldItem {
                    register,
                    start_offset: offset,
                })
                .map_err(|_| SplitError::TooManyRegisters {
                    count: registers.len(),
                    capacity: N,
                })?;
            offset += register.mask.width();
        }

        if offset > VALUE_BITS {
            return Err(SplitError::WidthOverflow {
                total: offset,
                max: VALUE_BITS,
            });
        }

        Ok(Self {
            items,
            total_width: offset,
        })
    }

    /// Builds a layout pairing each id with a mask.
    ///
    /// When fewer masks than ids are given, the last mask is reused for every
    /// remaining register.
    ///
    /// # Errors
    /// * [`SplitError::MissingMask`] - if `masks` is empty
    /// * any error from [`FieldLayout::build`]
    pub fn with_masks(ids: &[I], masks: &[Mask]) -> Result<Self, SplitError> {
        let last = masks.last().copied().ok_or(SplitError::MissingMask)?;
        if ids.len() > N {
            return Err(SplitError::TooManyRegisters {
                count: ids.len(),
                capacity: N,
            });
        }

        let mut registers: Vec<RegisterRef<I>, N> = Vec::new();
        for (i, &id) in ids.iter().enumerate() {
            let mask = masks.get(i).copied().unwrap_or(last);
            registers
                .push(RegisterRef::new(id, mask))
                .map_err(|_| SplitError::TooManyRegisters {
                    count: ids.len(),
                    capacity: N,
                })?;
        }
        Self::build(&registers)
    }

    /// Number of registers.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a built layout.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all field widths.
    #[inline]
    pub fn total_width(&self) -> u32 {
        self.total_width
    }

    #[inline]
    pub fn item(&self, position: usize) -> Option<&FieldItem<I>> {
        self.items.get(position)
    }

    #[inline]
    pub fn items(&self) -> &[FieldItem<I>] {
        &self.items
    }

    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.items.iter().map(|item| item.id())
    }
}

impl<I: Copy + PartialEq, const N: usize> FieldLayout<I, N> {
    /// Position of the first field stored in register `id`.
    pub fn position(&self, id: I) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Returns true if register `id` holds any field of this layout.
    pub fn contains(&self, id: I) -> bool {
        self.position(id).is_some()
    }
}
