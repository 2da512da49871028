//! Register bit masks.
//!
//! A [`Mask`] marks the bits of one register that belong to a field. Masks
//! must be non-empty and contiguous, so a field always has a well-defined
//! offset within its register and a width.

use core::str::FromStr;

use heapless::Vec;

use crate::split::SplitError;

/// A non-empty, contiguous bit mask within one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mask(u64);

impl Mask {
    /// The mask covering all eight bits of a byte-wide register.
    pub const BYTE: Mask = Mask(0xFF);

    /// Validates `bits` as a mask.
    ///
    /// # Errors
    /// * [`SplitError::MalformedMask`] - if `bits` is zero or has a gap
    ///
    /// # Example
    /// ```
    /// use split_cv::split::Mask;
    ///
    /// let nibble = Mask::new(0xF0).unwrap();
    /// assert_eq!(nibble.shift(), 4);
    /// assert_eq!(nibble.width(), 4);
    /// assert!(Mask::new(0b1010).is_err());
    /// ```
    pub const fn new(bits: u64) -> Result<Self, SplitError> {
        if bits == 0 {
            return Err(SplitError::MalformedMask(bits));
        }
        // contiguous iff the right-aligned run is 2^k - 1
        let run = bits >> bits.trailing_zeros();
        if run & run.wrapping_add(1) != 0 {
            return Err(SplitError::MalformedMask(bits));
        }
        Ok(Self(bits))
    }

    /// Mask of the lowest `width` bits.
    pub const fn low(width: u32) -> Result<Self, SplitError> {
        match width {
            0 => Err(SplitError::MalformedMask(0)),
            64 => Ok(Self(u64::MAX)),
            w if w > 64 => Err(SplitError::WidthOverflow {
                total: w,
                max: u64::BITS,
            }),
            w => Ok(Self((1u64 << w) - 1)),
        }
    }

    /// Raw mask bits in register position.
    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Offset of the field's lowest bit within the register.
    #[inline]
    pub const fn shift(self) -> u32 {
        self.0.trailing_zeros()
    }

    /// Number of bits in the field.
    #[inline]
    pub const fn width(self) -> u32 {
        self.0.count_ones()
    }

    /// The mask shifted down to bit 0.
    #[inline]
    pub const fn field_mask(self) -> u64 {
        self.0 >> self.shift()
    }

    /// Extracts this field from a register value, right-aligned.
    #[inline]
    pub const fn extract(self, register: u64) -> u64 {
        (register & self.0) >> self.shift()
    }

    /// Replaces this field in `register` with `field`, keeping all other bits.
    #[inline]
    pub const fn insert(self, register: u64, field: u64) -> u64 {
        (register & !self.0) | ((field << self.shift()) & self.0)
    }

    /// Parses a space-separated list of masks, one per register.
    ///
    /// # Errors
    /// * [`SplitError::MissingMask`] - if the text holds no masks
    /// * [`SplitError::TooManyRegisters`] - if more than `N` masks are listed
    /// * any error from [`Mask::from_str`]
    pub fn parse_list<const N: usize>(text: &str) -> Result<Vec<Mask, N>, SplitError> {
        let mut masks = Vec::new();
        for word in text.split_whitespace() {
            let mask = word.parse()?;
            masks.push(mask).map_err(|_| SplitError::TooManyRegisters {
                count: N + 1,
                capacity: N,
            })?;
        }
        if masks.is_empty() {
            return Err(SplitError::MissingMask);
        }
        Ok(masks)
    }

    fn from_notation(text: &str) -> Result<Self, SplitError> {
        if text.len() > 64 {
            return Err(SplitError::InvalidMaskNotation);
        }
        let mut bits = 0u64;
        for c in text.chars() {
            bits <<= 1;
            match c {
                'V' => bits |= 1,
                'X' => {}
                _ => return Err(SplitError::InvalidMaskNotation),
            }
        }
        Self::new(bits)
    }
}

/// Parses decoder notation (`"XXXXVVVV"`, most significant bit first, `V`
/// marking field bits) or a decimal / `0x` hexadecimal number.
impl FromStr for Mask {
    type Err = SplitError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SplitError::InvalidMaskNotation);
        }
        let hex = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"));
        let bits = if let Some(hex) = hex {
            u64::from_str_radix(hex, 16)
        } else if text.contains('V') || text.contains('X') {
            return Self::from_notation(text);
        } else {
            text.parse::<u64>()
        }
        .map_err(|_| SplitError::InvalidMaskNotation)?;
        Self::new(bits)
    }
}

impl Default for Mask {
    fn default() -> Self {
        Self::BYTE
    }
}
