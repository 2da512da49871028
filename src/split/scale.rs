use crate::split::SplitError;

/// Affine transform between device units and user units.
///
/// `user = raw * factor + offset`, `raw = (user - offset) / factor`. The
/// inverse truncates toward zero and is exact only for values produced by
/// [`LinearScale::to_user`]. Arithmetic wraps on overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearScale {
    factor: i64,
    offset: i64,
}

impl LinearScale {
    /// Factor one, offset zero.
    pub const IDENTITY: LinearScale = LinearScale {
        factor: 1,
        offset: 0,
    };

    /// # Errors
    /// * [`SplitError::ZeroFactor`] - if `factor` is zero
    pub const fn new(factor: i64, offset: i64) -> Result<Self, SplitError> {
        if factor == 0 {
            return Err(SplitError::ZeroFactor);
        }
        Ok(Self { factor, offset })
    }

    #[inline]
    pub const fn factor(&self) -> i64 {
        self.factor
    }

    #[inline]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    #[inline]
    pub const fn to_user(&self, raw: i64) -> i64 {
        raw.wrapping_mul(self.factor).wrapping_add(self.offset)
    }

    #[inline]
    pub const fn to_raw(&self, user: i64) -> i64 {
        user.wrapping_sub(self.offset).wrapping_div(self.factor)
    }
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}
