/// Errors reported by layout construction and the value API.
///
/// Register I/O failures are not errors: they surface as aggregate state
/// changes on the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SplitError {
    /// Mask is zero or its set bits are not contiguous.
    MalformedMask(u64),
    /// Mask text is neither `V`/`X` notation nor a number.
    InvalidMaskNotation,
    /// No mask was supplied for the register list.
    MissingMask,
    /// Layout has no registers.
    NoRegisters,
    /// More registers than the layout capacity.
    TooManyRegisters { count: usize, capacity: usize },
    /// Cumulative field width exceeds the logical value capacity.
    WidthOverflow { total: u32, max: u32 },
    /// Scale factor of zero.
    ZeroFactor,
    /// Register at this layout position does not exist in the bank.
    UnknownRegister(usize),
    /// A read or write transaction is already in flight.
    TransactionActive,
    /// Write requested on a read-only value.
    ReadOnly,
    /// Value was disposed and no longer tracks its registers.
    Disposed,
    /// Text is not an unsigned decimal number.
    InvalidNumber,
    /// Value rejected by the entry policy.
    OutOfRange,
}

impl core::fmt::Display for SplitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SplitError::MalformedMask(mask) => {
                write!(f, "mask {mask:#x} is empty or not contiguous")
            }
            SplitError::InvalidMaskNotation => write!(f, "mask text is not valid notation"),
            SplitError::MissingMask => write!(f, "no mask supplied for registers"),
            SplitError::NoRegisters => write!(f, "layout has no registers"),
            SplitError::TooManyRegisters { count, capacity } => {
                write!(f, "{count} registers exceed layout capacity {capacity}")
            }
            SplitError::WidthOverflow { total, max } => write!(
                f,
                "layout requires {total} bits, which exceeds the {max} bit capacity of the value"
            ),
            SplitError::ZeroFactor => write!(f, "scale factor must be non-zero"),
            SplitError::UnknownRegister(pos) => {
                write!(f, "register at position {pos} is not in the bank")
            }
            SplitError::TransactionActive => write!(f, "transaction already in progress"),
            SplitError::ReadOnly => write!(f, "value is read-only"),
            SplitError::Disposed => write!(f, "value has been disposed"),
            SplitError::InvalidNumber => write!(f, "text is not an unsigned number"),
            SplitError::OutOfRange => write!(f, "value rejected by entry policy"),
        }
    }
}
