/// Decides which user-entered values a logical value accepts.
pub trait EntryPolicy {
    /// Returns true if `user` (in user units) may be entered.
    fn accepts(&self, user: u64) -> bool;
}

/// Default policy that accepts every value.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl EntryPolicy for AcceptAll {
    fn accepts(&self, _user: u64) -> bool {
        true
    }
}

/// Accepts values in `min..=max`, compared as unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangePolicy {
    pub min: u64,
    pub max: u64,
}

impl RangePolicy {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }
}

impl Default for RangePolicy {
    fn default() -> Self {
        Self::new(0, u64::MAX)
    }
}

impl EntryPolicy for RangePolicy {
    fn accepts(&self, user: u64) -> bool {
        (self.min..=self.max).contains(&user)
    }
}
