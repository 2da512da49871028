use core::marker::PhantomData;

use bitmaps::{Bits, BitsImpl};

use crate::split::{
    AcceptAll, EntryPolicy, FieldLayout, LinearScale, Mask, NoListener, RegisterRef, SplitError,
    SplitValue, ValueListener,
};

// Builder states
pub struct NeedCapacity;
pub struct NeedLayout<const N: usize>;
pub struct NeedScale;
pub struct NeedPolicy;
pub struct NeedListener;
pub struct Ready;

#[derive(Debug, Clone, Copy)]
struct Settings {
    scale: LinearScale,
    read_only: bool,
    field_shrink: bool,
}

/// Type-state builder for [`SplitValue`].
///
/// `Lay`, `P` and `L` are `()` until the layout, entry policy and listener
/// are supplied.
pub struct SplitValueBuilder<Lay, P, L, State> {
    layout: Lay,
    policy: P,
    listener: L,
    settings: Settings,
    _state: PhantomData<State>,
}

fn assemble<Lay, P, L, State>(
    layout: Lay,
    policy: P,
    listener: L,
    settings: Settings,
) -> SplitValueBuilder<Lay, P, L, State> {
    SplitValueBuilder {
        layout,
        policy,
        listener,
        settings,
        _state: PhantomData,
    }
}

// Start the builder
impl SplitValueBuilder<(), (), (), NeedCapacity> {
    pub fn new() -> Self {
        assemble(
            (),
            (),
            (),
            Settings {
                scale: LinearScale::IDENTITY,
                read_only: false,
                field_shrink: false,
            },
        )
    }
}

impl Default for SplitValueBuilder<(), (), (), NeedCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

// Switches available in every state
impl<Lay, P, L, State> SplitValueBuilder<Lay, P, L, State> {
    /// Refuse writes to the device.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.settings.read_only = read_only;
        self
    }

    /// Apply edits first register to last.
    pub fn field_shrink(mut self, field_shrink: bool) -> Self {
        self.settings.field_shrink = field_shrink;
        self
    }
}

// Set register capacity
impl SplitValueBuilder<(), (), (), NeedCapacity> {
    /// Set the maximum number of registers.
    pub fn capacity<const N: usize>(self) -> SplitValueBuilder<(), (), (), NeedLayout<N>>
    where
        BitsImpl<N>: Bits,
    {
        assemble((), (), (), self.settings)
    }
}

// Set registers
impl<const N: usize> SplitValueBuilder<(), (), (), NeedLayout<N>>
where
    BitsImpl<N>: Bits,
{
    /// Set the registers, least significant field first.
    ///
    /// # Errors
    /// As for [`FieldLayout::build`].
    pub fn registers<I: Copy>(
        self,
        registers: &[RegisterRef<I>],
    ) -> Result<SplitValueBuilder<FieldLayout<I, N>, (), (), NeedScale>, SplitError> {
        let layout = FieldLayout::build(registers)?;
        Ok(assemble(layout, (), (), self.settings))
    }

    /// Set register ids and masks; the last mask covers any remaining ids.
    ///
    /// # Errors
    /// As for [`FieldLayout::with_masks`].
    pub fn split_masks<I: Copy>(
        self,
        ids: &[I],
        masks: &[Mask],
    ) -> Result<SplitValueBuilder<FieldLayout<I, N>, (), (), NeedScale>, SplitError> {
        let layout = FieldLayout::with_masks(ids, masks)?;
        Ok(assemble(layout, (), (), self.settings))
    }

    /// Set register ids and a space separated mask list such as
    /// `"XXXXVVVV VVVVVVVV"`.
    ///
    /// # Errors
    /// As for [`Mask::parse_list`] and [`FieldLayout::with_masks`].
    pub fn split_mask_text<I: Copy>(
        self,
        ids: &[I],
        masks: &str,
    ) -> Result<SplitValueBuilder<FieldLayout<I, N>, (), (), NeedScale>, SplitError> {
        let masks = Mask::parse_list::<N>(masks)?;
        self.split_masks(ids, &masks)
    }
}

// Set scale
impl<I, const N: usize> SplitValueBuilder<FieldLayout<I, N>, (), (), NeedScale> {
    /// Set the transform `user = raw * factor + offset`.
    ///
    /// # Errors
    /// * [`SplitError::ZeroFactor`] - if `factor` is zero
    pub fn scale(
        self,
        factor: i64,
        offset: i64,
    ) -> Result<SplitValueBuilder<FieldLayout<I, N>, (), (), NeedPolicy>, SplitError> {
        let settings = Settings {
            scale: LinearScale::new(factor, offset)?,
            ..self.settings
        };
        Ok(assemble(self.layout, (), (), settings))
    }

    /// Use factor one, offset zero.
    pub fn unit_scale(self) -> SplitValueBuilder<FieldLayout<I, N>, (), (), NeedPolicy> {
        assemble(self.layout, (), (), self.settings)
    }
}

// Set entry policy
impl<I, const N: usize> SplitValueBuilder<FieldLayout<I, N>, (), (), NeedPolicy> {
    pub fn entry_policy<P: EntryPolicy>(
        self,
        policy: P,
    ) -> SplitValueBuilder<FieldLayout<I, N>, P, (), NeedListener> {
        assemble(self.layout, policy, (), self.settings)
    }

    /// Accept every user-entered value
    pub fn accept_all(self) -> SplitValueBuilder<FieldLayout<I, N>, AcceptAll, (), NeedListener> {
        self.entry_policy(AcceptAll)
    }
}

// Set listener
impl<I, P, const N: usize> SplitValueBuilder<FieldLayout<I, N>, P, (), NeedListener>
where
    P: EntryPolicy,
{
    pub fn listener<L: ValueListener>(
        self,
        listener: L,
    ) -> SplitValueBuilder<FieldLayout<I, N>, P, L, Ready> {
        assemble(self.layout, self.policy, listener, self.settings)
    }

    /// Discard value, state and busy changes
    pub fn no_listener(self) -> SplitValueBuilder<FieldLayout<I, N>, P, NoListener, Ready> {
        self.listener(NoListener)
    }
}

// Build the final value
impl<I, P, L, const N: usize> SplitValueBuilder<FieldLayout<I, N>, P, L, Ready>
where
    I: Copy + PartialEq,
    P: EntryPolicy,
    L: ValueListener,
    BitsImpl<N>: Bits,
{
    pub fn build(self) -> SplitValue<I, P, L, N> {
        SplitValue::new(
            self.layout,
            self.settings.scale,
            self.policy,
            self.listener,
            self.settings.read_only,
            self.settings.field_shrink,
        )
    }
}
