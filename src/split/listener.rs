use crate::split::RegisterState;

/// Receives changes of a logical value.
pub trait ValueListener {
    /// The value changed from `old` to `new`. Never called with equal values.
    fn value_changed(&mut self, old: i64, new: i64);
    /// The aggregate register state changed.
    fn state_changed(&mut self, state: RegisterState);
    /// A transaction started (`true`) or ended (`false`).
    fn busy_changed(&mut self, busy: bool);
}

/// No-op listener that discards all changes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoListener;

impl ValueListener for NoListener {
    fn value_changed(&mut self, _old: i64, _new: i64) {}
    fn state_changed(&mut self, _state: RegisterState) {}
    fn busy_changed(&mut self, _busy: bool) {}
}

impl<L: ValueListener> ValueListener for &mut L {
    fn value_changed(&mut self, old: i64, new: i64) {
        (**self).value_changed(old, new)
    }

    fn state_changed(&mut self, state: RegisterState) {
        (**self).state_changed(state)
    }

    fn busy_changed(&mut self, busy: bool) {
        (**self).busy_changed(busy)
    }
}
