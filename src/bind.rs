//! Binding driver - signal-to-setter glue.
//!
//! The one pattern every generated attribute wrapper replicates: perform an
//! immediate write with the signal's current value, then re-invoke the same
//! setter on every future change. The subscription is owned by the element;
//! teardown removes the listener, so a signal outliving its element never
//! writes into a recycled arena slot.
//!
//! Variants: a plain value (one-shot, nothing to subscribe to), a signal,
//! and a collection-typed signal whose setter always receives the whole
//! collection, never per-element diffs.

use crate::dom::registry;
use crate::reactive::Signal;

/// Bind a signal to a setter on the element at `index`.
///
/// Invokes `setter` immediately with the current value, then on every
/// change until the element is destroyed. This operation cannot fail; both
/// inputs are already validated by construction.
pub fn bind<T: Clone + PartialEq + 'static>(
    index: usize,
    signal: &Signal<T>,
    setter: impl Fn(usize, &T) + 'static,
) {
    let current = signal.get();
    setter(index, &current);

    let handle = signal.listen(move |value| setter(index, value));
    registry::on_destroy(index, move || handle.remove());
}

/// One-shot variant for a plain, non-reactive value.
pub fn bind_value<T>(index: usize, value: &T, setter: impl Fn(usize, &T)) {
    setter(index, value);
}

/// Collection variant: the setter receives the whole collection on every
/// change.
pub fn bind_items<T: Clone + PartialEq + 'static>(
    index: usize,
    signal: &Signal<Vec<T>>,
    setter: impl Fn(usize, &[T]) + 'static,
) {
    let current = signal.get();
    setter(index, &current);

    let handle = signal.listen(move |values| setter(index, values));
    registry::on_destroy(index, move || handle.remove());
}
