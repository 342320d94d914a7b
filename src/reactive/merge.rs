//! Binding Merge - Bidirectional synchronization of two signals.
//!
//! A merge links two independently-owned signals, possibly of different
//! types, through a pair of bridging transforms. After linking, a change on
//! either side propagates to the other exactly once; a per-link guard flag
//! stops the echo from re-triggering the originating side.
//!
//! At link time the right signal adopts the left signal's transformed
//! current value: left is authoritative for the initial reconcile.
//!
//! Each link guards only its own propagation. A merge cycle across three or
//! more cells (A↔B, B↔C, C↔A) is caller misuse and is not detected.
//!
//! # Example
//!
//! ```
//! use sprig_dom::reactive::{merge, signal};
//!
//! let celsius = signal(0.0_f64);
//! let fahrenheit = signal(0.0_f64);
//!
//! let _link = merge(
//!     &celsius,
//!     &fahrenheit,
//!     |c| c * 9.0 / 5.0 + 32.0,
//!     |f| (f - 32.0) * 5.0 / 9.0,
//! );
//!
//! celsius.set(100.0);
//! assert_eq!(fahrenheit.get(), 212.0);
//! ```

use std::cell::Cell;
use std::rc::Rc;

use super::signal::Signal;

// =============================================================================
// Merge Link
// =============================================================================

/// Live bidirectional link between two signals.
///
/// Dropping the link does NOT tear the merge down; merges outlive the value
/// returned here and last as long as both cells. Call `unlink` for the rare
/// explicit teardown.
pub struct MergeLink {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl MergeLink {
    /// Explicitly tear the link down, removing both direction listeners.
    pub fn unlink(mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

// =============================================================================
// Merge
// =============================================================================

/// Link `left` and `right` bidirectionally.
///
/// `right` immediately adopts `left_to_right(left.get())`; afterwards every
/// change on one side is transformed and written to the other. Propagation
/// is synchronous: an observer of `right` sees the update before the
/// triggering `left.set` returns.
pub fn merge<L, R>(
    left: &Signal<L>,
    right: &Signal<R>,
    left_to_right: impl Fn(&L) -> R + 'static,
    right_to_left: impl Fn(&R) -> L + 'static,
) -> MergeLink
where
    L: Clone + PartialEq + 'static,
    R: Clone + PartialEq + 'static,
{
    // Reconcile before installing listeners so the initial write cannot echo.
    right.set(left_to_right(&left.get()));

    // One guard per link: set while a propagation is in flight in either
    // direction, so the far side's write never re-fires the near side.
    let propagating = Rc::new(Cell::new(false));

    let right_for_l2r = right.clone();
    let guard_l2r = propagating.clone();
    let l2r = left.listen(move |v| {
        if guard_l2r.get() {
            return;
        }
        guard_l2r.set(true);
        right_for_l2r.set(left_to_right(v));
        guard_l2r.set(false);
    });

    let left_for_r2l = left.clone();
    let guard_r2l = propagating;
    let r2l = right.listen(move |v| {
        if guard_r2l.get() {
            return;
        }
        guard_r2l.set(true);
        left_for_r2l.set(right_to_left(v));
        guard_r2l.set(false);
    });

    MergeLink {
        teardown: Some(Box::new(move || {
            l2r.remove();
            r2l.remove();
        })),
    }
}

/// Link two signals of the same type with identity transforms.
pub fn merge_same<T: Clone + PartialEq + 'static>(
    left: &Signal<T>,
    right: &Signal<T>,
) -> MergeLink {
    merge(left, right, |v| v.clone(), |v| v.clone())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::signal;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_initial_reconcile_left_authoritative() {
        let left = signal(3);
        let right = signal(99);

        let _link = merge_same(&left, &right);
        assert_eq!(right.get(), 3);
    }

    #[test]
    fn test_propagation_both_directions() {
        let left = signal(0);
        let right = signal(0);
        let _link = merge_same(&left, &right);

        left.set(5);
        assert_eq!(right.get(), 5);

        right.set(9);
        assert_eq!(left.get(), 9);
    }

    #[test]
    fn test_transforms() {
        let number = signal(7_i64);
        let text = signal(String::new());

        let _link = merge(
            &number,
            &text,
            |n| n.to_string(),
            |s| s.parse().unwrap_or(0),
        );
        assert_eq!(text.get(), "7");

        text.set("42".to_string());
        assert_eq!(number.get(), 42);
    }

    #[test]
    fn test_no_feedback_amplification() {
        let left = signal(0);
        let right = signal(0);
        let _link = merge_same(&left, &right);

        let left_notifies = Rc::new(Cell::new(0));
        let right_notifies = Rc::new(Cell::new(0));

        let ln = left_notifies.clone();
        let _hl = left.listen(move |_| ln.set(ln.get() + 1));
        let rn = right_notifies.clone();
        let _hr = right.listen(move |_| rn.set(rn.get() + 1));

        left.set(1);

        // One originating change, one propagated change, no echo.
        assert_eq!(left_notifies.get(), 1);
        assert_eq!(right_notifies.get(), 1);
    }

    #[test]
    fn test_observer_sees_far_side_before_set_returns() {
        let left = signal(0);
        let right = signal(0);
        let _link = merge_same(&left, &right);

        let observed = Rc::new(Cell::new(-1));
        let observed_clone = observed.clone();
        let right_clone = right.clone();
        let _h = left.listen(move |_| {
            // Merge listeners were registered before this one, so by the
            // time we run the far side already carries the new value.
            observed_clone.set(right_clone.get());
        });

        left.set(8);
        assert_eq!(observed.get(), 8);
    }

    #[test]
    fn test_self_merge_does_not_loop() {
        let cell = signal(1);
        let _link = merge_same(&cell, &cell.clone());

        cell.set(2);
        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn test_unlink() {
        let left = signal(0);
        let right = signal(0);
        let link = merge_same(&left, &right);

        link.unlink();
        left.set(7);
        assert_eq!(right.get(), 0);
    }

    #[test]
    fn test_dropping_link_keeps_merge_alive() {
        let left = signal(0);
        let right = signal(0);
        drop(merge_same(&left, &right));

        left.set(4);
        assert_eq!(right.get(), 4);
    }
}
