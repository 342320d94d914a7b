//! Signal - Observable mutable value cell.
//!
//! The leaf primitive of the reactive layer. A `Signal<T>` holds one value
//! and a registry of change listeners. Writes notify synchronously, in
//! registration order, on the calling thread.
//!
//! # Equality policy
//!
//! `set` suppresses notification when the new value compares equal to the
//! old one (`T: PartialEq` is a bound on the type). Callers that need an
//! unconditional notification use `set_force`. One policy, everywhere.
//!
//! # Example
//!
//! ```
//! use sprig_dom::reactive::signal;
//!
//! let count = signal(0);
//! let handle = count.listen(|v| println!("count is now {v}"));
//!
//! count.set(1); // notifies
//! count.set(1); // equal value, no notification
//! handle.remove();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

// =============================================================================
// Listener Storage
// =============================================================================

enum ListenerKind<T> {
    /// Called with the new value only.
    New(Rc<dyn Fn(&T)>),
    /// Called with (old, new).
    OldNew(Rc<dyn Fn(&T, &T)>),
}

impl<T> Clone for ListenerKind<T> {
    fn clone(&self) -> Self {
        match self {
            ListenerKind::New(f) => ListenerKind::New(f.clone()),
            ListenerKind::OldNew(f) => ListenerKind::OldNew(f.clone()),
        }
    }
}

struct SignalInner<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<(usize, ListenerKind<T>)>>,
    next_listener_id: Cell<usize>,
}

// =============================================================================
// Signal
// =============================================================================

/// Observable mutable cell holding a single value of type `T`.
///
/// Cheap to clone: clones share the same underlying cell (single-threaded
/// shared ownership via `Rc`).
pub struct Signal<T: Clone + PartialEq + 'static> {
    inner: Rc<SignalInner<T>>,
}

impl<T: Clone + PartialEq + 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Signal { inner: self.inner.clone() }
    }
}

/// Create a signal with an initial value.
pub fn signal<T: Clone + PartialEq + 'static>(initial: T) -> Signal<T> {
    Signal {
        inner: Rc::new(SignalInner {
            value: RefCell::new(initial),
            listeners: RefCell::new(Vec::new()),
            next_listener_id: Cell::new(0),
        }),
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Get the current value. No side effects.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Set a new value, notifying listeners if it differs from the old one.
    pub fn set(&self, new: T) {
        let equal = *self.inner.value.borrow() == new;
        if equal {
            return;
        }
        self.store_and_notify(new);
    }

    /// Set a new value and notify unconditionally, equal or not.
    pub fn set_force(&self, new: T) {
        self.store_and_notify(new);
    }

    /// Apply a function to the current value and store the result.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let new = f(&self.inner.value.borrow());
        self.set(new);
    }

    fn store_and_notify(&self, new: T) {
        let old = {
            let mut value = self.inner.value.borrow_mut();
            std::mem::replace(&mut *value, new.clone())
        };

        // Snapshot so listeners may subscribe/unsubscribe from inside a
        // callback without corrupting iteration. Listeners added during
        // notification do not see the in-flight change; listeners removed
        // during notification are skipped if not yet reached.
        let snapshot: Vec<(usize, ListenerKind<T>)> =
            self.inner.listeners.borrow().clone();

        for (id, listener) in snapshot {
            let still_registered = self
                .inner
                .listeners
                .borrow()
                .iter()
                .any(|(lid, _)| *lid == id);
            if !still_registered {
                continue;
            }
            match listener {
                ListenerKind::New(f) => f(&new),
                ListenerKind::OldNew(f) => f(&old, &new),
            }
        }
    }

    /// Register a listener called with each new value.
    ///
    /// Does not fire for the current value; only future changes.
    pub fn listen(&self, f: impl Fn(&T) + 'static) -> ListenerHandle<T> {
        self.push_listener(ListenerKind::New(Rc::new(f)))
    }

    /// Register a listener called with (old, new) on each change.
    pub fn listen_old_new(&self, f: impl Fn(&T, &T) + 'static) -> ListenerHandle<T> {
        self.push_listener(ListenerKind::OldNew(Rc::new(f)))
    }

    fn push_listener(&self, kind: ListenerKind<T>) -> ListenerHandle<T> {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, kind));
        ListenerHandle {
            inner: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug + 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

// =============================================================================
// Listener Handle
// =============================================================================

/// Token returned by `listen`; removes the listener on request.
///
/// Holds only a weak reference to the signal, so keeping a handle does not
/// keep the cell alive.
pub struct ListenerHandle<T: Clone + PartialEq + 'static> {
    inner: Weak<SignalInner<T>>,
    id: usize,
}

impl<T: Clone + PartialEq + 'static> ListenerHandle<T> {
    /// Remove the listener. Safe to call after the signal is gone, and safe
    /// to call from inside a notification of the same signal.
    pub fn remove(self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
