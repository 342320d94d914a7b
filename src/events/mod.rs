//! Events - Per-element handler slots and host callback lifecycle.
//!
//! Every (element, event type) pair owns at most one slot: the current
//! user handler plus the guard for the one host-installed dispatcher.
//! Re-registering replaces both together; the old host callback is released
//! before the new one is installed, so exactly one dispatcher is live at
//! any time. Destroying an element drops its slots, and each dropped guard
//! releases its host callback, so teardown walks nothing by hand.
//!
//! The dispatcher looks the handler up at invoke time, so a handler swap
//! can never pair a stale callback with a fresh handler or vice versa.
//!
//! # Edit coalescing
//!
//! Hosts report one logical edit twice: a raw `input` event followed by a
//! `change`. The `input` handling sets the element's `EDIT_PENDING` flag
//! and re-derives the cached value; a `change` arriving with the flag set
//! clears it and skips the re-derivation. Handlers run in both cases.

use std::rc::Rc;

use crate::dom::element::NodeFlags;
use crate::dom::host::{self, DispatcherGuard, HostEvent};
use crate::dom::registry;
use crate::handle::ElementHandle;

// =============================================================================
// Types
// =============================================================================

/// Keyboard modifier state attached to an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }

    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }
}

/// Typed event payload delivered to user handlers.
///
/// Constructed from host-native event data; fields not meaningful for an
/// event family stay `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// The element the handler was registered on.
    pub target: ElementHandle,
    /// Event type name (e.g. "click", "input", "change", "keydown").
    pub event_type: String,
    /// Key name for keyboard events.
    pub key: Option<String>,
    pub modifiers: Modifiers,
    /// Pointer coordinates for mouse events.
    pub coords: Option<(f64, f64)>,
    /// Control value for input/change events.
    pub value: Option<String>,
}

impl Event {
    /// Build a typed event from raw host event data.
    pub fn from_host(target: ElementHandle, event_type: &str, raw: HostEvent) -> Self {
        Event {
            target,
            event_type: event_type.to_string(),
            key: raw.key,
            modifiers: raw.modifiers,
            coords: raw.coords,
            value: raw.value,
        }
    }
}

/// Handler invoked with each typed event.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Slot for one (element, event type) pair.
pub struct EventSlot {
    pub handler: EventHandler,
    /// Guard for the installed host dispatcher; `None` when headless.
    pub dispatcher: Option<DispatcherGuard>,
}

// =============================================================================
// Registration
// =============================================================================

/// Register `handler` for `event_type` on the element at `index`.
///
/// Replaces any previous handler for the same event type; the previous host
/// dispatcher is released before the new one is installed.
pub fn on(index: usize, event_type: &str, handler: impl Fn(&Event) + 'static) {
    let handler: EventHandler = Rc::new(handler);

    // Store the handler and pull the old dispatcher out in one arena visit.
    let Some(old_dispatcher) = registry::with_element(index, |el| {
        let slot = el
            .event_slots
            .entry(event_type.to_string())
            .or_insert_with(|| EventSlot { handler: handler.clone(), dispatcher: None });
        slot.handler = handler.clone();
        slot.dispatcher.take()
    }) else {
        return; // element not allocated
    };

    // Release the superseded host callback outside the arena borrow.
    drop(old_dispatcher);

    // Install a fresh dispatcher when the element is mirrored onto a host.
    let host_node = registry::with_element(index, |el| el.host_node).flatten();
    if let Some(node) = host_node {
        let event_name = event_type.to_string();
        let guard = host::with_host(|h| {
            let dispatch_type = event_name.clone();
            let callback = h.install_callback(
                node,
                &event_name,
                Box::new(move |raw| {
                    dispatch(index, &dispatch_type, raw);
                }),
            );
            DispatcherGuard::new(callback)
        });
        if let Some(guard) = guard {
            registry::with_element(index, |el| {
                if let Some(slot) = el.event_slots.get_mut(event_type) {
                    slot.dispatcher = Some(guard);
                }
            });
        }
    }
}

/// Remove the handler for `event_type`, releasing its host dispatcher.
pub fn off(index: usize, event_type: &str) {
    let slot = registry::with_element(index, |el| el.event_slots.remove(event_type)).flatten();
    // Dropped here, outside the arena borrow; the guard releases the host
    // callback on drop.
    drop(slot);
}

/// Whether a handler is bound for `event_type`.
pub fn is_bound(index: usize, event_type: &str) -> bool {
    registry::with_element(index, |el| el.event_slots.contains_key(event_type)).unwrap_or(false)
}

// =============================================================================
// Dispatch
// =============================================================================

/// Deliver a raw host event to the element at `index`.
///
/// This is the host dispatcher's entry point and the direct entry point for
/// headless embeddings and tests. Returns true if a handler was invoked.
pub fn dispatch(index: usize, event_type: &str, raw: HostEvent) -> bool {
    // Value re-derivation with input/change coalescing, before the handler
    // runs, so the handler observes the already-updated cached value.
    let handler = registry::with_element(index, |el| {
        match event_type {
            "input" => {
                el.flags.insert(NodeFlags::EDIT_PENDING);
                if let Some(value) = &raw.value {
                    el.attributes.insert("value".to_string(), value.clone());
                }
            }
            "change" => {
                if el.flags.contains(NodeFlags::EDIT_PENDING) {
                    // Same logical edit already processed via `input`.
                    el.flags.remove(NodeFlags::EDIT_PENDING);
                } else if let Some(value) = &raw.value {
                    el.attributes.insert("value".to_string(), value.clone());
                }
            }
            _ => {}
        }
        el.event_slots.get(event_type).map(|slot| slot.handler.clone())
    });

    let Some(Some(handler)) = handler else {
        return false;
    };

    let event = Event::from_host(ElementHandle::from_index(index), event_type, raw);
    handler(&event);
    true
}

/// Read the element's current value.
///
/// Prefers the live host property; falls back to the cached `value`
/// attribute; an unattached, never-edited control reads as empty ("no user
/// input yet", not an error).
pub fn value_of(index: usize) -> String {
    let host_node = registry::with_element(index, |el| el.host_node).flatten();
    if let Some(node) = host_node {
        if let Some(Some(value)) = host::with_host(|h| h.get_property(node, "value")) {
            return value;
        }
    }
    registry::with_element(index, |el| el.attributes.get("value").cloned())
        .flatten()
        .unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::registry::{allocate, reset_dom};
    use std::cell::{Cell, RefCell};

    fn input_event(value: &str) -> HostEvent {
        HostEvent { value: Some(value.to_string()), ..HostEvent::default() }
    }

    #[test]
    fn test_dispatch_reaches_handler() {
        reset_dom();
        let index = allocate("button");

        let clicks = Rc::new(Cell::new(0));
        let clicks_clone = clicks.clone();
        on(index, "click", move |event| {
            assert_eq!(event.event_type, "click");
            clicks_clone.set(clicks_clone.get() + 1);
        });

        assert!(dispatch(index, "click", HostEvent::default()));
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_dispatch_without_handler_is_false() {
        reset_dom();
        let index = allocate("div");
        assert!(!dispatch(index, "click", HostEvent::default()));
    }

    #[test]
    fn test_reregistration_replaces_handler() {
        reset_dom();
        let index = allocate("button");

        let log = Rc::new(RefCell::new(Vec::new()));

        let log_a = log.clone();
        on(index, "click", move |_| log_a.borrow_mut().push("old"));
        let log_b = log.clone();
        on(index, "click", move |_| log_b.borrow_mut().push("new"));

        dispatch(index, "click", HostEvent::default());
        assert_eq!(*log.borrow(), vec!["new"]);
    }

    #[test]
    fn test_off_unbinds() {
        reset_dom();
        let index = allocate("button");

        let fired = Rc::new(Cell::new(false));
        let fired_clone = fired.clone();
        on(index, "click", move |_| fired_clone.set(true));
        assert!(is_bound(index, "click"));

        off(index, "click");
        assert!(!is_bound(index, "click"));
        dispatch(index, "click", HostEvent::default());
        assert!(!fired.get());
    }

    #[test]
    fn test_input_then_change_coalesces_value_derivation() {
        reset_dom();
        let index = allocate("input");
        on(index, "input", |_| {});
        on(index, "change", |_| {});

        dispatch(index, "input", input_event("hello"));
        assert_eq!(value_of(index), "hello");

        // The paired change reports a stale value; the pending edit wins.
        dispatch(index, "change", input_event("stale"));
        assert_eq!(value_of(index), "hello");

        // A change with no preceding input re-derives normally.
        dispatch(index, "change", input_event("fresh"));
        assert_eq!(value_of(index), "fresh");
    }

    #[test]
    fn test_value_of_unattached_is_empty() {
        reset_dom();
        let index = allocate("input");
        assert_eq!(value_of(index), "");
    }

    #[test]
    fn test_event_carries_key_and_modifiers() {
        reset_dom();
        let index = allocate("input");

        let seen = Rc::new(RefCell::new(None));
        let seen_clone = seen.clone();
        on(index, "keydown", move |event| {
            *seen_clone.borrow_mut() = Some((event.key.clone(), event.modifiers));
        });

        dispatch(
            index,
            "keydown",
            HostEvent {
                key: Some("Enter".to_string()),
                modifiers: Modifiers::ctrl(),
                ..HostEvent::default()
            },
        );

        assert_eq!(
            seen.borrow().clone(),
            Some((Some("Enter".to_string()), Modifiers::ctrl()))
        );
    }
}
