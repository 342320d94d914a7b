//! Host boundary - the externally-owned document this core mutates.
//!
//! The live document tree belongs to a host runtime (a browser, a webview,
//! an embedding shell). This module owns the crate's only handle to it: a
//! `HostBackend` trait object attached per thread. Everything above talks
//! to the host through free functions here and falls back to the local
//! element cache when no host is attached (headless evaluation).
//!
//! Host-installed event callbacks are the one resource the host will not
//! clean up for us. Each installed callback lives behind a
//! `DispatcherGuard` whose `Drop` releases it, so structural teardown of an
//! element frees every callback without a manual checklist.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::events::Modifiers;

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque handle to one native node, assigned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HostNode(pub u64);

/// Opaque handle to one installed native event callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HostCallback(pub u64);

// =============================================================================
// Host Event
// =============================================================================

/// Raw event data handed over by the host when a native callback fires.
///
/// The exact shape per event family is a pass-through concern; this carries
/// the common fields and the events module turns it into a typed `Event`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HostEvent {
    /// Key name for keyboard events (e.g. "a", "Enter").
    pub key: Option<String>,
    /// Modifier key state.
    pub modifiers: Modifiers,
    /// Pointer coordinates for mouse events.
    pub coords: Option<(f64, f64)>,
    /// Current control value for input/change events.
    pub value: Option<String>,
}

// =============================================================================
// Host Backend Trait
// =============================================================================

/// Everything this core needs from the host document environment.
pub trait HostBackend {
    /// Create a native node for the given tag name.
    fn create_node(&self, tag: &str) -> HostNode;

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already attached elsewhere.
    fn append_node(&self, parent: HostNode, child: HostNode);

    /// Append `node` under the document root.
    fn append_to_root(&self, node: HostNode);

    /// Detach `node` from the document.
    fn remove_node(&self, node: HostNode);

    fn set_attribute(&self, node: HostNode, key: &str, value: &str);

    fn remove_attribute(&self, node: HostNode, key: &str);

    fn set_style(&self, node: HostNode, property: &str, value: &str);

    /// Write a native numeric property slot. Returns false when the node
    /// has no such slot, in which case the caller falls back to the string
    /// attribute path.
    fn set_property_number(&self, node: HostNode, key: &str, value: f64) -> bool;

    /// Read a native string property (e.g. a live input's `value`).
    fn get_property(&self, node: HostNode, key: &str) -> Option<String>;

    /// Install a native callback for `event_type` on `node`. The host must
    /// invoke `dispatcher` with the raw event data each time it fires.
    fn install_callback(
        &self,
        node: HostNode,
        event_type: &str,
        dispatcher: Box<dyn Fn(HostEvent)>,
    ) -> HostCallback;

    /// Release a previously installed native callback.
    fn release_callback(&self, callback: HostCallback);

    /// Whether the document is currently visible.
    fn is_visible(&self) -> bool;

    /// Whether the document currently holds focus.
    fn has_focus(&self) -> bool;
}

// =============================================================================
// Attachment
// =============================================================================

/// Host attachment misuse.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("a host backend is already attached on this thread")]
    AlreadyAttached,
    #[error("no host backend is attached on this thread")]
    NotAttached,
}

thread_local! {
    static HOST: RefCell<Option<Rc<dyn HostBackend>>> = RefCell::new(None);
}

/// Attach a host backend for this thread.
pub fn attach_host(host: Rc<dyn HostBackend>) -> Result<(), HostError> {
    HOST.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(HostError::AlreadyAttached);
        }
        *slot = Some(host);
        Ok(())
    })
}

/// Detach the current host backend.
pub fn detach_host() -> Result<(), HostError> {
    HOST.with(|slot| {
        if slot.borrow_mut().take().is_none() {
            return Err(HostError::NotAttached);
        }
        Ok(())
    })
}

/// Whether a host backend is attached.
pub fn host_attached() -> bool {
    HOST.with(|slot| slot.borrow().is_some())
}

/// Run `f` with the attached host, if any.
///
/// The `Rc` is cloned out first so `f` runs without the attachment slot
/// borrowed; host calls may re-enter this crate.
pub fn with_host<R>(f: impl FnOnce(&Rc<dyn HostBackend>) -> R) -> Option<R> {
    let host = HOST.with(|slot| slot.borrow().clone());
    host.map(|host| f(&host))
}

/// Whether the host document is visible. True when headless.
pub fn document_visible() -> bool {
    with_host(|host| host.is_visible()).unwrap_or(true)
}

/// Whether the host document holds focus. True when headless.
pub fn document_focused() -> bool {
    with_host(|host| host.has_focus()).unwrap_or(true)
}

// =============================================================================
// Dispatcher Guard
// =============================================================================

/// Owned handle to one installed host callback.
///
/// Dropping the guard releases the callback with the host. An element's
/// event slots own their guards, so destroying the element releases every
/// still-bound callback structurally.
#[derive(Debug)]
pub struct DispatcherGuard {
    callback: HostCallback,
}

impl DispatcherGuard {
    pub fn new(callback: HostCallback) -> Self {
        DispatcherGuard { callback }
    }

    /// The host callback this guard owns.
    pub fn callback(&self) -> HostCallback {
        self.callback
    }
}

impl Drop for DispatcherGuard {
    fn drop(&mut self) {
        // If the host was detached first there is nothing left to release.
        with_host(|host| host.release_callback(self.callback));
    }
}

// =============================================================================
// Tests
// =============================================================================
