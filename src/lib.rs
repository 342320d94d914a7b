//! # sprig-dom
//!
//! Reactive DOM binding core for Rust.
//!
//! The state/binding machinery of a declarative HTML/CSS UI layer: it
//! stores application state in observable cells, propagates changes
//! bidirectionally between independently-owned cells, and drives
//! attribute/style/event mutation on a host-owned document tree, releasing
//! every host-held callback resource on teardown. The generated per-tag /
//! per-attribute wrapper surface sits above this crate and consumes it
//! through two narrow contracts: write a property of an element, and
//! subscribe to or merge with a reactive cell.
//!
//! ## Architecture
//!
//! Elements are indices into a thread-local arena rather than objects, so
//! parent/child relations are plain indices and never form ownership
//! cycles. There is no diffing: every write mutates the host tree eagerly
//! and synchronously. The one deferred operation is the added-to-document
//! notification, which runs on the next [`schedule::flush`] turn.
//!
//! ```text
//! Signal --bind--> ElementHandle setter --> local cache + host node
//!    ^                                            |
//!    +-------- event dispatch <-- host callback --+
//! ```
//!
//! ## Modules
//!
//! - [`reactive`] - signals and bidirectional merge links
//! - [`dom`] - element arena, tree lifecycle, attributes, host boundary
//! - [`events`] - per-element handler slots and host callback lifecycle
//! - [`bind`] - the signal-to-setter binding driver
//! - [`handle`] - the fluent `ElementHandle` surface
//! - [`schedule`] - the deferred-job queue for host-turn boundaries

pub mod bind;
pub mod dom;
pub mod events;
pub mod handle;
pub mod reactive;
pub mod schedule;

// Re-export commonly used items
pub use bind::{bind, bind_items, bind_value};
pub use dom::{
    attach_host, detach_host, reset_dom, BoolMode, DispatcherGuard, HostBackend, HostCallback,
    HostError, HostEvent, HostNode, NodeFlags,
};
pub use events::{dispatch, off, on, value_of, Event, EventHandler, Modifiers};
pub use handle::ElementHandle;
pub use reactive::{merge, merge_same, signal, ListenerHandle, MergeLink, Signal};
