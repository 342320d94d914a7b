//! Element record - per-node state stored in the arena.
//!
//! One `ElementData` per live node: identity, tag, class list, the local
//! attribute/style caches (authoritative when no host tree is attached),
//! tree links as arena indices, lifecycle callback lists, and event slots.
//!
//! Tree links are plain indices with the parent back-reference as an
//! `Option<usize>`, so the parent/child relation never forms an ownership
//! cycle. Only the tree module may touch `parent` and `children`; the
//! invariant is that a node's `parent` is set iff the node appears in that
//! parent's `children` list.

use std::collections::HashMap;
use std::rc::Rc;

use bitflags::bitflags;

use crate::dom::host::HostNode;
use crate::events::EventSlot;

bitflags! {
    /// Per-element lifecycle state.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// Reachable from a mounted document root.
        const IN_DOCUMENT = 1 << 0;
        /// Torn down; the arena slot is free or about to be.
        const DESTROYED = 1 << 1;
        /// A raw `input` edit happened and the next `change` event must not
        /// re-derive the cached value.
        const EDIT_PENDING = 1 << 2;
    }
}

/// Callback fired when an element's position among its siblings changes.
pub type PositionCallback = Rc<dyn Fn(usize)>;

/// Lifecycle callback (added to / removed from the document).
pub type LifecycleCallback = Rc<dyn Fn()>;

/// State for one element, addressed by its arena index.
pub struct ElementData {
    /// Session-unique opaque id (see `registry::set_id_generator`).
    pub id: String,
    /// Tag name the element was created with.
    pub tag: String,
    /// Ordered CSS class list (serialized into the `class` attribute).
    pub classes: Vec<String>,
    /// Arena index of the parent, if attached.
    pub parent: Option<usize>,
    /// Arena indices of children, in document order.
    pub children: Vec<usize>,
    /// Attribute cache; authoritative in headless mode, mirror otherwise.
    pub attributes: HashMap<String, String>,
    /// Inline style cache, same regime as `attributes`.
    pub styles: HashMap<String, String>,
    pub flags: NodeFlags,
    /// Native node, present once mirrored onto an attached host.
    pub host_node: Option<HostNode>,
    /// One slot per bound event type.
    pub event_slots: HashMap<String, EventSlot>,
    /// Fired with the new sibling index when this element shifts position.
    pub position_callbacks: Vec<PositionCallback>,
    /// Fired (deferred) after the element enters the document.
    pub added_callbacks: Vec<LifecycleCallback>,
    /// Fired (synchronously, child-before-parent) as the element leaves.
    pub removed_callbacks: Vec<LifecycleCallback>,
    /// Run once, just before the arena slot is reclaimed.
    pub destroy_callbacks: Vec<Box<dyn FnOnce()>>,
}

impl ElementData {
    pub fn new(id: String, tag: String) -> Self {
        ElementData {
            id,
            tag,
            classes: Vec::new(),
            parent: None,
            children: Vec::new(),
            attributes: HashMap::new(),
            styles: HashMap::new(),
            flags: NodeFlags::empty(),
            host_node: None,
            event_slots: HashMap::new(),
            position_callbacks: Vec::new(),
            added_callbacks: Vec::new(),
            removed_callbacks: Vec::new(),
            destroy_callbacks: Vec::new(),
        }
    }

    pub fn is_in_document(&self) -> bool {
        self.flags.contains(NodeFlags::IN_DOCUMENT)
    }

    pub fn is_destroyed(&self) -> bool {
        self.flags.contains(NodeFlags::DESTROYED)
    }

    /// Serialized class list, space separated.
    pub fn class_attribute(&self) -> String {
        self.classes.join(" ")
    }
}
