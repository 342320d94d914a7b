//! ElementHandle - the fluent surface consumed by the wrapper layer.
//!
//! A copyable index into the element arena with chainable write methods:
//! every setter returns the handle, so the generated per-attribute wrapper
//! surface can thread one stable identity through a whole builder chain.
//!
//! ```
//! use sprig_dom::{schedule, BoolMode, ElementHandle};
//! use sprig_dom::reactive::signal;
//!
//! let title = signal(String::from("hello"));
//!
//! let root = ElementHandle::new("div")
//!     .class("app")
//!     .style("color", "rebeccapurple")
//!     .child(
//!         ElementHandle::new("input")
//!             .attr_bool("disabled", false, BoolMode::Presence)
//!             .attr_signal("placeholder", &title),
//!     );
//!
//! root.mount();
//! schedule::flush();
//! ```

use crate::dom::attrs::{self, BoolMode};
use crate::dom::registry;
use crate::dom::tree;
use crate::events::{self, Event};
use crate::reactive::Signal;
use crate::bind;

/// Stable identity for one element; cheap to copy, chainable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    index: usize,
}

impl ElementHandle {
    /// Create a detached element with the given tag.
    pub fn new(tag: &str) -> Self {
        ElementHandle { index: tree::create_element(tag) }
    }

    /// Wrap an existing arena index.
    pub fn from_index(index: usize) -> Self {
        ElementHandle { index }
    }

    /// The arena index behind this handle.
    pub fn index(self) -> usize {
        self.index
    }

    /// The element's session-unique id.
    pub fn id(self) -> Option<String> {
        registry::get_id(self.index)
    }

    /// Whether the element is still alive.
    pub fn is_alive(self) -> bool {
        registry::is_allocated(self.index)
    }

    // -------------------------------------------------------------------------
    // Attributes & styles
    // -------------------------------------------------------------------------

    pub fn attr(self, key: &str, value: &str) -> Self {
        attrs::set_attribute(self.index, key, value);
        self
    }

    pub fn attr_bool(self, key: &str, value: bool, mode: BoolMode) -> Self {
        attrs::set_bool_attribute(self.index, key, value, mode);
        self
    }

    pub fn attr_number(self, key: &str, value: f64) -> Self {
        attrs::set_numeric_attribute(self.index, key, value);
        self
    }

    /// Reactive string attribute: written now and on every signal change.
    pub fn attr_signal(self, key: impl Into<String>, signal: &Signal<String>) -> Self {
        let key = key.into();
        bind::bind(self.index, signal, move |index, value: &String| {
            attrs::set_attribute(index, &key, value);
        });
        self
    }

    /// Reactive boolean attribute under the chosen encoding.
    pub fn attr_bool_signal(
        self,
        key: impl Into<String>,
        signal: &Signal<bool>,
        mode: BoolMode,
    ) -> Self {
        let key = key.into();
        bind::bind(self.index, signal, move |index, value| {
            attrs::set_bool_attribute(index, &key, *value, mode);
        });
        self
    }

    pub fn style(self, property: &str, value: &str) -> Self {
        attrs::set_style(self.index, property, value);
        self
    }

    /// Reactive style property.
    pub fn style_signal(self, property: impl Into<String>, signal: &Signal<String>) -> Self {
        let property = property.into();
        bind::bind(self.index, signal, move |index, value: &String| {
            attrs::set_style(index, &property, value);
        });
        self
    }

    pub fn class(self, name: &str) -> Self {
        attrs::add_class(self.index, name);
        self
    }

    /// Read an attribute back from the cache.
    pub fn attribute(self, key: &str) -> Option<String> {
        attrs::attribute(self.index, key)
    }

    /// The element's current control value (host property, cache, or empty).
    pub fn value(self) -> String {
        events::value_of(self.index)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Register an event handler, replacing any previous one for the type.
    pub fn on(self, event_type: &str, handler: impl Fn(&Event) + 'static) -> Self {
        events::on(self.index, event_type, handler);
        self
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Fired (deferred to the next flush turn) after entering the document.
    pub fn on_added(self, callback: impl Fn() + 'static) -> Self {
        tree::on_added_to_document(self.index, callback);
        self
    }

    /// Fired synchronously as the element leaves the document.
    pub fn on_removed(self, callback: impl Fn() + 'static) -> Self {
        tree::on_removed_from_document(self.index, callback);
        self
    }

    /// Fired with the new sibling index when the element shifts position.
    pub fn on_position_change(self, callback: impl Fn(usize) + 'static) -> Self {
        tree::on_position_change(self.index, callback);
        self
    }

    // -------------------------------------------------------------------------
    // Tree
    // -------------------------------------------------------------------------

    /// Append `child` as the last child of this element.
    pub fn child(self, child: ElementHandle) -> Self {
        tree::append_child(self.index, child.index);
        self
    }

    pub fn parent(self) -> Option<ElementHandle> {
        tree::parent(self.index).map(ElementHandle::from_index)
    }

    pub fn children(self) -> Vec<ElementHandle> {
        tree::children(self.index)
            .into_iter()
            .map(ElementHandle::from_index)
            .collect()
    }

    /// Mount this element as a document root.
    pub fn mount(self) {
        tree::mount(self.index);
    }

    /// Detach and tear down this element and its subtree.
    pub fn remove(self) {
        tree::remove(self.index);
    }
}
