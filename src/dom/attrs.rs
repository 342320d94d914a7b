//! Attribute and style writes - cache and host kept in lockstep.
//!
//! Every write lands in the element's local cache; when the element is
//! mirrored onto an attached host, the same write goes to the live node.
//! The cache is therefore both the headless store and the read-back source
//! (`attribute`/`style` never consult the host).

use super::host;
use super::registry::with_element;

// =============================================================================
// Boolean Encodings
// =============================================================================

/// How a boolean is encoded as a textual attribute. Callers pick per write;
/// `Presence` is the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoolMode {
    /// True: attribute present with an empty value. False: absent.
    #[default]
    Presence,
    /// Literal `"true"` / `"false"` strings, attribute always present.
    TrueFalse,
    /// Literal `"yes"` / `"no"` strings, attribute always present.
    YesNo,
    /// True: value equals the attribute name. False: absent.
    KeyAsValue,
}

// =============================================================================
// Attributes
// =============================================================================

/// Set a string attribute.
pub fn set_attribute(index: usize, key: &str, value: &str) {
    let host_node = with_element(index, |el| {
        el.attributes.insert(key.to_string(), value.to_string());
        el.host_node
    })
    .flatten();
    if let Some(node) = host_node {
        host::with_host(|h| h.set_attribute(node, key, value));
    }
}

/// Remove an attribute.
pub fn remove_attribute(index: usize, key: &str) {
    let host_node = with_element(index, |el| {
        el.attributes.remove(key);
        el.host_node
    })
    .flatten();
    if let Some(node) = host_node {
        host::with_host(|h| h.remove_attribute(node, key));
    }
}

/// Read an attribute back from the cache.
pub fn attribute(index: usize, key: &str) -> Option<String> {
    with_element(index, |el| el.attributes.get(key).cloned()).flatten()
}

/// Set a boolean attribute under the chosen encoding.
pub fn set_bool_attribute(index: usize, key: &str, value: bool, mode: BoolMode) {
    match (mode, value) {
        (BoolMode::Presence, true) => set_attribute(index, key, ""),
        (BoolMode::Presence, false) => remove_attribute(index, key),
        (BoolMode::TrueFalse, v) => {
            set_attribute(index, key, if v { "true" } else { "false" })
        }
        (BoolMode::YesNo, v) => set_attribute(index, key, if v { "yes" } else { "no" }),
        (BoolMode::KeyAsValue, true) => set_attribute(index, key, key),
        (BoolMode::KeyAsValue, false) => remove_attribute(index, key),
    }
}

/// Set a numeric attribute.
///
/// Prefers the host's native numeric property slot when one exists; the
/// string path is the fallback. The cache always records the formatted
/// string (Rust's `f64` Display is locale-independent, `3.0` prints `3`).
pub fn set_numeric_attribute(index: usize, key: &str, value: f64) {
    let formatted = value.to_string();

    let host_node = with_element(index, |el| {
        el.attributes.insert(key.to_string(), formatted.clone());
        el.host_node
    })
    .flatten();

    if let Some(node) = host_node {
        host::with_host(|h| {
            if !h.set_property_number(node, key, value) {
                h.set_attribute(node, key, &formatted);
            }
        });
    }
}

// =============================================================================
// Styles
// =============================================================================

/// Set an inline style property.
pub fn set_style(index: usize, property: &str, value: &str) {
    let host_node = with_element(index, |el| {
        el.styles.insert(property.to_string(), value.to_string());
        el.host_node
    })
    .flatten();
    if let Some(node) = host_node {
        host::with_host(|h| h.set_style(node, property, value));
    }
}

/// Set a numeric style property, formatted through the string path.
pub fn set_numeric_style(index: usize, property: &str, value: f64) {
    set_style(index, property, &value.to_string());
}

/// Read a style property back from the cache.
pub fn style(index: usize, property: &str) -> Option<String> {
    with_element(index, |el| el.styles.get(property).cloned()).flatten()
}

// =============================================================================
// Classes
// =============================================================================

/// Add a CSS class (no-op if already present). The ordered class list is
/// serialized into the `class` attribute.
pub fn add_class(index: usize, name: &str) {
    let changed = with_element(index, |el| {
        if el.classes.iter().any(|c| c == name) {
            false
        } else {
            el.classes.push(name.to_string());
            true
        }
    })
    .unwrap_or(false);
    if changed {
        sync_class_attribute(index);
    }
}

/// Remove a CSS class (no-op if absent).
pub fn remove_class(index: usize, name: &str) {
    let changed = with_element(index, |el| {
        let before = el.classes.len();
        el.classes.retain(|c| c != name);
        el.classes.len() != before
    })
    .unwrap_or(false);
    if changed {
        sync_class_attribute(index);
    }
}

/// Whether the element carries the class.
pub fn has_class(index: usize, name: &str) -> bool {
    with_element(index, |el| el.classes.iter().any(|c| c == name)).unwrap_or(false)
}

fn sync_class_attribute(index: usize) {
    let serialized = with_element(index, |el| el.class_attribute());
    if let Some(serialized) = serialized {
        set_attribute(index, "class", &serialized);
    }
}

// =============================================================================
// Tests
// =============================================================================
