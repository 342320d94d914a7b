//! DOM layer - element arena, tree lifecycle, attribute writes, and the
//! host document boundary.

pub mod attrs;
pub mod element;
pub mod host;
pub mod registry;
pub mod tree;

pub use attrs::{
    add_class, attribute, has_class, remove_attribute, remove_class, set_attribute,
    set_bool_attribute, set_numeric_attribute, set_numeric_style, set_style, style, BoolMode,
};
pub use element::{ElementData, NodeFlags};
pub use host::{
    attach_host, detach_host, document_focused, document_visible, host_attached, DispatcherGuard,
    HostBackend, HostCallback, HostError, HostEvent, HostNode,
};
pub use registry::{
    allocated_count, get_id, get_index, is_allocated, on_destroy, reset_dom, set_id_generator,
};
pub use tree::{
    append_child, children, create_element, is_ancestor, mount, on_added_to_document,
    on_position_change, on_removed_from_document, parent, remove, unmount,
};
