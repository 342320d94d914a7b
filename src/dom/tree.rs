//! Tree lifecycle - append, remove, mount, and teardown.
//!
//! These are the only operations allowed to touch an element's `parent`
//! back-reference or `children` list; everything else reads. Each mutation
//! keeps three things in lockstep: the arena's parent/child bookkeeping,
//! the live host tree (when attached), and lifecycle notifications.
//!
//! Notification timing is asymmetric on purpose:
//!
//! - added-to-document fires deferred (next `schedule::flush` turn,
//!   parent-before-child), so a callback never re-enters a tree that is
//!   still being assembled;
//! - removed-from-document fires synchronously during teardown,
//!   child-before-parent, with children fully torn down before the parent
//!   is finalized.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::element::{LifecycleCallback, NodeFlags, PositionCallback};
use super::host;
use super::registry::{self, with_element};
use crate::schedule;

// =============================================================================
// Creation
// =============================================================================

/// Create a detached element with the given tag.
///
/// Mirrors onto the host (a native node is created) when one is attached;
/// otherwise the element lives entirely in the local cache.
pub fn create_element(tag: &str) -> usize {
    let index = registry::allocate(tag);

    let host_node = host::with_host(|h| h.create_node(tag));
    if let Some(node) = host_node {
        with_element(index, |el| el.host_node = Some(node));
    }

    trace!(index, tag, "element created");
    index
}

// =============================================================================
// Append
// =============================================================================

/// Insert `child` as the last child of `parent`.
///
/// Re-parents if `child` is already attached elsewhere (detach without
/// teardown, then attach). Appending an element under its own descendant
/// would break the tree and is refused. When `parent` is in the document,
/// the child subtree is marked in-document and its added-to-document
/// notifications are scheduled for the next flush turn. Moving an
/// in-document subtree under a detached parent demotes it: the in-document
/// flags clear and removed-from-document fires synchronously,
/// child-before-parent, so the flags never go stale.
pub fn append_child(parent: usize, child: usize) {
    if parent == child {
        warn!(parent, "refusing to append an element to itself");
        return;
    }
    if !registry::is_allocated(parent) || !registry::is_allocated(child) {
        return;
    }
    if is_ancestor(child, parent) {
        warn!(parent, child, "refusing append that would create a cycle");
        return;
    }

    // Re-parent: pull out of the old child list first, never duplicate.
    let old_parent = with_element(child, |el| el.parent).flatten();
    if let Some(old_parent) = old_parent {
        detach(old_parent, child);
    }

    let new_position = with_element(parent, |el| {
        el.children.push(child);
        el.children.len() - 1
    });
    with_element(child, |el| el.parent = Some(parent));

    // Host append moves an already-attached native node, matching the
    // arena-side re-parent above.
    let parent_node = with_element(parent, |el| el.host_node).flatten();
    let child_node = with_element(child, |el| el.host_node).flatten();
    if let (Some(parent_node), Some(child_node)) = (parent_node, child_node) {
        host::with_host(|h| h.append_node(parent_node, child_node));
    }

    if let Some(position) = new_position {
        notify_positions(vec![(child, position)]);
    }

    let parent_in_document = registry::has_flag(parent, NodeFlags::IN_DOCUMENT);
    let child_in_document = registry::has_flag(child, NodeFlags::IN_DOCUMENT);
    if parent_in_document && !child_in_document {
        enter_document(child);
    } else if !parent_in_document && child_in_document {
        leave_document(child);
    }

    trace!(parent, child, "child appended");
}

// =============================================================================
// Remove
// =============================================================================

/// Detach `element` from its parent and tear the whole subtree down.
///
/// Teardown is depth-first, children before parent: every in-document node
/// gets exactly one removed-from-document notification, destroy callbacks
/// run, and dropping each record's event slots releases every still-bound
/// host callback. No-op if the element is not (or no longer) allocated.
pub fn remove(element: usize) {
    if !registry::is_allocated(element) {
        return;
    }

    let parent = with_element(element, |el| el.parent).flatten();
    if let Some(parent) = parent {
        detach(parent, element);
    }

    // One host removal for the subtree root; descendants go with it.
    let host_node = with_element(element, |el| el.host_node).flatten();
    if let Some(node) = host_node {
        host::with_host(|h| h.remove_node(node));
    }

    destroy_subtree(element);
    trace!(element, "element removed");
}

fn destroy_subtree(index: usize) {
    let children = with_element(index, |el| el.children.clone()).unwrap_or_default();
    for child in children {
        destroy_subtree(child);
    }

    let (was_in_document, removed_callbacks) = with_element(index, |el| {
        let was = el.is_in_document();
        el.flags.remove(NodeFlags::IN_DOCUMENT);
        el.flags.insert(NodeFlags::DESTROYED);
        (was, el.removed_callbacks.clone())
    })
    .unwrap_or((false, Vec::new()));

    if was_in_document {
        for callback in removed_callbacks {
            callback();
        }
    }

    if let Some(mut element) = registry::take(index) {
        let destroy_callbacks: Vec<_> = element.destroy_callbacks.drain(..).collect();
        for callback in destroy_callbacks {
            callback();
        }
        // Dropping the record drops its event slots; each dispatcher guard
        // releases its host callback.
        drop(element);
    }
}

// =============================================================================
// Mount / Unmount
// =============================================================================

/// Mount `root` as a document root.
///
/// Marks the subtree in-document, schedules added-to-document
/// notifications, and appends the native node under the host's root.
pub fn mount(root: usize) {
    if !registry::is_allocated(root) {
        return;
    }

    let host_node = with_element(root, |el| el.host_node).flatten();
    if let Some(node) = host_node {
        host::with_host(|h| h.append_to_root(node));
    }

    enter_document(root);
    debug!(root, "root mounted");
}

/// Unmount a document root: full removal and teardown of the subtree.
pub fn unmount(root: usize) {
    debug!(root, "root unmounting");
    remove(root);
}

// =============================================================================
// Lifecycle Callback Registration
// =============================================================================

/// Register a callback fired (deferred) after the element enters the
/// document.
pub fn on_added_to_document(index: usize, callback: impl Fn() + 'static) {
    let callback: LifecycleCallback = Rc::new(callback);
    with_element(index, |el| el.added_callbacks.push(callback));
}

/// Register a callback fired synchronously as the element leaves the
/// document during teardown.
pub fn on_removed_from_document(index: usize, callback: impl Fn() + 'static) {
    let callback: LifecycleCallback = Rc::new(callback);
    with_element(index, |el| el.removed_callbacks.push(callback));
}

/// Register a callback fired with the new sibling index whenever the
/// element's position among its siblings changes.
pub fn on_position_change(index: usize, callback: impl Fn(usize) + 'static) {
    let callback: PositionCallback = Rc::new(callback);
    with_element(index, |el| el.position_callbacks.push(callback));
}

// =============================================================================
// Queries
// =============================================================================

/// The element's parent index, if attached.
pub fn parent(index: usize) -> Option<usize> {
    with_element(index, |el| el.parent).flatten()
}

/// The element's children, in document order.
pub fn children(index: usize) -> Vec<usize> {
    with_element(index, |el| el.children.clone()).unwrap_or_default()
}

/// Whether `candidate` is an ancestor of `index` (or the element itself).
pub fn is_ancestor(candidate: usize, index: usize) -> bool {
    let mut current = Some(index);
    while let Some(node) = current {
        if node == candidate {
            return true;
        }
        current = with_element(node, |el| el.parent).flatten();
    }
    false
}

// =============================================================================
// Internals
// =============================================================================

/// Remove `child` from `parent`'s child list and clear the back-reference.
/// Siblings shifted down get their position callbacks fired.
fn detach(parent: usize, child: usize) {
    let shifted: Vec<(usize, usize)> = with_element(parent, |el| {
        match el.children.iter().position(|&c| c == child) {
            Some(position) => {
                el.children.remove(position);
                el.children
                    .iter()
                    .enumerate()
                    .skip(position)
                    .map(|(new_position, &sibling)| (sibling, new_position))
                    .collect()
            }
            None => Vec::new(),
        }
    })
    .unwrap_or_default();

    with_element(child, |el| el.parent = None);
    notify_positions(shifted);
}

fn notify_positions(shifted: Vec<(usize, usize)>) {
    for (index, new_position) in shifted {
        let callbacks =
            with_element(index, |el| el.position_callbacks.clone()).unwrap_or_default();
        for callback in callbacks {
            callback(new_position);
        }
    }
}

/// Take `root`'s subtree out of the document without tearing it down:
/// clear the in-document flags depth-first and fire removed-from-document
/// synchronously, child-before-parent. Used when re-parenting moves a
/// subtree under a detached parent.
fn leave_document(root: usize) {
    let children = with_element(root, |el| el.children.clone()).unwrap_or_default();
    for child in children {
        leave_document(child);
    }

    let callbacks = with_element(root, |el| {
        if el.is_in_document() {
            el.flags.remove(NodeFlags::IN_DOCUMENT);
            el.removed_callbacks.clone()
        } else {
            Vec::new()
        }
    })
    .unwrap_or_default();

    for callback in callbacks {
        callback();
    }
}

/// Mark `root`'s subtree in-document (parent-first) and schedule one
/// deferred job that fires the added-to-document callbacks in that order.
fn enter_document(root: usize) {
    let mut newly_entered = Vec::new();
    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        let children = with_element(index, |el| {
            if el.is_in_document() {
                None
            } else {
                el.flags.insert(NodeFlags::IN_DOCUMENT);
                Some(el.children.clone())
            }
        })
        .flatten();

        if let Some(children) = children {
            newly_entered.push(index);
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
    }

    if newly_entered.is_empty() {
        return;
    }

    schedule::defer(move || {
        for index in newly_entered {
            // The element may have been torn down between append and flush.
            let callbacks = with_element(index, |el| {
                if el.is_in_document() && !el.is_destroyed() {
                    el.added_callbacks.clone()
                } else {
                    Vec::new()
                }
            })
            .unwrap_or_default();
            for callback in callbacks {
                callback();
            }
        }
    });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::registry::reset_dom;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_append_sets_both_sides_of_the_link() {
        reset_dom();

        let parent_el = create_element("div");
        let child_el = create_element("span");

        append_child(parent_el, child_el);

        assert_eq!(parent(child_el), Some(parent_el));
        assert_eq!(children(parent_el), vec![child_el]);
    }

    #[test]
    fn test_append_then_remove_restores_parent() {
        reset_dom();

        let parent_el = create_element("div");
        let child_el = create_element("span");

        let before = children(parent_el);
        append_child(parent_el, child_el);
        remove(child_el);

        assert_eq!(children(parent_el), before);
        assert!(!registry::is_allocated(child_el));
    }

    #[test]
    fn test_reparenting_moves_not_duplicates() {
        reset_dom();

        let a = create_element("div");
        let b = create_element("div");
        let child = create_element("span");

        append_child(a, child);
        append_child(b, child);

        assert_eq!(children(a), Vec::<usize>::new());
        assert_eq!(children(b), vec![child]);
        assert_eq!(parent(child), Some(b));
    }

    #[test]
    fn test_self_and_cycle_appends_refused() {
        reset_dom();

        let a = create_element("div");
        let b = create_element("div");
        append_child(a, b);

        append_child(a, a);
        append_child(b, a);

        assert_eq!(parent(a), None);
        assert_eq!(children(b), Vec::<usize>::new());
        assert_eq!(children(a), vec![b]);
    }

    #[test]
    fn test_removed_notifications_depth_first_child_before_parent() {
        reset_dom();

        // root -> mid -> leaf, plus a second child of root.
        let root = create_element("div");
        let mid = create_element("div");
        let leaf = create_element("span");
        let sibling = create_element("span");
        append_child(root, mid);
        append_child(mid, leaf);
        append_child(root, sibling);
        mount(root);
        schedule::flush();

        let order = Rc::new(RefCell::new(Vec::new()));
        for (name, index) in [("root", root), ("mid", mid), ("leaf", leaf), ("sibling", sibling)] {
            let order_clone = order.clone();
            on_removed_from_document(index, move || order_clone.borrow_mut().push(name));
        }

        remove(root);

        // N + 1 notifications, children fully before parents.
        assert_eq!(*order.borrow(), vec!["leaf", "mid", "sibling", "root"]);
        assert_eq!(registry::allocated_count(), 0);
    }

    #[test]
    fn test_added_notification_is_deferred() {
        reset_dom();

        let root = create_element("div");
        let child = create_element("span");
        append_child(root, child);

        let added = Rc::new(RefCell::new(Vec::new()));
        for (name, index) in [("root", root), ("child", child)] {
            let added_clone = added.clone();
            on_added_to_document(index, move || added_clone.borrow_mut().push(name));
        }

        mount(root);
        assert!(added.borrow().is_empty());

        schedule::flush();
        assert_eq!(*added.borrow(), vec!["root", "child"]);
    }

    #[test]
    fn test_append_into_mounted_tree_notifies_subtree_once() {
        reset_dom();

        let root = create_element("div");
        mount(root);
        schedule::flush();

        let branch = create_element("div");
        let leaf = create_element("span");
        append_child(branch, leaf);

        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        on_added_to_document(leaf, move || count_clone.set(count_clone.get() + 1));

        append_child(root, branch);
        // Re-appending elsewhere inside the same turn must not double-notify.
        schedule::flush();
        schedule::flush();

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_removed_before_flush_skips_added_notification() {
        reset_dom();

        let root = create_element("div");
        mount(root);
        schedule::flush();

        let child = create_element("span");
        let added = Rc::new(Cell::new(false));
        let added_clone = added.clone();
        on_added_to_document(child, move || added_clone.set(true));

        append_child(root, child);
        remove(child);
        schedule::flush();

        assert!(!added.get());
    }

    #[test]
    fn test_position_callbacks_fire_on_sibling_shift() {
        reset_dom();

        let parent_el = create_element("ul");
        let first = create_element("li");
        let second = create_element("li");
        let third = create_element("li");
        append_child(parent_el, first);
        append_child(parent_el, second);
        append_child(parent_el, third);

        let positions = Rc::new(RefCell::new(Vec::new()));
        for index in [second, third] {
            let positions_clone = positions.clone();
            on_position_change(index, move |pos| positions_clone.borrow_mut().push((index, pos)));
        }

        remove(first);

        assert_eq!(*positions.borrow(), vec![(second, 0), (third, 1)]);
    }

    #[test]
    fn test_reparent_out_of_document_demotes_subtree() {
        reset_dom();

        let root = create_element("div");
        let branch = create_element("div");
        let leaf = create_element("span");
        append_child(branch, leaf);
        append_child(root, branch);
        mount(root);
        schedule::flush();

        let removed = Rc::new(RefCell::new(Vec::new()));
        for (name, index) in [("branch", branch), ("leaf", leaf)] {
            let removed_clone = removed.clone();
            on_removed_from_document(index, move || removed_clone.borrow_mut().push(name));
        }

        let holder = create_element("div");
        append_child(holder, branch);

        // Leaving the document is synchronous, child-before-parent, and
        // the flags clear so they cannot go stale.
        assert_eq!(*removed.borrow(), vec!["leaf", "branch"]);
        assert!(!registry::has_flag(branch, NodeFlags::IN_DOCUMENT));
        assert!(!registry::has_flag(leaf, NodeFlags::IN_DOCUMENT));
    }

    #[test]
    fn test_mount_after_reparent_out_notifies_added_again() {
        reset_dom();

        let root = create_element("div");
        let child = create_element("span");
        append_child(root, child);
        mount(root);
        schedule::flush();

        let holder = create_element("div");
        append_child(holder, child);

        let added = Rc::new(Cell::new(0));
        let added_clone = added.clone();
        on_added_to_document(child, move || added_clone.set(added_clone.get() + 1));

        mount(holder);
        schedule::flush();

        assert_eq!(added.get(), 1);
    }

    #[test]
    fn test_remove_while_detached_fires_no_removed_notification() {
        reset_dom();

        let root = create_element("div");
        let child = create_element("span");
        append_child(root, child);
        mount(root);
        schedule::flush();

        let holder = create_element("div");
        append_child(holder, child);

        // Demotion already delivered the single removed-from-document; the
        // later teardown of the detached node must stay silent.
        let removed = Rc::new(Cell::new(0));
        let removed_clone = removed.clone();
        on_removed_from_document(child, move || removed_clone.set(removed_clone.get() + 1));

        remove(child);
        assert_eq!(removed.get(), 0);
    }

    #[test]
    fn test_reparent_within_document_stays_silent() {
        reset_dom();

        let root = create_element("div");
        let left = create_element("div");
        let right = create_element("div");
        let child = create_element("span");
        append_child(root, left);
        append_child(root, right);
        append_child(left, child);
        mount(root);
        schedule::flush();

        let events = Rc::new(Cell::new(0));
        let added_events = events.clone();
        on_added_to_document(child, move || added_events.set(added_events.get() + 1));
        let removed_events = events.clone();
        on_removed_from_document(child, move || removed_events.set(removed_events.get() + 1));

        // In-document to in-document: the node never leaves the document.
        append_child(right, child);
        schedule::flush();

        assert_eq!(events.get(), 0);
        assert!(registry::has_flag(child, NodeFlags::IN_DOCUMENT));
    }

    #[test]
    fn test_remove_is_idempotent() {
        reset_dom();

        let el = create_element("div");
        remove(el);
        remove(el);
        assert_eq!(registry::allocated_count(), 0);
    }

    #[test]
    fn test_destroy_callbacks_run_on_remove() {
        reset_dom();

        let el = create_element("div");
        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();
        registry::on_destroy(el, move || called_clone.set(true));

        remove(el);
        assert!(called.get());
    }
}
