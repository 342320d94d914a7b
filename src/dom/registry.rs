//! Element registry - arena allocation for element records.
//!
//! Elements live in a thread-local table addressed by `usize` index, with a
//! free pool for O(1) slot reuse and an id → index map for lookups by the
//! session-unique element id. Parent/child links are indices into this same
//! table, so the tree carries no reference cycles.
//!
//! Id generation sits behind an injectable generator (ULID by default) so
//! tests and deterministic embeddings can swap in their own.

use std::cell::RefCell;
use std::collections::HashMap;

use ulid::Ulid;

use super::element::{ElementData, NodeFlags};

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Arena: one slot per index, `None` when free.
    static ELEMENTS: RefCell<Vec<Option<ElementData>>> = RefCell::new(Vec::new());

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = RefCell::new(Vec::new());

    /// Map element id to arena index.
    static ID_TO_INDEX: RefCell<HashMap<String, usize>> = RefCell::new(HashMap::new());

    /// Count of live elements (drives the reset-on-empty cleanup).
    static ALLOCATED_COUNT: RefCell<usize> = const { RefCell::new(0) };

    /// Injectable id generator; ULIDs by default.
    static ID_GENERATOR: RefCell<Box<dyn FnMut() -> String>> =
        RefCell::new(Box::new(|| Ulid::new().to_string()));
}

// =============================================================================
// Id Generation
// =============================================================================

/// Replace the element id generator (e.g. with a deterministic counter in
/// tests). Applies to this thread only.
pub fn set_id_generator(generator: impl FnMut() -> String + 'static) {
    ID_GENERATOR.with(|slot| *slot.borrow_mut() = Box::new(generator));
}

fn next_id() -> String {
    ID_GENERATOR.with(|generator| (generator.borrow_mut())())
}

// =============================================================================
// Allocation
// =============================================================================

/// Allocate a slot for a new element with the given tag.
///
/// Returns the arena index. The element starts detached, with no host node.
pub fn allocate(tag: &str) -> usize {
    let id = next_id();

    let index = FREE_INDICES.with(|free| free.borrow_mut().pop());
    let index = match index {
        Some(index) => {
            ELEMENTS.with(|elements| {
                elements.borrow_mut()[index] = Some(ElementData::new(id.clone(), tag.to_string()));
            });
            index
        }
        None => ELEMENTS.with(|elements| {
            let mut elements = elements.borrow_mut();
            elements.push(Some(ElementData::new(id.clone(), tag.to_string())));
            elements.len() - 1
        }),
    };

    ID_TO_INDEX.with(|map| {
        map.borrow_mut().insert(id, index);
    });
    ALLOCATED_COUNT.with(|count| *count.borrow_mut() += 1);

    index
}

/// Reclaim a slot, returning the owned element record to the caller.
///
/// The tree module calls this as the last step of teardown and lets the
/// returned record drop outside the arena borrow, so event dispatcher
/// guards release their host callbacks without re-entrancy hazards.
/// Returns `None` if the index is not allocated.
pub fn take(index: usize) -> Option<ElementData> {
    let element = ELEMENTS.with(|elements| {
        elements
            .borrow_mut()
            .get_mut(index)
            .and_then(|slot| slot.take())
    })?;

    ID_TO_INDEX.with(|map| {
        map.borrow_mut().remove(&element.id);
    });
    FREE_INDICES.with(|free| free.borrow_mut().push(index));

    let now_empty = ALLOCATED_COUNT.with(|count| {
        let mut count = count.borrow_mut();
        *count = count.saturating_sub(1);
        *count == 0
    });

    // Reset-on-empty: when the last element goes away, release the arena's
    // memory and start indices from zero again.
    if now_empty {
        ELEMENTS.with(|elements| elements.borrow_mut().clear());
        FREE_INDICES.with(|free| free.borrow_mut().clear());
    }

    Some(element)
}

// =============================================================================
// Access
// =============================================================================

/// Run `f` against the element at `index`.
///
/// Returns `None` if the index is not allocated. `f` runs with the arena
/// borrowed: it must not call back into registry or tree operations.
pub fn with_element<R>(index: usize, f: impl FnOnce(&mut ElementData) -> R) -> Option<R> {
    ELEMENTS.with(|elements| {
        elements
            .borrow_mut()
            .get_mut(index)
            .and_then(|slot| slot.as_mut())
            .map(f)
    })
}

/// Check if an index holds a live element.
pub fn is_allocated(index: usize) -> bool {
    ELEMENTS.with(|elements| {
        elements
            .borrow()
            .get(index)
            .is_some_and(|slot| slot.is_some())
    })
}

/// Look up an element's arena index by its id.
pub fn get_index(id: &str) -> Option<usize> {
    ID_TO_INDEX.with(|map| map.borrow().get(id).copied())
}

/// Get the id of the element at `index`.
pub fn get_id(index: usize) -> Option<String> {
    with_element(index, |el| el.id.clone())
}

/// Count of live elements.
pub fn allocated_count() -> usize {
    ALLOCATED_COUNT.with(|count| *count.borrow())
}

/// Register a callback to run when the element at `index` is destroyed.
pub fn on_destroy(index: usize, callback: impl FnOnce() + 'static) {
    with_element(index, |el| {
        el.destroy_callbacks.push(Box::new(callback));
    });
}

/// Test helper: check a flag without exposing the whole record.
pub fn has_flag(index: usize, flag: NodeFlags) -> bool {
    with_element(index, |el| el.flags.contains(flag)).unwrap_or(false)
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
///
/// Element records are moved out of the arena first so their event slots
/// drop, and release any host callbacks, without the arena borrowed.
pub fn reset_dom() {
    let dropped: Vec<ElementData> = ELEMENTS.with(|elements| {
        elements
            .borrow_mut()
            .drain(..)
            .flatten()
            .collect()
    });
    drop(dropped);

    FREE_INDICES.with(|free| free.borrow_mut().clear());
    ID_TO_INDEX.with(|map| map.borrow_mut().clear());
    ALLOCATED_COUNT.with(|count| *count.borrow_mut() = 0);
    ID_GENERATOR.with(|generator| {
        *generator.borrow_mut() = Box::new(|| Ulid::new().to_string());
    });
    crate::schedule::reset_schedule();
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_allocate_and_lookup() {
        reset_dom();

        let a = allocate("div");
        let b = allocate("span");

        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert!(is_allocated(a));
        assert_eq!(allocated_count(), 2);

        let id = get_id(a).unwrap();
        assert_eq!(get_index(&id), Some(a));
        assert_eq!(with_element(b, |el| el.tag.clone()), Some("span".into()));
    }

    #[test]
    fn test_take_and_reuse() {
        reset_dom();

        let a = allocate("div");
        let _b = allocate("div");

        let taken = take(a).unwrap();
        assert!(!is_allocated(a));
        assert_eq!(get_index(&taken.id), None);

        // Freed index is reused.
        let c = allocate("p");
        assert_eq!(c, a);
    }

    #[test]
    fn test_reset_on_empty_restarts_indices() {
        reset_dom();

        let a = allocate("div");
        let b = allocate("div");
        take(b);
        take(a);
        assert_eq!(allocated_count(), 0);

        // Arena was cleared, so allocation starts over at zero.
        assert_eq!(allocate("div"), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        reset_dom();

        let a = allocate("div");
        let b = allocate("div");
        assert_ne!(get_id(a), get_id(b));
    }

    #[test]
    fn test_injectable_id_generator() {
        reset_dom();

        let counter = Rc::new(Cell::new(0));
        let counter_clone = counter.clone();
        set_id_generator(move || {
            counter_clone.set(counter_clone.get() + 1);
            format!("el-{}", counter_clone.get())
        });

        let a = allocate("div");
        assert_eq!(get_id(a), Some("el-1".to_string()));
        assert_eq!(get_index("el-1"), Some(a));
    }

    #[test]
    fn test_destroy_callback_runs_when_record_consumed() {
        reset_dom();

        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();

        let index = allocate("div");
        on_destroy(index, move || called_clone.set(true));

        let mut element = take(index).unwrap();
        for callback in element.destroy_callbacks.drain(..) {
            callback();
        }
        assert!(called.get());
    }
}
