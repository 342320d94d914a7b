//! Reactive layer - signals and bidirectional merges.
//!
//! Single-threaded, synchronous, no batching: a `set` notifies every
//! listener before it returns. This direct-mutation model matches the DOM
//! layer above it, which mutates the host tree eagerly rather than diffing.

pub mod merge;
pub mod signal;

pub use merge::{merge, merge_same, MergeLink};
pub use signal::{signal, ListenerHandle, Signal};
