//! Identity for coordinator-tree nodes.
//!
//! Parent → child ownership is strong (`Rc`); child → parent is weak
//! (`Weak`), so presenting a modal or detour can temporarily reassign a
//! coordinator's parent without creating a reference cycle, and a removed
//! flow coordinator is freed once the embedder drops its own handle.

use std::cell::Cell;

/// A process-unique identifier for a coordinator, stable for its lifetime.
/// Used for caller-skip checks and cycle detection without requiring
/// `PartialEq` on the coordinator trait object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

thread_local! {
    static NEXT_ID: Cell<u64> = Cell::new(1);
}

impl NodeId {
    pub(crate) fn next() -> Self {
        NEXT_ID.with(|cell| {
            let id = cell.get();
            cell.set(id + 1);
            NodeId(id)
        })
    }
}
