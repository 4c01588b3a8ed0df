//! The fixed node record shared by the data queue and the free list.

use std::sync::atomic::{AtomicU16, Ordering};

use crate::error::QueueError;
use crate::node_ptr::{NodePtr, PackedPtr, NONE};

/// Number of nodes in the pool. One slot is permanently reserved as the
/// data queue's dummy head, so at most `POOL_CAPACITY - 1` values can be
/// enqueued at once.
pub const POOL_CAPACITY: usize = 65_534;

/// Validates that an index read from the shared region is safe to use as a
/// node-array subscript. Called on every `NodePtr` unpacked off the
/// pool's live state, not just at the entry points of `enqueue`/`dequeue`:
/// a corrupt peer can write a bad index into an in-chain node's `next` or
/// `next_free` field just as easily as into `head`/`tail` themselves, and
/// either one must surface as `CorruptPool` rather than an out-of-bounds
/// panic.
pub(crate) fn validate_index(index: i32) -> Result<(), QueueError> {
    if index < NONE || index as usize >= POOL_CAPACITY {
        debug_assert!(false, "pool index {index} out of range");
        return Err(QueueError::CorruptPool { index });
    }
    Ok(())
}

/// A single pool slot. Addressed only by its array index — never by
/// pointer — so the pool can be mapped at different virtual addresses in
/// different processes and still link up correctly.
#[repr(C)]
pub struct Node {
    value: AtomicU16,
    pub next: PackedPtr,
    pub next_free: PackedPtr,
    /// Immutable position of this node in the pool array, written once
    /// during initialization.
    idx: u16,
}

impl Node {
    pub fn value(&self) -> u16 {
        self.value.load(Ordering::Acquire)
    }

    pub fn set_value(&self, v: u16) {
        self.value.store(v, Ordering::Release);
    }

    pub fn idx(&self) -> u16 {
        self.idx
    }

    /// Resets a node to its "just returned to the free list" state: no
    /// payload, no outgoing links. Called before a node is linked back
    /// into the free chain.
    pub fn reset(&self) {
        self.set_value(0);
        self.next.store(NodePtr::NIL, Ordering::Release);
        self.next_free.store(NodePtr::NIL, Ordering::Release);
    }

    /// Initializes node `i` during pool construction. Takes `&mut self`
    /// because it runs while the creating process still holds unique
    /// access to the mapping, before any other opener can observe it.
    pub(crate) fn init_in_place(&mut self, i: usize) {
        *self.value.get_mut() = 0;
        self.next.store(NodePtr::NIL, Ordering::Relaxed);
        self.next_free.store(NodePtr::NIL, Ordering::Relaxed);
        self.idx = i as u16;
    }
}
