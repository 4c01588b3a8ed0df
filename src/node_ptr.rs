//! The packed pointer-counter word: a 64-bit value carrying a signed
//! 32-bit node index and an unsigned 32-bit ABA counter, manipulated only
//! through whole-word atomic operations.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel value for "no node".
pub const NONE: i32 = -1;

/// An unpacked view of a pointer-counter word.
///
/// `index` is `NONE` (`-1`) when the word points at nothing. `count` is
/// bumped by one on every successful compare-and-swap that installs a new
/// value into the word this was read from, which is what defeats the ABA
/// hazard: two reads that observe the same `index` after an intervening
/// cycle of detach/reattach will disagree on `count`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NodePtr {
    pub index: i32,
    pub count: u32,
}

impl NodePtr {
    pub const NIL: NodePtr = NodePtr { index: NONE, count: 0 };

    pub const fn new(index: i32, count: u32) -> Self {
        NodePtr { index, count }
    }

    fn pack(self) -> u64 {
        ((self.count as u64) << 32) | (self.index as u32 as u64)
    }

    fn unpack(bits: u64) -> Self {
        NodePtr {
            index: bits as u32 as i32,
            count: (bits >> 32) as u32,
        }
    }
}

impl fmt::Debug for NodePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePtr({}, #{})", self.index, self.count)
    }
}

/// An atomic pointer-counter word. Always accessed as a single 64-bit unit
/// so the index and counter never observe a torn intermediate state.
#[repr(transparent)]
pub struct PackedPtr(AtomicU64);

impl PackedPtr {
    pub fn new(value: NodePtr) -> Self {
        PackedPtr(AtomicU64::new(value.pack()))
    }

    /// Atomic load of the full word. Callers that need both halves to be
    /// mutually consistent must take them from the same `load`, not from
    /// separate reads of `index`/`count`.
    pub fn load(&self, order: Ordering) -> NodePtr {
        NodePtr::unpack(self.0.load(order))
    }

    /// Unconditional store, used only during single-threaded pool
    /// initialization (no other opener can observe the region yet).
    pub fn store(&self, value: NodePtr, order: Ordering) {
        self.0.store(value.pack(), order);
    }

    /// Atomic compare-and-swap of the whole word. Succeeds iff the word
    /// currently equals `expected` in both halves, in which case `desired`
    /// is installed. `desired.count` must already have been set to
    /// `expected.count + 1` by the caller; this method does not bump it
    /// itself, since not every CAS here installs a "new" logical value.
    pub fn compare_and_swap(&self, expected: NodePtr, desired: NodePtr) -> bool {
        self.0
            .compare_exchange(
                expected.pack(),
                desired.pack(),
                Ordering::Release,
                Ordering::Acquire,
            )
            .is_ok()
    }
}
