//! The pool: a fixed node array plus the four head/tail words for the
//! data queue and the free list, laid out so the whole structure can be
//! embedded directly at the start of a shared-memory mapping.

use std::sync::atomic::Ordering::{Acquire, Relaxed};

use crate::chain::{self, DataLink, FreeLink};
use crate::error::QueueError;
use crate::node::{Node, POOL_CAPACITY};
use crate::node_ptr::{NodePtr, PackedPtr, NONE};

/// `head, tail, free_head, free_tail`, then the flat node array — this
/// exact field order is the on-disk/on-wire layout contract for the
/// mapping (spec §6 "Backing-store layout").
#[repr(C)]
pub struct Pool {
    pub head: PackedPtr,
    pub tail: PackedPtr,
    pub free_head: PackedPtr,
    pub free_tail: PackedPtr,
    pub nodes: [Node; POOL_CAPACITY],
}

impl Pool {
    /// Runs once, on the process that creates the backing region, before
    /// any other opener can observe it. Node 0 becomes the data queue's
    /// dummy head; nodes `1..POOL_CAPACITY` form the initial free chain.
    pub(crate) fn init_in_place(&mut self) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.init_in_place(i);
        }
        for i in 0..POOL_CAPACITY - 1 {
            self.nodes[i]
                .next_free
                .store(NodePtr::new((i + 1) as i32, 0), Relaxed);
        }
        self.nodes[POOL_CAPACITY - 1]
            .next_free
            .store(NodePtr::NIL, Relaxed);

        // Node 0 is reserved as the data queue's dummy head: sever it
        // from the free chain the loop above just linked it into.
        self.nodes[0].next.store(NodePtr::NIL, Relaxed);
        self.nodes[0].next_free.store(NodePtr::NIL, Relaxed);

        self.head.store(NodePtr::new(0, 0), Relaxed);
        self.tail.store(NodePtr::new(0, 0), Relaxed);
        self.free_head.store(NodePtr::new(1, 0), Relaxed);
        self.free_tail
            .store(NodePtr::new((POOL_CAPACITY - 1) as i32, 0), Relaxed);
    }

    pub fn enqueue(&self, v: u16) -> Result<(), QueueError> {
        let node_idx = self.dequeue_free()?;

        let node = &self.nodes[node_idx as usize];
        node.set_value(v);
        node.next.store(NodePtr::NIL, Relaxed);

        chain::enqueue::<DataLink>(&self.nodes, &self.tail, node_idx)
    }

    pub fn dequeue(&self) -> Result<u16, QueueError> {
        let (value, recycle_idx) = chain::dequeue::<DataLink>(&self.nodes, &self.head, &self.tail)?
            .ok_or(QueueError::Empty)?;
        self.enqueue_free(recycle_idx)?;
        Ok(value)
    }

    /// Fast approximate emptiness check: `head.index == tail.index`. A
    /// strict test additionally requires `nodes[head.index].next.index ==
    /// -1` (a transiently lagging `tail` can otherwise make this return
    /// `false` for one instant on an otherwise-empty queue).
    pub fn empty(&self) -> bool {
        self.head.load(Acquire).index == self.tail.load(Acquire).index
    }

    /// Single-threaded snapshot traversal: visits real payload values in
    /// queue order, skipping the dummy sentinel. Undefined under
    /// concurrent mutation — callers must ensure quiescence.
    pub fn walk(&self, mut f: impl FnMut(u16)) {
        let head = self.head.load(Acquire);
        let mut i = self.nodes[head.index as usize].next.load(Acquire).index;
        while i != NONE {
            let node = &self.nodes[i as usize];
            f(node.value());
            i = node.next.load(Acquire).index;
        }
    }

    /// Reproduces the reference implementation's literal traversal:
    /// starts at `head.index` *inclusive* (so the first value observed is
    /// the stale sentinel payload) and stops once the index is no longer
    /// strictly positive. Exists for parity with the original source and
    /// for tests that want to observe the raw chain; ordinary callers
    /// should prefer [`Pool::walk`].
    pub fn walk_raw(&self, mut f: impl FnMut(u16)) {
        let mut i = self.head.load(Acquire).index;
        while i > 0 {
            let node = &self.nodes[i as usize];
            f(node.value());
            i = node.next.load(Acquire).index;
        }
    }

    fn dequeue_free(&self) -> Result<u16, QueueError> {
        let (_unused, detached) =
            chain::dequeue::<FreeLink>(&self.nodes, &self.free_head, &self.free_tail)?
                .ok_or(QueueError::FreeListEmpty)?;
        self.nodes[detached as usize]
            .next_free
            .store(NodePtr::NIL, Relaxed);
        Ok(detached)
    }

    fn enqueue_free(&self, idx: u16) -> Result<(), QueueError> {
        self.nodes[idx as usize].reset();
        chain::enqueue::<FreeLink>(&self.nodes, &self.free_tail, idx)
    }
}
