//! A single Michael & Scott two-lock-free-queue primitive, parameterized
//! over which link field of [`Node`] it follows. The data queue and the
//! free list are both instances of this primitive: the spec's free-list
//! operations are structurally identical to the data queue's, differing
//! only in which pair of head/tail words and which link field they use.

use std::sync::atomic::Ordering::Acquire;

use crate::error::QueueError;
use crate::node::{validate_index, Node, POOL_CAPACITY};
use crate::node_ptr::{NodePtr, PackedPtr, NONE};

/// Selects which of a node's two link fields a chain operates over.
pub trait Link {
    fn field(node: &Node) -> &PackedPtr;
}

/// The data queue's `next` chain.
pub struct DataLink;
impl Link for DataLink {
    fn field(node: &Node) -> &PackedPtr {
        &node.next
    }
}

/// The free list's `next_free` chain.
pub struct FreeLink;
impl Link for FreeLink {
    fn field(node: &Node) -> &PackedPtr {
        &node.next_free
    }
}

/// Links `node_idx` onto the tail of the chain. `node_idx` must already be
/// fully initialized (payload/link fields set) and owned exclusively by
/// the caller before this is invoked — it becomes visible to other threads
/// only once the CAS in step (a) below succeeds.
///
/// Every index read off the chain's live state is validated before it is
/// used to subscript `nodes`, so a corrupted `tail`/`next` surfaces as
/// `QueueError::CorruptPool` instead of an out-of-bounds panic.
pub fn enqueue<L: Link>(
    nodes: &[Node; POOL_CAPACITY],
    tail: &PackedPtr,
    node_idx: u16,
) -> Result<(), QueueError> {
    let observed_tail = loop {
        let tail_snapshot = tail.load(Acquire);
        validate_index(tail_snapshot.index)?;
        let next = L::field(&nodes[tail_snapshot.index as usize]).load(Acquire);
        if tail.load(Acquire) != tail_snapshot {
            continue; // tail moved under us, restart
        }
        if next.index == NONE {
            // tail really is the last node; try to link ours after it (a)
            let desired = NodePtr::new(node_idx as i32, next.count + 1);
            if L::field(&nodes[tail_snapshot.index as usize]).compare_and_swap(next, desired) {
                break tail_snapshot;
            }
        } else {
            validate_index(next.index)?;
            // tail is lagging; help swing it forward before retrying
            let _ = tail.compare_and_swap(
                tail_snapshot,
                NodePtr::new(next.index, tail_snapshot.count + 1),
            );
        }
    };
    // Best-effort: swing tail to the node we just linked. Ignore the
    // result — another thread may already have done this for us.
    let _ = tail.compare_and_swap(
        observed_tail,
        NodePtr::new(node_idx as i32, observed_tail.count + 1),
    );
    Ok(())
}

/// Detaches the node immediately after `head`.
///
/// Returns `Ok(Some((value, detached_index)))` on success: `value` is
/// `nodes[next.index].value()`, read *before* `head` is advanced, and
/// `detached_index` is the old head's index — the node no longer
/// referenced by this chain once the CAS succeeds, safe for the caller to
/// repurpose. Returns `Ok(None)` if the chain holds only its dummy
/// sentinel. Every index read off the chain's live state is validated
/// before it is used to subscript `nodes`, so a corrupted `head`/`tail`/
/// `next` surfaces as `QueueError::CorruptPool` instead of an
/// out-of-bounds panic.
pub fn dequeue<L: Link>(
    nodes: &[Node; POOL_CAPACITY],
    head: &PackedPtr,
    tail: &PackedPtr,
) -> Result<Option<(u16, u16)>, QueueError> {
    loop {
        let head_snapshot = head.load(Acquire);
        validate_index(head_snapshot.index)?;
        let tail_snapshot = tail.load(Acquire);
        validate_index(tail_snapshot.index)?;
        let next = L::field(&nodes[head_snapshot.index as usize]).load(Acquire);
        if head.load(Acquire) != head_snapshot {
            continue; // head moved under us, restart
        }
        if head_snapshot.index == tail_snapshot.index {
            if next.index == NONE {
                return Ok(None); // genuinely empty
            }
            validate_index(next.index)?;
            // tail is lagging behind head; help it catch up, then retry
            let _ = tail.compare_and_swap(
                tail_snapshot,
                NodePtr::new(next.index, tail_snapshot.count + 1),
            );
        } else {
            validate_index(next.index)?;
            // Read before the CAS: once head advances, this node is
            // eligible for reuse by another thread and its value field
            // may be overwritten.
            let value = nodes[next.index as usize].value();
            if head.compare_and_swap(
                head_snapshot,
                NodePtr::new(next.index, head_snapshot.count + 1),
            ) {
                return Ok(Some((value, head_snapshot.index as u16)));
            }
        }
    }
}
