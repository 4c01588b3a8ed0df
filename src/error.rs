//! Error kinds exposed at the crate boundary.

use thiserror::Error;

/// Everything that can go wrong calling into this crate.
///
/// `Empty` and `FreeListEmpty` are expected, non-fatal outcomes of normal
/// operation — the queue state is unchanged when either is returned, and
/// callers that want to wait simply retry. `CorruptPool` and `Io` are
/// resource/programmer errors: something about the mapped region or the
/// host filesystem is not what this crate expects.
#[derive(Debug, Error)]
pub enum QueueError {
    /// `dequeue` was called on a queue holding no payload nodes.
    #[error("queue is empty")]
    Empty,

    /// `enqueue` found no free node to carry the new value; the pool is
    /// holding its maximum of `POOL_CAPACITY - 1` values.
    #[error("free list is exhausted")]
    FreeListEmpty,

    /// A node index read from the shared region fell outside
    /// `[-1, POOL_CAPACITY - 1]`. Indicates a corrupted segment or an
    /// incompatible peer process.
    #[error("shared pool is corrupt: index {index} out of range")]
    CorruptPool { index: i32 },

    /// An OS-level failure opening, truncating, renaming, or mapping the
    /// backing file, propagated verbatim.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
