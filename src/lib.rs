//! A lock-free, multi-producer multi-consumer FIFO queue of `u16` values
//! living entirely inside a named POSIX shared-memory region, so that
//! independent OS processes mapping the same region can enqueue and
//! dequeue concurrently with no kernel-mediated synchronization on the
//! hot path.
//!
//! The queue is the two-lock-free-queue design attributed to Michael &
//! Scott, adapted so every link is an array index into a fixed node pool
//! rather than a native pointer — the pool is position-independent, which
//! is what lets it live in memory mapped at different virtual addresses
//! in different processes. A second, structurally identical chain over
//! the same node pool tracks which nodes are currently unused (the free
//! list), replacing a heap allocator on the hot path.
//!
//! ```no_run
//! use shm_queue::load_shared;
//!
//! let mem = load_shared("example-queue")?;
//! let queue = mem.list();
//! queue.enqueue(42)?;
//! assert_eq!(queue.dequeue()?, 42);
//! mem.close()?;
//! # Ok::<(), shm_queue::QueueError>(())
//! ```

mod chain;
mod error;
mod node;
mod node_ptr;
mod pool;
mod shared_memory;

pub use error::QueueError;
pub use node::POOL_CAPACITY;
pub use shared_memory::{load_shared, storage_size, Queue, SharedMemory};
