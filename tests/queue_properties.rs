//! Single-process testable properties from spec §8: dequeue-on-empty,
//! FIFO single-producer/single-consumer, walk consistency, the pool
//! bound, and empty-state transitions. Mirrors
//! `original_source/cqueue_test.go`'s `TestDequeueEmpty` and
//! `TestEnqueueMultiple`.

use std::sync::atomic::{AtomicUsize, Ordering};

use shm_queue::{load_shared, QueueError, SharedMemory, POOL_CAPACITY};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Gives each test its own backing directory and region name so tests
/// never interfere with each other or touch the real `/dev/shm`.
struct TestRegion {
    _dir: tempfile::TempDir,
    name: String,
}

impl TestRegion {
    fn new(prefix: &str) -> Self {
        let _ = env_logger::try_init();
        let dir = tempfile::tempdir().expect("tempdir");
        std::env::set_var("SHMQUEUE_DIR", dir.path());
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        TestRegion {
            _dir: dir,
            name: format!("{prefix}-{n}"),
        }
    }

    fn load(&self) -> SharedMemory {
        load_shared(&self.name).expect("load_shared")
    }
}

/// Scenario A: create region "t-A"; dequeue() on a fresh queue.
#[test]
fn scenario_a_dequeue_on_empty() {
    let region = TestRegion::new("t-A");
    let mem = region.load();
    let queue = mem.list();
    assert!(matches!(queue.dequeue(), Err(QueueError::Empty)));
    mem.close().unwrap();
}

/// Scenario B: sequential single-thread enqueue/walk/dequeue, then one
/// more enqueue-dequeue after a full drain.
#[test]
fn scenario_b_sequential_fifo_and_walk() {
    let region = TestRegion::new("t-B");
    let mem = region.load();
    let queue = mem.list();

    let n: u16 = (POOL_CAPACITY - 2) as u16; // 65532, matching the reference test
    for v in 0..n {
        queue.enqueue(v).unwrap();
    }

    let mut walked = Vec::with_capacity(n as usize);
    queue.walk(|v| walked.push(v));
    assert_eq!(walked, (0..n).collect::<Vec<_>>());

    for expected in 0..n {
        assert_eq!(queue.dequeue().unwrap(), expected);
    }
    assert!(queue.empty());

    // Invariant 5, second clause: after a full drain, enqueue still works.
    queue.enqueue(123).unwrap();
    assert_eq!(queue.dequeue().unwrap(), 123);

    mem.close().unwrap();
}

/// Invariant 5: the pool holds exactly `POOL_CAPACITY - 1` usable slots;
/// the slot past that fails with `FreeListEmpty`, and draining one value
/// makes room for exactly one more.
#[test]
fn pool_bound_is_capacity_minus_one() {
    let region = TestRegion::new("t-bound");
    let mem = region.load();
    let queue = mem.list();

    for v in 0..(POOL_CAPACITY - 1) as u32 {
        queue.enqueue(v as u16).unwrap();
    }
    assert!(matches!(queue.enqueue(0), Err(QueueError::FreeListEmpty)));

    assert_eq!(queue.dequeue().unwrap(), 0);
    queue.enqueue(9999).unwrap();
    assert!(matches!(queue.enqueue(0), Err(QueueError::FreeListEmpty)));

    mem.close().unwrap();
}

/// Invariant 6: `empty()` transitions false->true->false->true correctly.
#[test]
fn empty_transitions() {
    let region = TestRegion::new("t-empty");
    let mem = region.load();
    let queue = mem.list();

    assert!(queue.empty());
    queue.enqueue(1).unwrap();
    assert!(!queue.empty());
    queue.enqueue(2).unwrap();
    assert!(!queue.empty());
    queue.dequeue().unwrap();
    assert!(!queue.empty());
    queue.dequeue().unwrap();
    assert!(queue.empty());
}

/// On a completely fresh queue the dummy sentinel is node 0, and the
/// reference's literal `for i := head.index; i > 0; ...` loop never even
/// enters its body when `i` starts at 0 — so `walk_raw` observes nothing
/// at all here, unlike `walk`, which correctly reports the real values.
/// This is the quirk spec §9 calls out; `walk_raw` reproduces it on
/// purpose rather than "fixing" it, since its entire point is parity with
/// the reference.
#[test]
fn walk_raw_sees_nothing_while_sentinel_is_node_zero() {
    let region = TestRegion::new("t-walk-raw-fresh");
    let mem = region.load();
    let queue = mem.list();

    for v in 0..5u16 {
        queue.enqueue(v).unwrap();
    }

    let mut raw = Vec::new();
    queue.walk_raw(|v| raw.push(v));
    assert!(raw.is_empty());

    let mut skipped = Vec::new();
    queue.walk(|v| skipped.push(v));
    assert_eq!(skipped, vec![0, 1, 2, 3, 4]);
}

/// Once a dequeue has moved the sentinel off node 0, `walk_raw`'s
/// inclusive traversal does run, and visits exactly one more value than
/// `walk` — the stale payload left behind at the new sentinel.
#[test]
fn walk_raw_includes_stale_sentinel_after_a_dequeue() {
    let region = TestRegion::new("t-walk-raw-rotated");
    let mem = region.load();
    let queue = mem.list();

    for v in 0..5u16 {
        queue.enqueue(v).unwrap();
    }
    assert_eq!(queue.dequeue().unwrap(), 0);

    let mut raw = Vec::new();
    queue.walk_raw(|v| raw.push(v));
    let mut skipped = Vec::new();
    queue.walk(|v| skipped.push(v));

    assert_eq!(raw.len(), skipped.len() + 1);
    assert_eq!(&raw[1..], &skipped[..]);
    assert_eq!(skipped, vec![1, 2, 3, 4]);
}

/// Reopening an already-created region attaches to the existing pool
/// instead of re-initializing it.
#[test]
fn reopen_attaches_without_reinitializing() {
    let region = TestRegion::new("t-reopen");
    let first = region.load();
    first.list().enqueue(7).unwrap();
    first.close().unwrap();

    let second = region.load();
    assert_eq!(second.list().dequeue().unwrap(), 7);
    second.close().unwrap();
}

/// FIFO holds across a long interleaved sequence from one producer and
/// one consumer running concurrently on separate threads.
#[test]
fn fifo_single_producer_single_consumer() {
    let region = TestRegion::new("t-spsc");
    let mem = region.load();
    let queue = mem.list();
    let n: u16 = 20_000;

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for v in 0..n {
                loop {
                    match queue.enqueue(v) {
                        Ok(()) => break,
                        Err(QueueError::FreeListEmpty) => std::hint::spin_loop(),
                        Err(e) => panic!("unexpected enqueue error: {e}"),
                    }
                }
            }
        });

        let mut received = Vec::with_capacity(n as usize);
        while received.len() < n as usize {
            match queue.dequeue() {
                Ok(v) => received.push(v),
                Err(QueueError::Empty) => std::hint::spin_loop(),
                Err(e) => panic!("unexpected dequeue error: {e}"),
            }
        }
        assert_eq!(received, (0..n).collect::<Vec<_>>());
    });

    mem.close().unwrap();
}
