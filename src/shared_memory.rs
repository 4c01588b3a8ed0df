//! The shared-memory binding: open-or-create a named backing region, map
//! it read/write/shared, and hand out a [`Queue`] handle whose operations
//! manipulate the mapped [`Pool`] in place.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;

use crate::error::QueueError;
use crate::pool::Pool;

/// Safety padding appended after the pool record itself, matching the
/// reference source's `4*1024 // safety padding`.
const SAFETY_PADDING: usize = 4 * 1024;

/// Total size, in bytes, of the backing region: one [`Pool`] record plus
/// safety padding. A static, platform-ABI-dependent constant — the segment
/// is not portable across architectures (field widths and alignment are
/// whatever this process's `Pool` layout says they are).
pub fn storage_size() -> usize {
    std::mem::size_of::<Pool>() + SAFETY_PADDING
}

/// Resolves the directory new regions are created in and existing ones
/// are looked up in. Honors `SHMQUEUE_DIR` so tests (and callers who don't
/// want to touch the real shared-memory namespace) can redirect this; production
/// use defaults to `/dev/shm`, the conventional POSIX shared-memory mount.
fn shm_dir() -> PathBuf {
    std::env::var_os("SHMQUEUE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/dev/shm"))
}

/// A live mapping of a named shared-memory queue. Dropping (or explicitly
/// [`close`](SharedMemory::close)-ing) this unmaps the region; the backing
/// file itself is untouched — its lifetime belongs to whoever created it.
pub struct SharedMemory {
    mmap: MmapMut,
}

/// A handle to the in-place queue living inside a [`SharedMemory`]
/// mapping. Valid for as long as the `SharedMemory` it was obtained from.
pub struct Queue<'a> {
    pool: &'a Pool,
}

impl SharedMemory {
    /// Opens the named region if it already exists, or creates and
    /// initializes it if not. See the module docs and `DESIGN.md` for how
    /// the first-creation race is handled.
    pub fn load(name: &str) -> Result<SharedMemory, QueueError> {
        let dir = shm_dir();
        let final_path = dir.join(name);

        match open_existing(&final_path) {
            Ok(file) => Ok(SharedMemory { mmap: map_existing(file)? }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Ok(SharedMemory { mmap: create_and_publish(&dir, name, &final_path)? })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns a handle to the in-place queue. Valid until `close`.
    pub fn list(&self) -> Queue<'_> {
        Queue {
            // SAFETY: `mmap` is at least `storage_size()` bytes (we
            // created or found it at that size), page-aligned (hence
            // 8-byte aligned, `Pool`'s strictest requirement), and every
            // field of `Pool`/`Node` is either a plain integer or an
            // atomic wrapper around one, both of which accept any bit
            // pattern a zeroed or previously-initialized mapping can hold.
            pool: unsafe { &*(self.mmap.as_ptr() as *const Pool) },
        }
    }

    /// Unmaps the region. The backing file is not removed; the harness or
    /// caller that created it owns cleanup.
    pub fn close(self) -> Result<(), QueueError> {
        // `MmapMut`'s `Drop` performs the unmap; there is nothing else to
        // release, so consuming `self` here is the entire contract.
        drop(self);
        Ok(())
    }
}

fn open_existing(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

#[cfg(unix)]
fn create_new_file(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_new_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).create_new(true).open(path)
}

fn map_existing(file: File) -> Result<MmapMut, QueueError> {
    // SAFETY: the file is expected to already be `storage_size()` bytes,
    // written by a creator that has finished initializing it (the rename
    // in `create_and_publish` only becomes visible at `final_path` after
    // initialization completes). Another process truncating or unlinking
    // the file out from under us is outside this crate's trust model (see
    // spec §1/§7: all processes mapping the segment are trusted).
    let mmap = unsafe { MmapMut::map_mut(&file)? };
    if mmap.len() < storage_size() {
        return Err(QueueError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "shared-memory region is smaller than the expected pool size",
        )));
    }
    Ok(mmap)
}

/// Builds a fully-initialized pool under a private, process-unique
/// temporary name, then atomically renames it onto `final_path`. No other
/// opener can observe a partially-initialized region this way: until the
/// rename lands, `final_path` simply doesn't exist yet from their point of
/// view, and once it does, the inode behind it is already complete.
fn create_and_publish(dir: &Path, name: &str, final_path: &Path) -> Result<MmapMut, QueueError> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static UNIQUE: AtomicU64 = AtomicU64::new(0);
    let uniq = UNIQUE.fetch_add(1, Ordering::Relaxed);
    let tmp_path = dir.join(format!(".{name}.tmp-{}-{}", std::process::id(), uniq));
    let tmp_file = create_new_file(&tmp_path)?;
    tmp_file.set_len(storage_size() as u64)?;

    log::info!(
        "creating shared-memory queue {:?} ({} bytes)",
        final_path,
        storage_size()
    );

    let mut mmap = unsafe { MmapMut::map_mut(&tmp_file)? };
    // SAFETY: see `SharedMemory::list` — same layout/alignment argument,
    // and we hold the only reference to this mapping until the rename
    // below, so `&mut` exclusivity is genuinely upheld here.
    let pool = unsafe { &mut *(mmap.as_mut_ptr() as *mut Pool) };
    pool.init_in_place();

    std::fs::rename(&tmp_path, final_path)?;
    Ok(mmap)
}

impl<'a> Queue<'a> {
    pub fn enqueue(&self, v: u16) -> Result<(), QueueError> {
        self.pool.enqueue(v)
    }

    pub fn dequeue(&self) -> Result<u16, QueueError> {
        self.pool.dequeue()
    }

    pub fn empty(&self) -> bool {
        self.pool.empty()
    }

    /// Visits values from the first real payload node forward, skipping
    /// the dummy sentinel. Single-threaded; callers must ensure
    /// quiescence (see spec §4.2 `Walk`).
    pub fn walk(&self, f: impl FnMut(u16)) {
        self.pool.walk(f)
    }

    /// Same traversal, but sentinel-inclusive — matches the reference
    /// source's literal behavior. See `DESIGN.md` for why this exists
    /// alongside `walk`.
    pub fn walk_raw(&self, f: impl FnMut(u16)) {
        self.pool.walk_raw(f)
    }
}

/// Opens or creates the named shared-memory region.
pub fn load_shared(name: &str) -> Result<SharedMemory, QueueError> {
    SharedMemory::load(name)
}
