//! File layer: the positional I/O vtable the rest of the engine is built on.
//! A caller-supplied implementation is accepted so that alternative backends
//! (in-memory, test doubles) are pluggable.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviseHint {
    Sequential,
    WillNeed,
    DontNeed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    pub create: bool,
}

/// Positional file I/O operations. Implementations must be `Send + Sync` so
/// a `Db` can be freely shared across threads.
pub trait FileOps: Send + Sync {
    /// # Errors
    /// Returns an error if the underlying read fails for any reason other
    /// than a retried interrupted syscall.
    fn pread(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// # Errors
    /// Returns an error if the underlying write fails for any reason other
    /// than a retried interrupted syscall.
    fn pwrite(&self, buf: &[u8], offset: u64) -> io::Result<usize>;

    /// # Errors
    /// Returns an error if the file's length cannot be determined.
    fn goto_eof(&self) -> io::Result<u64>;

    /// # Errors
    /// Returns an error (mapped by callers to `StoreError::Write`) if the
    /// OS fails to flush durably.
    fn sync(&self) -> io::Result<()>;

    /// Best-effort readahead/eviction hint. Never an error for callers to
    /// act on; a backend that cannot honor it silently no-ops.
    fn advise(&self, offset: u64, len: u64, hint: AdviseHint) -> io::Result<()>;
}

/// Retries `f` while it reports `ErrorKind::Interrupted`
/// ("All I/O loops on interrupted-syscall signals").
fn retry_on_interrupted<T>(mut f: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    loop {
        match f() {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Standard single-file backend, used for every real (non-test-double) open.
pub struct StdFileOps {
    file: parking_lot::Mutex<File>,
}

impl StdFileOps {
    /// Opens `path`, creating it when `flags.create` is set.
    ///
    /// # Errors
    /// Returns `io::ErrorKind::NotFound` distinctly from other open
    /// failures.
    pub fn open(path: &Path, flags: OpenFlags) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).create(flags.create).open(path)?;
        Ok(Self { file: parking_lot::Mutex::new(file) })
    }
}

impl FileOps for StdFileOps {
    fn pread(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        retry_on_interrupted(|| {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(offset))?;
            file.read(buf)
        })
    }

    fn pwrite(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        retry_on_interrupted(|| {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(offset))?;
            file.write(buf)
        })
    }

    fn goto_eof(&self) -> io::Result<u64> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::End(0))
    }

    fn sync(&self) -> io::Result<()> {
        self.file.lock().sync_all()
    }

    fn advise(&self, _offset: u64, _len: u64, _hint: AdviseHint) -> io::Result<()> {
        // No portable posix_fadvise in the dependency stack; a hint is
        // never required for correctness, so this is an intentional no-op.
        Ok(())
    }
}

/// Reads exactly `buf.len()` bytes at `offset`, looping past short reads.
///
/// # Errors
/// Returns `io::ErrorKind::UnexpectedEof` if EOF is hit before `buf` fills.
pub fn pread_exact(ops: &dyn FileOps, buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    let mut filled = 0usize;
    while filled < buf.len() {
        let n = ops.pread(&mut buf[filled..], offset)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short read"));
        }
        filled += n;
        offset += n as u64;
    }
    Ok(())
}

/// Writes all of `buf` at `offset`, looping past short writes.
///
/// # Errors
/// Propagates the underlying I/O error.
pub fn pwrite_all(ops: &dyn FileOps, buf: &[u8], mut offset: u64) -> io::Result<()> {
    let mut written = 0usize;
    while written < buf.len() {
        let n = ops.pwrite(&buf[written..], offset)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
        }
        written += n;
        offset += n as u64;
    }
    Ok(())
}
