//! Database handle: owns the latest header, the tracked EOF, and
//! orchestrates bulk-modify calls against both primary trees plus the
//! local-docs tree.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::block::{BLOCK_SIZE, MARKER_HEADER};
use crate::btree::{self, Action, TreeKind};
use crate::chunk;
use crate::database::header::{Header, DISK_VERSION};
use crate::errors::{StoreError, StoreResult};
use crate::file_ops::{FileOps, OpenFlags, StdFileOps};
use crate::types::NodePointer;

/// Options controlling how [`Db::open`] behaves when the target file is
/// missing or empty.
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    pub create: bool,
    pub chunk_threshold: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self { create: true, chunk_threshold: btree::DEFAULT_CHUNK_THRESHOLD }
    }
}

/// An open store file. Mutated only by `save_docs`/`commit`/the local-doc
/// shims; readers of a cloned header snapshot never observe a write until
/// a fresh `commit` replaces it.
pub struct Db {
    ops: Box<dyn FileOps>,
    write_offset: AtomicU64,
    header: Mutex<Header>,
    chunk_threshold: usize,
    pending: Mutex<PendingBatch>,
    // Set by any queued action, including an immediately-applied local-doc
    // write. `commit` must not skip writing a header while this is set,
    // even when the by-id/by-seq batches themselves are empty.
    dirty: AtomicBool,
}

#[derive(Default)]
struct PendingBatch {
    by_id: Vec<Action>,
    by_seq: Vec<Action>,
}

impl Db {
    /// Opens `path`, locating the most recent valid header by scanning
    /// backward from EOF. Creates a fresh empty-root header if the file is
    /// empty and `opts.create` is set.
    ///
    /// # Errors
    /// `StoreError::NoHeader` if no valid header is found and creation is
    /// not permitted; `StoreError::HeaderVersion` if a header with an
    /// unsupported disk version is the newest one found (scanning does not
    /// fall back past a version mismatch, matching couchstore's behavior of
    /// treating it as a hard failure rather than silently skipping it).
    pub fn open(path: &Path, opts: OpenOptions) -> StoreResult<Self> {
        let ops = StdFileOps::open(path, OpenFlags { create: opts.create }).map_err(|_| StoreError::OpenFile)?;
        let eof = ops.goto_eof().map_err(|_| StoreError::OpenFile)?;

        let header = if eof == 0 {
            if !opts.create {
                return Err(StoreError::NoHeader);
            }
            Header::empty()
        } else {
            scan_for_header(&ops, eof)?
        };

        Ok(Self {
            ops: Box::new(ops),
            write_offset: AtomicU64::new(eof),
            header: Mutex::new(header),
            chunk_threshold: opts.chunk_threshold,
            pending: Mutex::new(PendingBatch::default()),
            dirty: AtomicBool::new(false),
        })
    }

    /// A read-only snapshot of the header this handle last committed (or
    /// opened with). Lookups and range scans against this snapshot never
    /// observe writes appended after it was taken.
    #[must_use]
    pub fn header_snapshot(&self) -> Header {
        self.header.lock().clone()
    }

    pub(crate) fn file_ops(&self) -> &dyn FileOps {
        self.ops.as_ref()
    }

    fn next_offset(&self) -> &AtomicU64 {
        &self.write_offset
    }

    /// Queues `actions` against the named tree for the next `commit`.
    /// Internal helper shared by the `ops` module's document and
    /// local-doc APIs.
    pub(crate) fn queue(&self, kind: TreeKind, action: Action) {
        match kind {
            TreeKind::ById => self.pending.lock().by_id.push(action),
            TreeKind::BySeq => self.pending.lock().by_seq.push(action),
            TreeKind::LocalDocs => {
                // Local docs commit immediately: they carry no sequence
                // number and are not part of the durability contract that
                // ties a batch to `update_seq`.
                self.commit_local(action);
            }
        }
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn commit_local(&self, action: Action) {
        let mut header = self.header.lock();
        let reducer = crate::btree::reducer_for(TreeKind::LocalDocs);
        let mut offset = self.write_offset.load(Ordering::SeqCst);
        let new_root = btree::bulk_modify(self.ops.as_ref(), &mut offset, header.local_docs_root.as_ref(), vec![action], reducer.as_ref(), self.chunk_threshold)
            .unwrap_or_else(|_| header.local_docs_root.clone());
        self.write_offset.store(offset, Ordering::SeqCst);
        header.local_docs_root = new_root;
    }

    /// Allocates the next `update_seq` values, assigning sequential
    /// numbers starting just past the header's current `update_seq`.
    pub(crate) fn next_seq_block(&self, n: u64) -> u64 {
        let mut header = self.header.lock();
        let start = header.update_seq + 1;
        header.update_seq += n;
        start
    }

    pub(crate) fn current_by_id_root(&self) -> Option<NodePointer> {
        self.header.lock().by_id_root.clone()
    }

    pub(crate) fn current_by_seq_root(&self) -> Option<NodePointer> {
        self.header.lock().by_seq_root.clone()
    }

    pub(crate) fn current_local_docs_root(&self) -> Option<NodePointer> {
        self.header.lock().local_docs_root.clone()
    }

    pub(crate) fn chunk_threshold(&self) -> usize {
        self.chunk_threshold
    }

    /// Writes `payload` as a new data chunk at the tracked EOF, advancing
    /// it, and returns the chunk's starting offset.
    ///
    /// # Errors
    /// Propagates I/O failures from the underlying write.
    pub(crate) fn append_chunk(&self, payload: &[u8], compress: bool) -> StoreResult<u64> {
        let offset = self.next_offset().load(Ordering::SeqCst);
        let written = chunk::write_chunk(self.ops.as_ref(), offset, payload, compress, false)?;
        self.write_offset.fetch_add(written, Ordering::SeqCst);
        Ok(offset)
    }

    /// Applies the pending by-id and by-seq batches, writes a new header
    /// chunk aligned to the next block boundary, and syncs twice: once
    /// after the tree data, once after the header.
    ///
    /// # Errors
    /// Propagates I/O and tree-modify errors. A failed commit leaves the
    /// previous header as the most recent valid one.
    pub fn commit(&self) -> StoreResult<()> {
        let (by_id_batch, by_seq_batch) = {
            let mut pending = self.pending.lock();
            (std::mem::take(&mut pending.by_id), std::mem::take(&mut pending.by_seq))
        };
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let mut header = self.header.lock();
        let mut offset = self.write_offset.load(Ordering::SeqCst);

        let by_id_reducer = crate::btree::reducer_for(TreeKind::ById);
        let new_by_id = btree::bulk_modify(self.ops.as_ref(), &mut offset, header.by_id_root.as_ref(), by_id_batch, by_id_reducer.as_ref(), self.chunk_threshold)?;

        let by_seq_reducer = crate::btree::reducer_for(TreeKind::BySeq);
        let new_by_seq = btree::bulk_modify(self.ops.as_ref(), &mut offset, header.by_seq_root.as_ref(), by_seq_batch, by_seq_reducer.as_ref(), self.chunk_threshold)?;

        self.ops.sync().map_err(|_| StoreError::Write)?;

        header.by_id_root = new_by_id;
        header.by_seq_root = new_by_seq;

        // Align the header chunk to the next block boundary, padding with
        // a zero-length data chunk if we are not already aligned.
        if offset % BLOCK_SIZE != 0 {
            let written = chunk::write_chunk(self.ops.as_ref(), offset, &[], false, false)?;
            offset += written;
        }
        debug_assert_eq!(offset % BLOCK_SIZE, 0);

        let header_bytes = header.encode();
        let written = chunk::write_chunk(self.ops.as_ref(), offset, &header_bytes, false, true)?;
        offset += written;
        self.write_offset.store(offset, Ordering::SeqCst);

        self.ops.sync().map_err(|_| StoreError::Write)?;
        Ok(())
    }

    /// Releases the handle without writing anything; any uncommitted
    /// batch is simply dropped.
    pub fn close(self) {
        drop(self);
    }
}

/// Scans backward from `eof` in block-sized steps looking for a
/// `0x01`-marked header whose chunk decodes and checksums cleanly.
/// A checksum failure (or a decode failure) at one offset is not fatal: the
/// scan simply continues further back. An unsupported disk version is
/// different: the newest header found is well-formed, it is just not one
/// this version of the engine can open, so the scan stops and surfaces
/// `HeaderVersion` instead of silently falling back to an older header.
fn scan_for_header(ops: &dyn FileOps, eof: u64) -> StoreResult<Header> {
    let mut block_start = eof - (eof % BLOCK_SIZE);
    loop {
        let mut marker = [0u8; 1];
        if ops.pread(&mut marker, block_start).is_ok_and(|n| n == 1) && marker[0] == MARKER_HEADER
            && let Ok(bytes) = chunk::read_chunk(ops, block_start, true)
        {
            match Header::decode(&bytes) {
                Ok(header) => return Ok(header),
                Err(StoreError::HeaderVersion) => return Err(StoreError::HeaderVersion),
                Err(_) => {}
            }
        }
        if block_start == 0 {
            return Err(StoreError::NoHeader);
        }
        block_start -= BLOCK_SIZE;
    }
}

#[must_use]
pub fn default_disk_version() -> i64 {
    DISK_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn open_on_empty_file_creates_fresh_header() {
        let tmp = NamedTempFile::new().unwrap();
        let db = Db::open(tmp.path(), OpenOptions::default()).unwrap();
        let h = db.header_snapshot();
        assert_eq!(h.disk_version, DISK_VERSION);
        assert_eq!(h.update_seq, 0);
        assert!(h.by_id_root.is_none());
    }

    #[test]
    fn open_without_create_on_empty_file_fails() {
        let tmp = NamedTempFile::new().unwrap();
        let opts = OpenOptions { create: false, ..OpenOptions::default() };
        assert!(matches!(Db::open(tmp.path(), opts), Err(StoreError::NoHeader)));
    }

    #[test]
    fn commit_with_no_pending_actions_is_a_no_op() {
        let tmp = NamedTempFile::new().unwrap();
        let db = Db::open(tmp.path(), OpenOptions::default()).unwrap();
        let before = db.write_offset.load(Ordering::SeqCst);
        db.commit().unwrap();
        assert_eq!(db.write_offset.load(Ordering::SeqCst), before);
    }

    #[test]
    fn reopen_after_commit_recovers_header() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        {
            let db = Db::open(&path, OpenOptions::default()).unwrap();
            db.queue(TreeKind::ById, Action::Insert(b"a".to_vec(), b"v".to_vec()));
            db.commit().unwrap();
        }
        let db2 = Db::open(&path, OpenOptions::default()).unwrap();
        let h = db2.header_snapshot();
        assert!(h.by_id_root.is_some());
        assert_eq!(crate::btree::lookup(db2.file_ops(), h.by_id_root.as_ref(), b"a").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn a_newest_header_with_an_unsupported_version_is_a_hard_failure_not_a_skip() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        {
            let db = Db::open(&path, OpenOptions::default()).unwrap();
            db.queue(TreeKind::ById, Action::Insert(b"a".to_vec(), b"v".to_vec()));
            db.commit().unwrap();

            // Append a second, newer header with an unsupported disk version
            // directly past the one `commit` just wrote.
            let mut bad_header = db.header_snapshot();
            bad_header.disk_version = 99;
            let mut offset = db.write_offset.load(Ordering::SeqCst);
            if offset % BLOCK_SIZE != 0 {
                offset += chunk::write_chunk(db.ops.as_ref(), offset, &[], false, false).unwrap();
            }
            let written = chunk::write_chunk(db.ops.as_ref(), offset, &bad_header.encode(), false, true).unwrap();
            offset += written;
            db.write_offset.store(offset, Ordering::SeqCst);
        }

        assert!(matches!(Db::open(&path, OpenOptions::default()), Err(StoreError::HeaderVersion)));
    }
}
