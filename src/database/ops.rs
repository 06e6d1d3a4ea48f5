//! Document and local-doc shims over the B+-tree engine.

use crate::btree::{lookup as tree_lookup, Action, RangeCursor, TreeKind};
use crate::database::core::Db;
use crate::errors::StoreResult;
use crate::types::{Doc, DocInfo};

impl Db {
    /// Saves `docs` (already paired with caller-supplied `rev`/`deleted`
    /// metadata via `infos`), assigning sequence numbers in order and
    /// queuing by-id/by-seq batch actions for the next `commit`.
    ///
    /// `infos[i].seq`/`infos[i].bp`/`infos[i].size` are overwritten; the
    /// caller only needs to have set `id`, `meta`, `deleted`, `rev`.
    ///
    /// # Errors
    /// Propagates I/O errors writing document body chunks, or decode
    /// errors consulting the current by-id tree for superseded sequence
    /// numbers.
    pub fn save_docs(&self, docs: &[Doc], infos: &mut [DocInfo]) -> StoreResult<()> {
        assert_eq!(docs.len(), infos.len(), "docs and infos must be parallel slices");
        let start_seq = self.next_seq_block(docs.len() as u64);
        let by_id_root = self.current_by_id_root();

        for (i, (doc, info)) in docs.iter().zip(infos.iter_mut()).enumerate() {
            info.seq = start_seq + i as u64;
            info.body_kind = doc.body_kind();

            if info.deleted {
                info.bp = 0;
                info.size = 0;
            } else {
                let body = doc.body();
                info.size = body.len() as u64;
                info.bp = self.append_chunk(body, true)?;
            }

            // Look up any existing DocInfo for this id so its old seq entry
            // can be retired from the by-seq tree in the same batch.
            if let Some(old_encoded) = tree_lookup(self.file_ops(), by_id_root.as_ref(), &info.id)? {
                let old_info = DocInfo::decode(&old_encoded)?;
                self.queue(TreeKind::BySeq, Action::Remove(old_info.seq.to_be_bytes().to_vec()));
            }

            let encoded = info.encode();
            if info.deleted {
                self.queue(TreeKind::ById, Action::Remove(info.id.clone()));
            } else {
                self.queue(TreeKind::ById, Action::Insert(info.id.clone(), encoded.clone()));
            }
            self.queue(TreeKind::BySeq, Action::Insert(info.seq.to_be_bytes().to_vec(), encoded));
        }
        Ok(())
    }

    /// Looks up the current `DocInfo` for `id` against this handle's last
    /// committed header.
    ///
    /// # Errors
    /// Propagates I/O and decode errors.
    pub fn lookup_by_id(&self, id: &[u8]) -> StoreResult<Option<DocInfo>> {
        let root = self.current_by_id_root();
        tree_lookup(self.file_ops(), root.as_ref(), id)?.map(|b| DocInfo::decode(&b)).transpose()
    }

    /// Looks up the `DocInfo` recorded at sequence number `seq`.
    ///
    /// # Errors
    /// Propagates I/O and decode errors.
    pub fn lookup_by_seq(&self, seq: u64) -> StoreResult<Option<DocInfo>> {
        let root = self.current_by_seq_root();
        tree_lookup(self.file_ops(), root.as_ref(), &seq.to_be_bytes())?.map(|b| DocInfo::decode(&b)).transpose()
    }

    /// Reads a document body previously written at `bp`/`size`.
    ///
    /// # Errors
    /// Propagates I/O and checksum errors.
    pub fn read_body(&self, bp: u64) -> StoreResult<Vec<u8>> {
        crate::chunk::read_chunk(self.file_ops(), bp, false)
    }

    /// Opens a resumable range cursor over the by-id tree, in key order.
    ///
    /// # Errors
    /// Propagates I/O and decode errors descending to the start key.
    pub fn range_by_id<'a>(&'a self, start_inclusive: Option<&[u8]>, end_exclusive: Option<&[u8]>) -> StoreResult<RangeCursor<'a>> {
        let root = self.current_by_id_root();
        RangeCursor::new(self.file_ops(), root.as_ref(), start_inclusive, end_exclusive)
    }

    /// Opens a resumable range cursor over the by-seq tree.
    ///
    /// # Errors
    /// Propagates I/O and decode errors descending to the start key.
    pub fn range_by_seq<'a>(&'a self, start_inclusive: Option<u64>, end_exclusive: Option<u64>) -> StoreResult<RangeCursor<'a>> {
        let root = self.current_by_seq_root();
        let start = start_inclusive.map(|s| s.to_be_bytes());
        let end = end_exclusive.map(|e| e.to_be_bytes());
        RangeCursor::new(self.file_ops(), root.as_ref(), start.as_ref().map(|s| s.as_slice()), end.as_ref().map(|e| e.as_slice()))
    }

    /// Saves a local doc (never assigned a sequence number, never part of
    /// a durability-sensitive batch — it commits as soon as it's queued).
    ///
    /// # Errors
    /// Propagates I/O errors from the immediate tree write.
    pub fn save_local_doc(&self, id: &[u8], value: &[u8]) {
        self.queue(TreeKind::LocalDocs, Action::Insert(id.to_vec(), value.to_vec()));
    }

    /// Deletes a local doc by id.
    pub fn delete_local_doc(&self, id: &[u8]) {
        self.queue(TreeKind::LocalDocs, Action::Remove(id.to_vec()));
    }

    /// # Errors
    /// Propagates I/O and decode errors.
    pub fn get_local_doc(&self, id: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let root = self.current_local_docs_root();
        tree_lookup(self.file_ops(), root.as_ref(), id)
    }
}
