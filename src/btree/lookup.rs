//! Point lookup and ordered range scan over a B+-tree snapshot.
//!
//! Both operations only ever touch nodes reachable from the root pointer
//! they were handed; they never consult the file's current EOF, which is
//! what makes reads against an older header (the recovery scan, or a
//! long-lived iterator) safe while writers keep appending.

use crate::btree::node::Node;
use crate::chunk;
use crate::errors::StoreResult;
use crate::file_ops::FileOps;
use crate::types::NodePointer;

/// Looks up `key` under `root`. Returns `None` if the tree is empty or the
/// key is absent.
///
/// # Errors
/// Propagates I/O and decode errors reading intermediate nodes.
pub fn lookup(ops: &dyn FileOps, root: Option<&NodePointer>, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
    let Some(root) = root else { return Ok(None) };
    let mut pointer = root.pointer;
    loop {
        let node = Node::decode(&chunk::read_chunk(ops, pointer, false)?)?;
        match node {
            Node::Leaf(entries) => {
                return Ok(entries.into_iter().find(|(k, _)| k == key).map(|(_, v)| v));
            }
            Node::Interior(pointers) => {
                let idx = pointers.partition_point(|p| p.key.as_slice() < key).min(pointers.len() - 1);
                pointer = pointers[idx].pointer;
            }
        }
    }
}

/// A resumable, read-only in-order cursor over a tree snapshot.
///
/// Constructed against one root pointer, it never observes writes appended
/// after that point, the same guarantee the diagnostic CLI and range reads
/// rely on for consistent output.
pub struct RangeCursor<'a> {
    ops: &'a dyn FileOps,
    // Stack of (node entries or pointers, next index to visit).
    stack: Vec<(Node, usize)>,
    end_exclusive: Option<Vec<u8>>,
}

impl<'a> RangeCursor<'a> {
    /// Starts a cursor over `[start_inclusive, end_exclusive)`. `None` for
    /// either bound means unbounded on that side.
    ///
    /// # Errors
    /// Propagates I/O and decode errors descending to the start key.
    pub fn new(
        ops: &'a dyn FileOps,
        root: Option<&NodePointer>,
        start_inclusive: Option<&[u8]>,
        end_exclusive: Option<&[u8]>,
    ) -> StoreResult<Self> {
        let mut cursor = Self { ops, stack: Vec::new(), end_exclusive: end_exclusive.map(<[u8]>::to_vec) };
        let Some(root) = root else { return Ok(cursor) };
        cursor.descend(root.pointer, start_inclusive)?;
        Ok(cursor)
    }

    fn descend(&mut self, mut pointer: u64, start: Option<&[u8]>) -> StoreResult<()> {
        loop {
            let node = Node::decode(&chunk::read_chunk(self.ops, pointer, false)?)?;
            match &node {
                Node::Leaf(entries) => {
                    let idx = start.map_or(0, |s| entries.partition_point(|(k, _)| k.as_slice() < s));
                    self.stack.push((node, idx));
                    return Ok(());
                }
                Node::Interior(pointers) => {
                    let idx = start.map_or(0, |s| pointers.partition_point(|p| p.key.as_slice() < s));
                    let idx = idx.min(pointers.len() - 1);
                    let next_pointer = pointers[idx].pointer;
                    self.stack.push((node, idx));
                    pointer = next_pointer;
                }
            }
        }
    }

    /// # Errors
    /// Propagates I/O and decode errors descending into a sibling subtree.
    pub fn next(&mut self) -> StoreResult<Option<(Vec<u8>, Vec<u8>)>> {
        loop {
            let Some((node, idx)) = self.stack.last_mut() else { return Ok(None) };
            match node {
                Node::Leaf(entries) => {
                    if *idx >= entries.len() {
                        self.stack.pop();
                        continue;
                    }
                    let (k, v) = entries[*idx].clone();
                    if self.end_exclusive.as_deref().is_some_and(|end| k.as_slice() >= end) {
                        self.stack.clear();
                        return Ok(None);
                    }
                    *idx += 1;
                    return Ok(Some((k, v)));
                }
                Node::Interior(pointers) => {
                    if *idx >= pointers.len() {
                        self.stack.pop();
                        continue;
                    }
                    let pointer = pointers[*idx].pointer;
                    *idx += 1;
                    self.descend(pointer, None)?;
                }
            }
        }
    }
}
