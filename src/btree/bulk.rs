//! Bulk modify: the append-only batch update algorithm.
//!
//! Every call rewrites the path from root to the touched leaves as brand new
//! chunks, never mutating an existing chunk in place. The caller commits the
//! resulting root pointer into a new header; nothing is visible until then.

use std::cmp::Ordering;

use crate::btree::node::Node;
use crate::btree::reduce::Reducer;
use crate::chunk;
use crate::errors::StoreResult;
use crate::file_ops::FileOps;
use crate::types::NodePointer;

/// Couchstore's traditional default node-chunk threshold in bytes.
pub const DEFAULT_CHUNK_THRESHOLD: usize = 1279;

#[derive(Debug, Clone)]
pub enum Action {
    Insert(Vec<u8>, Vec<u8>),
    Remove(Vec<u8>),
}

impl Action {
    fn key(&self) -> &[u8] {
        match self {
            Self::Insert(k, _) => k,
            Self::Remove(k) => k,
        }
    }
}

/// Sorts `actions` by key and keeps only the last action for each key, the
/// way a single bulk call resolves multiple writes to the same key within
/// one batch.
fn prepare_batch(mut actions: Vec<Action>) -> Vec<Action> {
    actions.sort_by(|a, b| a.key().cmp(b.key()));
    let mut out: Vec<Action> = Vec::with_capacity(actions.len());
    for action in actions {
        if out.last().is_some_and(|last| last.key() == action.key()) {
            out.pop();
        }
        out.push(action);
    }
    out
}

/// Applies `actions` to the tree rooted at `root` (`None` means empty tree),
/// returning the new root (`None` if the tree became empty). Writes new
/// chunks via `ops`/`write_offset`, advancing it as it goes.
///
/// # Errors
/// Propagates I/O and decode errors from reading existing nodes or writing
/// new ones.
pub fn bulk_modify(
    ops: &dyn FileOps,
    write_offset: &mut u64,
    root: Option<&NodePointer>,
    actions: Vec<Action>,
    reducer: &dyn Reducer,
    chunk_threshold: usize,
) -> StoreResult<Option<NodePointer>> {
    let batch = prepare_batch(actions);
    if batch.is_empty() {
        return Ok(root.cloned());
    }

    let node = match root {
        Some(p) => chunk::read_chunk(ops, p.pointer, false).and_then(|b| Node::decode(&b))?,
        None => Node::Leaf(Vec::new()),
    };

    let new_pointers = modify_node(ops, write_offset, &node, &batch, reducer, chunk_threshold)?;

    match new_pointers.len() {
        0 => Ok(None),
        1 => Ok(Some(new_pointers.into_iter().next().unwrap())),
        _ => {
            // Root split: wrap the new pointers in one fresh interior level,
            // growing the tree's depth by one. Recurse until a single root
            // pointer remains, matching the way a B-tree grows upward.
            let mut level = new_pointers;
            loop {
                level = write_interior_splits(ops, write_offset, level, reducer, chunk_threshold)?;
                match level.len() {
                    0 => return Ok(None),
                    1 => return Ok(level.into_iter().next()),
                    _ => continue,
                }
            }
        }
    }
}

/// Recursively applies `batch` (already sorted, deduped, non-empty) to
/// `node`, returning the pointer(s) that replace it. More than one pointer
/// means `node` split under the batch's insertions; zero means every entry
/// in `node`'s subtree was removed.
fn modify_node(
    ops: &dyn FileOps,
    write_offset: &mut u64,
    node: &Node,
    batch: &[Action],
    reducer: &dyn Reducer,
    chunk_threshold: usize,
) -> StoreResult<Vec<NodePointer>> {
    match node {
        Node::Leaf(entries) => {
            let merged = merge_leaf(entries, batch);
            write_leaf_splits(ops, write_offset, merged, reducer, chunk_threshold)
        }
        Node::Interior(pointers) => {
            let groups = partition_batch(pointers, batch);
            let mut new_children: Vec<NodePointer> = Vec::new();
            for (idx, child_batch) in groups {
                if child_batch.is_empty() {
                    new_children.push(pointers[idx].clone());
                    continue;
                }
                let child_node = chunk::read_chunk(ops, pointers[idx].pointer, false).and_then(|b| Node::decode(&b))?;
                let replaced = modify_node(ops, write_offset, &child_node, &child_batch, reducer, chunk_threshold)?;
                new_children.extend(replaced);
            }
            write_interior_splits(ops, write_offset, new_children, reducer, chunk_threshold)
        }
    }
}

fn merge_leaf(entries: &[(Vec<u8>, Vec<u8>)], batch: &[Action]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::with_capacity(entries.len() + batch.len());
    let mut ei = entries.iter().peekable();
    let mut bi = batch.iter().peekable();
    loop {
        match (ei.peek(), bi.peek()) {
            (Some((ek, ev)), Some(action)) => match ek.as_slice().cmp(action.key()) {
                Ordering::Less => {
                    out.push((ek.clone(), ev.clone()));
                    ei.next();
                }
                Ordering::Greater => {
                    apply_action(&mut out, action);
                    bi.next();
                }
                Ordering::Equal => {
                    apply_action(&mut out, action);
                    ei.next();
                    bi.next();
                }
            },
            (Some((ek, ev)), None) => {
                out.push((ek.clone(), ev.clone()));
                ei.next();
            }
            (None, Some(action)) => {
                apply_action(&mut out, action);
                bi.next();
            }
            (None, None) => break,
        }
    }
    out
}

fn apply_action(out: &mut Vec<(Vec<u8>, Vec<u8>)>, action: &Action) {
    if let Action::Insert(k, v) = action {
        out.push((k.clone(), v.clone()));
    }
    // Remove: simply contributes nothing to `out`.
}

/// Groups `batch` entries by which child of an interior node they fall
/// under. Keys greater than every existing separator are clamped to the
/// last child; that child's separator key is recomputed from its new
/// contents on the way back up, so the tree's key range grows correctly.
fn partition_batch(pointers: &[NodePointer], batch: &[Action]) -> Vec<(usize, Vec<Action>)> {
    let mut groups: Vec<(usize, Vec<Action>)> = (0..pointers.len()).map(|i| (i, Vec::new())).collect();
    for action in batch {
        let idx = pointers.partition_point(|p| p.key.as_slice() < action.key());
        let idx = idx.min(pointers.len() - 1);
        groups[idx].1.push(action.clone());
    }
    groups
}

fn write_leaf_splits(
    ops: &dyn FileOps,
    write_offset: &mut u64,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    reducer: &dyn Reducer,
    chunk_threshold: usize,
) -> StoreResult<Vec<NodePointer>> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for chunk_entries in chunk_by_threshold(entries, |e| e.0.len() + e.1.len() + 16, chunk_threshold) {
        let node = Node::Leaf(chunk_entries);
        out.push(write_node(ops, write_offset, &node, reducer)?);
    }
    Ok(out)
}

fn write_interior_splits(
    ops: &dyn FileOps,
    write_offset: &mut u64,
    pointers: Vec<NodePointer>,
    reducer: &dyn Reducer,
    chunk_threshold: usize,
) -> StoreResult<Vec<NodePointer>> {
    if pointers.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for chunk_pointers in chunk_by_threshold(pointers, |p| p.key.len() + p.reduce_value.len() + 32, chunk_threshold) {
        let node = Node::Interior(chunk_pointers);
        out.push(write_node(ops, write_offset, &node, reducer)?);
    }
    Ok(out)
}

/// Greedily groups `items` into runs whose estimated encoded size stays at
/// or under `threshold`, always keeping at least one item per group.
fn chunk_by_threshold<T>(items: Vec<T>, weight: impl Fn(&T) -> usize, threshold: usize) -> Vec<Vec<T>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    let mut current_size = 0usize;
    for item in items {
        let w = weight(&item);
        if !current.is_empty() && current_size + w > threshold {
            groups.push(std::mem::take(&mut current));
            current_size = 0;
        }
        current_size += w;
        current.push(item);
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

fn write_node(ops: &dyn FileOps, write_offset: &mut u64, node: &Node, reducer: &dyn Reducer) -> StoreResult<NodePointer> {
    let max_key = node.max_key().map(<[u8]>::to_vec).unwrap_or_default();
    let (reduce_value, subtreesize) = match node {
        Node::Leaf(entries) => {
            let rv = reducer.leaf_reduce(entries)?;
            let mut size = 0u64;
            for (k, v) in entries {
                size += reducer.entry_weight(k, v)?;
            }
            (rv, size)
        }
        Node::Interior(pointers) => {
            let rv = reducer.rereduce(&pointers.iter().map(|p| p.reduce_value.clone()).collect::<Vec<_>>())?;
            let size = pointers.iter().map(|p| p.subtreesize).sum();
            (rv, size)
        }
    };
    let payload = node.encode();
    let offset = *write_offset;
    let written = chunk::write_chunk(ops, offset, &payload, true, false)?;
    *write_offset += written;
    Ok(NodePointer { key: max_key, pointer: offset, reduce_value, subtreesize })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btree::reduce::LocalDocsReducer;
    use crate::file_ops::{FileOps as _, OpenFlags, StdFileOps};
    use tempfile::NamedTempFile;

    fn ops() -> StdFileOps {
        let tmp = NamedTempFile::new().unwrap();
        StdFileOps::open(tmp.path(), OpenFlags { create: true }).unwrap()
    }

    #[test]
    fn insert_into_empty_tree_creates_leaf_root() {
        let ops = ops();
        let mut offset = 0u64;
        let reducer = LocalDocsReducer;
        let actions = vec![Action::Insert(b"a".to_vec(), b"1".to_vec())];
        let root = bulk_modify(&ops, &mut offset, None, actions, &reducer, DEFAULT_CHUNK_THRESHOLD).unwrap().unwrap();
        assert_eq!(root.key, b"a");
        let node = Node::decode(&chunk::read_chunk(&ops, root.pointer, false).unwrap()).unwrap();
        assert_eq!(node, Node::Leaf(vec![(b"a".to_vec(), b"1".to_vec())]));
    }

    #[test]
    fn remove_only_entry_empties_tree() {
        let ops = ops();
        let mut offset = 0u64;
        let reducer = LocalDocsReducer;
        let root = bulk_modify(&ops, &mut offset, None, vec![Action::Insert(b"a".to_vec(), b"1".to_vec())], &reducer, DEFAULT_CHUNK_THRESHOLD)
            .unwrap();
        let root = bulk_modify(&ops, &mut offset, root.as_ref(), vec![Action::Remove(b"a".to_vec())], &reducer, DEFAULT_CHUNK_THRESHOLD).unwrap();
        assert!(root.is_none());
    }

    #[test]
    fn repeated_insert_of_same_key_overwrites() {
        let ops = ops();
        let mut offset = 0u64;
        let reducer = LocalDocsReducer;
        let root = bulk_modify(&ops, &mut offset, None, vec![Action::Insert(b"a".to_vec(), b"1".to_vec())], &reducer, DEFAULT_CHUNK_THRESHOLD)
            .unwrap();
        let root = bulk_modify(&ops, &mut offset, root.as_ref(), vec![Action::Insert(b"a".to_vec(), b"2".to_vec())], &reducer, DEFAULT_CHUNK_THRESHOLD)
            .unwrap()
            .unwrap();
        let node = Node::decode(&chunk::read_chunk(&ops, root.pointer, false).unwrap()).unwrap();
        assert_eq!(node, Node::Leaf(vec![(b"a".to_vec(), b"2".to_vec())]));
    }

    #[test]
    fn large_batch_splits_into_multiple_leaves() {
        let ops = ops();
        let mut offset = 0u64;
        let reducer = LocalDocsReducer;
        let actions: Vec<Action> = (0..500)
            .map(|i| Action::Insert(format!("key-{i:04}").into_bytes(), vec![b'x'; 20]))
            .collect();
        let root = bulk_modify(&ops, &mut offset, None, actions, &reducer, DEFAULT_CHUNK_THRESHOLD).unwrap().unwrap();
        let node = Node::decode(&chunk::read_chunk(&ops, root.pointer, false).unwrap()).unwrap();
        // 500 entries at ~20+9+16 bytes each exceeds the default threshold
        // many times over, so the root must have split into an interior node.
        assert!(!node.is_leaf());
    }

    #[test]
    fn batch_with_duplicate_keys_keeps_last_action() {
        let actions = vec![
            Action::Insert(b"a".to_vec(), b"1".to_vec()),
            Action::Remove(b"a".to_vec()),
            Action::Insert(b"a".to_vec(), b"3".to_vec()),
        ];
        let prepared = prepare_batch(actions);
        assert_eq!(prepared.len(), 1);
        assert!(matches!(&prepared[0], Action::Insert(k, v) if k == b"a" && v == b"3"));
    }
}
