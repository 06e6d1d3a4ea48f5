//! Reduce functions threaded through interior nodes. Each of the three
//! trees (by-id, by-seq, local-docs) carries a different reduction,
//! selected by `TreeKind`.

use crate::errors::StoreResult;
use crate::term::Term;
use crate::types::DocInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    ById,
    BySeq,
    LocalDocs,
}

/// Per-tree reduce/rereduce/weight behavior.
///
/// `leaf_reduce` folds a leaf's raw (key, value) entries into a reduce
/// value; `rereduce` folds a list of child reduce values (already-reduced)
/// into one, one level up; `entry_weight` returns the byte count a single
/// leaf entry contributes to `subtreesize`, used by the data-size reporting
/// in the diagnostic CLI.
pub trait Reducer: Send + Sync {
    fn leaf_reduce(&self, entries: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<Vec<u8>>;
    fn rereduce(&self, reduce_values: &[Vec<u8>]) -> StoreResult<Vec<u8>>;
    fn entry_weight(&self, key: &[u8], value: &[u8]) -> StoreResult<u64>;
}

/// Reduce value shape for by-id and by-seq: `(count, deleted_count,
/// total_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountReduceValue {
    pub count: u64,
    pub deleted_count: u64,
    pub total_size: u64,
}

impl CountReduceValue {
    #[must_use]
    pub fn to_term(self) -> Term {
        Term::Tuple(vec![
            Term::Int(self.count as i64),
            Term::Int(self.deleted_count as i64),
            Term::Int(self.total_size as i64),
        ])
    }

    /// # Errors
    /// Returns `StoreError::ParseTerm` if `bytes` is not a well-formed
    /// 3-tuple of integers.
    pub fn decode(bytes: &[u8]) -> StoreResult<Self> {
        let (term, _) = Term::decode(bytes)?;
        Self::from_term(&term)
    }

    fn from_term(term: &Term) -> StoreResult<Self> {
        use crate::errors::StoreError;
        let fields = term.as_tuple().ok_or_else(|| StoreError::ParseTerm("count reduce: expected tuple".into()))?;
        if fields.len() != 3 {
            return Err(StoreError::ParseTerm("count reduce: wrong arity".into()));
        }
        Ok(Self {
            count: fields[0].as_int().ok_or_else(|| StoreError::ParseTerm("count".into()))? as u64,
            deleted_count: fields[1].as_int().ok_or_else(|| StoreError::ParseTerm("deleted_count".into()))? as u64,
            total_size: fields[2].as_int().ok_or_else(|| StoreError::ParseTerm("total_size".into()))? as u64,
        })
    }

    #[must_use]
    pub fn encode(self) -> Vec<u8> {
        self.to_term().encode()
    }

    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            deleted_count: self.deleted_count + other.deleted_count,
            total_size: self.total_size + other.total_size,
        }
    }
}

/// By-id tree: leaf values are encoded `DocInfo`s. The reduction counts
/// live/deleted documents and sums their on-disk size.
pub struct ByIdReducer;

impl Reducer for ByIdReducer {
    fn leaf_reduce(&self, entries: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<Vec<u8>> {
        let mut acc = CountReduceValue::default();
        for (_, v) in entries {
            let info = DocInfo::decode(v)?;
            acc.count += 1;
            if info.deleted {
                acc.deleted_count += 1;
            }
            acc.total_size += info.size + info.meta.len() as u64;
        }
        Ok(acc.encode())
    }

    fn rereduce(&self, reduce_values: &[Vec<u8>]) -> StoreResult<Vec<u8>> {
        let mut acc = CountReduceValue::default();
        for rv in reduce_values {
            acc = acc.merge(CountReduceValue::decode(rv)?);
        }
        Ok(acc.encode())
    }

    fn entry_weight(&self, _key: &[u8], value: &[u8]) -> StoreResult<u64> {
        let info = DocInfo::decode(value)?;
        Ok(info.size + info.meta.len() as u64)
    }
}

/// By-seq tree: same leaf value shape as by-id, but only the document count
/// is meaningful (used for the changes-feed count in the CLI summary).
pub struct BySeqReducer;

impl Reducer for BySeqReducer {
    fn leaf_reduce(&self, entries: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<Vec<u8>> {
        Ok(Term::Int(entries.len() as i64).encode())
    }

    fn rereduce(&self, reduce_values: &[Vec<u8>]) -> StoreResult<Vec<u8>> {
        let mut total = 0i64;
        for rv in reduce_values {
            let (term, _) = Term::decode(rv)?;
            total += term.as_int().unwrap_or(0);
        }
        Ok(Term::Int(total).encode())
    }

    fn entry_weight(&self, _key: &[u8], value: &[u8]) -> StoreResult<u64> {
        Ok(value.len() as u64)
    }
}

/// Local-docs tree: no reduction is defined; local docs are never
/// reduced"); weight is just the stored value's length.
pub struct LocalDocsReducer;

impl Reducer for LocalDocsReducer {
    fn leaf_reduce(&self, _entries: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn rereduce(&self, _reduce_values: &[Vec<u8>]) -> StoreResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn entry_weight(&self, _key: &[u8], value: &[u8]) -> StoreResult<u64> {
        Ok(value.len() as u64)
    }
}

#[must_use]
pub fn reducer_for(kind: TreeKind) -> Box<dyn Reducer> {
    match kind {
        TreeKind::ById => Box::new(ByIdReducer),
        TreeKind::BySeq => Box::new(BySeqReducer),
        TreeKind::LocalDocs => Box::new(LocalDocsReducer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BodyKind;

    fn info(size: u64, deleted: bool) -> DocInfo {
        DocInfo { id: b"d".to_vec(), meta: b"m".to_vec(), deleted, seq: 1, rev: 1, bp: if deleted { 0 } else { 10 }, size, body_kind: BodyKind::Json }
    }

    #[test]
    fn by_id_leaf_reduce_counts_and_sums() {
        let r = ByIdReducer;
        let entries = vec![
            (b"a".to_vec(), info(100, false).encode()),
            (b"b".to_vec(), info(50, true).encode()),
        ];
        let rv = r.leaf_reduce(&entries).unwrap();
        let parsed = CountReduceValue::decode(&rv).unwrap();
        assert_eq!(parsed.count, 2);
        assert_eq!(parsed.deleted_count, 1);
        assert_eq!(parsed.total_size, 100 + 1 + 50 + 1);
    }

    #[test]
    fn by_id_rereduce_merges() {
        let r = ByIdReducer;
        let a = CountReduceValue { count: 2, deleted_count: 1, total_size: 10 }.encode();
        let b = CountReduceValue { count: 3, deleted_count: 0, total_size: 20 }.encode();
        let merged = CountReduceValue::decode(&r.rereduce(&[a, b]).unwrap()).unwrap();
        assert_eq!(merged, CountReduceValue { count: 5, deleted_count: 1, total_size: 30 });
    }

    #[test]
    fn by_seq_reduce_is_a_count() {
        let r = BySeqReducer;
        let entries = vec![(b"1".to_vec(), vec![]), (b"2".to_vec(), vec![])];
        let rv = r.leaf_reduce(&entries).unwrap();
        let (term, _) = Term::decode(&rv).unwrap();
        assert_eq!(term, Term::Int(2));
    }

    #[test]
    fn local_docs_reduce_is_empty() {
        let r = LocalDocsReducer;
        assert!(r.leaf_reduce(&[(b"k".to_vec(), b"v".to_vec())]).unwrap().is_empty());
    }
}
