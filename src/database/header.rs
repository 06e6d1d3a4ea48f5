//! On-disk header: the single mutable pointer into an otherwise append-only
//! file. A header is itself a header-marked
//! chunk, so it gets the same length/CRC framing as any other chunk; only
//! its file offset changes across commits, never its own bytes once
//! written.

use crate::errors::{StoreError, StoreResult};
use crate::term::Term;
use crate::types::NodePointer;

/// Current on-disk header format. Headers with any other value are
/// rejected with `HEADER_VERSION`.
pub const DISK_VERSION: i64 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub disk_version: i64,
    pub update_seq: u64,
    pub by_id_root: Option<NodePointer>,
    pub by_seq_root: Option<NodePointer>,
    pub local_docs_root: Option<NodePointer>,
    pub purge_seq: u64,
    pub purged_docs: Vec<Vec<u8>>,
}

impl Header {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            disk_version: DISK_VERSION,
            update_seq: 0,
            by_id_root: None,
            by_seq_root: None,
            local_docs_root: None,
            purge_seq: 0,
            purged_docs: Vec::new(),
        }
    }

    #[must_use]
    pub fn to_term(&self) -> Term {
        Term::Tuple(vec![
            Term::Int(self.disk_version),
            Term::Int(self.update_seq as i64),
            NodePointer::to_term_opt(self.by_id_root.as_ref()),
            NodePointer::to_term_opt(self.by_seq_root.as_ref()),
            NodePointer::to_term_opt(self.local_docs_root.as_ref()),
            Term::Int(self.purge_seq as i64),
            Term::List(self.purged_docs.iter().cloned().map(Term::Binary).collect()),
        ])
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        self.to_term().encode()
    }

    /// # Errors
    /// Returns `StoreError::HeaderVersion` for an unsupported disk version,
    /// or `StoreError::ParseTerm` for a malformed payload.
    pub fn decode(bytes: &[u8]) -> StoreResult<Self> {
        let (term, _) = Term::decode(bytes)?;
        Self::from_term(&term)
    }

    fn from_term(term: &Term) -> StoreResult<Self> {
        let fields = term.as_tuple().ok_or_else(|| StoreError::ParseTerm("header: expected tuple".into()))?;
        if fields.len() != 7 {
            return Err(StoreError::ParseTerm("header: wrong arity".into()));
        }
        let disk_version = fields[0].as_int().ok_or_else(|| StoreError::ParseTerm("header.disk_version".into()))?;
        if disk_version != DISK_VERSION {
            return Err(StoreError::HeaderVersion);
        }
        let update_seq = fields[1].as_int().ok_or_else(|| StoreError::ParseTerm("header.update_seq".into()))? as u64;
        let by_id_root = NodePointer::from_term_opt(&fields[2])?;
        let by_seq_root = NodePointer::from_term_opt(&fields[3])?;
        let local_docs_root = NodePointer::from_term_opt(&fields[4])?;
        let purge_seq = fields[5].as_int().ok_or_else(|| StoreError::ParseTerm("header.purge_seq".into()))? as u64;
        let purged_docs = fields[6]
            .as_list()
            .ok_or_else(|| StoreError::ParseTerm("header.purged_docs".into()))?
            .iter()
            .map(|t| t.as_binary().map(<[u8]>::to_vec).ok_or_else(|| StoreError::ParseTerm("header.purged_docs entry".into())))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self { disk_version, update_seq, by_id_root, by_seq_root, local_docs_root, purge_seq, purged_docs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_header_round_trips() {
        let h = Header::empty();
        let back = Header::decode(&h.encode()).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn header_with_roots_round_trips() {
        let np = NodePointer { key: b"k".to_vec(), pointer: 4096, reduce_value: vec![1, 2, 3], subtreesize: 10 };
        let h = Header {
            disk_version: DISK_VERSION,
            update_seq: 7,
            by_id_root: Some(np.clone()),
            by_seq_root: Some(np),
            local_docs_root: None,
            purge_seq: 2,
            purged_docs: vec![b"deadbeef".to_vec()],
        };
        let back = Header::decode(&h.encode()).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut h = Header::empty();
        h.disk_version = 99;
        assert!(matches!(Header::decode(&h.encode()), Err(StoreError::HeaderVersion)));
    }
}
