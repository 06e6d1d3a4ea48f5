//! Term encoding/decoding for the data-model types that cross the chunk
//! boundary: `DocInfo` (leaf values of the by-id/by-seq trees) and
//! `NodePointer` (interior-node entries and header roots).

use crate::errors::{StoreError, StoreResult};
use crate::term::Term;
use crate::types::{BodyKind, DocInfo, NodePointer};

impl DocInfo {
    #[must_use]
    pub fn to_term(&self) -> Term {
        Term::Tuple(vec![
            Term::Binary(self.id.clone()),
            Term::Binary(self.meta.clone()),
            Term::Int(i64::from(self.deleted)),
            Term::Int(self.seq as i64),
            Term::Int(self.rev as i64),
            Term::Int(self.bp as i64),
            Term::Int(self.size as i64),
            Term::Atom(match self.body_kind { BodyKind::Json => "json".into(), BodyKind::Binary => "binary".into() }),
        ])
    }

    /// # Errors
    /// Returns `StoreError::ParseTerm` if `term` is not a well-formed
    /// `DocInfo` tuple.
    pub fn from_term(term: &Term) -> StoreResult<Self> {
        let fields = term.as_tuple().ok_or_else(|| StoreError::ParseTerm("DocInfo: expected tuple".into()))?;
        if fields.len() != 8 {
            return Err(StoreError::ParseTerm("DocInfo: wrong arity".into()));
        }
        let id = fields[0].as_binary().ok_or_else(|| StoreError::ParseTerm("DocInfo.id".into()))?.to_vec();
        let meta = fields[1].as_binary().ok_or_else(|| StoreError::ParseTerm("DocInfo.meta".into()))?.to_vec();
        let deleted = fields[2].as_int().ok_or_else(|| StoreError::ParseTerm("DocInfo.deleted".into()))? != 0;
        let seq = fields[3].as_int().ok_or_else(|| StoreError::ParseTerm("DocInfo.seq".into()))? as u64;
        let rev = fields[4].as_int().ok_or_else(|| StoreError::ParseTerm("DocInfo.rev".into()))? as u64;
        let bp = fields[5].as_int().ok_or_else(|| StoreError::ParseTerm("DocInfo.bp".into()))? as u64;
        let size = fields[6].as_int().ok_or_else(|| StoreError::ParseTerm("DocInfo.size".into()))? as u64;
        let body_kind = match &fields[7] {
            Term::Atom(s) if s == "binary" => BodyKind::Binary,
            Term::Atom(s) if s == "json" => BodyKind::Json,
            _ => return Err(StoreError::ParseTerm("DocInfo.body_kind".into())),
        };
        Ok(Self { id, meta, deleted, seq, rev, bp, size, body_kind })
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        self.to_term().encode()
    }

    /// # Errors
    /// Returns `StoreError::ParseTerm` on malformed bytes.
    pub fn decode(bytes: &[u8]) -> StoreResult<Self> {
        let (term, _) = Term::decode(bytes)?;
        Self::from_term(&term)
    }
}

impl NodePointer {
    #[must_use]
    pub fn to_term(&self) -> Term {
        Term::Tuple(vec![
            Term::Binary(self.key.clone()),
            Term::Int(self.pointer as i64),
            Term::Binary(self.reduce_value.clone()),
            Term::Int(self.subtreesize as i64),
        ])
    }

    /// # Errors
    /// Returns `StoreError::ParseTerm` if `term` is not a well-formed
    /// `NodePointer` tuple.
    pub fn from_term(term: &Term) -> StoreResult<Self> {
        let fields = term.as_tuple().ok_or_else(|| StoreError::ParseTerm("NodePointer: expected tuple".into()))?;
        if fields.len() != 4 {
            return Err(StoreError::ParseTerm("NodePointer: wrong arity".into()));
        }
        let key = fields[0].as_binary().ok_or_else(|| StoreError::ParseTerm("NodePointer.key".into()))?.to_vec();
        let pointer = fields[1].as_int().ok_or_else(|| StoreError::ParseTerm("NodePointer.pointer".into()))? as u64;
        let reduce_value = fields[2].as_binary().ok_or_else(|| StoreError::ParseTerm("NodePointer.reduce_value".into()))?.to_vec();
        let subtreesize = fields[3].as_int().ok_or_else(|| StoreError::ParseTerm("NodePointer.subtreesize".into()))? as u64;
        Ok(Self { key, pointer, reduce_value, subtreesize })
    }

    /// Encodes an `Option<NodePointer>` the way a header stores a nullable root.
    #[must_use]
    pub fn to_term_opt(opt: Option<&Self>) -> Term {
        opt.map_or(Term::Nil, Self::to_term)
    }

    /// # Errors
    /// Returns `StoreError::ParseTerm` on malformed bytes.
    pub fn from_term_opt(term: &Term) -> StoreResult<Option<Self>> {
        if matches!(term, Term::Nil) { Ok(None) } else { Self::from_term(term).map(Some) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docinfo_round_trips() {
        let info = DocInfo {
            id: b"doc1".to_vec(),
            meta: b"rev-meta".to_vec(),
            deleted: false,
            seq: 42,
            rev: 3,
            bp: 4096,
            size: 128,
            body_kind: BodyKind::Json,
        };
        let bytes = info.encode();
        let back = DocInfo::decode(&bytes).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn node_pointer_option_round_trips() {
        let np = NodePointer { key: b"k".to_vec(), pointer: 99, reduce_value: vec![1, 2], subtreesize: 7 };
        let t = NodePointer::to_term_opt(Some(&np));
        assert_eq!(NodePointer::from_term_opt(&t).unwrap(), Some(np));
        assert_eq!(NodePointer::from_term_opt(&Term::Nil).unwrap(), None);
    }
}
