//! B+-tree node representation and term encoding.
//!
//! Nodes are immutable once written: every modification produces new chunks
//! at new file offsets and a new root pointer. No existing node is ever
//! mutated in place.

use crate::errors::{StoreError, StoreResult};
use crate::term::Term;
use crate::types::NodePointer;

/// A leaf entry: an opaque key/value pair. Callers (the by-id, by-seq, and
/// local-docs trees) interpret `value` differently but the node layer never
/// needs to.
pub type LeafEntry = (Vec<u8>, Vec<u8>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(Vec<LeafEntry>),
    Interior(Vec<NodePointer>),
}

const TAG_LEAF: &str = "leaf";
const TAG_KP: &str = "kp_node";

impl Node {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// The largest key covered by this node, or `None` for an empty node
    /// (only possible transiently during a bulk-modify pass).
    #[must_use]
    pub fn max_key(&self) -> Option<&[u8]> {
        match self {
            Self::Leaf(entries) => entries.last().map(|(k, _)| k.as_slice()),
            Self::Interior(pointers) => pointers.last().map(|p| p.key.as_slice()),
        }
    }

    /// Total encoded size of a node's entries, used to decide chunk splits.
    /// Approximates the on-disk chunk payload size without actually encoding.
    #[must_use]
    pub fn entries_size(&self) -> usize {
        match self {
            Self::Leaf(entries) => entries.iter().map(|(k, v)| k.len() + v.len() + 16).sum(),
            Self::Interior(pointers) => {
                pointers.iter().map(|p| p.key.len() + p.reduce_value.len() + 32).sum()
            }
        }
    }

    #[must_use]
    pub fn to_term(&self) -> Term {
        match self {
            Self::Leaf(entries) => Term::Tuple(vec![
                Term::Atom(TAG_LEAF.into()),
                Term::List(
                    entries
                        .iter()
                        .map(|(k, v)| Term::Tuple(vec![Term::Binary(k.clone()), Term::Binary(v.clone())]))
                        .collect(),
                ),
            ]),
            Self::Interior(pointers) => Term::Tuple(vec![
                Term::Atom(TAG_KP.into()),
                Term::List(pointers.iter().map(NodePointer::to_term).collect()),
            ]),
        }
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

    fn from_term(term: &Term) -> StoreResult<Self> {
        let fields = term.as_tuple().ok_or_else(|| StoreError::ParseTerm("node: expected tuple".into()))?;
        if fields.len() != 2 {
            return Err(StoreError::ParseTerm("node: wrong arity".into()));
        }
        let tag = match &fields[0] {
            Term::Atom(s) => s.as_str(),
            _ => return Err(StoreError::ParseTerm("node: missing tag".into())),
        };
        let items = fields[1].as_list().ok_or_else(|| StoreError::ParseTerm("node: expected list".into()))?;
        match tag {
            TAG_LEAF => {
                let mut entries = Vec::with_capacity(items.len());
                for item in items {
                    let kv = item.as_tuple().ok_or_else(|| StoreError::ParseTerm("leaf entry: expected tuple".into()))?;
                    if kv.len() != 2 {
                        return Err(StoreError::ParseTerm("leaf entry: wrong arity".into()));
                    }
                    let k = kv[0].as_binary().ok_or_else(|| StoreError::ParseTerm("leaf entry key".into()))?.to_vec();
                    let v = kv[1].as_binary().ok_or_else(|| StoreError::ParseTerm("leaf entry value".into()))?.to_vec();
                    entries.push((k, v));
                }
                Ok(Self::Leaf(entries))
            }
            TAG_KP => {
                let mut pointers = Vec::with_capacity(items.len());
                for item in items {
                    pointers.push(NodePointer::from_term(item)?);
                }
                Ok(Self::Interior(pointers))
            }
            other => Err(StoreError::ParseTerm(format!("node: unknown tag {other}"))),
        }
    }
}
