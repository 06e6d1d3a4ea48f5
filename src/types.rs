//! Core data-model types shared by the storage engine.

/// An owned, binary-safe byte range. Not zero-terminated.
pub type SizedBuf = Vec<u8>;

/// A document as presented to and returned from the API.
///
/// Exactly one of `json`/`binary` carries the body; which one is recorded in
/// `DocInfo`'s flags via `BodyKind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doc {
    pub id: SizedBuf,
    pub json: Option<SizedBuf>,
    pub binary: Option<SizedBuf>,
}

impl Doc {
    /// # Panics
    /// Panics if `id` is empty, or if neither/both of `json`/`binary` are set.
    #[must_use]
    pub fn new(id: SizedBuf, json: Option<SizedBuf>, binary: Option<SizedBuf>) -> Self {
        assert!(!id.is_empty(), "document id must not be empty");
        assert!(json.is_some() ^ binary.is_some(), "exactly one of json/binary must be set");
        Self { id, json, binary }
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.json.as_deref().or(self.binary.as_deref()).unwrap_or(&[])
    }

    #[must_use]
    pub const fn body_kind(&self) -> BodyKind {
        if self.binary.is_some() { BodyKind::Binary } else { BodyKind::Json }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Binary,
}

/// Document metadata persisted in both the by-id and by-seq trees.
///
/// Invariant: if `deleted` then `bp == 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocInfo {
    pub id: SizedBuf,
    pub meta: SizedBuf,
    pub deleted: bool,
    pub seq: u64,
    pub rev: u64,
    /// Absolute file offset of the document body chunk; 0 iff body absent.
    pub bp: u64,
    /// Encoded body size in bytes.
    pub size: u64,
    pub body_kind: BodyKind,
}

impl DocInfo {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !self.deleted || self.bp == 0
    }
}

/// A pointer to a B+-tree subtree root.
///
/// Invariant: `reduce_value` equals the reduction of the pointed-to subtree;
/// `subtreesize` is the sum of body+metadata bytes reachable through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePointer {
    pub key: SizedBuf,
    pub pointer: u64,
    pub reduce_value: SizedBuf,
    pub subtreesize: u64,
}
