//! B+-tree engine: append-only node storage, bulk modify, point
//! lookup, and ordered range scans, shared by the by-id, by-seq, and
//! local-docs trees.

pub mod bulk;
pub mod lookup;
pub mod node;
pub mod reduce;

pub use bulk::{bulk_modify, Action, DEFAULT_CHUNK_THRESHOLD};
pub use lookup::{lookup, RangeCursor};
pub use node::Node;
pub use reduce::{reducer_for, Reducer, TreeKind};
