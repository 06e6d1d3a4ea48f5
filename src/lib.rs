#![forbid(unsafe_code)]

//! An append-only, single-file document store with two primary B+-tree
//! indexes (by document id, by sequence number) and an auxiliary local-docs
//! tree, plus a sandboxed JavaScript evaluator for materialized map views.
//!
//! The on-disk format is a sequence of fixed-size blocks (see [`block`])
//! carrying length/CRC-checked, optionally Snappy-compressed chunks (see
//! [`chunk`]). Every mutation is expressed as a [`btree`] bulk-modify pass
//! that rewrites the path from root to leaf as brand-new chunks; a
//! [`database::Db`] commit makes the result visible by appending one new
//! header chunk and is the only mutable pointer into the file.

pub mod block;
pub mod btree;
pub mod chunk;
pub mod cli;
pub mod codec;
pub mod config;
pub mod database;
pub mod errors;
pub mod file_ops;
pub mod logger;
pub mod mapreduce;
pub mod term;
pub mod types;

pub use database::{Db, Header, OpenOptions};
pub use errors::{StoreError, StoreResult};
pub use types::{BodyKind, Doc, DocInfo, NodePointer, SizedBuf};
