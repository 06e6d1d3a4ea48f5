//! Minimal binary tuple encoding used for header and reduce-value payloads.
//!
//! The only contract that matters is a symmetric round-trip with stable
//! byte output for identical inputs (integers, atoms, nested tuples,
//! binaries). This module implements a small self-describing binary format
//! with that shape; it is not wire-compatible with Erlang's external term
//! format, and callers never need to interoperate with one.

use crate::errors::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Nil,
    Int(i64),
    Atom(String),
    Binary(Vec<u8>),
    Tuple(Vec<Term>),
    List(Vec<Term>),
}

const TAG_NIL: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_ATOM: u8 = 2;
const TAG_BINARY: u8 = 3;
const TAG_TUPLE: u8 = 4;
const TAG_LIST: u8 = 5;

impl Term {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::Nil => out.push(TAG_NIL),
            Self::Int(v) => {
                out.push(TAG_INT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Self::Atom(s) => {
                out.push(TAG_ATOM);
                out.extend_from_slice(&(s.len() as u32).to_be_bytes());
                out.extend_from_slice(s.as_bytes());
            }
            Self::Binary(b) => {
                out.push(TAG_BINARY);
                out.extend_from_slice(&(b.len() as u32).to_be_bytes());
                out.extend_from_slice(b);
            }
            Self::Tuple(items) => {
                out.push(TAG_TUPLE);
                out.extend_from_slice(&(items.len() as u32).to_be_bytes());
                for item in items {
                    item.encode_into(out);
                }
            }
            Self::List(items) => {
                out.push(TAG_LIST);
                out.extend_from_slice(&(items.len() as u32).to_be_bytes());
                for item in items {
                    item.encode_into(out);
                }
            }
        }
    }

    /// # Errors
    /// Returns `StoreError::ParseTerm` on truncated or malformed input.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), StoreError> {
        let (term, used) = decode_one(buf)?;
        Ok((term, used))
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let Self::Int(v) = self { Some(*v) } else { None }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        if let Self::Binary(b) = self { Some(b) } else { None }
    }

    #[must_use]
    pub fn as_tuple(&self) -> Option<&[Term]> {
        if let Self::Tuple(items) = self { Some(items) } else { None }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Term]> {
        if let Self::List(items) = self { Some(items) } else { None }
    }
}

fn need(buf: &[u8], n: usize) -> Result<(), StoreError> {
    if buf.len() < n { Err(StoreError::ParseTerm("truncated term".into())) } else { Ok(()) }
}

fn decode_one(buf: &[u8]) -> Result<(Term, usize), StoreError> {
    need(buf, 1)?;
    match buf[0] {
        TAG_NIL => Ok((Term::Nil, 1)),
        TAG_INT => {
            need(buf, 9)?;
            let mut arr = [0u8; 8];
            arr.copy_from_slice(&buf[1..9]);
            Ok((Term::Int(i64::from_be_bytes(arr)), 9))
        }
        TAG_ATOM => {
            let (len, body) = read_len(buf)?;
            need(body, len)?;
            let s = String::from_utf8(body[..len].to_vec())
                .map_err(|e| StoreError::ParseTerm(e.to_string()))?;
            Ok((Term::Atom(s), 5 + len))
        }
        TAG_BINARY => {
            let (len, body) = read_len(buf)?;
            need(body, len)?;
            Ok((Term::Binary(body[..len].to_vec()), 5 + len))
        }
        TAG_TUPLE | TAG_LIST => {
            let (count, mut body) = read_len(buf)?;
            let mut used = 5;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                let (item, n) = decode_one(body)?;
                items.push(item);
                used += n;
                body = &body[n..];
            }
            let term = if buf[0] == TAG_TUPLE { Term::Tuple(items) } else { Term::List(items) };
            Ok((term, used))
        }
        other => Err(StoreError::ParseTerm(format!("unknown term tag {other}"))),
    }
}

fn read_len(buf: &[u8]) -> Result<(usize, &[u8]), StoreError> {
    need(buf, 5)?;
    let mut arr = [0u8; 4];
    arr.copy_from_slice(&buf[1..5]);
    Ok((u32::from_be_bytes(arr) as usize, &buf[5..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalars() {
        for t in [Term::Nil, Term::Int(-7), Term::Int(i64::MAX), Term::Atom("ok".into())] {
            let bytes = t.encode();
            let (decoded, used) = Term::decode(&bytes).unwrap();
            assert_eq!(used, bytes.len());
            assert_eq!(decoded, t);
        }
    }

    #[test]
    fn round_trips_nested_tuple() {
        let t = Term::Tuple(vec![
            Term::Int(8),
            Term::Binary(vec![1, 2, 3]),
            Term::List(vec![Term::Int(1), Term::Int(2)]),
            Term::Nil,
        ]);
        let bytes = t.encode();
        let (decoded, used) = Term::decode(&bytes).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded, t);
    }

    #[test]
    fn truncated_input_is_an_error() {
        let t = Term::Binary(vec![9; 16]);
        let bytes = t.encode();
        assert!(Term::decode(&bytes[..bytes.len() - 1]).is_err());
    }
}
