//! Self-describing payload stored next to each key in an index file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tagged value that round-trips through the index file verbatim.
///
/// Encoded with postcard; the enum tag travels with every value, so readers
/// need no schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Document {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Document>),
    Map(BTreeMap<String, Document>),
}

impl Document {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Document::UInt32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Document::UInt64(v) => Some(v),
            Document::UInt32(v) => Some(v.into()),
            _ => None,
        }
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Size of [`encode`](Self::encode)'s output, without allocating it.
    pub(crate) fn encoded_len(&self) -> Result<usize, postcard::Error> {
        postcard::experimental::serialized_size(self)
    }

    /// Appends the encoding to `buf`, reusing its allocation.
    pub(crate) fn encode_into(&self, buf: Vec<u8>) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_extend(self, buf)
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

impl From<&str> for Document {
    fn from(value: &str) -> Self {
        Document::String(value.to_string())
    }
}

impl From<String> for Document {
    fn from(value: String) -> Self {
        Document::String(value)
    }
}

impl From<bool> for Document {
    fn from(value: bool) -> Self {
        Document::Bool(value)
    }
}

impl From<i32> for Document {
    fn from(value: i32) -> Self {
        Document::Int32(value)
    }
}

impl From<i64> for Document {
    fn from(value: i64) -> Self {
        Document::Int64(value)
    }
}

impl From<u32> for Document {
    fn from(value: u32) -> Self {
        Document::UInt32(value)
    }
}

impl From<u64> for Document {
    fn from(value: u64) -> Self {
        Document::UInt64(value)
    }
}

impl From<f64> for Document {
    fn from(value: f64) -> Self {
        Document::Double(value)
    }
}

#[cfg(test)]
mod tests;
