//! Core types for the segment substrate

use serde::{Deserialize, Serialize};
use std::fmt;

/// Segment identifier (monotonically increasing per shard)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl SegmentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment_{}", self.0)
    }
}

/// Dense document number within a segment (0..max_doc)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocNo(pub u32);

impl DocNo {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of one term's posting list inside a field's postings data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingListMeta {
    /// Byte offset of the list in the postings data
    pub offset: u64,
    /// Encoded length in bytes
    pub length: u64,
    /// Number of documents containing the term
    pub doc_frequency: u32,
}

/// Postings are written in blocks of this many doc numbers
pub const BLOCK_SIZE: usize = 128;
