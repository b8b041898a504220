//! Segment substrate consumed by field data loaders
//!
//! A segment is an immutable slice of documents with dense doc numbers.
//! Each field is stored inverted: an FST term dictionary pointing into
//! block-encoded posting lists, protected by a checksum.
//!
//! # Architecture
//!
//! - `SegmentWriter`: buffers documents and writes a segment
//! - `SegmentReader`: immutable reader exposing per-field term streams
//! - `TermDictionary`: FST term -> posting list metadata
//! - `PostingsWriter` / `PostingsReader`: block posting codec

mod postings;
mod reader;
mod term_dict;
mod types;
mod writer;

pub use postings::*;
pub use reader::*;
pub use term_dict::*;
pub use types::*;
pub use writer::*;
