//! Per-segment field data
//!
//! Field data is the columnar view of a field's values per document,
//! un-inverted from a segment's terms. Every format shares the same
//! ordinals layout and accessor contract and differs only in how the
//! distinct terms are stored:
//!
//! - `Concrete`: one owned buffer per term
//! - `PagedBytes`: terms packed into fixed-size pages
//! - `Fst`: a finite state transducer walked backwards by ordinal
//!
//! # Architecture
//!
//! - `FieldDataService`: per index, resolves the factory of a field
//! - `IndexFieldData`: per field, loads and caches per-segment field data
//! - `AtomicFieldData`: the loaded data of one segment
//! - `BytesValues`: per-document accessor handed to consumers

mod atomic;
mod fst_terms;
mod hashed;
mod index;
mod loader;
mod ordinals;
mod paged_bytes;
mod service;
mod terms;
mod values;

pub use atomic::*;
pub use fst_terms::*;
pub use hashed::*;
pub use index::*;
pub use loader::*;
pub use ordinals::*;
pub use paged_bytes::*;
pub use service::*;
pub use terms::*;
pub use values::*;
