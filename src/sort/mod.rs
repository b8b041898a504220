//! Sorting documents by byte-valued field data
//!
//! `BytesComparatorSource` turns a field, a sort mode and a missing-value
//! policy into per-search comparators. `TopFieldCollector` drives one over
//! the live documents of a segment.

mod collector;
mod comparator;
mod mode;

pub use collector::*;
pub use comparator::*;
pub use mode::*;
