//! Sort keys over byte-valued field data
//!
//! A comparator reduces each document to one key using the sort mode and
//! keeps the keys of competitive documents in numbered slots. Collectors
//! drive it through `copy`, `compare`, `set_bottom` and `compare_bottom`.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::Result;
use crate::fielddata::{AtomicFieldData, BytesValues, IndexFieldData};
use crate::segment::{DocNo, SegmentReader};

use super::mode::SortMode;

/// Largest code point (U+10FFFF) in UTF-8; the key of missing documents
/// in ascending sorts without an override
pub const MAX_TERM: &[u8] = b"\xF4\x8F\xBF\xBF";

/// Key classes in natural order: an absent key sorts before every value and
/// the max sentinel after every value
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum KeyKind {
    Null,
    Value,
    MaxSentinel,
}

#[derive(Clone, Debug)]
struct SortKey {
    kind: KeyKind,
    bytes: Vec<u8>,
}

impl SortKey {
    fn empty() -> Self {
        Self {
            kind: KeyKind::Null,
            bytes: Vec::new(),
        }
    }

    fn set(&mut self, kind: KeyKind, bytes: &[u8]) {
        self.kind = kind;
        self.bytes.clear();
        self.bytes.extend_from_slice(bytes);
    }
}

#[inline]
fn compare_keys(a: KeyKind, a_bytes: &[u8], b: KeyKind, b_bytes: &[u8]) -> Ordering {
    match (a, b) {
        (KeyKind::Value, KeyKind::Value) => a_bytes.cmp(b_bytes),
        _ => a.cmp(&b),
    }
}

/// Write the key of `doc` into `out`. Returns false when the document has no
/// value, leaving `out` cleared.
fn extract_key(
    values: BytesValues<'_>,
    doc: DocNo,
    mode: SortMode,
    out: &mut Vec<u8>,
    candidate: &mut Vec<u8>,
) -> bool {
    match mode {
        SortMode::Max => {
            let mut iter = values.iter(doc);
            if !iter.next_into(out) {
                out.clear();
                return false;
            }
            while iter.next_into(candidate) {
                if *candidate > *out {
                    std::mem::swap(candidate, out);
                }
            }
            true
        }
        // other modes are rejected when the source is built
        _ => {
            if !values.has_value(doc) {
                out.clear();
                return false;
            }
            values.value_scratch(doc, out);
            true
        }
    }
}

/// Builds comparators for one field, sort mode and missing-value policy
#[derive(Clone)]
pub struct BytesComparatorSource {
    field_data: Arc<IndexFieldData>,
    missing: Option<Vec<u8>>,
    mode: SortMode,
}

impl BytesComparatorSource {
    /// `mode` must already be validated for byte sequences
    pub(crate) fn new(
        field_data: Arc<IndexFieldData>,
        missing: Option<Vec<u8>>,
        mode: SortMode,
    ) -> Self {
        debug_assert!(mode.is_supported_for_bytes());
        Self {
            field_data,
            missing,
            mode,
        }
    }

    pub fn field(&self) -> &str {
        self.field_data.field()
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    pub fn missing(&self) -> Option<&[u8]> {
        self.missing.as_deref()
    }

    /// Comparator for collecting `num_hits` documents in the given direction
    pub fn new_comparator(&self, num_hits: usize, reversed: bool) -> BytesFieldComparator {
        let missing = match &self.missing {
            Some(bytes) => SortKey {
                kind: KeyKind::Value,
                bytes: bytes.clone(),
            },
            None if reversed => SortKey::empty(),
            None => SortKey {
                kind: KeyKind::MaxSentinel,
                bytes: MAX_TERM.to_vec(),
            },
        };
        BytesFieldComparator {
            field_data: Arc::clone(&self.field_data),
            mode: self.mode,
            missing,
            slots: vec![SortKey::empty(); num_hits],
            bottom: None,
            current: None,
            scratch: Vec::new(),
            candidate: Vec::new(),
        }
    }
}

pub struct BytesFieldComparator {
    field_data: Arc<IndexFieldData>,
    mode: SortMode,
    missing: SortKey,
    slots: Vec<SortKey>,
    bottom: Option<usize>,
    current: Option<Arc<dyn AtomicFieldData>>,
    scratch: Vec<u8>,
    candidate: Vec<u8>,
}

impl BytesFieldComparator {
    /// Switch to a new segment, loading its field data through the cache
    pub fn set_next_reader(&mut self, segment: &SegmentReader) -> Result<()> {
        self.current = Some(self.field_data.load(segment)?);
        Ok(())
    }

    /// Store the key of `doc` in `slot`
    #[track_caller]
    pub fn copy(&mut self, slot: usize, doc: DocNo) {
        let values = current_values(&self.current);
        let key = &mut self.slots[slot];
        if extract_key(values, doc, self.mode, &mut key.bytes, &mut self.candidate) {
            key.kind = KeyKind::Value;
        } else {
            key.set(self.missing.kind, &self.missing.bytes);
        }
    }

    pub fn compare(&self, slot1: usize, slot2: usize) -> Ordering {
        let a = &self.slots[slot1];
        let b = &self.slots[slot2];
        compare_keys(a.kind, &a.bytes, b.kind, &b.bytes)
    }

    /// Mark `slot` as the weakest competitive entry
    pub fn set_bottom(&mut self, slot: usize) {
        self.bottom = Some(slot);
    }

    /// Compare the bottom slot against the key of `doc` without storing it
    #[track_caller]
    pub fn compare_bottom(&mut self, doc: DocNo) -> Ordering {
        let bottom = match self.bottom {
            Some(slot) => &self.slots[slot],
            None => panic!("compare_bottom called before set_bottom"),
        };
        let values = current_values(&self.current);
        let kind = if extract_key(values, doc, self.mode, &mut self.scratch, &mut self.candidate) {
            KeyKind::Value
        } else {
            self.missing.kind
        };
        let bytes = if kind == KeyKind::Value {
            self.scratch.as_slice()
        } else {
            self.missing.bytes.as_slice()
        };
        compare_keys(bottom.kind, &bottom.bytes, kind, bytes)
    }

    /// The key held in `slot`; `None` for an absent key
    pub fn value(&self, slot: usize) -> Option<&[u8]> {
        let key = &self.slots[slot];
        match key.kind {
            KeyKind::Null => None,
            _ => Some(key.bytes.as_slice()),
        }
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }
}

#[track_caller]
fn current_values(current: &Option<Arc<dyn AtomicFieldData>>) -> BytesValues<'_> {
    match current {
        Some(data) => data.bytes_values(),
        None => panic!("set_next_reader must be called before reading documents"),
    }
}
