//! Shared fixtures for field data integration tests

#![allow(dead_code)]

use std::sync::Arc;

use fielddata::segment::{DocNo, SegmentId, SegmentReader, SegmentWriter};
use fielddata::{FieldDataFormat, IndexFieldData, SortMode, TopFieldCollector};

pub const FIELD: &str = "value";

/// Build a segment where document `i` holds `docs[i]` in `FIELD`
pub fn segment_with(id: u64, docs: &[&[&str]]) -> SegmentReader {
    let mut writer = SegmentWriter::new(SegmentId::new(id));
    for values in docs {
        let pairs: Vec<(&str, &[u8])> = values.iter().map(|v| (FIELD, v.as_bytes())).collect();
        writer.add_document(&pairs);
    }
    writer.finish().unwrap()
}

pub fn single_value_all_set() -> SegmentReader {
    segment_with(1, &[&["2"], &["1"], &["3"]])
}

pub fn single_value_with_missing() -> SegmentReader {
    segment_with(2, &[&["2"], &[], &["3"]])
}

pub fn multi_value_all_set() -> SegmentReader {
    segment_with(3, &[&["2", "4"], &["1"], &["3"]])
}

pub fn multi_value_with_missing() -> SegmentReader {
    segment_with(4, &[&["2", "4"], &[], &["3"]])
}

pub fn all_missing() -> SegmentReader {
    let mut writer = SegmentWriter::new(SegmentId::new(5));
    for _ in 0..3 {
        writer.add_document(&[("other", b"x")]);
    }
    writer.finish().unwrap()
}

/// Eight documents, documents 1 and 5 without a value
pub fn mixed_with_two_missing() -> SegmentReader {
    segment_with(
        6,
        &[
            &["02", "04"],
            &[],
            &["03"],
            &["04", "05", "06"],
            &["06", "07", "08"],
            &[],
            &["08", "09", "10"],
            &["!08", "!09", "!10"],
        ],
    )
}

/// Three documents with values, the middle one deleted
pub fn with_deleted_doc() -> SegmentReader {
    let mut writer = SegmentWriter::new(SegmentId::new(7));
    writer.add_document(&[(FIELD, b"a")]);
    writer.add_document(&[(FIELD, b"b")]);
    writer.add_document(&[(FIELD, b"c")]);
    writer.delete_document(DocNo(1));
    writer.finish().unwrap()
}

pub fn field_data(format: FieldDataFormat) -> Arc<IndexFieldData> {
    // small pages so the paged format spans several pages
    Arc::new(IndexFieldData::new(FIELD, format, 64))
}

/// Sort every live document of `segment`; returns doc ids and keys in rank order
pub fn sort(
    format: FieldDataFormat,
    segment: &SegmentReader,
    mode: SortMode,
    reversed: bool,
    missing: Option<&str>,
) -> (Vec<u32>, Vec<Option<Vec<u8>>>) {
    let source = field_data(format)
        .comparator_source(missing.map(|m| m.as_bytes().to_vec()), mode)
        .unwrap();
    let top = TopFieldCollector::new(source, segment.max_doc() as usize, reversed)
        .search(segment)
        .unwrap();
    let keys = top.docs.iter().map(|d| d.value.clone()).collect();
    (top.doc_ids(), keys)
}

pub fn key(value: &str) -> Option<Vec<u8>> {
    Some(value.as_bytes().to_vec())
}
