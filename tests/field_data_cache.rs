//! Factory cache behavior: single-flight loads, eviction and load failures

mod common;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use common::*;
use fielddata::segment::{
    DocNo, FieldTerms, PostingListMeta, PostingsWriter, SegmentId, SegmentReader,
    SegmentReaderBuilder, TermDictionaryBuilder,
};
use fielddata::{FieldDataError, FieldDataFormat, FieldDataListener, SortMode, TopFieldCollector};

fn field_parts(terms: &[(&str, &[u32])]) -> (Vec<u8>, Vec<PostingListMeta>, Vec<u8>) {
    let mut postings = PostingsWriter::new();
    let mut dict = TermDictionaryBuilder::new();
    for (term, docs) in terms {
        let docs: Vec<DocNo> = docs.iter().map(|&d| DocNo(d)).collect();
        let meta = postings.write_posting_list(&docs);
        dict.add(term.as_bytes().to_vec(), meta);
    }
    let dict = dict.build().unwrap();
    (
        dict.fst_bytes().to_vec(),
        dict.metadata().to_vec(),
        postings.into_data(),
    )
}

/// A segment whose last posting list is cut short; the checksum still matches
fn truncated_postings_segment(id: u64) -> SegmentReader {
    let (fst, metas, mut postings) = field_parts(&[("a", &[0]), ("b", &[1, 2])]);
    postings.pop();
    let checksum = FieldTerms::compute_checksum(&fst, &postings);
    SegmentReaderBuilder::new(SegmentId::new(id), 3)
        .with_field(FIELD, fst, metas, postings, checksum)
        .unwrap()
        .build()
        .unwrap()
}

fn bad_checksum_segment(id: u64) -> SegmentReader {
    let (fst, metas, postings) = field_parts(&[("a", &[0])]);
    let checksum = FieldTerms::compute_checksum(&fst, &postings) ^ 1;
    SegmentReaderBuilder::new(SegmentId::new(id), 1)
        .with_field(FIELD, fst, metas, postings, checksum)
        .unwrap()
        .build()
        .unwrap()
}

#[derive(Default)]
struct CountingListener {
    loads: AtomicU64,
    unloads: AtomicU64,
    bytes: AtomicU64,
}

impl FieldDataListener for CountingListener {
    fn on_load(&self, _field: &str, _segment: SegmentId, memory_size_in_bytes: u64) {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.bytes.fetch_add(memory_size_in_bytes, Ordering::SeqCst);
    }

    fn on_unload(&self, _field: &str, _segment: SegmentId, memory_size_in_bytes: u64) {
        self.unloads.fetch_add(1, Ordering::SeqCst);
        self.bytes.fetch_sub(memory_size_in_bytes, Ordering::SeqCst);
    }
}

#[test]
fn test_concurrent_first_loads_build_once() {
    let listener = Arc::new(CountingListener::default());
    let field_data = Arc::new(
        fielddata::IndexFieldData::new(FIELD, FieldDataFormat::PagedBytes, 64)
            .with_listener(listener.clone()),
    );
    let segment = Arc::new(mixed_with_two_missing());
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let field_data = Arc::clone(&field_data);
            let segment = Arc::clone(&segment);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                field_data.load(&segment).unwrap()
            })
        })
        .collect();
    let loaded: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for data in &loaded[1..] {
        assert!(Arc::ptr_eq(&loaded[0], data));
    }
    let stats = field_data.stats();
    assert_eq!(stats.loads, 1);
    assert_eq!(stats.hits, threads as u64 - 1);
    assert_eq!(listener.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_segments_load_independently() {
    let field_data = field_data(FieldDataFormat::Fst);
    let segments: Vec<_> = (0..4)
        .map(|i| segment_with(100 + i, &[&["x"], &["y", "z"]]))
        .collect();

    thread::scope(|scope| {
        for segment in &segments {
            let field_data = &field_data;
            scope.spawn(move || {
                let data = field_data.load(segment).unwrap();
                assert!(data.is_multi_valued());
            });
        }
    });

    assert_eq!(field_data.cached_segments().len(), 4);
    assert_eq!(field_data.stats().loads, 4);
}

#[test]
fn test_evicted_data_stays_usable() {
    let listener = Arc::new(CountingListener::default());
    let field_data = Arc::new(
        fielddata::IndexFieldData::new(FIELD, FieldDataFormat::Concrete, 64)
            .with_listener(listener.clone()),
    );
    let segment = multi_value_all_set();

    let held = field_data.load(&segment).unwrap();
    assert!(field_data.memory_size_in_bytes() > 0);
    field_data.evict(segment.id());

    assert!(field_data.cached_segments().is_empty());
    assert_eq!(field_data.memory_size_in_bytes(), 0);
    assert_eq!(held.bytes_values().value(DocNo(0)), key("2"));
    assert_eq!(listener.unloads.load(Ordering::SeqCst), 1);
    assert_eq!(listener.bytes.load(Ordering::SeqCst), 0);

    let reloaded = field_data.load(&segment).unwrap();
    assert!(!Arc::ptr_eq(&held, &reloaded));
    assert_eq!(field_data.stats().loads, 2);
}

#[test]
fn test_eviction_racing_loads_keeps_listener_balanced() {
    let listener = Arc::new(CountingListener::default());
    let field_data = Arc::new(
        fielddata::IndexFieldData::new(FIELD, FieldDataFormat::PagedBytes, 64)
            .with_listener(listener.clone()),
    );
    let values: Vec<String> = (0..2000).map(|i| format!("v{:05}", (i * 7) % 2000)).collect();
    let docs: Vec<[&str; 1]> = values.iter().map(|v| [v.as_str()]).collect();
    let docs: Vec<&[&str]> = docs.iter().map(|d| &d[..]).collect();
    let segment = segment_with(50, &docs);
    let stop = AtomicBool::new(false);

    thread::scope(|scope| {
        let evictor = scope.spawn(|| {
            while !stop.load(Ordering::SeqCst) {
                field_data.evict(segment.id());
                thread::yield_now();
            }
        });
        for _ in 0..200 {
            let data = field_data.load(&segment).unwrap();
            assert_eq!(data.bytes_values().num_docs(), 2000);
        }
        stop.store(true, Ordering::SeqCst);
        evictor.join().unwrap();
    });
    field_data.clear();

    let stats = field_data.stats();
    let loads = listener.loads.load(Ordering::SeqCst);
    assert!(loads >= 1);
    assert_eq!(loads, stats.loads);
    assert_eq!(listener.unloads.load(Ordering::SeqCst), loads);
    assert_eq!(stats.evictions, loads);
    assert_eq!(listener.bytes.load(Ordering::SeqCst), 0);
    assert!(field_data.cached_segments().is_empty());
    assert_eq!(field_data.memory_size_in_bytes(), 0);
}

#[test]
fn test_corrupt_postings_fail_without_caching() {
    for format in FieldDataFormat::ALL {
        let field_data = field_data(format);
        let bad = truncated_postings_segment(40);

        let err = field_data.load(&bad).err().unwrap();
        match &err {
            FieldDataError::LoadFailure { field, segment, .. } => {
                assert_eq!(field, FIELD);
                assert_eq!(*segment, SegmentId::new(40));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.is_retriable());
        assert!(field_data.cached_segments().is_empty());
        assert_eq!(field_data.stats().failures, 1);

        // a failed build leaves nothing behind to short-circuit the next attempt
        assert!(field_data.load(&bad).is_err());
        assert_eq!(field_data.stats().failures, 2);

        let good = single_value_all_set();
        assert!(field_data.load(&good).is_ok());
        assert_eq!(field_data.cached_segments(), vec![good.id()]);
    }
}

#[test]
fn test_checksum_mismatch_is_load_failure() {
    let field_data = field_data(FieldDataFormat::PagedBytes);
    let err = field_data.load(&bad_checksum_segment(41)).err().unwrap();
    assert!(matches!(err, FieldDataError::LoadFailure { .. }));
    assert!(err.to_string().contains("Checksum mismatch"));
}

#[test]
fn test_collector_surfaces_load_failure() {
    let source = field_data(FieldDataFormat::Concrete)
        .comparator_source(None, SortMode::Min)
        .unwrap();
    let collector = TopFieldCollector::new(source, 3, false);
    let err = collector.search(&truncated_postings_segment(42)).err().unwrap();
    assert!(matches!(err, FieldDataError::LoadFailure { .. }));
}

#[test]
fn test_unsupported_sort_modes() {
    let field_data = field_data(FieldDataFormat::PagedBytes);
    for mode in [SortMode::Sum, SortMode::Avg] {
        match field_data.comparator_source(None, mode) {
            Err(FieldDataError::UnsupportedSortMode { field, mode: name }) => {
                assert_eq!(field, FIELD);
                assert_eq!(name, mode.to_string());
            }
            _ => panic!("mode {} should be rejected", mode),
        }
    }
}
