//! Per-segment field data

use super::fst_terms::FstTerms;
use super::hashed::hash_bytes;
use super::ordinals::Ordinals;
use super::paged_bytes::PagedBytes;
use super::terms::{ConcreteTerms, TermStore};
use super::values::BytesValues;
use crate::config::FieldDataFormat;

/// The loaded values of one field in one segment.
///
/// Immutable once built and shared across threads behind an `Arc`.
pub trait AtomicFieldData: Send + Sync {
    /// A fresh accessor over this segment's values
    fn bytes_values(&self) -> BytesValues<'_>;

    fn num_docs(&self) -> u32;

    fn is_multi_valued(&self) -> bool;

    /// Estimated bytes held by this structure, computed at build time
    fn memory_size_in_bytes(&self) -> u64;

    fn format(&self) -> FieldDataFormat;

    /// Number of distinct values in the segment
    fn term_count(&self) -> usize;
}

/// Field data laid out as doc -> ordinals plus an ordinal -> term store
pub struct OrdinalsFieldData<T: TermStore> {
    ordinals: Ordinals,
    terms: T,
    hashes: Box<[u64]>,
    memory_size: u64,
}

pub type ConcreteFieldData = OrdinalsFieldData<ConcreteTerms>;
pub type PagedBytesFieldData = OrdinalsFieldData<PagedBytes>;
pub type FstFieldData = OrdinalsFieldData<FstTerms>;

impl<T: TermStore> OrdinalsFieldData<T> {
    pub fn new(ordinals: Ordinals, terms: T) -> Self {
        let mut scratch = Vec::new();
        let hashes: Box<[u64]> = (0..terms.len())
            .map(|ord| {
                terms.copy_term(ord as u32, &mut scratch);
                hash_bytes(&scratch)
            })
            .collect();
        let memory_size = ordinals.memory_size_in_bytes()
            + terms.memory_size_in_bytes()
            + (hashes.len() * std::mem::size_of::<u64>()) as u64;
        Self {
            ordinals,
            terms,
            hashes,
            memory_size,
        }
    }

    pub fn terms(&self) -> &T {
        &self.terms
    }
}

impl<T: TermStore> AtomicFieldData for OrdinalsFieldData<T> {
    fn bytes_values(&self) -> BytesValues<'_> {
        BytesValues::new(&self.ordinals, &self.terms, &self.hashes)
    }

    fn num_docs(&self) -> u32 {
        self.ordinals.num_docs()
    }

    fn is_multi_valued(&self) -> bool {
        self.ordinals.is_multi_valued()
    }

    fn memory_size_in_bytes(&self) -> u64 {
        self.memory_size
    }

    fn format(&self) -> FieldDataFormat {
        self.terms.format()
    }

    fn term_count(&self) -> usize {
        self.terms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fielddata::ordinals::OrdinalsBuilder;
    use crate::fielddata::terms::{ConcreteTermsBuilder, TermStoreBuilder};
    use crate::segment::DocNo;

    fn concrete(terms: &[&[u8]], docs: &[&[u32]], num_docs: u32) -> ConcreteFieldData {
        let mut ordinals = OrdinalsBuilder::new(num_docs);
        let mut store = ConcreteTermsBuilder::new();
        for (term, holders) in terms.iter().zip(docs) {
            store.add(term).unwrap();
            let ord = ordinals.next_ordinal().unwrap();
            for &doc in holders.iter() {
                ordinals.add_doc(DocNo(doc), ord).unwrap();
            }
        }
        OrdinalsFieldData::new(ordinals.build(), store.build().unwrap())
    }

    #[test]
    fn test_hashes_match_values() {
        let data = concrete(&[b"a", b"b"], &[&[1], &[0, 1]], 3);
        let values = data.bytes_values();
        let mut scratch = Vec::new();

        assert_eq!(values.value_hashed(DocNo(0), &mut scratch), hash_bytes(b"b"));
        assert_eq!(scratch, b"b");
        assert_eq!(values.value_hashed(DocNo(2), &mut scratch), hash_bytes(b""));
        assert!(scratch.is_empty());

        let hashed: Vec<_> = std::iter::from_fn({
            let mut iter = values.iter(DocNo(1));
            move || iter.next_hashed()
        })
        .collect();
        assert_eq!(hashed.len(), 2);
        for value in hashed {
            assert_eq!(value.hash(), hash_bytes(value.bytes()));
        }
    }

    #[test]
    fn test_memory_and_shape() {
        let data = concrete(&[b"x"], &[&[0]], 2);
        assert!(!data.is_multi_valued());
        assert_eq!(data.num_docs(), 2);
        assert_eq!(data.term_count(), 1);
        assert_eq!(data.format(), FieldDataFormat::Concrete);
        assert!(data.memory_size_in_bytes() > 0);

        let empty = concrete(&[], &[], 4);
        assert!(!empty.is_multi_valued());
        assert_eq!(empty.num_docs(), 4);
        assert!(!empty.bytes_values().has_value(DocNo(3)));
    }

    #[test]
    #[should_panic(expected = "document 2 out of range for segment with 2 documents")]
    fn test_out_of_range_document_panics() {
        let data = concrete(&[b"x"], &[&[0]], 2);
        data.bytes_values().has_value(DocNo(2));
    }
}
