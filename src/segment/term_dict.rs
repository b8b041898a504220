//! Term dictionary using FST (Finite State Transducer)
//!
//! Maps a field's terms to their posting list metadata. The FST value is
//! the index into the metadata array, which is also the term's rank in
//! lexicographic order.

use std::io;

use fst::{Map, MapBuilder, Streamer};

use super::types::PostingListMeta;

/// Term dictionary backed by FST
pub struct TermDictionary {
    /// FST mapping term -> index in metadata array
    fst: Map<Vec<u8>>,
    /// Metadata for each term (parallel to FST output values)
    metadata: Vec<PostingListMeta>,
}

impl TermDictionary {
    /// Create a term dictionary from FST data and metadata
    pub fn new(fst_data: Vec<u8>, metadata: Vec<PostingListMeta>) -> io::Result<Self> {
        let fst = Map::new(fst_data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if fst.len() != metadata.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Term dictionary has {} terms but {} metadata entries",
                    fst.len(),
                    metadata.len()
                ),
            ));
        }
        Ok(Self { fst, metadata })
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Raw FST data (for checksums and serialization)
    pub fn fst_bytes(&self) -> &[u8] {
        self.fst.as_fst().as_bytes()
    }

    pub fn metadata(&self) -> &[PostingListMeta] {
        &self.metadata
    }

    /// Stream terms in lexicographic order
    pub fn stream(&self) -> TermStream<'_> {
        TermStream {
            inner: self.fst.stream(),
            metadata: &self.metadata,
        }
    }
}

/// Ordered stream over `(term, metadata)` pairs.
///
/// The term slice is only valid until the next call, so this is a
/// streamer rather than an `Iterator`.
pub struct TermStream<'a> {
    inner: fst::map::Stream<'a>,
    metadata: &'a [PostingListMeta],
}

impl<'a> TermStream<'a> {
    pub fn next(&mut self) -> io::Result<Option<(&[u8], &'a PostingListMeta)>> {
        let metadata = self.metadata;
        match self.inner.next() {
            Some((term, idx)) => {
                let meta = metadata.get(idx as usize).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Term metadata index {} out of bounds", idx),
                    )
                })?;
                Ok(Some((term, meta)))
            }
            None => Ok(None),
        }
    }
}

/// Builder for term dictionaries
#[derive(Default)]
pub struct TermDictionaryBuilder {
    /// Terms and their metadata, sorted on build
    terms: Vec<(Vec<u8>, PostingListMeta)>,
}

impl TermDictionaryBuilder {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, term: Vec<u8>, meta: PostingListMeta) {
        self.terms.push((term, meta));
    }

    /// Build the term dictionary
    pub fn build(mut self) -> io::Result<TermDictionary> {
        // FST requires sorted, distinct input
        self.terms.sort_by(|a, b| a.0.cmp(&b.0));

        let mut fst_builder = MapBuilder::memory();
        let mut metadata = Vec::with_capacity(self.terms.len());

        for (idx, (term, meta)) in self.terms.into_iter().enumerate() {
            fst_builder
                .insert(&term, idx as u64)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            metadata.push(meta);
        }

        let fst_data = fst_builder
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        TermDictionary::new(fst_data, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(offset: u64, doc_frequency: u32) -> PostingListMeta {
        PostingListMeta {
            offset,
            length: 4,
            doc_frequency,
        }
    }

    #[test]
    fn test_term_dictionary_builder() {
        let mut builder = TermDictionaryBuilder::new();
        builder.add(b"cherry".to_vec(), meta(8, 15));
        builder.add(b"apple".to_vec(), meta(0, 10));
        builder.add(b"banana".to_vec(), meta(4, 20));

        let dict = builder.build().unwrap();

        assert_eq!(dict.len(), 3);
        let mut stream = dict.stream();
        let mut frequencies = Vec::new();
        while let Some((term, meta)) = stream.next().unwrap() {
            frequencies.push((term.to_vec(), meta.doc_frequency));
        }
        assert_eq!(
            frequencies,
            vec![
                (b"apple".to_vec(), 10),
                (b"banana".to_vec(), 20),
                (b"cherry".to_vec(), 15),
            ]
        );
    }

    #[test]
    fn test_stream_is_sorted() {
        let mut builder = TermDictionaryBuilder::new();
        builder.add(b"b".to_vec(), meta(0, 1));
        builder.add(b"\xff".to_vec(), meta(4, 1));
        builder.add(b"a".to_vec(), meta(8, 1));

        let dict = builder.build().unwrap();
        let mut stream = dict.stream();
        let mut seen = Vec::new();
        while let Some((term, _)) = stream.next().unwrap() {
            seen.push(term.to_vec());
        }
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec(), b"\xff".to_vec()]);
    }

    #[test]
    fn test_duplicate_terms_rejected() {
        let mut builder = TermDictionaryBuilder::new();
        builder.add(b"same".to_vec(), meta(0, 1));
        builder.add(b"same".to_vec(), meta(4, 1));
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_metadata_count_mismatch() {
        let mut builder = TermDictionaryBuilder::new();
        builder.add(b"one".to_vec(), meta(0, 1));
        let dict = builder.build().unwrap();
        let fst_data = dict.fst_bytes().to_vec();
        assert!(TermDictionary::new(fst_data, Vec::new()).is_err());
    }
}
