//! Immutable segment reader
//!
//! Each field of a segment is an FST term dictionary over block-encoded
//! posting lists. Field data loaders consume the `(term, docs)` stream of a
//! field in term order.

use std::collections::HashMap;
use std::io;

use crc32fast::Hasher;
use roaring::RoaringBitmap;

use super::postings::PostingsReader;
use super::term_dict::{TermDictionary, TermStream};
use super::types::{DocNo, PostingListMeta, SegmentId};

/// Inverted data for one field of one segment
pub struct FieldTerms {
    terms: TermDictionary,
    postings: PostingsReader,
    checksum: u32,
}

impl FieldTerms {
    pub fn new(terms: TermDictionary, postings: PostingsReader, checksum: u32) -> Self {
        Self {
            terms,
            postings,
            checksum,
        }
    }

    /// Checksum over the field's FST and postings data.
    pub fn compute_checksum(fst_bytes: &[u8], postings: &[u8]) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(fst_bytes);
        hasher.update(postings);
        hasher.finalize()
    }

    /// Recompute the checksum and compare it to the stored one
    pub fn verify(&self) -> io::Result<()> {
        let actual = Self::compute_checksum(self.terms.fst_bytes(), self.postings.data());
        if actual != self.checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: expected {:08x}, got {:08x}",
                    self.checksum, actual
                ),
            ));
        }
        Ok(())
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Number of distinct terms
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn dictionary(&self) -> &TermDictionary {
        &self.terms
    }

    /// Stream `(term, docs)` in term order.
    ///
    /// Doc numbers are validated against `max_doc`.
    pub fn iter(&self, max_doc: u32) -> TermPostings<'_> {
        TermPostings {
            stream: self.terms.stream(),
            postings: &self.postings,
            max_doc,
            docs: Vec::new(),
            deltas: Vec::new(),
        }
    }
}

/// Streaming cursor over a field's terms and their documents
pub struct TermPostings<'a> {
    stream: TermStream<'a>,
    postings: &'a PostingsReader,
    max_doc: u32,
    docs: Vec<DocNo>,
    deltas: Vec<u32>,
}

impl<'a> TermPostings<'a> {
    /// Advance to the next term. Both slices are only valid until the next call.
    pub fn next(&mut self) -> io::Result<Option<(&[u8], &[DocNo])>> {
        let (term, meta): (&[u8], &PostingListMeta) = match self.stream.next()? {
            Some(entry) => entry,
            None => return Ok(None),
        };
        self.postings
            .read_posting_list(meta, &mut self.docs, &mut self.deltas)?;
        if let Some(last) = self.docs.last() {
            if last.0 >= self.max_doc {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Doc number {} out of range for segment with {} documents",
                        last.0, self.max_doc
                    ),
                ));
            }
        }
        Ok(Some((term, &self.docs)))
    }
}

/// Immutable segment reader backed by in-memory data
pub struct SegmentReader {
    id: SegmentId,
    max_doc: u32,
    fields: HashMap<String, FieldTerms>,
    deleted: RoaringBitmap,
}

impl SegmentReader {
    pub fn from_memory(
        id: SegmentId,
        max_doc: u32,
        fields: HashMap<String, FieldTerms>,
        deleted: RoaringBitmap,
    ) -> Self {
        Self {
            id,
            max_doc,
            fields,
            deleted,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Number of documents, including deleted ones
    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    pub fn live_doc_count(&self) -> u32 {
        self.max_doc - self.deleted.len() as u32
    }

    pub fn is_deleted(&self, docno: DocNo) -> bool {
        self.deleted.contains(docno.as_u32())
    }

    /// Iterate over live documents in id order
    pub fn live_docs(&self) -> impl Iterator<Item = DocNo> + '_ {
        (0..self.max_doc)
            .filter(move |d| !self.deleted.contains(*d))
            .map(DocNo)
    }

    /// Inverted data for a field, `None` if no document of the segment has it
    pub fn field_terms(&self, field: &str) -> Option<&FieldTerms> {
        self.fields.get(field)
    }
}

/// Builder for creating segment readers from raw field parts
pub struct SegmentReaderBuilder {
    id: SegmentId,
    max_doc: u32,
    fields: HashMap<String, FieldTerms>,
    deleted: RoaringBitmap,
}

impl SegmentReaderBuilder {
    pub fn new(id: SegmentId, max_doc: u32) -> Self {
        Self {
            id,
            max_doc,
            fields: HashMap::new(),
            deleted: RoaringBitmap::new(),
        }
    }

    /// Add a field from its serialized parts
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        fst_data: Vec<u8>,
        metadata: Vec<PostingListMeta>,
        postings_data: Vec<u8>,
        checksum: u32,
    ) -> io::Result<Self> {
        let terms = TermDictionary::new(fst_data, metadata)?;
        self.fields.insert(
            name.into(),
            FieldTerms::new(terms, PostingsReader::new(postings_data), checksum),
        );
        Ok(self)
    }

    pub fn with_deleted(mut self, docno: DocNo) -> Self {
        self.deleted.insert(docno.as_u32());
        self
    }

    pub fn build(self) -> io::Result<SegmentReader> {
        if let Some(max) = self.deleted.max() {
            if max >= self.max_doc {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Deleted doc {} beyond max_doc {}", max, self.max_doc),
                ));
            }
        }
        Ok(SegmentReader::from_memory(
            self.id,
            self.max_doc,
            self.fields,
            self.deleted,
        ))
    }
}
