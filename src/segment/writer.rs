//! Segment writer for creating new immutable segments
//!
//! Documents are buffered as per-field `term -> docs` maps and written as
//! an FST term dictionary plus block postings per field.

use std::collections::{BTreeMap, HashMap};
use std::io;

use roaring::RoaringBitmap;

use super::postings::{PostingsReader, PostingsWriter};
use super::reader::{FieldTerms, SegmentReader};
use super::term_dict::TermDictionaryBuilder;
use super::types::{DocNo, SegmentId};

/// Writer for one segment
pub struct SegmentWriter {
    segment_id: SegmentId,
    doc_count: u32,
    /// field -> term -> docs (docs ascending by construction)
    fields: HashMap<String, BTreeMap<Vec<u8>, Vec<DocNo>>>,
    deleted: RoaringBitmap,
}

impl SegmentWriter {
    pub fn new(segment_id: SegmentId) -> Self {
        Self {
            segment_id,
            doc_count: 0,
            fields: HashMap::new(),
            deleted: RoaringBitmap::new(),
        }
    }

    /// Add a document and return its docno.
    ///
    /// A field may appear several times; a repeated `(field, value)` pair is
    /// indexed once.
    pub fn add_document(&mut self, values: &[(&str, &[u8])]) -> DocNo {
        let docno = DocNo::new(self.doc_count);
        self.doc_count += 1;

        for (field, value) in values {
            let docs = self
                .fields
                .entry((*field).to_string())
                .or_default()
                .entry(value.to_vec())
                .or_default();
            if docs.last() != Some(&docno) {
                docs.push(docno);
            }
        }

        docno
    }

    /// Add a document without any indexed field
    pub fn add_empty_document(&mut self) -> DocNo {
        self.add_document(&[])
    }

    /// Mark a document as deleted. Its values stay in the segment.
    pub fn delete_document(&mut self, docno: DocNo) {
        if docno.as_u32() < self.doc_count {
            self.deleted.insert(docno.as_u32());
        }
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    /// Write all fields and return the segment reader
    pub fn finish(self) -> io::Result<SegmentReader> {
        let mut fields = HashMap::with_capacity(self.fields.len());

        for (name, terms) in self.fields {
            let mut postings_writer = PostingsWriter::new();
            let mut term_builder = TermDictionaryBuilder::with_capacity(terms.len());

            for (term, docs) in terms {
                let meta = postings_writer.write_posting_list(&docs);
                term_builder.add(term, meta);
            }

            let dictionary = term_builder.build()?;
            let postings_data = postings_writer.into_data();
            let checksum = FieldTerms::compute_checksum(dictionary.fst_bytes(), &postings_data);
            fields.insert(
                name,
                FieldTerms::new(dictionary, PostingsReader::new(postings_data), checksum),
            );
        }

        Ok(SegmentReader::from_memory(
            self.segment_id,
            self.doc_count,
            fields,
            self.deleted,
        ))
    }
}
