//! Per-document value access
//!
//! `BytesValues` is the view consumers use on a segment's field data. It is
//! cheap to create, borrows the field data, and is meant for one thread.
//! Hot loops should use the scratch-buffer methods, which write into a
//! caller-owned `Vec<u8>` and never allocate on their own.

use std::borrow::Cow;

use super::hashed::{hash_bytes, HashedBytes};
use super::ordinals::{Ordinals, TermOrd};
use super::terms::TermStore;
use crate::segment::DocNo;

#[derive(Clone, Copy)]
pub struct BytesValues<'a> {
    ordinals: &'a Ordinals,
    terms: &'a dyn TermStore,
    hashes: &'a [u64],
}

impl<'a> BytesValues<'a> {
    pub(crate) fn new(ordinals: &'a Ordinals, terms: &'a dyn TermStore, hashes: &'a [u64]) -> Self {
        Self {
            ordinals,
            terms,
            hashes,
        }
    }

    pub fn num_docs(&self) -> u32 {
        self.ordinals.num_docs()
    }

    /// Whether a document of this segment may hold more than one value
    pub fn is_multi_valued(&self) -> bool {
        self.ordinals.is_multi_valued()
    }

    /// Panics if `doc` is outside `[0, num_docs)`.
    #[inline]
    #[track_caller]
    fn ords(&self, doc: DocNo) -> &'a [TermOrd] {
        let num_docs = self.ordinals.num_docs();
        if doc.as_u32() >= num_docs {
            panic!(
                "document {} out of range for segment with {} documents",
                doc, num_docs
            );
        }
        self.ordinals.ords(doc.as_u32())
    }

    #[track_caller]
    pub fn has_value(&self, doc: DocNo) -> bool {
        !self.ords(doc).is_empty()
    }

    #[track_caller]
    pub fn value_count(&self, doc: DocNo) -> usize {
        self.ords(doc).len()
    }

    /// The first value of the document, `None` if it has none
    #[track_caller]
    pub fn value(&self, doc: DocNo) -> Option<Vec<u8>> {
        self.ords(doc)
            .first()
            .map(|&ord| self.terms.term(ord).into_owned())
    }

    /// Write the first value of the document into `scratch` and return it.
    ///
    /// `scratch` is cleared first; it stays empty for a missing document.
    #[track_caller]
    pub fn value_scratch<'b>(&self, doc: DocNo, scratch: &'b mut Vec<u8>) -> &'b [u8] {
        match self.ords(doc).first() {
            Some(&ord) => self.terms.copy_term(ord, scratch),
            None => scratch.clear(),
        }
        scratch.as_slice()
    }

    /// Like `value_scratch`, returning the value's precomputed hash.
    ///
    /// A missing document yields the hash of the empty byte sequence.
    #[track_caller]
    pub fn value_hashed(&self, doc: DocNo, scratch: &mut Vec<u8>) -> u64 {
        match self.ords(doc).first() {
            Some(&ord) => {
                self.terms.copy_term(ord, scratch);
                self.hashes[ord as usize]
            }
            None => {
                scratch.clear();
                hash_bytes(&[])
            }
        }
    }

    /// All values of the document in ascending order.
    ///
    /// Every call returns a new iterator positioned on the first value.
    #[track_caller]
    pub fn iter(&self, doc: DocNo) -> ValuesIter<'a> {
        ValuesIter {
            ords: self.ords(doc),
            terms: self.terms,
            hashes: self.hashes,
            pos: 0,
        }
    }
}

/// Iterator over one document's values
pub struct ValuesIter<'a> {
    ords: &'a [TermOrd],
    terms: &'a dyn TermStore,
    hashes: &'a [u64],
    pos: usize,
}

impl<'a> ValuesIter<'a> {
    fn advance(&mut self) -> Option<TermOrd> {
        let ord = *self.ords.get(self.pos)?;
        self.pos += 1;
        Some(ord)
    }

    /// Copy the next value into `out`. Returns false once exhausted, leaving
    /// `out` untouched.
    pub fn next_into(&mut self, out: &mut Vec<u8>) -> bool {
        match self.advance() {
            Some(ord) => {
                self.terms.copy_term(ord, out);
                true
            }
            None => false,
        }
    }

    /// The next value together with its precomputed hash
    pub fn next_hashed(&mut self) -> Option<HashedBytes<'a>> {
        let ord = self.advance()?;
        Some(HashedBytes::with_hash(
            self.terms.term(ord),
            self.hashes[ord as usize],
        ))
    }
}

impl<'a> Iterator for ValuesIter<'a> {
    type Item = Cow<'a, [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        let ord = self.advance()?;
        Some(self.terms.term(ord))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ords.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ValuesIter<'_> {}
