//! Ordinal -> term dictionaries
//!
//! Every physical encoding of field data shares the ordinals layout and
//! differs only in how the distinct terms are held. A term store is filled
//! in ordinal order (ascending term order) and is immutable once built.

use std::borrow::Cow;
use std::io;

use super::ordinals::TermOrd;
use crate::config::FieldDataFormat;

/// Read side of a term dictionary
pub trait TermStore: Send + Sync + 'static {
    fn format(&self) -> FieldDataFormat;

    /// Number of distinct terms
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The term with ordinal `ord`, borrowed when the encoding allows it
    fn term(&self, ord: TermOrd) -> Cow<'_, [u8]>;

    /// Copy the term with ordinal `ord` into `out`, replacing its content
    fn copy_term(&self, ord: TermOrd, out: &mut Vec<u8>) {
        out.clear();
        out.extend_from_slice(&self.term(ord));
    }

    fn memory_size_in_bytes(&self) -> u64;
}

/// Write side of a term dictionary
pub trait TermStoreBuilder {
    type Store: TermStore;

    /// Append the next term. Terms arrive strictly ascending.
    fn add(&mut self, term: &[u8]) -> io::Result<()>;

    fn build(self) -> io::Result<Self::Store>;
}

/// One owned buffer per term
#[derive(Debug)]
pub struct ConcreteTerms {
    terms: Box<[Box<[u8]>]>,
    total_bytes: u64,
}

impl TermStore for ConcreteTerms {
    fn format(&self) -> FieldDataFormat {
        FieldDataFormat::Concrete
    }

    fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    fn term(&self, ord: TermOrd) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.terms[ord as usize])
    }

    fn memory_size_in_bytes(&self) -> u64 {
        self.total_bytes + (self.terms.len() * std::mem::size_of::<Box<[u8]>>()) as u64
    }
}

#[derive(Debug, Default)]
pub struct ConcreteTermsBuilder {
    terms: Vec<Box<[u8]>>,
    total_bytes: u64,
}

impl ConcreteTermsBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TermStoreBuilder for ConcreteTermsBuilder {
    type Store = ConcreteTerms;

    fn add(&mut self, term: &[u8]) -> io::Result<()> {
        if let Some(last) = self.terms.last() {
            if **last >= *term {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Terms out of order",
                ));
            }
        }
        self.total_bytes += term.len() as u64;
        self.terms.push(term.into());
        Ok(())
    }

    fn build(self) -> io::Result<ConcreteTerms> {
        Ok(ConcreteTerms {
            terms: self.terms.into_boxed_slice(),
            total_bytes: self.total_bytes,
        })
    }
}
