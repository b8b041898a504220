//! Terms packed into fixed-size pages
//!
//! A term never straddles two pages, so every term is a contiguous slice
//! and can be handed out without copying. Terms longer than a page get a
//! page of their own.

use std::borrow::Cow;
use std::io;

use super::ordinals::TermOrd;
use super::terms::{TermStore, TermStoreBuilder};
use crate::config::FieldDataFormat;

#[derive(Debug)]
pub struct PagedBytes {
    pages: Box<[Box<[u8]>]>,
    page_bits: u32,
    /// Per ordinal: `page << page_bits | offset`
    addresses: Box<[u64]>,
    lengths: Box<[u32]>,
}

impl PagedBytes {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    fn slice(&self, ord: TermOrd) -> &[u8] {
        let address = self.addresses[ord as usize];
        let page = (address >> self.page_bits) as usize;
        let offset = (address & ((1u64 << self.page_bits) - 1)) as usize;
        let len = self.lengths[ord as usize] as usize;
        &self.pages[page][offset..offset + len]
    }
}

impl TermStore for PagedBytes {
    fn format(&self) -> FieldDataFormat {
        FieldDataFormat::PagedBytes
    }

    fn len(&self) -> usize {
        self.addresses.len()
    }

    #[inline]
    fn term(&self, ord: TermOrd) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.slice(ord))
    }

    fn memory_size_in_bytes(&self) -> u64 {
        let pages: usize = self.pages.iter().map(|p| p.len()).sum();
        (pages
            + self.addresses.len() * std::mem::size_of::<u64>()
            + self.lengths.len() * std::mem::size_of::<u32>()) as u64
    }
}

pub struct PagedBytesBuilder {
    page_size: usize,
    page_bits: u32,
    pages: Vec<Box<[u8]>>,
    current: Vec<u8>,
    addresses: Vec<u64>,
    lengths: Vec<u32>,
    last_term: Vec<u8>,
}

impl PagedBytesBuilder {
    /// `page_size` must be a power of two
    pub fn new(page_size: usize) -> Self {
        debug_assert!(page_size.is_power_of_two());
        Self {
            page_size,
            page_bits: page_size.trailing_zeros(),
            pages: Vec::new(),
            current: Vec::new(),
            addresses: Vec::new(),
            lengths: Vec::new(),
            last_term: Vec::new(),
        }
    }

    /// Close the open page. A page is open once a term was addressed into
    /// it, even an empty one.
    fn seal_current(&mut self) {
        if self.current.capacity() > 0 {
            let page = std::mem::take(&mut self.current);
            self.pages.push(page.into_boxed_slice());
        }
    }
}

impl TermStoreBuilder for PagedBytesBuilder {
    type Store = PagedBytes;

    fn add(&mut self, term: &[u8]) -> io::Result<()> {
        if !self.addresses.is_empty() && self.last_term.as_slice() >= term {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Terms out of order",
            ));
        }
        let len = u32::try_from(term.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "Term too long")
        })?;

        let address = if term.len() > self.page_size {
            self.seal_current();
            self.pages.push(term.into());
            ((self.pages.len() - 1) as u64) << self.page_bits
        } else {
            if self.current.len() + term.len() > self.page_size {
                self.seal_current();
            }
            if self.current.capacity() == 0 {
                self.current.reserve_exact(self.page_size);
            }
            let offset = self.current.len() as u64;
            self.current.extend_from_slice(term);
            ((self.pages.len() as u64) << self.page_bits) | offset
        };

        self.addresses.push(address);
        self.lengths.push(len);
        self.last_term.clear();
        self.last_term.extend_from_slice(term);
        Ok(())
    }

    fn build(mut self) -> io::Result<PagedBytes> {
        self.seal_current();
        Ok(PagedBytes {
            pages: self.pages.into_boxed_slice(),
            page_bits: self.page_bits,
            addresses: self.addresses.into_boxed_slice(),
            lengths: self.lengths.into_boxed_slice(),
        })
    }
}
