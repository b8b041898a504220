//! Terms held in a finite state transducer
//!
//! The FST maps each term to its ordinal. Outputs grow with the key order,
//! so a transition's output is the smallest ordinal reachable through it and
//! the term for an ordinal can be recovered by walking down from the root,
//! always taking the last transition whose accumulated output does not
//! exceed the target.

use std::borrow::Cow;
use std::io;

use fst::{Map, MapBuilder};

use super::ordinals::TermOrd;
use super::terms::{TermStore, TermStoreBuilder};
use crate::config::FieldDataFormat;

pub struct FstTerms {
    map: Map<Vec<u8>>,
}

impl FstTerms {
    /// Ordinal of a term, if present
    pub fn ord_of(&self, term: &[u8]) -> Option<TermOrd> {
        self.map.get(term).map(|v| v as TermOrd)
    }

    /// Write the term for `ord` into `out`. Returns false if no term has it.
    fn walk(&self, ord: TermOrd, out: &mut Vec<u8>) -> bool {
        let target = ord as u64;
        let fst = self.map.as_fst();
        let mut node = fst.root();
        let mut acc = 0u64;
        out.clear();

        loop {
            if node.is_final() && acc + node.final_output().value() == target {
                return true;
            }
            let mut next = None;
            for transition in node.transitions() {
                if acc + transition.out.value() <= target {
                    next = Some(transition);
                } else {
                    break;
                }
            }
            match next {
                Some(transition) => {
                    out.push(transition.inp);
                    acc += transition.out.value();
                    node = fst.node(transition.addr);
                }
                None => {
                    out.clear();
                    return false;
                }
            }
        }
    }
}

impl TermStore for FstTerms {
    fn format(&self) -> FieldDataFormat {
        FieldDataFormat::Fst
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn term(&self, ord: TermOrd) -> Cow<'_, [u8]> {
        let mut out = Vec::new();
        self.copy_term(ord, &mut out);
        Cow::Owned(out)
    }

    fn copy_term(&self, ord: TermOrd, out: &mut Vec<u8>) {
        let found = self.walk(ord, out);
        debug_assert!(found, "ordinal {} not in term dictionary", ord);
    }

    fn memory_size_in_bytes(&self) -> u64 {
        self.map.as_fst().as_bytes().len() as u64
    }
}

pub struct FstTermsBuilder {
    builder: MapBuilder<Vec<u8>>,
    next_ord: u64,
}

impl FstTermsBuilder {
    pub fn new() -> Self {
        Self {
            builder: MapBuilder::memory(),
            next_ord: 0,
        }
    }
}

impl Default for FstTermsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TermStoreBuilder for FstTermsBuilder {
    type Store = FstTerms;

    fn add(&mut self, term: &[u8]) -> io::Result<()> {
        self.builder
            .insert(term, self.next_ord)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.next_ord += 1;
        Ok(())
    }

    fn build(self) -> io::Result<FstTerms> {
        let data = self
            .builder
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let map = Map::new(data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(FstTerms { map })
    }
}
