//! Doc -> term ordinal mapping
//!
//! Ordinals are the ranks of a field's distinct terms in lexicographic order,
//! so a document's ordinals in ascending order are its values in ascending
//! order. The layout is picked from the data:
//! - no values at all: `Empty`
//! - at most one value per document: one slot per document
//! - otherwise: offsets into a flat ordinal array

use std::io;

use crate::segment::DocNo;

/// Term ordinal within one field of one segment
pub type TermOrd = u32;

/// Slot value for documents without a value in the single-valued layout
const MISSING_ORD: TermOrd = TermOrd::MAX;

#[derive(Debug)]
pub enum Ordinals {
    Empty { num_docs: u32 },
    Single(SingleOrdinals),
    Multi(MultiOrdinals),
}

#[derive(Debug)]
pub struct SingleOrdinals {
    ords: Box<[TermOrd]>,
}

#[derive(Debug)]
pub struct MultiOrdinals {
    /// `num_docs + 1` offsets into `ords`
    offsets: Box<[u32]>,
    ords: Box<[TermOrd]>,
}

impl Ordinals {
    pub fn num_docs(&self) -> u32 {
        match self {
            Ordinals::Empty { num_docs } => *num_docs,
            Ordinals::Single(single) => single.ords.len() as u32,
            Ordinals::Multi(multi) => (multi.offsets.len() - 1) as u32,
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Ordinals::Multi(_))
    }

    /// Ordinals of a document in ascending order. `doc` must be in range.
    #[inline]
    pub fn ords(&self, doc: u32) -> &[TermOrd] {
        match self {
            Ordinals::Empty { .. } => &[],
            Ordinals::Single(single) => {
                let ord = &single.ords[doc as usize];
                if *ord == MISSING_ORD {
                    &[]
                } else {
                    std::slice::from_ref(ord)
                }
            }
            Ordinals::Multi(multi) => {
                let start = multi.offsets[doc as usize] as usize;
                let end = multi.offsets[doc as usize + 1] as usize;
                &multi.ords[start..end]
            }
        }
    }

    pub fn memory_size_in_bytes(&self) -> u64 {
        let words = match self {
            Ordinals::Empty { .. } => 0,
            Ordinals::Single(single) => single.ords.len(),
            Ordinals::Multi(multi) => multi.offsets.len() + multi.ords.len(),
        };
        (words * std::mem::size_of::<u32>()) as u64
    }
}

/// Collects `(doc, ord)` pairs while terms are streamed in order
pub struct OrdinalsBuilder {
    num_docs: u32,
    next_ord: TermOrd,
    docs: Vec<u32>,
    ords: Vec<TermOrd>,
    counts: Vec<u32>,
}

impl OrdinalsBuilder {
    pub fn new(num_docs: u32) -> Self {
        Self {
            num_docs,
            next_ord: 0,
            docs: Vec::new(),
            ords: Vec::new(),
            counts: vec![0; num_docs as usize],
        }
    }

    /// Allocate the ordinal for the next term
    pub fn next_ordinal(&mut self) -> io::Result<TermOrd> {
        if self.next_ord == MISSING_ORD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Too many distinct terms for one segment",
            ));
        }
        let ord = self.next_ord;
        self.next_ord += 1;
        Ok(ord)
    }

    /// Record that `doc` holds the term `ord`.
    ///
    /// Ordinals must be added in ascending order.
    pub fn add_doc(&mut self, doc: DocNo, ord: TermOrd) -> io::Result<()> {
        let count = self.counts.get_mut(doc.as_usize()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Doc number {} out of range for segment with {} documents",
                    doc, self.num_docs
                ),
            )
        })?;
        *count += 1;
        self.docs.push(doc.as_u32());
        self.ords.push(ord);
        if self.ords.len() >= u32::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Too many ordinals for one segment",
            ));
        }
        Ok(())
    }

    pub fn build(self) -> Ordinals {
        if self.ords.is_empty() {
            return Ordinals::Empty {
                num_docs: self.num_docs,
            };
        }

        if self.counts.iter().all(|&c| c <= 1) {
            let mut ords = vec![MISSING_ORD; self.num_docs as usize];
            for (&doc, &ord) in self.docs.iter().zip(&self.ords) {
                ords[doc as usize] = ord;
            }
            return Ordinals::Single(SingleOrdinals {
                ords: ords.into_boxed_slice(),
            });
        }

        let mut offsets = Vec::with_capacity(self.num_docs as usize + 1);
        let mut total = 0u32;
        offsets.push(0);
        for &count in &self.counts {
            total += count;
            offsets.push(total);
        }

        // pairs arrive in ordinal order, so filling each document's range
        // front to back keeps its ordinals ascending
        let mut cursor: Vec<u32> = offsets[..self.num_docs as usize].to_vec();
        let mut ords = vec![0; total as usize];
        for (&doc, &ord) in self.docs.iter().zip(&self.ords) {
            let slot = &mut cursor[doc as usize];
            ords[*slot as usize] = ord;
            *slot += 1;
        }

        Ordinals::Multi(MultiOrdinals {
            offsets: offsets.into_boxed_slice(),
            ords: ords.into_boxed_slice(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ordinals() {
        let ordinals = OrdinalsBuilder::new(3).build();
        assert!(matches!(ordinals, Ordinals::Empty { num_docs: 3 }));
        assert!(!ordinals.is_multi_valued());
        assert!(ordinals.ords(2).is_empty());
        assert_eq!(ordinals.memory_size_in_bytes(), 0);
    }

    #[test]
    fn test_single_valued_with_missing() {
        let mut builder = OrdinalsBuilder::new(3);
        let first = builder.next_ordinal().unwrap();
        builder.add_doc(DocNo(2), first).unwrap();
        let second = builder.next_ordinal().unwrap();
        builder.add_doc(DocNo(0), second).unwrap();

        let ordinals = builder.build();
        assert!(!ordinals.is_multi_valued());
        assert_eq!(ordinals.num_docs(), 3);
        assert_eq!(ordinals.ords(0), &[1]);
        assert!(ordinals.ords(1).is_empty());
        assert_eq!(ordinals.ords(2), &[0]);
        assert!(ordinals.memory_size_in_bytes() > 0);
    }

    #[test]
    fn test_multi_valued_keeps_ordinals_ascending() {
        let mut builder = OrdinalsBuilder::new(3);
        for docs in [vec![1u32], vec![0, 2], vec![0]] {
            let ord = builder.next_ordinal().unwrap();
            for doc in docs {
                builder.add_doc(DocNo(doc), ord).unwrap();
            }
        }

        let ordinals = builder.build();
        assert!(ordinals.is_multi_valued());
        assert_eq!(ordinals.ords(0), &[1, 2]);
        assert_eq!(ordinals.ords(1), &[0]);
        assert_eq!(ordinals.ords(2), &[1]);
    }

    #[test]
    fn test_doc_out_of_range() {
        let mut builder = OrdinalsBuilder::new(1);
        let ord = builder.next_ordinal().unwrap();
        assert!(builder.add_doc(DocNo(1), ord).is_err());
    }
}
