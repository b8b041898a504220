//! Reference top-N collector over one segment
//!
//! Keeps the current best hits in a binary heap with the weakest hit at the
//! root, which is also the comparator's bottom slot. A new document only
//! touches the heap once it beats the bottom.

use std::cmp::Ordering;

use serde::Serialize;

use super::comparator::{BytesComparatorSource, BytesFieldComparator};
use crate::error::Result;
use crate::segment::{DocNo, SegmentReader};

/// One ranked hit with its sort key
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDoc {
    pub doc: DocNo,
    /// `None` when the document sorted on an absent key
    pub value: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TopFieldDocs {
    pub total_hits: u64,
    pub docs: Vec<FieldDoc>,
}

impl TopFieldDocs {
    pub fn doc_ids(&self) -> Vec<u32> {
        self.docs.iter().map(|d| d.doc.as_u32()).collect()
    }
}

/// Collects the best `num_hits` live documents of a segment by sort key.
///
/// Equal keys rank by ascending document number.
pub struct TopFieldCollector {
    source: BytesComparatorSource,
    num_hits: usize,
    reversed: bool,
}

impl TopFieldCollector {
    pub fn new(source: BytesComparatorSource, num_hits: usize, reversed: bool) -> Self {
        Self {
            source,
            num_hits,
            reversed,
        }
    }

    pub fn search(&self, segment: &SegmentReader) -> Result<TopFieldDocs> {
        if self.num_hits == 0 {
            return Ok(TopFieldDocs {
                total_hits: segment.live_docs().count() as u64,
                docs: Vec::new(),
            });
        }

        let mut comparator = self.source.new_comparator(self.num_hits, self.reversed);
        comparator.set_next_reader(segment)?;

        // weakest hit at the root; every entry owns one comparator slot
        let mut heap: Vec<(usize, DocNo)> = Vec::with_capacity(self.num_hits);
        let mut total_hits = 0u64;

        for doc in segment.live_docs() {
            total_hits += 1;
            if heap.len() < self.num_hits {
                let slot = heap.len();
                comparator.copy(slot, doc);
                heap.push((slot, doc));
                self.sift_up(&comparator, &mut heap, slot);
            } else {
                // documents arrive in id order, so a tie never displaces the bottom
                if self.direction(comparator.compare_bottom(doc)) != Ordering::Greater {
                    continue;
                }
                let slot = heap[0].0;
                comparator.copy(slot, doc);
                heap[0] = (slot, doc);
                self.sift_down(&comparator, &mut heap, 0);
            }

            if heap.len() == self.num_hits {
                comparator.set_bottom(heap[0].0);
            }
        }

        heap.sort_by(|a, b| self.rank(&comparator, *a, *b));
        let docs = heap
            .iter()
            .map(|&(slot, doc)| FieldDoc {
                doc,
                value: comparator.value(slot).map(<[u8]>::to_vec),
            })
            .collect();

        Ok(TopFieldDocs { total_hits, docs })
    }

    fn direction(&self, ordering: Ordering) -> Ordering {
        if self.reversed {
            ordering.reverse()
        } else {
            ordering
        }
    }

    /// `Less` when `a` ranks ahead of `b`
    fn rank(
        &self,
        comparator: &BytesFieldComparator,
        a: (usize, DocNo),
        b: (usize, DocNo),
    ) -> Ordering {
        self.direction(comparator.compare(a.0, b.0))
            .then_with(|| a.1.cmp(&b.1))
    }

    fn sift_up(
        &self,
        comparator: &BytesFieldComparator,
        heap: &mut [(usize, DocNo)],
        mut i: usize,
    ) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.rank(comparator, heap[i], heap[parent]) != Ordering::Greater {
                break;
            }
            heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(
        &self,
        comparator: &BytesFieldComparator,
        heap: &mut [(usize, DocNo)],
        mut i: usize,
    ) {
        loop {
            let mut weakest = i;
            for child in [2 * i + 1, 2 * i + 2] {
                if child < heap.len()
                    && self.rank(comparator, heap[child], heap[weakest]) == Ordering::Greater
                {
                    weakest = child;
                }
            }
            if weakest == i {
                break;
            }
            heap.swap(i, weakest);
            i = weakest;
        }
    }
}
