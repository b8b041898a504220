//! Builds per-segment field data from a segment's inverted terms

use std::io;
use std::sync::Arc;

use super::atomic::{AtomicFieldData, OrdinalsFieldData};
use super::fst_terms::FstTermsBuilder;
use super::ordinals::OrdinalsBuilder;
use super::paged_bytes::PagedBytesBuilder;
use super::terms::{ConcreteTermsBuilder, TermStore, TermStoreBuilder};
use crate::config::FieldDataFormat;
use crate::error::{FieldDataError, Result};
use crate::segment::{FieldTerms, SegmentReader};

/// Materialize `field` of `segment` in the requested format.
///
/// A field absent from the segment loads as "every document missing".
pub fn load_field_data(
    segment: &SegmentReader,
    field: &str,
    format: FieldDataFormat,
    page_size: usize,
) -> Result<Arc<dyn AtomicFieldData>> {
    let terms = segment.field_terms(field);
    let max_doc = segment.max_doc();

    let loaded = match format {
        FieldDataFormat::Concrete => shared(build(terms, max_doc, ConcreteTermsBuilder::new())),
        FieldDataFormat::PagedBytes => {
            shared(build(terms, max_doc, PagedBytesBuilder::new(page_size)))
        }
        FieldDataFormat::Fst => shared(build(terms, max_doc, FstTermsBuilder::new())),
    };

    loaded.map_err(|e| FieldDataError::load_failure(field, segment.id(), e))
}

fn shared<T: TermStore>(
    data: io::Result<OrdinalsFieldData<T>>,
) -> io::Result<Arc<dyn AtomicFieldData>> {
    let data: Arc<dyn AtomicFieldData> = Arc::new(data?);
    Ok(data)
}

fn build<B: TermStoreBuilder>(
    terms: Option<&FieldTerms>,
    max_doc: u32,
    mut store: B,
) -> io::Result<OrdinalsFieldData<B::Store>> {
    let mut ordinals = OrdinalsBuilder::new(max_doc);

    if let Some(terms) = terms {
        terms.verify()?;
        let mut postings = terms.iter(max_doc);
        while let Some((term, docs)) = postings.next()? {
            if docs.is_empty() {
                continue;
            }
            store.add(term)?;
            let ord = ordinals.next_ordinal()?;
            for &doc in docs {
                ordinals.add_doc(doc, ord)?;
            }
        }
    }

    Ok(OrdinalsFieldData::new(ordinals.build(), store.build()?))
}
