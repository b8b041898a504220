pub mod config;
pub mod error;
pub mod fielddata;
pub mod segment;
pub mod sort;

pub use config::{FieldDataFormat, FieldDataSettings, FieldSettings};
pub use error::{FieldDataError, Result};
pub use fielddata::{
    hash_bytes, AtomicFieldData, BytesValues, FieldDataListener, FieldDataService, FieldDataStats,
    HashedBytes, IndexFieldData, ValuesIter,
};
pub use segment::{DocNo, SegmentId, SegmentReader, SegmentWriter};
pub use sort::{
    BytesComparatorSource, BytesFieldComparator, FieldDoc, SortMode, TopFieldCollector,
    TopFieldDocs, MAX_TERM,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
