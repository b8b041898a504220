//! Byte sequences paired with a precomputed hash

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use xxhash_rust::xxh64::xxh64;

/// Hash used for every value handed out by field data.
///
/// xxHash64 with seed 0, so callers can reproduce it from the bytes alone.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxh64(bytes, 0)
}

/// A byte sequence with its cached hash.
///
/// Equality and ordering look at the bytes only; the hash is an accelerator
/// for hash-based consumers such as term aggregations.
#[derive(Clone)]
pub struct HashedBytes<'a> {
    bytes: Cow<'a, [u8]>,
    hash: u64,
}

impl<'a> HashedBytes<'a> {
    pub fn new(bytes: impl Into<Cow<'a, [u8]>>) -> Self {
        let bytes = bytes.into();
        let hash = hash_bytes(&bytes);
        Self { bytes, hash }
    }

    /// Pair bytes with a hash computed earlier by `hash_bytes`
    pub fn with_hash(bytes: impl Into<Cow<'a, [u8]>>, hash: u64) -> Self {
        let bytes = bytes.into();
        debug_assert_eq!(hash, hash_bytes(&bytes));
        Self { bytes, hash }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn into_owned(self) -> HashedBytes<'static> {
        HashedBytes {
            bytes: Cow::Owned(self.bytes.into_owned()),
            hash: self.hash,
        }
    }
}

impl From<&str> for HashedBytes<'static> {
    fn from(s: &str) -> Self {
        HashedBytes::new(s.as_bytes().to_vec())
    }
}

impl PartialEq for HashedBytes<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for HashedBytes<'_> {}

impl Hash for HashedBytes<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialOrd for HashedBytes<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HashedBytes<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl fmt::Debug for HashedBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedBytes")
            .field("bytes", &String::from_utf8_lossy(&self.bytes))
            .field("hash", &format_args!("{:016x}", self.hash))
            .finish()
    }
}
