//! Interning cache for map-key strings.
//!
//! Map keys are short and repeat constantly (field names), so the decoder
//! can skip UTF-8 validation and allocation bookkeeping for byte runs it has
//! already seen. Records live in buckets indexed by byte length; each bucket
//! keeps its records in most-recently-used order and evicts from the tail.

use std::sync::{Arc, Mutex};

use crate::error::{MsgPackError, Result};

pub const DEFAULT_MAX_KEY_LENGTH: usize = 16;
pub const DEFAULT_MAX_RECORDS_PER_BUCKET: usize = 16;

/// A key cache shared between decoders.
pub type SharedKeyCache = Arc<Mutex<KeyCache>>;

#[derive(Debug)]
struct KeyRecord {
    bytes: Box<[u8]>,
    value: String,
}

#[derive(Debug)]
pub struct KeyCache {
    max_key_length: usize,
    max_records_per_bucket: usize,
    buckets: Vec<Vec<KeyRecord>>,
    hits: u64,
    misses: u64,
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyCache {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_KEY_LENGTH, DEFAULT_MAX_RECORDS_PER_BUCKET)
    }

    pub fn with_limits(max_key_length: usize, max_records_per_bucket: usize) -> Self {
        Self {
            max_key_length,
            max_records_per_bucket: max_records_per_bucket.max(1),
            buckets: (0..max_key_length).map(|_| Vec::new()).collect(),
            hits: 0,
            misses: 0,
        }
    }

    /// Wraps a default cache for sharing across decoders.
    pub fn shared() -> SharedKeyCache {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Number of records currently cached.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(Vec::clear);
        self.hits = 0;
        self.misses = 0;
    }

    #[inline]
    pub fn can_be_cached(&self, byte_length: usize) -> bool {
        byte_length > 0 && byte_length <= self.max_key_length
    }

    /// Decodes `byte_length` bytes of `buffer` starting at `offset`.
    pub fn decode(&mut self, buffer: &[u8], offset: usize, byte_length: usize) -> Result<String> {
        let remaining = buffer.len().saturating_sub(offset);
        let bytes = offset
            .checked_add(byte_length)
            .and_then(|end| buffer.get(offset..end))
            .ok_or(MsgPackError::InsufficientData {
                needed: byte_length,
                remaining,
            })?;
        if !self.can_be_cached(byte_length) {
            return decode_utf8(bytes);
        }

        let max_records = self.max_records_per_bucket;
        let bucket = &mut self.buckets[byte_length - 1];
        if let Some(pos) = bucket.iter().position(|record| *record.bytes == *bytes) {
            self.hits += 1;
            bucket[..=pos].rotate_right(1);
            return Ok(bucket[0].value.clone());
        }

        self.misses += 1;
        let value = decode_utf8(bytes)?;
        if bucket.len() >= max_records {
            if let Some(evicted) = bucket.pop() {
                tracing::trace!(key = %evicted.value, "evicting cached map key");
            }
        }
        bucket.insert(
            0,
            KeyRecord {
                bytes: bytes.into(),
                value: value.clone(),
            },
        );
        Ok(value)
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| MsgPackError::InvalidUtf8)
}
