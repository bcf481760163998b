//! Encoder and decoder configuration.

use serde::{Deserialize, Serialize};

use crate::error::{LengthKind, MsgPackError, Result};
use crate::key_cache::SharedKeyCache;

pub const DEFAULT_MAX_DEPTH: usize = 100;
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 2048;
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Nesting depth at which encoding fails with `DepthExceeded`.
    pub max_depth: usize,
    /// Order every map by encoded key bytes, not only maps with
    /// non-string keys.
    pub sort_keys: bool,
    /// Drop map entries whose value is `Undefined`.
    pub ignore_undefined: bool,
    /// Write `F64` values that survive an `f32` round trip as float32.
    pub force_float32: bool,
    pub initial_buffer_size: usize,
    pub max_chunk_size: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            sort_keys: false,
            ignore_undefined: false,
            force_float32: false,
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

impl EncodeOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    pub fn with_ignore_undefined(mut self, ignore_undefined: bool) -> Self {
        self.ignore_undefined = ignore_undefined;
        self
    }

    pub fn with_force_float32(mut self, force_float32: bool) -> Self {
        self.force_float32 = force_float32;
        self
    }
}

/// Ceilings checked against every declared length before allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    pub max_str_length: u32,
    pub max_bin_length: u32,
    pub max_array_length: u32,
    pub max_map_length: u32,
    pub max_ext_length: u32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_str_length: u32::MAX,
            max_bin_length: u32::MAX,
            max_array_length: u32::MAX,
            max_map_length: u32::MAX,
            max_ext_length: u32::MAX,
        }
    }
}

impl DecodeLimits {
    pub fn max_for(&self, kind: LengthKind) -> u32 {
        match kind {
            LengthKind::Str => self.max_str_length,
            LengthKind::Bin => self.max_bin_length,
            LengthKind::Array => self.max_array_length,
            LengthKind::Map => self.max_map_length,
            LengthKind::Ext => self.max_ext_length,
        }
    }

    /// Fails with `MaxLengthExceeded` when `length` is above the ceiling for
    /// `kind`.
    #[inline]
    pub fn check(&self, kind: LengthKind, length: usize) -> Result<()> {
        let max = self.max_for(kind) as usize;
        if length > max {
            tracing::debug!(%kind, length, max, "declared length exceeds limit");
            return Err(MsgPackError::MaxLengthExceeded { kind, length, max });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub limits: DecodeLimits,
    /// Decode uint64/int64 payloads as `BigInt` through the decimal bridge.
    pub use_big_int_fallback: bool,
    /// Replace non-string map keys with their canonical hex string and wrap
    /// the entry value as `{"key": rawKey, "value": value}`.
    pub stringify_keys: bool,
    /// Return unregistered extensions as raw `Value::Ext` instead of failing.
    pub keep_unknown_extensions: bool,
    #[serde(skip)]
    pub key_cache: Option<SharedKeyCache>,
}

impl DecodeOptions {
    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_big_int_fallback(mut self, enabled: bool) -> Self {
        self.use_big_int_fallback = enabled;
        self
    }

    pub fn with_stringify_keys(mut self, enabled: bool) -> Self {
        self.stringify_keys = enabled;
        self
    }

    pub fn with_keep_unknown_extensions(mut self, enabled: bool) -> Self {
        self.keep_unknown_extensions = enabled;
        self
    }

    pub fn with_key_cache(mut self, cache: SharedKeyCache) -> Self {
        self.key_cache = Some(cache);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_to_u32_max() {
        let limits = DecodeLimits::default();
        assert!(limits.check(LengthKind::Str, u32::MAX as usize).is_ok());
        assert_eq!(limits.max_for(LengthKind::Ext), u32::MAX);
    }

    #[test]
    fn limits_reject_longer_lengths() {
        let limits = DecodeLimits {
            max_array_length: 1,
            ..DecodeLimits::default()
        };
        assert_eq!(
            limits.check(LengthKind::Array, 3),
            Err(MsgPackError::MaxLengthExceeded {
                kind: LengthKind::Array,
                length: 3,
                max: 1
            })
        );
    }

    #[test]
    fn options_load_from_partial_config() {
        let options: EncodeOptions = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
        assert_eq!(options.max_depth, 8);
        assert!(!options.sort_keys);

        let decode: DecodeOptions =
            serde_json::from_str(r#"{"limits": {"max_str_length": 64}}"#).unwrap();
        assert_eq!(decode.limits.max_str_length, 64);
        assert_eq!(decode.limits.max_map_length, u32::MAX);
        assert!(decode.key_cache.is_none());
    }
}
