//! `Decoder` - reads MessagePack into [`Value`]s.
//!
//! Decoding is iterative: arrays and maps push a [`Frame`] and completed
//! values are fed into the innermost frame, so nesting depth is bounded by
//! heap, not by the call stack.

use std::fmt::Write as _;
use std::sync::{Arc, PoisonError};

use packwire_buffers::Reader;

use crate::constants::*;
use crate::error::{LengthKind, MsgPackError, Result, TypeTag};
use crate::extension::ExtensionRegistry;
use crate::int64;
use crate::key_cache::SharedKeyCache;
use crate::options::DecodeOptions;
use crate::timestamp::{Timestamp, TIMESTAMP_EXT_TYPE};
use crate::value::{Extension, Value};

/// Lowercase hex of an encoded map key.
///
/// Hex keeps the byte-lexicographic order of the encodings, which is the
/// order the encoder writes non-string keys in.
pub fn canonical_key(encoded: &[u8]) -> String {
    let mut out = String::with_capacity(encoded.len() * 2);
    for byte in encoded {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

enum Frame {
    Array {
        size: usize,
        items: Vec<Value>,
    },
    Map {
        size: usize,
        entries: Vec<(Value, Value)>,
        key: Option<Value>,
        /// Original key when it was replaced by its canonical string.
        raw_key: Option<Value>,
        key_start: usize,
    },
}

impl Frame {
    /// Feeds a completed child value; returns true once the frame is full.
    fn push(&mut self, value: Value, reader: &Reader<'_>, stringify_keys: bool) -> bool {
        match self {
            Frame::Array { size, items } => {
                items.push(value);
                items.len() == *size
            }
            Frame::Map {
                size,
                entries,
                key,
                raw_key,
                key_start,
            } => match key.take() {
                None => {
                    if stringify_keys && !matches!(value, Value::Str(_)) {
                        let encoded = &reader.uint8[*key_start..reader.x];
                        *key = Some(Value::Str(canonical_key(encoded)));
                        *raw_key = Some(value);
                    } else {
                        *key = Some(value);
                    }
                    false
                }
                Some(k) => {
                    let value = match raw_key.take() {
                        Some(raw) => Value::map([("key", raw), ("value", value)]),
                        None => value,
                    };
                    entries.push((k, value));
                    entries.len() == *size
                }
            },
        }
    }

    fn into_value(self) -> Value {
        match self {
            Frame::Array { items, .. } => Value::Array(items),
            Frame::Map { entries, .. } => Value::Map(entries),
        }
    }
}

enum Step {
    Value(Value),
    Open(Frame),
}

pub struct Decoder {
    options: DecodeOptions,
    registry: Option<Arc<ExtensionRegistry>>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default())
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            options,
            registry: None,
        }
    }

    pub fn with_registry(mut self, registry: Arc<ExtensionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decodes the first value in `input`; trailing bytes are ignored.
    pub fn decode(&mut self, input: &[u8]) -> Result<Value> {
        let mut reader = Reader::new(input);
        self.read_any(&mut reader)
    }

    /// Decodes exactly one value, failing if `input` has bytes left over.
    pub fn decode_single(&mut self, input: &[u8]) -> Result<Value> {
        let mut reader = Reader::new(input);
        let value = self.read_any(&mut reader)?;
        if !reader.is_empty() {
            return Err(MsgPackError::TrailingBytes {
                offset: reader.x,
                remaining: reader.remaining(),
            });
        }
        Ok(value)
    }

    /// Decodes back-to-back values until `input` is exhausted.
    pub fn decode_multi(&mut self, input: &[u8]) -> Result<Vec<Value>> {
        let mut reader = Reader::new(input);
        let mut values = Vec::new();
        while !reader.is_empty() {
            values.push(self.read_any(&mut reader)?);
        }
        Ok(values)
    }

    /// Reads one value at the reader's cursor.
    pub fn read_any(&mut self, reader: &mut Reader<'_>) -> Result<Value> {
        let stringify_keys = self.options.stringify_keys;
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            let awaiting_key = match stack.last_mut() {
                Some(Frame::Map {
                    key: None,
                    key_start,
                    ..
                }) => {
                    *key_start = reader.x;
                    true
                }
                _ => false,
            };
            let key_cache = self.options.key_cache.as_ref().filter(|_| awaiting_key);
            let mut value = match self.read_step(reader, key_cache)? {
                Step::Value(value) => value,
                Step::Open(frame) => {
                    stack.push(frame);
                    continue;
                }
            };
            loop {
                let Some(mut top) = stack.pop() else {
                    return Ok(value);
                };
                if !top.push(value, reader, stringify_keys) {
                    stack.push(top);
                    break;
                }
                value = top.into_value();
            }
        }
    }

    fn read_step(
        &self,
        reader: &mut Reader<'_>,
        key_cache: Option<&SharedKeyCache>,
    ) -> Result<Step> {
        let offset = reader.x;
        let byte = reader.u8()?;
        let value = match byte {
            0x00..=POSITIVE_FIXINT_MAX => Value::Int(i64::from(byte)),
            0x80..=0x8f => return self.open_map(reader, usize::from(byte & 0x0f)),
            0x90..=0x9f => return self.open_array(reader, usize::from(byte & 0x0f)),
            0xa0..=0xbf => self.read_str(reader, usize::from(byte & 0x1f), key_cache)?,
            NEGATIVE_FIXINT_MIN..=0xff => Value::Int(i64::from(byte as i8)),
            NIL => Value::Nil,
            FALSE => Value::Bool(false),
            TRUE => Value::Bool(true),
            BIN_8 => {
                let length = usize::from(reader.u8()?);
                self.read_bin(reader, length)?
            }
            BIN_16 => {
                let length = usize::from(reader.u16()?);
                self.read_bin(reader, length)?
            }
            BIN_32 => {
                let length = reader.u32()? as usize;
                self.read_bin(reader, length)?
            }
            EXT_8 => {
                let length = usize::from(reader.u8()?);
                self.read_ext(reader, length, offset)?
            }
            EXT_16 => {
                let length = usize::from(reader.u16()?);
                self.read_ext(reader, length, offset)?
            }
            EXT_32 => {
                let length = reader.u32()? as usize;
                self.read_ext(reader, length, offset)?
            }
            FLOAT_32 => Value::F32(reader.f32()?),
            FLOAT_64 => Value::F64(reader.f64()?),
            UINT_8 => Value::Int(i64::from(reader.u8()?)),
            UINT_16 => Value::Int(i64::from(reader.u16()?)),
            UINT_32 => Value::Int(i64::from(reader.u32()?)),
            UINT_64 => int64::read_uint64(reader, self.options.use_big_int_fallback)?,
            INT_8 => Value::Int(i64::from(reader.i8()?)),
            INT_16 => Value::Int(i64::from(reader.i16()?)),
            INT_32 => Value::Int(i64::from(reader.i32()?)),
            INT_64 => int64::read_int64(reader, self.options.use_big_int_fallback)?,
            FIXEXT_1 => self.read_ext(reader, 1, offset)?,
            FIXEXT_2 => self.read_ext(reader, 2, offset)?,
            FIXEXT_4 => self.read_ext(reader, 4, offset)?,
            FIXEXT_8 => self.read_ext(reader, 8, offset)?,
            FIXEXT_16 => self.read_ext(reader, 16, offset)?,
            STR_8 => {
                let length = usize::from(reader.u8()?);
                self.read_str(reader, length, key_cache)?
            }
            STR_16 => {
                let length = usize::from(reader.u16()?);
                self.read_str(reader, length, key_cache)?
            }
            STR_32 => {
                let length = reader.u32()? as usize;
                self.read_str(reader, length, key_cache)?
            }
            ARRAY_16 => {
                let length = usize::from(reader.u16()?);
                return self.open_array(reader, length);
            }
            ARRAY_32 => {
                let length = reader.u32()? as usize;
                return self.open_array(reader, length);
            }
            MAP_16 => {
                let length = usize::from(reader.u16()?);
                return self.open_map(reader, length);
            }
            MAP_32 => {
                let length = reader.u32()? as usize;
                return self.open_map(reader, length);
            }
            NEVER_USED => {
                tracing::debug!(offset, "never-used type byte 0xc1");
                return Err(MsgPackError::UnrecognizedType {
                    tag: TypeTag::Byte(byte),
                    offset,
                });
            }
        };
        Ok(Step::Value(value))
    }

    fn open_array(&self, reader: &Reader<'_>, size: usize) -> Result<Step> {
        self.options.limits.check(LengthKind::Array, size)?;
        if size == 0 {
            return Ok(Step::Value(Value::Array(Vec::new())));
        }
        Ok(Step::Open(Frame::Array {
            size,
            items: Vec::with_capacity(size.min(reader.remaining())),
        }))
    }

    fn open_map(&self, reader: &Reader<'_>, size: usize) -> Result<Step> {
        self.options.limits.check(LengthKind::Map, size)?;
        if size == 0 {
            return Ok(Step::Value(Value::Map(Vec::new())));
        }
        Ok(Step::Open(Frame::Map {
            size,
            entries: Vec::with_capacity(size.min(reader.remaining() / 2)),
            key: None,
            raw_key: None,
            key_start: reader.x,
        }))
    }

    fn read_str(
        &self,
        reader: &mut Reader<'_>,
        length: usize,
        key_cache: Option<&SharedKeyCache>,
    ) -> Result<Value> {
        self.options.limits.check(LengthKind::Str, length)?;
        // Held for one lookup only: extension decoders may decode nested
        // MessagePack against the same cache.
        if let Some(shared) = key_cache {
            let mut cache = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if cache.can_be_cached(length) {
                let key = cache.decode(reader.uint8, reader.x, length)?;
                drop(cache);
                reader.skip(length)?;
                return Ok(Value::Str(key));
            }
        }
        Ok(Value::Str(reader.utf8(length)?.to_owned()))
    }

    fn read_bin(&self, reader: &mut Reader<'_>, length: usize) -> Result<Value> {
        self.options.limits.check(LengthKind::Bin, length)?;
        Ok(Value::Bin(reader.buf(length)?.to_vec()))
    }

    fn read_ext(&self, reader: &mut Reader<'_>, length: usize, offset: usize) -> Result<Value> {
        self.options.limits.check(LengthKind::Ext, length)?;
        let type_id = reader.i8()?;
        let data = reader.buf(length)?;
        if type_id == TIMESTAMP_EXT_TYPE {
            return Timestamp::from_bytes(data).map(Value::Timestamp);
        }
        if let Some(registry) = self.registry.as_ref().filter(|r| r.contains(type_id)) {
            return registry.decode(data, type_id);
        }
        if self.options.keep_unknown_extensions {
            return Ok(Value::Ext(Extension::new(type_id, data.to_vec())));
        }
        tracing::debug!(type_id, offset, "no decoder for extension type");
        Err(MsgPackError::UnrecognizedType {
            tag: TypeTag::Extension(type_id),
            offset,
        })
    }
}
