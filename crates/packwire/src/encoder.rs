//! `Encoder` - writes [`Value`]s as MessagePack.
//!
//! Integers always take the narrowest exact representation. Maps with any
//! non-string key (or every map, with `sort_keys`) are written in the
//! byte-lexicographic order of their encoded keys so equal maps serialize
//! identically.

use std::sync::Arc;

use malachite::Integer;
use packwire_buffers::Writer;

use crate::constants::*;
use crate::error::{LengthKind, MsgPackError, Result};
use crate::extension::ExtensionRegistry;
use crate::int64;
use crate::options::EncodeOptions;
use crate::timestamp::{Timestamp, TIMESTAMP_EXT_TYPE};
use crate::value::{Extension, Value};

pub struct Encoder {
    pub writer: Writer,
    options: EncodeOptions,
    registry: Option<Arc<ExtensionRegistry>>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_options(EncodeOptions::default())
    }

    pub fn with_options(options: EncodeOptions) -> Self {
        Self {
            writer: Writer::with_sizes(options.initial_buffer_size, options.max_chunk_size),
            options,
            registry: None,
        }
    }

    /// Consults `registry` before the built-in dispatch for every value.
    pub fn with_registry(mut self, registry: Arc<ExtensionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    pub fn encode(&mut self, value: &Value) -> Result<Vec<u8>> {
        self.writer.reset();
        match self.write_any(value, 0) {
            Ok(()) => Ok(self.writer.flush()),
            Err(err) => {
                self.writer.reset();
                Err(err)
            }
        }
    }

    pub fn write_any(&mut self, value: &Value, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(MsgPackError::DepthExceeded(self.options.max_depth));
        }
        if let Some(registry) = self.registry.as_ref().filter(|r| !r.is_empty()) {
            if let Some((type_id, data)) = registry.try_encode(value)? {
                return self.write_ext(type_id as i8, &data);
            }
        }
        match value {
            Value::Nil | Value::Undefined => self.write_null(),
            Value::Bool(b) => self.write_boolean(*b),
            Value::Int(i) => self.write_integer(*i),
            Value::UInt(u) => self.write_u_integer(*u),
            Value::BigInt(n) => self.write_big_int(n)?,
            Value::F32(f) => self.write_float32(*f),
            Value::F64(f) => self.write_float(*f),
            Value::Str(s) => self.write_str(s)?,
            Value::Bin(b) => self.write_bin(b)?,
            Value::Array(arr) => self.write_arr(arr, depth)?,
            Value::Map(entries) => self.write_map(entries, depth)?,
            Value::Ext(ext) => self.write_extension(ext)?,
            Value::Timestamp(ts) => self.write_timestamp(ts)?,
            Value::Custom(_) => return Err(MsgPackError::UnrecognizedExtensionValue),
        }
        Ok(())
    }

    pub fn write_null(&mut self) {
        self.writer.u8(NIL);
    }

    pub fn write_boolean(&mut self, b: bool) {
        self.writer.u8(if b { TRUE } else { FALSE });
    }

    pub fn write_float(&mut self, float: f64) {
        if self.options.force_float32 {
            let narrowed = float as f32;
            if f64::from(narrowed) == float || float.is_nan() {
                self.writer.u8f32(FLOAT_32, narrowed);
                return;
            }
        }
        self.writer.u8f64(FLOAT_64, float);
    }

    pub fn write_float32(&mut self, float: f32) {
        self.writer.u8f32(FLOAT_32, float);
    }

    /// Encodes a non-negative integer in the narrowest unsigned family.
    pub fn write_u_integer(&mut self, uint: u64) {
        let writer = &mut self.writer;
        if uint <= u64::from(POSITIVE_FIXINT_MAX) {
            writer.u8(uint as u8);
        } else if uint <= 0xff {
            writer.u16((u16::from(UINT_8) << 8) | uint as u16);
        } else if uint <= 0xffff {
            writer.u8u16(UINT_16, uint as u16);
        } else if uint <= 0xffff_ffff {
            writer.u8u32(UINT_32, uint as u32);
        } else {
            writer.u8u64(UINT_64, uint);
        }
    }

    /// Encodes an integer in the narrowest signed or unsigned family.
    pub fn write_integer(&mut self, int: i64) {
        if int >= 0 {
            self.write_u_integer(int as u64);
            return;
        }
        let writer = &mut self.writer;
        if int >= -0x20 {
            writer.u8(int as i8 as u8);
        } else if int >= i64::from(i8::MIN) {
            writer.u8(INT_8);
            writer.i8(int as i8);
        } else if int >= i64::from(i16::MIN) {
            writer.u8(INT_16);
            writer.i16(int as i16);
        } else if int >= i64::from(i32::MIN) {
            writer.u8(INT_32);
            writer.i32(int as i32);
        } else {
            writer.u8(INT_64);
            writer.i64(int);
        }
    }

    /// Native-range values take the plain integer path; larger unsigned
    /// values are written as raw uint64 halves.
    pub fn write_big_int(&mut self, n: &Integer) -> Result<()> {
        if let Some(int) = int64::bigint_to_i64(n) {
            self.write_integer(int);
            return Ok(());
        }
        if !int64::bigint_fits_u64(n) {
            return Err(MsgPackError::IntegerOverflow);
        }
        let (hi, lo) = int64::decimal_to_halves(&n.to_string())?;
        self.writer.u8(UINT_64);
        self.writer.u32(hi);
        self.writer.u32(lo);
        Ok(())
    }

    pub fn write_str_hdr(&mut self, length: usize) -> Result<()> {
        if length <= MAX_FIXSTR_SIZE {
            self.writer.u8(FIXSTR | length as u8);
        } else if length <= 0xff {
            self.writer.u16((u16::from(STR_8) << 8) | length as u16);
        } else if length <= 0xffff {
            self.writer.u8u16(STR_16, length as u16);
        } else {
            self.writer.u8u32(STR_32, wire_length(LengthKind::Str, length)?);
        }
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_str_hdr(s.len())?;
        self.writer.utf8(s);
        Ok(())
    }

    pub fn write_bin_hdr(&mut self, length: usize) -> Result<()> {
        if length <= 0xff {
            self.writer.u16((u16::from(BIN_8) << 8) | length as u16);
        } else if length <= 0xffff {
            self.writer.u8u16(BIN_16, length as u16);
        } else {
            self.writer.u8u32(BIN_32, wire_length(LengthKind::Bin, length)?);
        }
        Ok(())
    }

    pub fn write_bin(&mut self, buf: &[u8]) -> Result<()> {
        self.write_bin_hdr(buf.len())?;
        self.writer.buf(buf);
        Ok(())
    }

    pub fn write_arr_hdr(&mut self, length: usize) -> Result<()> {
        if length <= MAX_FIXARRAY_SIZE {
            self.writer.u8(FIXARRAY | length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(ARRAY_16, length as u16);
        } else {
            self.writer.u8u32(ARRAY_32, wire_length(LengthKind::Array, length)?);
        }
        Ok(())
    }

    pub fn write_arr(&mut self, arr: &[Value], depth: usize) -> Result<()> {
        self.write_arr_hdr(arr.len())?;
        for item in arr {
            self.write_any(item, depth + 1)?;
        }
        Ok(())
    }

    pub fn write_map_hdr(&mut self, length: usize) -> Result<()> {
        if length <= MAX_FIXMAP_SIZE {
            self.writer.u8(FIXMAP | length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(MAP_16, length as u16);
        } else {
            self.writer.u8u32(MAP_32, wire_length(LengthKind::Map, length)?);
        }
        Ok(())
    }

    pub fn write_map(&mut self, entries: &[(Value, Value)], depth: usize) -> Result<()> {
        let ignore_undefined = self.options.ignore_undefined;
        let entries: Vec<&(Value, Value)> = entries
            .iter()
            .filter(|(_, v)| !(ignore_undefined && matches!(v, Value::Undefined)))
            .collect();

        let sorted = self.options.sort_keys
            || entries.iter().any(|(k, _)| !matches!(k, Value::Str(_)));
        if !sorted {
            self.write_map_hdr(entries.len())?;
            for (key, val) in entries {
                self.write_any(key, depth + 1)?;
                self.write_any(val, depth + 1)?;
            }
            return Ok(());
        }

        let mut keyed = Vec::with_capacity(entries.len());
        for (key, val) in entries {
            keyed.push((self.encode_detached(key, depth + 1)?, val));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        self.write_map_hdr(keyed.len())?;
        for (key, val) in keyed {
            self.writer.buf(&key);
            self.write_any(val, depth + 1)?;
        }
        Ok(())
    }

    /// Encodes `value` into its own buffer without touching the output.
    fn encode_detached(&mut self, value: &Value, depth: usize) -> Result<Vec<u8>> {
        let scratch = Writer::with_sizes(64, self.options.max_chunk_size);
        let mut outer = std::mem::replace(&mut self.writer, scratch);
        let result = self.write_any(value, depth);
        std::mem::swap(&mut self.writer, &mut outer);
        result.map(|()| outer.flush())
    }

    pub fn write_ext_hdr(&mut self, type_id: i8, length: usize) -> Result<()> {
        let type_byte = type_id as u8;
        match length {
            1 => self.writer.u16((u16::from(FIXEXT_1) << 8) | u16::from(type_byte)),
            2 => self.writer.u16((u16::from(FIXEXT_2) << 8) | u16::from(type_byte)),
            4 => self.writer.u16((u16::from(FIXEXT_4) << 8) | u16::from(type_byte)),
            8 => self.writer.u16((u16::from(FIXEXT_8) << 8) | u16::from(type_byte)),
            16 => self.writer.u16((u16::from(FIXEXT_16) << 8) | u16::from(type_byte)),
            _ => {
                if length <= 0xff {
                    self.writer.u16((u16::from(EXT_8) << 8) | length as u16);
                } else if length <= 0xffff {
                    self.writer.u8u16(EXT_16, length as u16);
                } else {
                    self.writer.u8u32(EXT_32, wire_length(LengthKind::Ext, length)?);
                }
                self.writer.u8(type_byte);
            }
        }
        Ok(())
    }

    pub fn write_ext(&mut self, type_id: i8, data: &[u8]) -> Result<()> {
        self.write_ext_hdr(type_id, data.len())?;
        self.writer.buf(data);
        Ok(())
    }

    pub fn write_extension(&mut self, ext: &Extension) -> Result<()> {
        self.write_ext(ext.type_id, &ext.data)
    }

    pub fn write_timestamp(&mut self, ts: &Timestamp) -> Result<()> {
        self.write_ext(TIMESTAMP_EXT_TYPE, &ts.to_bytes())
    }
}

/// Length as it goes into a 32-bit header field.
fn wire_length(kind: LengthKind, length: usize) -> Result<u32> {
    u32::try_from(length).map_err(|_| MsgPackError::MaxLengthExceeded {
        kind,
        length,
        max: u32::MAX as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(value: Value) -> Vec<u8> {
        Encoder::new().encode(&value).unwrap()
    }

    #[test]
    fn literal_vectors() {
        assert_eq!(enc(Value::Nil), [0xc0]);
        assert_eq!(enc(Value::Undefined), [0xc0]);
        assert_eq!(enc(Value::Int(0)), [0x00]);
        assert_eq!(enc(Value::Int(-1)), [0xff]);
        assert_eq!(enc(Value::Array(vec![])), [0x90]);
        assert_eq!(enc(Value::Map(vec![])), [0x80]);
        assert_eq!(enc(Value::Bool(true)), [0xc3]);
    }

    #[test]
    fn integer_widths() {
        assert_eq!(enc(Value::Int(127)), [0x7f]);
        assert_eq!(enc(Value::Int(128)), [0xcc, 0x80]);
        assert_eq!(enc(Value::Int(255)), [0xcc, 0xff]);
        assert_eq!(enc(Value::Int(256)), [0xcd, 0x01, 0x00]);
        assert_eq!(enc(Value::Int(65535)), [0xcd, 0xff, 0xff]);
        assert_eq!(enc(Value::Int(65536)), [0xce, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(enc(Value::Int(1 << 32))[0], 0xcf);
        assert_eq!(enc(Value::Int(-32)), [0xe0]);
        assert_eq!(enc(Value::Int(-33)), [0xd0, 0xdf]);
        assert_eq!(enc(Value::Int(-128)), [0xd0, 0x80]);
        assert_eq!(enc(Value::Int(-129)), [0xd1, 0xff, 0x7f]);
        assert_eq!(enc(Value::Int(-32769))[0], 0xd2);
        assert_eq!(enc(Value::Int(i64::MIN))[0], 0xd3);
        assert_eq!(enc(Value::UInt(5)), [0x05]);
    }

    #[test]
    fn big_ints() {
        assert_eq!(enc(Value::BigInt(Integer::from(128))), [0xcc, 0x80]);
        let above = enc(Value::BigInt(Integer::from(u64::MAX)));
        assert_eq!(above, [0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        let too_big = Integer::from(u64::MAX) + Integer::from(1u32);
        assert_eq!(
            Encoder::new().encode(&Value::BigInt(too_big)),
            Err(MsgPackError::IntegerOverflow)
        );
    }

    #[test]
    fn floats() {
        assert_eq!(enc(Value::F64(1.5))[0], 0xcb);
        assert_eq!(enc(Value::F32(1.5)), [0xca, 0x3f, 0xc0, 0x00, 0x00]);
        let mut narrow = Encoder::with_options(EncodeOptions::default().with_force_float32(true));
        assert_eq!(narrow.encode(&Value::F64(1.5)).unwrap()[0], 0xca);
        assert_eq!(narrow.encode(&Value::F64(0.1)).unwrap()[0], 0xcb);
    }

    #[test]
    fn string_headers() {
        assert_eq!(enc(Value::Str("".into())), [0xa0]);
        assert_eq!(enc(Value::Str("a".repeat(31)))[0], 0xbf);
        assert_eq!(&enc(Value::Str("a".repeat(32)))[..2], &[0xd9, 32]);
        assert_eq!(&enc(Value::Str("a".repeat(256)))[..3], &[0xda, 0x01, 0x00]);
        assert_eq!(&enc(Value::Str("a".repeat(65536)))[..5], &[0xdb, 0, 1, 0, 0]);
        // header counts bytes, not chars
        assert_eq!(enc(Value::Str("€".into())), [0xa3, 0xe2, 0x82, 0xac]);
    }

    #[test]
    fn ext_headers() {
        let ext = |n: usize| enc(Value::Ext(Extension::new(5, vec![0; n])));
        assert_eq!(&ext(1)[..2], &[0xd4, 5]);
        assert_eq!(&ext(2)[..2], &[0xd5, 5]);
        assert_eq!(&ext(4)[..2], &[0xd6, 5]);
        assert_eq!(&ext(8)[..2], &[0xd7, 5]);
        assert_eq!(&ext(16)[..2], &[0xd8, 5]);
        assert_eq!(ext(0), [0xc7, 0, 5]);
        assert_eq!(&ext(3)[..3], &[0xc7, 3, 5]);
        assert_eq!(&ext(300)[..4], &[0xc8, 0x01, 0x2c, 5]);
        assert_eq!(&enc(Value::Ext(Extension::new(-2, vec![1])))[..2], &[0xd4, 0xfe]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_headers_are_rejected() {
        let length = u32::MAX as usize + 1;
        let too_long = |kind: LengthKind| -> Result<()> {
            Err(MsgPackError::MaxLengthExceeded {
                kind,
                length,
                max: u32::MAX as usize,
            })
        };
        let mut encoder = Encoder::new();
        assert_eq!(encoder.write_str_hdr(length), too_long(LengthKind::Str));
        assert_eq!(encoder.write_bin_hdr(length), too_long(LengthKind::Bin));
        assert_eq!(encoder.write_arr_hdr(length), too_long(LengthKind::Array));
        assert_eq!(encoder.write_map_hdr(length), too_long(LengthKind::Map));
        assert_eq!(encoder.write_ext_hdr(7, length), too_long(LengthKind::Ext));
        assert!(encoder.writer.is_empty());

        encoder.write_arr_hdr(u32::MAX as usize).unwrap();
        assert_eq!(encoder.writer.flush(), [0xdd, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn depth_limit() {
        let mut nested = Value::Nil;
        for _ in 0..5 {
            nested = Value::Array(vec![nested]);
        }
        let mut shallow = Encoder::with_options(EncodeOptions::default().with_max_depth(4));
        assert_eq!(shallow.encode(&nested), Err(MsgPackError::DepthExceeded(4)));
        let mut deep_enough = Encoder::with_options(EncodeOptions::default().with_max_depth(5));
        assert!(deep_enough.encode(&nested).is_ok());
    }

    #[test]
    fn custom_without_registry_fails() {
        assert_eq!(
            Encoder::new().encode(&Value::custom(42u8)),
            Err(MsgPackError::UnrecognizedExtensionValue)
        );
    }

    #[test]
    fn non_string_keys_are_sorted_by_encoding() {
        let a = Value::Map(vec![
            (Value::Int(2), Value::Str("two".into())),
            (Value::Str("x".into()), Value::Nil),
            (Value::Int(1), Value::Str("one".into())),
        ]);
        let b = Value::Map(vec![
            (Value::Str("x".into()), Value::Nil),
            (Value::Int(1), Value::Str("one".into())),
            (Value::Int(2), Value::Str("two".into())),
        ]);
        let bytes = enc(a);
        assert_eq!(bytes, enc(b));
        assert_eq!(&bytes[..3], &[0x83, 0x01, 0xa3]);
    }

    #[test]
    fn string_keys_keep_order_unless_sorted() {
        let map = Value::map([("b", Value::Int(1)), ("a", Value::Int(2))]);
        assert_eq!(enc(map.clone()), [0x82, 0xa1, b'b', 0x01, 0xa1, b'a', 0x02]);
        let mut stable = Encoder::with_options(EncodeOptions::default().with_sort_keys(true));
        assert_eq!(
            stable.encode(&map).unwrap(),
            [0x82, 0xa1, b'a', 0x02, 0xa1, b'b', 0x01]
        );
    }

    #[test]
    fn undefined_entries() {
        let map = Value::map([("a", Value::Undefined), ("b", Value::Int(1))]);
        assert_eq!(enc(map.clone()), [0x82, 0xa1, b'a', 0xc0, 0xa1, b'b', 0x01]);
        let mut dropping =
            Encoder::with_options(EncodeOptions::default().with_ignore_undefined(true));
        assert_eq!(dropping.encode(&map).unwrap(), [0x81, 0xa1, b'b', 0x01]);
    }

    #[test]
    fn encoder_is_reusable_after_error() {
        let mut encoder = Encoder::new();
        let bad = Value::Array(vec![Value::Int(1), Value::custom(1u8)]);
        assert!(encoder.encode(&bad).is_err());
        assert_eq!(encoder.encode(&Value::Int(1)).unwrap(), [0x01]);
    }
}
