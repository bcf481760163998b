//! Conversions between [`Value`] and `serde_json::Value`.

use std::mem;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::decoder::canonical_key;
use crate::encoder::Encoder;
use crate::error::MsgPackError;
use crate::value::Value;

const BINARY_DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Fails only for values with no JSON counterpart: `Custom` objects, or
/// map keys that cannot be encoded.
impl TryFrom<Value> for serde_json::Value {
    type Error = MsgPackError;

    fn try_from(mut v: Value) -> Result<Self, Self::Error> {
        // `Value` implements `Drop`: owned parts are taken rather than moved out.
        Ok(match &mut v {
            Value::Nil | Value::Undefined => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::UInt(u) => serde_json::Value::from(*u),
            Value::BigInt(n) => serde_json::Value::String(n.to_string()),
            Value::F32(f) => float(f64::from(*f)),
            Value::F64(f) => float(*f),
            Value::Str(s) => serde_json::Value::String(mem::take(s)),
            Value::Bin(b) => {
                serde_json::Value::String(format!("{BINARY_DATA_URI_PREFIX}{}", STANDARD.encode(b)))
            }
            Value::Array(arr) => serde_json::Value::Array(
                mem::take(arr)
                    .into_iter()
                    .map(serde_json::Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(entries) => {
                let mut obj = serde_json::Map::with_capacity(entries.len());
                for (mut k, v) in mem::take(entries) {
                    let key = match &mut k {
                        Value::Str(s) => mem::take(s),
                        other => canonical_key(&Encoder::new().encode(other)?),
                    };
                    obj.insert(key, serde_json::Value::try_from(v)?);
                }
                serde_json::Value::Object(obj)
            }
            Value::Ext(ext) => serde_json::json!({
                "type": ext.type_id,
                "data": format!("{BINARY_DATA_URI_PREFIX}{}", STANDARD.encode(&ext.data)),
            }),
            Value::Timestamp(ts) => serde_json::json!({
                "seconds": ts.seconds,
                "nanoseconds": ts.nanoseconds,
            }),
            Value::Custom(_) => return Err(MsgPackError::UnrecognizedExtensionValue),
        })
    }
}

fn float(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f).map_or(serde_json::Value::Null, serde_json::Value::Number)
}
