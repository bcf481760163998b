//! packwire - a MessagePack codec.
//!
//! Values are modeled by the closed [`Value`] enum. Application types travel
//! as [`Value::Custom`] and reach the wire through an [`ExtensionRegistry`]
//! entry.
//!
//! Two conventions go beyond the base format:
//!
//! - integers are always written in the narrowest exact representation;
//! - maps with non-string keys are written in the byte order of their encoded
//!   keys, so equal maps always encode identically.
//!
//! ```
//! use packwire::{decode, encode, DecodeOptions, EncodeOptions, Value};
//!
//! let value = Value::map([("id", Value::Int(128)), ("tags", Value::Array(vec![]))]);
//! let bytes = encode(&value, &EncodeOptions::default()).unwrap();
//! assert_eq!(&bytes[..5], &[0x82, 0xa2, b'i', b'd', 0xcc]);
//! assert_eq!(decode(&bytes, &DecodeOptions::default()).unwrap(), value);
//! ```

pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod extension;
pub mod int64;
pub mod json;
pub mod key_cache;
pub mod options;
pub mod timestamp;
pub mod value;

use std::sync::Arc;

pub use decoder::{canonical_key, Decoder};
pub use encoder::Encoder;
pub use error::{LengthKind, MsgPackError, Result, TypeTag};
pub use extension::{filters, ExtensionRegistry, Filter, Payload};
pub use key_cache::{KeyCache, SharedKeyCache};
pub use options::{DecodeLimits, DecodeOptions, EncodeOptions};
pub use timestamp::Timestamp;
pub use value::{CustomObject, CustomValue, Extension, Value};

/// Encodes `value` with the built-in types only.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>> {
    Encoder::with_options(options.clone()).encode(value)
}

/// Encodes `value`, consulting `registry` for application types.
pub fn encode_with(
    value: &Value,
    options: &EncodeOptions,
    registry: Arc<ExtensionRegistry>,
) -> Result<Vec<u8>> {
    Encoder::with_options(options.clone())
        .with_registry(registry)
        .encode(value)
}

/// Decodes the first value in `input`.
pub fn decode(input: &[u8], options: &DecodeOptions) -> Result<Value> {
    Decoder::with_options(options.clone()).decode(input)
}

/// Decodes the first value in `input`, resolving extensions through
/// `registry`.
pub fn decode_with(
    input: &[u8],
    options: &DecodeOptions,
    registry: Arc<ExtensionRegistry>,
) -> Result<Value> {
    Decoder::with_options(options.clone())
        .with_registry(registry)
        .decode(input)
}
