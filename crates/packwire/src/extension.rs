//! Registry of application-defined extension types.
//!
//! Each entry pairs a matcher with an encoder and a decoder under a type id
//! in `0..=127`. Matchers are scanned on encode and the last registered one
//! that accepts a value wins. Decoding is a direct lookup by type id.

use std::fmt;
use std::sync::Arc;

use crate::error::{MsgPackError, Result};
use crate::value::Value;

/// Highest type id applications may register.
pub const MAX_EXT_TYPE_ID: u8 = 127;

const TABLE_SIZE: usize = MAX_EXT_TYPE_ID as usize + 1;

pub type Matcher = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
pub type ExtEncoder = Arc<dyn Fn(&Value) -> Result<Vec<u8>> + Send + Sync>;
pub type ExtDecoder = Arc<dyn Fn(&[u8], i8) -> Result<Value> + Send + Sync>;

/// Intermediate data flowing through a filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Value(Value),
    Bytes(Vec<u8>),
}

/// One stage of a layered extension codec.
pub type Filter = Arc<dyn Fn(Payload) -> Result<Payload> + Send + Sync>;

#[derive(Default)]
pub struct ExtensionRegistry {
    matchers: Vec<(u8, Matcher)>,
    encoders: Vec<Option<ExtEncoder>>,
    decoders: Vec<Option<ExtDecoder>>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<u8> = self.matchers.iter().map(|(id, _)| *id).collect();
        f.debug_struct("ExtensionRegistry")
            .field("type_ids", &ids)
            .finish()
    }
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self {
            matchers: Vec::new(),
            encoders: vec![None; TABLE_SIZE],
            decoders: vec![None; TABLE_SIZE],
        }
    }

    /// Installs an extension type.
    ///
    /// Registering a type id again replaces its callbacks and moves its
    /// matcher to the end of the scan order.
    pub fn register<M, E, D>(
        &mut self,
        type_id: u8,
        matcher: M,
        encoder: E,
        decoder: D,
    ) -> Result<()>
    where
        M: Fn(&Value) -> bool + Send + Sync + 'static,
        E: Fn(&Value) -> Result<Vec<u8>> + Send + Sync + 'static,
        D: Fn(&[u8], i8) -> Result<Value> + Send + Sync + 'static,
    {
        if type_id > MAX_EXT_TYPE_ID {
            return Err(MsgPackError::InvalidExtensionTypeId(type_id));
        }
        if self.encoders.is_empty() {
            self.encoders = vec![None; TABLE_SIZE];
            self.decoders = vec![None; TABLE_SIZE];
        }
        self.matchers.retain(|(id, _)| *id != type_id);
        self.matchers.push((type_id, Arc::new(matcher)));
        self.encoders[type_id as usize] = Some(Arc::new(encoder));
        self.decoders[type_id as usize] = Some(Arc::new(decoder));
        tracing::debug!(type_id, "registered extension type");
        Ok(())
    }

    /// Installs an extension type whose codecs are chains of filters.
    ///
    /// The encode chain starts from `Payload::Value` and must end with
    /// `Payload::Bytes`; the decode chain runs the other way.
    pub fn register_chain<M>(
        &mut self,
        type_id: u8,
        matcher: M,
        encode_filters: Vec<Filter>,
        decode_filters: Vec<Filter>,
    ) -> Result<()>
    where
        M: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let encoder = move |value: &Value| -> Result<Vec<u8>> {
            match run_chain(&encode_filters, Payload::Value(value.clone()))? {
                Payload::Bytes(bytes) => Ok(bytes),
                Payload::Value(_) => Err(MsgPackError::extension(
                    "encode chain did not produce bytes",
                )),
            }
        };
        let decoder = move |data: &[u8], _type_id: i8| -> Result<Value> {
            match run_chain(&decode_filters, Payload::Bytes(data.to_vec()))? {
                Payload::Value(value) => Ok(value),
                Payload::Bytes(_) => Err(MsgPackError::extension(
                    "decode chain did not produce a value",
                )),
            }
        };
        self.register(type_id, matcher, encoder, decoder)
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn contains(&self, type_id: i8) -> bool {
        self.decoder(type_id).is_some()
    }

    fn decoder(&self, type_id: i8) -> Option<&ExtDecoder> {
        let index = usize::try_from(type_id).ok()?;
        self.decoders.get(index)?.as_ref()
    }

    /// Type id of the last registered matcher accepting `value`.
    pub fn match_type(&self, value: &Value) -> Option<u8> {
        self.matchers
            .iter()
            .rev()
            .find(|(_, matcher)| matcher(value))
            .map(|(id, _)| *id)
    }

    /// Encodes `value` with the matching entry, if any.
    pub fn try_encode(&self, value: &Value) -> Result<Option<(u8, Vec<u8>)>> {
        let Some(type_id) = self.match_type(value) else {
            return Ok(None);
        };
        let encoder = self.encoders[type_id as usize]
            .as_ref()
            .ok_or(MsgPackError::UnrecognizedExtensionValue)?;
        Ok(Some((type_id, encoder(value)?)))
    }

    /// Encodes `value` with the matching entry, failing when none matches.
    pub fn encode(&self, value: &Value) -> Result<(u8, Vec<u8>)> {
        self.try_encode(value)?
            .ok_or(MsgPackError::UnrecognizedExtensionValue)
    }

    pub fn decode(&self, data: &[u8], type_id: i8) -> Result<Value> {
        let decoder = self
            .decoder(type_id)
            .ok_or(MsgPackError::UnrecognizedExtensionType(type_id))?;
        decoder(data, type_id)
    }
}

fn run_chain(filters: &[Filter], input: Payload) -> Result<Payload> {
    filters.iter().try_fold(input, |payload, filter| filter(payload))
}

/// Building blocks for [`ExtensionRegistry::register_chain`].
pub mod filters {
    use std::sync::Arc;

    use super::{Filter, Payload};
    use crate::decoder::Decoder;
    use crate::encoder::Encoder;
    use crate::error::{MsgPackError, Result};
    use crate::options::{DecodeOptions, EncodeOptions};
    use crate::value::Value;

    /// Transforms the value stage, e.g. an application object into a plain
    /// MessagePack structure and back.
    pub fn map_value<F>(f: F) -> Filter
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Arc::new(move |payload: Payload| -> Result<Payload> {
            match payload {
                Payload::Value(value) => f(value).map(Payload::Value),
                Payload::Bytes(_) => Err(MsgPackError::extension("expected a value stage")),
            }
        })
    }

    /// Serializes the value stage as nested MessagePack.
    pub fn msgpack_encode(options: EncodeOptions) -> Filter {
        Arc::new(move |payload: Payload| -> Result<Payload> {
            match payload {
                Payload::Value(value) => {
                    let mut encoder = Encoder::with_options(options.clone());
                    encoder.encode(&value).map(Payload::Bytes)
                }
                bytes @ Payload::Bytes(_) => Ok(bytes),
            }
        })
    }

    /// Parses the bytes stage as exactly one nested MessagePack value.
    pub fn msgpack_decode(options: DecodeOptions) -> Filter {
        Arc::new(move |payload: Payload| -> Result<Payload> {
            match payload {
                Payload::Bytes(bytes) => {
                    let mut decoder = Decoder::with_options(options.clone());
                    decoder.decode_single(&bytes).map(Payload::Value)
                }
                value @ Payload::Value(_) => Ok(value),
            }
        })
    }
}
