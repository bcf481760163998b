//! Codec error type.

use std::fmt;

use packwire_buffers::BufferError;
use thiserror::Error;

/// The length-bearing family whose declared size tripped a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthKind {
    Str,
    Bin,
    Array,
    Map,
    Ext,
}

impl fmt::Display for LengthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LengthKind::Str => "str",
            LengthKind::Bin => "bin",
            LengthKind::Array => "array",
            LengthKind::Map => "map",
            LengthKind::Ext => "ext",
        };
        f.write_str(name)
    }
}

/// What the decoder could not recognize: a leading tag byte or an
/// extension type id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Byte(u8),
    Extension(i8),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Byte(byte) => write!(f, "type byte 0x{byte:02x}"),
            TypeTag::Extension(type_id) => write!(f, "extension type {type_id}"),
        }
    }
}

/// Errors produced while encoding or decoding MessagePack.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MsgPackError {
    #[error("insufficient data: needed {needed} bytes, {remaining} remaining")]
    InsufficientData { needed: usize, remaining: usize },
    #[error("{kind} length {length} exceeds maximum {max}")]
    MaxLengthExceeded {
        kind: LengthKind,
        length: usize,
        max: usize,
    },
    #[error("unrecognized {tag} at offset {offset}")]
    UnrecognizedType { tag: TypeTag, offset: usize },
    #[error("no decoder registered for extension type {0}")]
    UnrecognizedExtensionType(i8),
    #[error("value cannot be mapped to MessagePack")]
    UnrecognizedExtensionValue,
    #[error("extension type id {0} is outside 0..=127")]
    InvalidExtensionTypeId(u8),
    #[error("maximum depth {0} exceeded")]
    DepthExceeded(usize),
    #[error("{remaining} trailing bytes at offset {offset}")]
    TrailingBytes { offset: usize, remaining: usize },
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("integer does not fit in 64 bits")]
    IntegerOverflow,
    #[error("invalid decimal integer {0:?}")]
    InvalidInteger(String),
    #[error("invalid timestamp extension payload")]
    InvalidTimestamp,
    #[error("extension codec failed: {0}")]
    Extension(String),
}

impl MsgPackError {
    /// Wraps a failure raised by an application extension callback.
    pub fn extension(message: impl Into<String>) -> Self {
        MsgPackError::Extension(message.into())
    }
}

impl From<BufferError> for MsgPackError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer { needed, remaining } => {
                MsgPackError::InsufficientData { needed, remaining }
            }
            BufferError::InvalidUtf8 => MsgPackError::InvalidUtf8,
        }
    }
}

pub type Result<T> = std::result::Result<T, MsgPackError>;
