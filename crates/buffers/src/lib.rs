//! packwire-buffers - byte buffer primitives for the packwire codec.
//!
//! [`Writer`] is an append-only output buffer that grows in chunks, and
//! [`Reader`] is a cursor over an immutable input slice whose every read is
//! bounds-checked.

pub mod concat;
pub mod reader;
pub mod writer;

use thiserror::Error;

pub use concat::{concat_list, list_to_uint8};
pub use reader::Reader;
pub use writer::Writer;

/// Errors raised by [`Reader`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("end of buffer: needed {needed} bytes, {remaining} remaining")]
    EndOfBuffer { needed: usize, remaining: usize },
    #[error("invalid UTF-8")]
    InvalidUtf8,
}
