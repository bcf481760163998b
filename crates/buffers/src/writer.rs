//! Binary buffer writer that grows in chunks.

use crate::concat::list_to_uint8;

/// Size of the first chunk allocated by [`Writer::new`].
pub const DEFAULT_INITIAL_SIZE: usize = 2048;

/// Upper bound for the size a chunk doubles up to.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// An append-only binary writer.
///
/// Bytes are written into an active chunk. When a write does not fit, the
/// written prefix of the active chunk is moved into a list of completed
/// chunks and a new chunk twice the size (capped at the maximum chunk size,
/// but never smaller than the pending write) becomes active. Nothing already
/// written is ever copied while growing; [`Writer::flush`] joins the chunks
/// once at the end.
///
/// ```
/// use packwire_buffers::Writer;
///
/// let mut writer = Writer::with_sizes(2, 64);
/// writer.u8(0xcd);
/// writer.u16(0x0203);
/// writer.utf8("ok");
/// assert_eq!(writer.completed_chunks(), 1);
/// assert_eq!(writer.flush(), [0xcd, 0x02, 0x03, b'o', b'k']);
/// ```
pub struct Writer {
    /// The active chunk.
    pub uint8: Vec<u8>,
    /// Cursor position inside the active chunk.
    pub x: usize,
    chunks: Vec<Vec<u8>>,
    chunked_len: usize,
    initial_size: usize,
    max_chunk_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a writer with the default chunk sizes.
    pub fn new() -> Self {
        Self::with_sizes(DEFAULT_INITIAL_SIZE, DEFAULT_MAX_CHUNK_SIZE)
    }

    /// Creates a writer with a custom first-chunk size and doubling cap.
    pub fn with_sizes(initial_size: usize, max_chunk_size: usize) -> Self {
        let initial_size = initial_size.max(1);
        Self {
            uint8: vec![0u8; initial_size],
            x: 0,
            chunks: Vec::new(),
            chunked_len: 0,
            initial_size,
            max_chunk_size: max_chunk_size.max(initial_size),
        }
    }

    /// Total number of bytes written since the last flush.
    pub fn len(&self) -> usize {
        self.chunked_len + self.x
    }

    /// Returns `true` when nothing was written since the last flush.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of chunks completed since the last flush.
    pub fn completed_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Ensures the active chunk has room for `n` more bytes.
    #[inline]
    pub fn reserve(&mut self, n: usize) {
        if self.uint8.len() - self.x < n {
            self.grow(n);
        }
    }

    fn grow(&mut self, n: usize) {
        let doubled = self.uint8.len().saturating_mul(2).min(self.max_chunk_size);
        let new_size = doubled.max(n);
        let mut done = std::mem::replace(&mut self.uint8, vec![0u8; new_size]);
        if self.x > 0 {
            done.truncate(self.x);
            self.chunked_len += self.x;
            self.chunks.push(done);
        }
        self.x = 0;
    }

    /// Discards everything written since the last flush.
    pub fn reset(&mut self) {
        self.chunks.clear();
        self.chunked_len = 0;
        self.x = 0;
        if self.uint8.len() > self.max_chunk_size {
            self.uint8 = vec![0u8; self.initial_size];
        }
    }

    /// Returns the written bytes as one contiguous vector and resets the
    /// writer for reuse.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = if self.chunks.is_empty() {
            self.uint8[..self.x].to_vec()
        } else {
            let mut list: Vec<&[u8]> = self.chunks.iter().map(Vec::as_slice).collect();
            list.push(&self.uint8[..self.x]);
            list_to_uint8(&list)
        };
        self.reset();
        result
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.reserve(1);
        self.uint8[self.x] = val;
        self.x += 1;
    }

    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.u8(val as u8);
    }

    #[inline]
    fn put<const N: usize>(&mut self, bytes: [u8; N]) {
        self.reserve(N);
        self.uint8[self.x..self.x + N].copy_from_slice(&bytes);
        self.x += N;
    }

    /// Writes a tag byte and an `N`-byte body with a single capacity check.
    #[inline]
    fn tagged<const N: usize>(&mut self, tag: u8, body: [u8; N]) {
        self.reserve(N + 1);
        self.uint8[self.x] = tag;
        self.uint8[self.x + 1..self.x + 1 + N].copy_from_slice(&body);
        self.x += N + 1;
    }

    // Multi-byte values are big-endian; floats are IEEE-754.

    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.put(val.to_be_bytes());
    }

    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.put(val.to_be_bytes());
    }

    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.put(val.to_be_bytes());
    }

    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.put(val.to_be_bytes());
    }

    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.put(val.to_be_bytes());
    }

    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.put(val.to_be_bytes());
    }

    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.put(val.to_be_bytes());
    }

    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.put(val.to_be_bytes());
    }

    pub fn u8u16(&mut self, tag: u8, val: u16) {
        self.tagged(tag, val.to_be_bytes());
    }

    pub fn u8u32(&mut self, tag: u8, val: u32) {
        self.tagged(tag, val.to_be_bytes());
    }

    pub fn u8u64(&mut self, tag: u8, val: u64) {
        self.tagged(tag, val.to_be_bytes());
    }

    pub fn u8f32(&mut self, tag: u8, val: f32) {
        self.tagged(tag, val.to_be_bytes());
    }

    pub fn u8f64(&mut self, tag: u8, val: f64) {
        self.tagged(tag, val.to_be_bytes());
    }

    pub fn buf(&mut self, buf: &[u8]) {
        let length = buf.len();
        self.reserve(length);
        self.uint8[self.x..self.x + length].copy_from_slice(buf);
        self.x += length;
    }

    /// Writes a string's UTF-8 bytes. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        self.buf(s.as_bytes());
        s.len()
    }
}
