// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The caller-owned IO abstraction. The engine never opens or closes a
//! stream (`spec.md` §3 "IO stream" lifecycle); it only reads/writes through
//! [`Source`]/[`Sink`], which are implemented both for in-memory buffers and
//! for arbitrary [`std::io::Read`]/[`std::io::Write`] streams.

use crate::error::{PackError, UnpackError};

/// A byte sink. Mirrors the `Writer` of `echo_wasm_abi::codec`, generalized
/// to byte-oriented buffers and arbitrary [`std::io::Write`] streams.
pub trait Sink {
    /// Write raw bytes to the sink.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), PackError>;

    /// Write a single byte.
    fn write_u8(&mut self, byte: u8) -> Result<(), PackError> {
        self.write_bytes(&[byte])
    }
}

/// A byte source supporting one-byte lookahead, needed to classify the next
/// MessagePack atom without consuming it (`peekformat`/`step`, `spec.md`
/// §4.1/§4.7).
pub trait Source {
    /// Look at the next byte without consuming it.
    fn peek_u8(&mut self) -> Result<u8, UnpackError>;

    /// Consume and return the next byte.
    fn read_u8(&mut self) -> Result<u8, UnpackError>;

    /// Consume exactly `buf.len()` bytes into `buf`.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), UnpackError>;

    /// Consume and return exactly `len` bytes.
    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, UnpackError> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Skip `len` bytes without materializing them.
    fn skip_bytes(&mut self, len: usize) -> Result<(), UnpackError> {
        // Default: materialize-then-drop. Slice-backed sources override this
        // to avoid the allocation.
        self.read_vec(len).map(|_| ())
    }
}

/// An in-memory, zero-copy [`Sink`] backed by an owned `Vec<u8>`.
#[derive(Debug, Default)]
pub struct VecSink {
    buf: Vec<u8>,
}

impl VecSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink with a pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Consume the sink and return the written bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl Sink for VecSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), PackError> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

/// An in-memory, zero-copy [`Source`] backed by a borrowed byte slice.
#[derive(Debug)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Create a source positioned at the start of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes remaining.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Whether every byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

impl Source for SliceSource<'_> {
    fn peek_u8(&mut self) -> Result<u8, UnpackError> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or(UnpackError::Eof { format: "byte" })
    }

    fn read_u8(&mut self) -> Result<u8, UnpackError> {
        let b = self.peek_u8()?;
        self.pos += 1;
        Ok(b)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), UnpackError> {
        let end = self
            .pos
            .checked_add(buf.len())
            .ok_or(UnpackError::Eof { format: "bytes" })?;
        if end > self.bytes.len() {
            return Err(UnpackError::Eof { format: "bytes" });
        }
        buf.copy_from_slice(&self.bytes[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, UnpackError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(UnpackError::Eof { format: "bytes" })?;
        if end > self.bytes.len() {
            return Err(UnpackError::Eof { format: "bytes" });
        }
        let out = self.bytes[self.pos..end].to_vec();
        self.pos = end;
        Ok(out)
    }

    fn skip_bytes(&mut self, len: usize) -> Result<(), UnpackError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(UnpackError::Eof { format: "bytes" })?;
        if end > self.bytes.len() {
            return Err(UnpackError::Eof { format: "bytes" });
        }
        self.pos = end;
        Ok(())
    }
}

/// A [`Sink`] adapter over any [`std::io::Write`].
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: std::io::Write> IoSink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap back to the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: std::io::Write> Sink for IoSink<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), PackError> {
        self.inner
            .write_all(bytes)
            .map_err(|e| PackError::Sink(e.to_string()))
    }
}

/// A [`Source`] adapter over any [`std::io::Read`], with a one-byte
/// pushback buffer to support [`Source::peek_u8`].
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    peeked: Option<u8>,
}

impl<R: std::io::Read> IoSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
        }
    }

    /// Unwrap back to the inner reader. Panics in debug builds if a byte was
    /// peeked but not consumed, as that byte would silently vanish.
    pub fn into_inner(self) -> R {
        debug_assert!(
            self.peeked.is_none(),
            "IoSource::into_inner dropped a peeked byte"
        );
        self.inner
    }

    fn fill_one(&mut self) -> Result<u8, UnpackError> {
        if let Some(b) = self.peeked {
            return Ok(b);
        }
        let mut b = [0u8; 1];
        let n = self
            .inner
            .read(&mut b)
            .map_err(|e| UnpackError::Source(e.to_string()))?;
        if n == 0 {
            return Err(UnpackError::Eof { format: "byte" });
        }
        self.peeked = Some(b[0]);
        Ok(b[0])
    }
}

impl<R: std::io::Read> Source for IoSource<R> {
    fn peek_u8(&mut self) -> Result<u8, UnpackError> {
        self.fill_one()
    }

    fn read_u8(&mut self) -> Result<u8, UnpackError> {
        let b = self.fill_one()?;
        self.peeked = None;
        Ok(b)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), UnpackError> {
        if buf.is_empty() {
            return Ok(());
        }
        let mut offset = 0;
        if let Some(b) = self.peeked.take() {
            buf[0] = b;
            offset = 1;
        }
        if offset < buf.len() {
            self.inner
                .read_exact(&mut buf[offset..])
                .map_err(|e| UnpackError::Source(e.to_string()))?;
        }
        Ok(())
    }
}
