use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::counting::CountingReader;
use crate::{Decode, DecodeError, DecodeResult, StreamConfig, StreamError};

type Handle = Lookahead<CountingReader<BufReader<File>>>;

/// Smallest read-ahead when decoding a value incrementally.
const MIN_READ_AHEAD: usize = 64;

/// Reader with a pushback buffer for bytes read ahead of the current value.
///
/// Unread bytes are handed out again before anything else from `inner`.
struct Lookahead<R> {
    inner: R,
    pending: Vec<u8>,
    pos: usize,
}

impl<R> Lookahead<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            pos: 0,
        }
    }

    fn pending_len(&self) -> usize {
        self.pending.len() - self.pos
    }

    fn advance(&mut self, amt: usize) {
        self.pos += amt.min(self.pending_len());
        if self.pos == self.pending.len() {
            self.pending.clear();
            self.pos = 0;
        }
    }

    /// Push `bytes` back so they are read again, ahead of anything pending.
    fn unread(&mut self, mut bytes: Vec<u8>) {
        if bytes.is_empty() {
            return;
        }
        bytes.extend_from_slice(&self.pending[self.pos..]);
        self.pending = bytes;
        self.pos = 0;
    }
}

impl<R: Read> Read for Lookahead<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pending_len() == 0 {
            return self.inner.read(buf);
        }
        let n = buf.len().min(self.pending_len());
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.advance(n);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for Lookahead<R> {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        if self.pending_len() == 0 {
            return self.inner.fill_buf();
        }
        Ok(&self.pending[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        if self.pending_len() == 0 {
            return self.inner.consume(amt);
        }
        self.advance(amt);
    }
}

/// Read-only endpoint backed by a file.
///
/// Values must be read back in the same order and with the same shapes they
/// were written with; the file holds no record boundaries of its own.
pub struct ByteSource {
    path: PathBuf,
    config: StreamConfig,
    file: Option<Handle>,
}

impl std::fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteSource")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for ByteSource {
    fn drop(&mut self) {
        self.close();
    }
}

impl ByteSource {
    pub fn new<P: AsRef<Path>>(path: P) -> ByteSource {
        Self::with_config(path, StreamConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: StreamConfig) -> ByteSource {
        ByteSource {
            path: path.as_ref().to_path_buf(),
            config,
            file: None,
        }
    }

    /// Open the bound file for reading. Fails if it does not exist.
    ///
    /// Opening an already open source does nothing.
    pub fn open(&mut self) -> std::io::Result<()> {
        if self.file.is_some() {
            tracing::debug!(path = %self.path.display(), "byte source already open");
            return Ok(());
        }

        let file = File::open(&self.path)?;
        // `is_exhausted` peeks through the buffer, so it cannot be empty.
        self.file = Some(Lookahead::new(CountingReader::new(
            BufReader::with_capacity(self.config.buffer_capacity.max(1), file),
        )));
        tracing::debug!(path = %self.path.display(), "opened byte source");
        Ok(())
    }

    /// Release the file handle. Closing a source that is not open does
    /// nothing.
    pub fn close(&mut self) {
        if let Some(file) = self.file.take() {
            tracing::debug!(
                path = %self.path.display(),
                bytes = file.inner.bytes_read() - file.pending_len() as u64,
                "closed byte source"
            );
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes read since the source was last opened.
    pub fn bytes_read(&self) -> u64 {
        self.file
            .as_ref()
            .map(|f| f.inner.bytes_read() - f.pending_len() as u64)
            .unwrap_or(0)
    }

    /// Fill `buf` completely from the file.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), StreamError> {
        self.handle()?.read_exact(buf)?;
        Ok(())
    }

    /// Read exactly `len` bytes into a new buffer of that size.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, StreamError> {
        let mut buf = Vec::new();
        self.read_at_least(&mut buf, len, len)?;
        Ok(buf)
    }

    /// Read and decode one value of type `T`.
    pub fn get<T: Decode>(&mut self) -> Result<T, StreamError> {
        T::read_from(self)
    }

    /// Decode one value with `decode`, pulling bytes from the file as the
    /// decoder reports them missing.
    ///
    /// `decode` is called with everything gathered so far at offset zero. The
    /// amount read ahead at least doubles on every retry, and bytes past the
    /// end of the value are kept for the next read, so the source ends up
    /// positioned exactly after the value.
    pub fn read_decoded<T, F>(&mut self, decode: F) -> Result<T, StreamError>
    where
        F: Fn(&[u8], usize) -> DecodeResult<T>,
    {
        let mut buf = Vec::new();
        loop {
            match decode(&buf, 0) {
                Ok((value, size)) => {
                    let surplus = buf.split_off(size.consumed.min(buf.len()));
                    self.handle()?.unread(surplus);
                    return Ok(value);
                }
                Err(DecodeError::TruncatedInput { needed, .. }) => {
                    let want = needed.max(buf.len()).max(MIN_READ_AHEAD);
                    self.read_at_least(&mut buf, needed.max(1), want)?;
                }
                Err(e) => {
                    self.handle()?.unread(buf);
                    return Err(e.into());
                }
            }
        }
    }

    /// Whether the file has no bytes left to read.
    pub fn is_exhausted(&mut self) -> Result<bool, StreamError> {
        Ok(self.handle()?.fill_buf()?.is_empty())
    }

    /// Append between `min` and `max` bytes to `buf`, stopping early only at
    /// end of file.
    fn read_at_least(
        &mut self,
        buf: &mut Vec<u8>,
        min: usize,
        max: usize,
    ) -> Result<(), StreamError> {
        // A corrupt length must not turn into a huge up-front allocation.
        buf.reserve(max.min(self.config.buffer_capacity.max(MIN_READ_AHEAD)));
        let handle = self.handle()?;
        let got = handle.by_ref().take(max as u64).read_to_end(buf)?;
        if got < min {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("expected {} more bytes, file ended after {}", min, got),
            )
            .into());
        }
        Ok(())
    }

    fn handle(&mut self) -> Result<&mut Handle, StreamError> {
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(StreamError::NotOpen {
                path: self.path.clone(),
            }),
        }
    }
}
