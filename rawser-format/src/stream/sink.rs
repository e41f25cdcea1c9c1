use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::counting::CountingWriter;
use crate::{Encode, StreamConfig, StreamError};

type Handle = CountingWriter<BufWriter<File>>;

/// Write-only endpoint backed by a file.
///
/// ```no_run
/// use rawser_format::ByteSink;
///
/// let mut sink = ByteSink::new("values.bin");
/// sink.open()?;
/// sink.put(&42i32)?;
/// sink.put("hello")?;
/// sink.put(&vec![1u8, 2, 3])?;
/// sink.close()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ByteSink {
    path: PathBuf,
    config: StreamConfig,
    file: Option<Handle>,
}

impl std::fmt::Debug for ByteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteSink")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for ByteSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(path = %self.path.display(), error = %e, "byte sink failed to flush on drop");
        }
    }
}

impl ByteSink {
    pub fn new<P: AsRef<Path>>(path: P) -> ByteSink {
        Self::with_config(path, StreamConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: StreamConfig) -> ByteSink {
        ByteSink {
            path: path.as_ref().to_path_buf(),
            config,
            file: None,
        }
    }

    /// Create or truncate the bound file for writing.
    ///
    /// Opening an already open sink does nothing.
    pub fn open(&mut self) -> std::io::Result<()> {
        if self.file.is_some() {
            tracing::debug!(path = %self.path.display(), "byte sink already open");
            return Ok(());
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;

        self.file = Some(CountingWriter::new(BufWriter::with_capacity(
            self.config.buffer_capacity,
            file,
        )));
        tracing::debug!(path = %self.path.display(), "opened byte sink");
        Ok(())
    }

    /// Flush buffered bytes and release the file handle.
    ///
    /// The handle is released even when the flush fails. Closing a sink that
    /// is not open does nothing.
    pub fn close(&mut self) -> std::io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let bytes = file.bytes_written();
            file.flush()?;
            tracing::debug!(path = %self.path.display(), bytes, "closed byte sink");
        }
        Ok(())
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written since the sink was last opened.
    pub fn bytes_written(&self) -> u64 {
        self.file.as_ref().map(|f| f.bytes_written()).unwrap_or(0)
    }

    /// Write raw bytes. The bytes are not interpreted.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        self.handle()?.write_all(bytes)?;
        Ok(())
    }

    /// Encode `value` and write its bytes.
    pub fn put<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), StreamError> {
        value.write_to(self)
    }

    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.handle()?.flush()?;
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
