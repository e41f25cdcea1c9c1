use std::path::PathBuf;

/// Error type for decoding values out of a byte buffer.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A field declares more bytes than remain. `needed` is the number of
    /// additional bytes required to finish the field starting at `offset`.
    #[error("truncated input: field at offset {offset} needs {needed} more bytes")]
    TruncatedInput { offset: usize, needed: usize },

    #[error("map key count ({keys}) does not match value count ({values})")]
    LengthMismatch { keys: usize, values: usize },

    #[error("expected {expected} elements, found {found}")]
    CountMismatch { expected: usize, found: usize },

    #[error("cannot decode element {index}")]
    Element {
        index: usize,
        #[source]
        source: Box<DecodeError>,
    },

    #[error("invalid UTF-8 in text")]
    InvalidUtf8,

    #[error("invalid bool byte: 0x{0:02x}")]
    InvalidBool(u8),

    #[error("invalid char scalar value: 0x{0:x}")]
    InvalidChar(u32),

    #[error("{0} bytes left over after decoding")]
    TrailingBytes(usize),
}

impl DecodeError {
    /// Wrap `err` as the failure of element `index`.
    ///
    /// Truncation is passed through untouched so that callers pulling bytes
    /// incrementally always see how many more bytes the value needs.
    pub fn element(index: usize, err: DecodeError) -> DecodeError {
        match err {
            DecodeError::TruncatedInput { .. } => err,
            err => DecodeError::Element {
                index,
                source: Box::new(err),
            },
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodeError::TruncatedInput { .. })
    }

    /// Additional bytes required, if this is a truncation.
    pub fn needed(&self) -> Option<usize> {
        match self {
            DecodeError::TruncatedInput { needed, .. } => Some(*needed),
            _ => None,
        }
    }
}

impl From<DecodeError> for std::io::Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::TruncatedInput { .. } => {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, e)
            }
            _ => std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        }
    }
}

/// Error type for the file-backed byte sink and source.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream for `{}` is not open", .path.display())]
    NotOpen { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl StreamError {
    /// Rewrap a decode failure as the failure of element `index`.
    pub(crate) fn element(index: usize, err: StreamError) -> StreamError {
        match err {
            StreamError::Decode(e) => StreamError::Decode(DecodeError::element(index, e)),
            err => err,
        }
    }
}
