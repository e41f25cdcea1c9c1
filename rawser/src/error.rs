use std::path::PathBuf;

use miette::Diagnostic;
use rawser_format::{Shape, ShapeError, StreamError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error("Cannot create file `{}`", .path.display())]
    #[diagnostic(help("Does the parent directory exist?"))]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open file `{}`", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot encode value {index} as `{shape}`")]
    EncodeValue {
        index: usize,
        shape: Shape,
        #[source]
        source: ShapeError,
    },

    #[error("Cannot write value {index} to `{}`", .path.display())]
    WriteValue {
        index: usize,
        path: PathBuf,
        #[source]
        source: StreamError,
    },

    #[error("Cannot finish file `{}`", .path.display())]
    FinishFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read value {index} as `{shape}`")]
    #[diagnostic(help(
        "Values must be read with the shapes they were written with, in the same order"
    ))]
    ReadValue {
        index: usize,
        shape: Shape,
        #[source]
        source: StreamError,
    },

    #[error("Cannot read from `{}`", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: StreamError,
    },

    #[error("Bytes left in `{}` after the last value", .path.display())]
    #[diagnostic(help("Pass more shapes to read the rest, or drop --strict"))]
    TrailingBytes { path: PathBuf },

    #[error("Cannot print value {index}")]
    PrintValue {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}
