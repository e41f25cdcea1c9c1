use rawser_format::{ByteSource, StreamConfig};

use crate::cli::ReadArgs;
use crate::error::{Error, Result};
use crate::util::format_size;

pub fn run(args: ReadArgs) -> Result<()> {
    let config = StreamConfig::new().with_buffer_capacity(args.buffer_size);
    let mut source = ByteSource::with_config(&args.file, config);
    source.open().map_err(|source| Error::OpenFile {
        path: args.file.clone(),
        source,
    })?;

    for (index, shape) in args.shapes.iter().enumerate() {
        let value = shape
            .read_from(&mut source)
            .map_err(|source| Error::ReadValue {
                index,
                shape: shape.clone(),
                source,
            })?;

        let printed = if args.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        println!(
            "{}",
            printed.map_err(|source| Error::PrintValue { index, source })?
        );
    }

    if args.verbose {
        let total = std::fs::metadata(&args.file)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "?".to_string());
        eprintln!(
            "Read {} value(s), {} of {} from {}",
            args.shapes.len(),
            format_size(source.bytes_read()),
            total,
            args.file.display()
        );
    }

    if args.strict {
        let exhausted = source.is_exhausted().map_err(|source| Error::ReadFile {
            path: args.file.clone(),
            source,
        })?;
        if !exhausted {
            return Err(Error::TrailingBytes {
                path: args.file.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rawser_format::{ByteSink, Shape};
    use tempfile::TempDir;

    use super::*;

    fn write_values(path: &Path) {
        let mut sink = ByteSink::new(path);
        sink.open().unwrap();
        sink.put(&5i32).unwrap();
        sink.put("five").unwrap();
        sink.close().unwrap();
    }

    fn read_args(file: &Path, shapes: &[&str], strict: bool, buffer_size: usize) -> ReadArgs {
        ReadArgs {
            file: file.to_path_buf(),
            shapes: shapes.iter().map(|s| s.parse::<Shape>().unwrap()).collect(),
            pretty: false,
            strict,
            buffer_size,
            verbose: false,
        }
    }

    #[test]
    fn strict_read_rejects_leftover_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("values.bin");
        write_values(&path);

        let err = run(read_args(&path, &["i32"], true, 64)).unwrap_err();
        assert!(matches!(err, Error::TrailingBytes { .. }));

        // Without --strict the leftover bytes are ignored.
        run(read_args(&path, &["i32"], false, 64)).unwrap();
    }

    #[test]
    fn strict_read_accepts_a_fully_consumed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("values.bin");
        write_values(&path);

        for buffer_size in [0, 1, 3, 64 * 1024] {
            run(read_args(&path, &["i32", "text"], true, buffer_size)).unwrap();
        }
    }

    #[test]
    fn wrong_shape_names_the_failing_value() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("values.bin");
        write_values(&path);

        match run(read_args(&path, &["i32", "text", "u8"], false, 64)) {
            Err(Error::ReadValue { index, shape, .. }) => {
                assert_eq!(index, 2);
                assert_eq!(shape, Shape::U8);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.bin");
        let err = run(read_args(&path, &["u8"], false, 64)).unwrap_err();
        assert!(matches!(err, Error::OpenFile { .. }));
    }
}
