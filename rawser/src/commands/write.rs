use rawser_format::{ByteSink, StreamConfig};

use crate::cli::WriteArgs;
use crate::error::{Error, Result};
use crate::util::format_size;

pub fn run(args: WriteArgs) -> Result<()> {
    // Encode everything first so a bad value leaves no half-written file.
    let mut encoded = Vec::with_capacity(args.values.len());
    for (index, item) in args.values.iter().enumerate() {
        let mut buf = Vec::new();
        item.shape
            .encode(&item.value, &mut buf)
            .map_err(|source| Error::EncodeValue {
                index,
                shape: item.shape.clone(),
                source,
            })?;
        tracing::debug!(index, shape = %item.shape, bytes = buf.len(), "encoded value");
        encoded.push(buf);
    }

    let config = StreamConfig::new().with_buffer_capacity(args.buffer_size);
    let mut sink = ByteSink::with_config(&args.file, config);
    sink.open().map_err(|source| Error::CreateFile {
        path: args.file.clone(),
        source,
    })?;

    for (index, buf) in encoded.iter().enumerate() {
        sink.write(buf).map_err(|source| Error::WriteValue {
            index,
            path: args.file.clone(),
            source,
        })?;
    }

    let written = sink.bytes_written();
    sink.close().map_err(|source| Error::FinishFile {
        path: args.file.clone(),
        source,
    })?;

    if args.verbose {
        eprintln!(
            "Wrote {} value(s), {} to {}",
            encoded.len(),
            format_size(written),
            args.file.display()
        );
    }

    Ok(())
}
