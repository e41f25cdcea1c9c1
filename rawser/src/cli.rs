use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rawser_format::stream::DEFAULT_BUFFER_CAPACITY;
use rawser_format::Shape;

#[derive(Debug, Parser)]
#[command(
    name = "rawser",
    about = "Write and read host-native rawser value files.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(visible_alias = "w", about = "Encode values into a new file")]
    Write(WriteArgs),

    #[command(visible_alias = "r", about = "Decode values from a file as JSON")]
    Read(ReadArgs),
}

/// A value given on the command line, with the shape to encode it as.
#[derive(Debug, Clone)]
pub struct ShapedValue {
    pub shape: Shape,
    pub value: serde_json::Value,
}

fn parse_shaped_value(src: &str) -> Result<ShapedValue, String> {
    let (shape, json) = src
        .split_once(':')
        .ok_or_else(|| format!("expected <SHAPE>:<JSON>, got `{}`", src))?;
    let shape = shape.parse::<Shape>().map_err(|e| e.to_string())?;
    let value = serde_json::from_str(json).map_err(|e| format!("invalid JSON: {}", e))?;
    Ok(ShapedValue { shape, value })
}

#[derive(Debug, clap::Args)]
#[command(after_help = "\
\x1b[1m\x1b[4mShapes:\x1b[0m
  bool char u8 u16 u32 u64 u128 usize i8 i16 i32 i64 i128 isize f32 f64 text
  seq<SHAPE>           Sequence (aliases: vec, list, set)
  map<KEY, VALUE>      Map, given as [[key, value], ...] or a JSON object for text keys

\x1b[1m\x1b[4mExamples:\x1b[0m
  rawser write values.bin -v i32:42 -v 'text:\"hello\"' -v 'seq<f64>:[1.5, 2]'
  rawser write values.bin -v 'map<text, u8>:{\"a\": 1, \"b\": 2}'")]
pub struct WriteArgs {
    /// Output file path; an existing file is truncated
    pub file: PathBuf,

    /// Value to write, as <SHAPE>:<JSON>; repeat to write several in order
    #[arg(short = 'v', long = "value", value_name = "SHAPE:JSON", value_parser = parse_shaped_value, required = true)]
    pub values: Vec<ShapedValue>,

    /// Size of the file buffer in bytes
    #[arg(long = "buffer-size", default_value_t = DEFAULT_BUFFER_CAPACITY)]
    pub buffer_size: usize,

    /// Print a summary of what was written
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug, clap::Args)]
pub struct ReadArgs {
    /// Input file path
    pub file: PathBuf,

    /// Shapes of the values to read, in the order they were written
    #[arg(required = true)]
    pub shapes: Vec<Shape>,

    /// Pretty-print each JSON document
    #[arg(short, long)]
    pub pretty: bool,

    /// Fail if bytes remain after the last value
    #[arg(long)]
    pub strict: bool,

    /// Size of the file buffer in bytes
    #[arg(long = "buffer-size", default_value_t = DEFAULT_BUFFER_CAPACITY)]
    pub buffer_size: usize,

    /// Print a summary of what was read
    #[arg(long)]
    pub verbose: bool,
}
