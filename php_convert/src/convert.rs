//! The conversions behind each subcommand.

use std::fmt;
use std::io::{self, Write as _};

use anyhow::{Context as _, Result};
use serde_php::{Codec, Key, Value};

/// Converts serialized PHP data to JSON.
pub fn decode<W: io::Write>(codec: &Codec, input: &[u8], output: W, pretty: bool) -> Result<()> {
    let value = parse(codec, input)?;
    let mut output = io::BufWriter::new(output);
    let res = if pretty {
        serde_json::to_writer_pretty(&mut output, &value)
    } else {
        serde_json::to_writer(&mut output, &value)
    };

    res.context("cannot write json output")?;

    writeln!(output)?;
    output.flush()?;
    Ok(())
}

/// Converts JSON to serialized PHP data.
///
/// JSON booleans and null have no counterpart and are rejected. Object keys
/// that are canonical integers become integer keys, as they would in PHP.
pub fn encode<W: io::Write>(codec: &Codec, input: &[u8], output: W) -> Result<()> {
    let value: Value = serde_json::from_slice(input).context("input is not valid json")?;
    let value = normalize_keys(value);
    let mut output = io::BufWriter::new(output);
    codec
        .to_writer(&mut output, &value)
        .context("cannot serialize value")?;

    output.flush()?;
    Ok(())
}

fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Array(entries) => Value::Array(
            entries
                .into_iter()
                .map(|(key, value)| {
                    let key = match key {
                        Key::Str(text) => Key::normalized(text),
                        key => key,
                    };

                    (key, normalize_keys(value))
                })
                .collect(),
        ),
        value => value,
    }
}

/// Validates serialized PHP data and summarizes it.
pub fn check(codec: &Codec, input: &[u8]) -> Result<Summary> {
    let value = parse(codec, input)?;
    let mut summary = Summary::default();
    summary.visit(&value, 0);
    Ok(summary)
}

fn parse(codec: &Codec, input: &[u8]) -> Result<Value> {
    // files usually end in a newline, which isn't part of the payload
    let input = input.trim_ascii_end();
    let value = codec.from_slice(input).context("input is not valid serialized data")?;
    log::debug!("parsed {} bytes", input.len());
    Ok(value)
}

/// Counts of every kind of value within a payload.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub ints: usize,
    pub floats: usize,
    pub strings: usize,
    pub arrays: usize,
    pub depth: usize,
}

impl Summary {
    fn visit(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Int(_) => self.ints += 1,
            Value::Float(_) => self.floats += 1,
            Value::Str(_) => self.strings += 1,
            Value::Array(entries) => {
                self.arrays += 1;
                self.depth = self.depth.max(depth + 1);
                for (_, value) in entries {
                    self.visit(value, depth + 1);
                }
            },
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "valid: {} integers, {} floats, {} strings, {} arrays nested {} deep",
            self.ints, self.floats, self.strings, self.arrays, self.depth
        )
    }
}
