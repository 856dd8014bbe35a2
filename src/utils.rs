//! Miscellaneous utility functions.

use anyhow::Context as _;
use colored::Colorize;
use serde_json::Value;
use std::io::Write;
use std::io::{self, ErrorKind};

/// Returns the depth of the JSON value.
#[must_use]
pub fn depth(json: &Value) -> usize {
    match json {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => 1,
        Value::Array(arr) => 1 + arr.iter().map(depth).max().unwrap_or(0),
        Value::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
    }
}

// ==============================================================================
// Colorized JSON Output
// ==============================================================================

/// Write one match (path header + colorized JSON value) to `writer`.
///
/// The header is omitted for the root (an empty path) or when `show_path` is
/// off. A broken pipe counts as success so that piping into `head` exits
/// cleanly.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_colored_result<W: Write>(
    writer: &mut W,
    value: &Value,
    path: &str,
    pretty: bool,
    show_path: bool,
) -> anyhow::Result<()> {
    quiet_broken_pipe((|| {
        if show_path && !path.is_empty() {
            writeln!(writer, "{}:", path.bold().magenta())?;
        }
        write_colored_json(writer, value, 0, pretty)?;
        writeln!(writer)
    })())
}

/// Write one matched path per line.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_paths<W: Write, S: AsRef<str>>(
    writer: &mut W,
    paths: &[S],
) -> anyhow::Result<()> {
    quiet_broken_pipe(
        paths
            .iter()
            .try_for_each(|path| writeln!(writer, "{}", path.as_ref().magenta())),
    )
}

fn quiet_broken_pipe(result: io::Result<()>) -> anyhow::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err).context("write colorized JSON to stdout"),
    }
}

/// Recursively write a JSON value with syntax highlighting.
fn write_colored_json<W: Write>(
    writer: &mut W,
    value: &Value,
    indent: usize,
    pretty: bool,
) -> io::Result<()> {
    let next_indent = indent + 2;
    let break_line = |writer: &mut W, width: usize| -> io::Result<()> {
        if pretty {
            writeln!(writer)?;
            write!(writer, "{:width$}", "")?;
        }
        Ok(())
    };

    match value {
        Value::Null => write!(writer, "{}", "null".red().dimmed()),
        Value::Bool(b) => write!(writer, "{}", b.to_string().yellow().bold()),
        Value::Number(n) => write!(writer, "{}", n.to_string().yellow()),
        // Display on a string value yields the quoted, escaped literal.
        Value::String(_) => write!(writer, "{}", value.to_string().green()),
        Value::Array(items) => {
            write!(writer, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(writer, ",")?;
                }
                break_line(writer, next_indent)?;
                write_colored_json(writer, item, next_indent, pretty)?;
            }
            if !items.is_empty() {
                break_line(writer, indent)?;
            }
            write!(writer, "]")
        }
        Value::Object(map) => {
            write!(writer, "{{")?;
            for (i, (key, val)) in map.iter().enumerate() {
                if i > 0 {
                    write!(writer, ",")?;
                }
                break_line(writer, next_indent)?;
                let quoted_key = Value::from(key.as_str()).to_string();
                write!(writer, "{}", quoted_key.cyan())?;
                write!(writer, "{}", if pretty { ": " } else { ":" })?;
                write_colored_json(writer, val, next_indent, pretty)?;
            }
            if !map.is_empty() {
                break_line(writer, indent)?;
            }
            write!(writer, "}}")
        }
    }
}
