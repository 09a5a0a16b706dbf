//! JSON text input and output.
//!
//! Parsing and string escaping are delegated to `serde_json` (with exact
//! number literals and source key order preserved); this module owns the
//! structural punctuation, pretty-printing, and the rendering of the engine's
//! number representations.

use crate::event::JsonGenerator;
use crate::map::JsonMap;
use crate::number::BigDecimal;
use crate::value::JsonValue;
use crate::{Error, Result};
use num_bigint::BigInt;
use std::io::Write;

/// Parses JSON text into a [`JsonValue`] tree.
///
/// Number literals are preserved exactly (never routed through a double) and
/// object keys keep their source order.
///
/// # Errors
///
/// Returns [`Error::Syntax`] with line/column information when the text is
/// not well-formed JSON.
pub fn parse_text(input: &str) -> Result<JsonValue> {
    let parsed: serde_json::Value = serde_json::from_str(input)
        .map_err(|e| Error::syntax(e.line(), e.column(), &e.to_string()))?;
    convert(parsed)
}

fn convert(value: serde_json::Value) -> Result<JsonValue> {
    Ok(match value {
        serde_json::Value::Null => JsonValue::Null,
        serde_json::Value::Bool(b) => JsonValue::Bool(b),
        // The exact source literal survives in the number's text form.
        serde_json::Value::Number(n) => {
            JsonValue::Number(crate::number::parse_literal(&n.to_string())?)
        }
        serde_json::Value::String(s) => JsonValue::String(s),
        serde_json::Value::Array(items) => {
            let converted: Result<Vec<JsonValue>> = items.into_iter().map(convert).collect();
            JsonValue::Array(converted?)
        }
        serde_json::Value::Object(entries) => {
            let mut map = JsonMap::with_capacity(entries.len());
            for (key, item) in entries {
                map.insert(key, convert(item)?);
            }
            JsonValue::Object(map)
        }
    })
}

struct Frame {
    array: bool,
    count: usize,
}

/// A [`JsonGenerator`] that writes JSON text to an [`io::Write`] sink.
///
/// [`io::Write`]: std::io::Write
pub struct TextGenerator<W: Write> {
    out: W,
    pretty: bool,
    indent: usize,
    frames: Vec<Frame>,
    after_key: bool,
}

impl<W: Write> TextGenerator<W> {
    /// Creates a generator writing to `out`. `indent` is the pretty-print
    /// indentation width and is ignored when `pretty` is false.
    #[must_use]
    pub fn new(out: W, pretty: bool, indent: usize) -> Self {
        TextGenerator {
            out,
            pretty,
            indent,
            frames: Vec::new(),
            after_key: false,
        }
    }

    /// Consumes the generator and returns the sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn io(e: std::io::Error) -> Error {
        Error::io(&e.to_string())
    }

    fn newline(&mut self) -> Result<()> {
        self.out.write_all(b"\n").map_err(Self::io)?;
        let width = self.indent * self.frames.len();
        for _ in 0..width {
            self.out.write_all(b" ").map_err(Self::io)?;
        }
        Ok(())
    }

    /// Writes the separator due before a value or key at the current spot.
    fn before_item(&mut self) -> Result<()> {
        if self.after_key {
            self.after_key = false;
            return Ok(());
        }
        let (first, in_frame) = match self.frames.last_mut() {
            Some(frame) => {
                let first = frame.count == 0;
                frame.count += 1;
                (first, true)
            }
            None => (true, false),
        };
        if !first {
            self.out.write_all(b",").map_err(Self::io)?;
        }
        if self.pretty && in_frame {
            self.newline()?;
        }
        Ok(())
    }

    fn open(&mut self, array: bool) -> Result<()> {
        self.before_item()?;
        self.out
            .write_all(if array { b"[" } else { b"{" })
            .map_err(Self::io)?;
        self.frames.push(Frame { array, count: 0 });
        Ok(())
    }

    fn close(&mut self, array: bool) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Error::custom("close without matching open"))?;
        if frame.array != array {
            return Err(Error::custom("mismatched close"));
        }
        if self.pretty && frame.count > 0 {
            self.newline()?;
        }
        self.out
            .write_all(if array { b"]" } else { b"}" })
            .map_err(Self::io)
    }
}

impl<W: Write> JsonGenerator for TextGenerator<W> {
    fn write_start_object(&mut self) -> Result<()> {
        self.open(false)
    }

    fn write_end_object(&mut self) -> Result<()> {
        self.close(false)
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.open(true)
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.close(true)
    }

    fn write_key(&mut self, key: &str) -> Result<()> {
        self.before_item()?;
        serde_json::to_writer(&mut self.out, key).map_err(|e| Error::io(&e.to_string()))?;
        self.out
            .write_all(if self.pretty { b": " } else { b":" })
            .map_err(Self::io)?;
        self.after_key = true;
        Ok(())
    }

    fn write_null(&mut self) -> Result<()> {
        self.before_item()?;
        self.out.write_all(b"null").map_err(Self::io)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.before_item()?;
        self.out
            .write_all(if value { b"true" } else { b"false" })
            .map_err(Self::io)
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.before_item()?;
        serde_json::to_writer(&mut self.out, value).map_err(|e| Error::io(&e.to_string()))
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.before_item()?;
        write!(self.out, "{value}").map_err(Self::io)
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.before_item()?;
        serde_json::to_writer(&mut self.out, &value).map_err(|e| Error::io(&e.to_string()))
    }

    fn write_big_int(&mut self, value: &BigInt) -> Result<()> {
        self.before_item()?;
        write!(self.out, "{value}").map_err(Self::io)
    }

    fn write_decimal(&mut self, value: &BigDecimal) -> Result<()> {
        self.before_item()?;
        write!(self.out, "{value}").map_err(Self::io)
    }
}
