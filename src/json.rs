use crate::error::VexlError;
use crate::sketch::{RuntimeValue, Sketch, VariableEntry};
use crate::vec2::Vec2;

use std::fmt::Write;

/// JSON formatting style.
#[derive(Clone, Copy)]
pub enum JsonStyle {
    /// Compact: no whitespace between tokens.
    Compact,
    /// Pretty: 2-space indented, one entry per line.
    Pretty,
}

struct JsonWriter {
    buf: String,
    style: JsonStyle,
    depth: usize,
}

impl JsonWriter {
    fn new(style: JsonStyle) -> Self {
        JsonWriter {
            buf: String::new(),
            style,
            depth: 0,
        }
    }

    fn is_pretty(&self) -> bool {
        matches!(self.style, JsonStyle::Pretty)
    }

    fn newline(&mut self) {
        if self.is_pretty() {
            self.buf.push('\n');
            for _ in 0..self.depth {
                self.buf.push_str("  ");
            }
        }
    }

    fn space(&mut self) {
        if self.is_pretty() {
            self.buf.push(' ');
        }
    }

    /// The whole environment: variable name → entry object.
    fn write_sketch(&mut self, sketch: &Sketch) {
        self.buf.push('{');
        self.depth += 1;

        let mut first = true;
        for (name, entry) in sketch.variables() {
            self.entry_sep(&mut first);
            self.write_key(name);
            self.write_entry(sketch, entry);
        }

        self.depth -= 1;
        if !sketch.variables().is_empty() {
            self.newline();
        }
        self.buf.push('}');
    }

    /// One variable entry. Unset properties are omitted.
    fn write_entry(&mut self, sketch: &Sketch, entry: &VariableEntry) {
        self.buf.push('{');
        self.depth += 1;

        let mut first = true;
        self.entry_sep(&mut first);
        self.write_key("value");
        match &entry.value {
            RuntimeValue::Scalar(n) => self.write_number(*n),
            RuntimeValue::Vector(id) => self.write_vec2(sketch.vector(*id)),
            RuntimeValue::Str(s) => self.write_string_value(s),
        }

        if let Some(ref color) = entry.properties.color {
            self.entry_sep(&mut first);
            self.write_key("color");
            self.write_string_value(color);
        }
        if entry.properties.interactive {
            self.entry_sep(&mut first);
            self.write_key("interactive");
            self.buf.push_str("true");
        }
        if entry.properties.reference {
            self.entry_sep(&mut first);
            self.write_key("reference");
            self.buf.push_str("true");
        }
        if let Some(origin) = sketch.origin_of(entry) {
            self.entry_sep(&mut first);
            self.write_key("origin");
            self.write_vec2(origin);
        }

        self.depth -= 1;
        self.newline();
        self.buf.push('}');
    }

    fn write_vec2(&mut self, v: Vec2) {
        self.buf.push('{');
        self.write_key("x");
        self.write_number(v.x);
        self.buf.push(',');
        self.space();
        self.write_key("y");
        self.write_number(v.y);
        self.buf.push('}');
    }

    fn write_number(&mut self, n: f64) {
        // Format integers without decimal point.
        // Guard: must be finite, integral, and within the range where f64
        // can represent every integer exactly (2^53).
        if n.is_finite() && n.fract() == 0.0 && n.abs() < (1u64 << 53) as f64 {
            write!(&mut self.buf, "{}", n as i64).unwrap();
        } else if n.is_finite() {
            write!(&mut self.buf, "{}", n).unwrap();
        } else {
            // JSON has no NaN/Infinity literal.
            self.buf.push_str("null");
        }
    }

    fn entry_sep(&mut self, first: &mut bool) {
        if *first {
            *first = false;
        } else {
            self.buf.push(',');
        }
        self.newline();
    }

    fn write_key(&mut self, key: &str) {
        self.write_string_value(key);
        self.buf.push(':');
        self.space();
    }

    fn write_string_value(&mut self, s: &str) {
        self.buf.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.buf.push_str("\\\""),
                '\\' => self.buf.push_str("\\\\"),
                '\n' => self.buf.push_str("\\n"),
                '\r' => self.buf.push_str("\\r"),
                '\t' => self.buf.push_str("\\t"),
                '\u{0008}' => self.buf.push_str("\\b"),
                '\u{000C}' => self.buf.push_str("\\f"),
                c if c < '\u{0020}' => {
                    write!(&mut self.buf, "\\u{:04x}", c as u32).unwrap();
                }
                c => self.buf.push(c),
            }
        }
        self.buf.push('"');
    }
}

/// Serialize the variable environment to a compact JSON string.
pub fn to_json(sketch: &Sketch) -> String {
    let mut w = JsonWriter::new(JsonStyle::Compact);
    w.write_sketch(sketch);
    w.buf
}

/// Serialize the variable environment to pretty JSON (2-space indent).
pub fn to_json_pretty(sketch: &Sketch) -> String {
    let mut w = JsonWriter::new(JsonStyle::Pretty);
    w.write_sketch(sketch);
    w.buf
}

/// Serialize an error list to a JSON array string.
pub fn errors_to_json(errors: &[VexlError]) -> String {
    let mut w = JsonWriter::new(JsonStyle::Compact);
    w.buf.push('[');
    for (i, err) in errors.iter().enumerate() {
        if i > 0 {
            w.buf.push(',');
        }
        w.buf.push('{');
        w.write_key("code");
        w.write_string_value(err.code);
        w.buf.push(',');
        w.write_key("message");
        w.write_string_value(&err.message);
        w.buf.push(',');
        w.write_key("line");
        write!(&mut w.buf, "{}", err.line).unwrap();
        w.buf.push(',');
        w.write_key("source");
        w.write_string_value(&err.source);
        w.buf.push('}');
    }
    w.buf.push(']');
    w.buf
}
