use std::fmt;

/// An error produced while parsing or executing a script.
///
/// Errors are accumulated in lists and surfaced after a full run; they
/// never cross the `parse`/`execute` boundary as panics. Each error is
/// attributed to the source line it came from (line 0 = no attribution).
#[derive(Debug, Clone, PartialEq)]
pub struct VexlError {
    /// Machine-readable error code.
    pub code: &'static str,
    pub message: String,
    /// 1-based source line number, or 0 when unknown.
    pub line: usize,
    /// The trimmed source line text.
    pub source: String,
}

impl VexlError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        VexlError {
            code,
            message: message.into(),
            line: 0,
            source: String::new(),
        }
    }

    /// Attribute this error to a source line.
    pub fn at_line(mut self, line: usize, source: &str) -> Self {
        self.line = line;
        self.source = source.to_string();
        self
    }

    /// Whether this entry is a non-fatal warning rather than a failure.
    pub fn is_warning(&self) -> bool {
        self.code == "unknown-modifier"
    }
}

impl fmt::Display for VexlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{} ({})", self.message, self.code)
        } else {
            write!(
                f,
                "Line {}: `{}` failed. Error: {} ({})",
                self.line, self.source, self.message, self.code
            )
        }
    }
}
