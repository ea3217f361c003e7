use std::fmt;

/// Error kind for decode errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed array text literal (unterminated quote or literal).
    Parse,
    /// Binary access outside the cell or buffer.
    Bounds,
    /// Binary decoding requested for a type that only decodes from text.
    UnsupportedMode,
    /// Scalar literal that does not parse as its type (`"abc"` for int4).
    InvalidLiteral,
    /// Result set whose rows do not match its column list.
    Shape,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Parse => f.write_str("parse"),
            ErrorKind::Bounds => f.write_str("bounds"),
            ErrorKind::UnsupportedMode => f.write_str("unsupported mode"),
            ErrorKind::InvalidLiteral => f.write_str("invalid literal"),
            ErrorKind::Shape => f.write_str("shape"),
        }
    }
}

/// Returned by every decoder and by the buffer view.
///
/// Fatal to the cell being decoded. The marshaler attaches row/column/type
/// context and aborts the whole conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    kind: ErrorKind,
    message: String,
}

impl DecodeError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Parse, message: msg.into() }
    }

    pub fn bounds(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Bounds, message: msg.into() }
    }

    pub fn unsupported_mode(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::UnsupportedMode, message: msg.into() }
    }

    pub fn invalid_literal(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::InvalidLiteral, message: msg.into() }
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Shape, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for DecodeError {}

// ---------------------------------------------------------------------------
// From impls: standard error types → DecodeError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<std::str::Utf8Error> for DecodeError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::invalid_literal(format!("cell is not valid UTF-8: {e}"))
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_literal(format!("malformed json: {e}"))
    }
}
