use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

use bstr::BStr;
use tabreader_core::SplitConfigError;

/// A crate-private constructor for `Error`, so the enum can grow variants
/// without that being a breaking change for callers matching on it.
pub(crate) fn new_error(kind: ErrorKind) -> Error {
    Error(Box::new(kind))
}

/// A type alias for `Result<T, tabreader::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur while configuring or running a parser.
///
/// This wraps an [`ErrorKind`] behind a pointer-sized `Box` so that adding
/// new error variants never changes the size of `Result<T, Error>` on the
/// hot path.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// Return the specific kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying kind.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns the position at which this error occurred, if the error
    /// kind carries one.
    pub fn position(&self) -> Option<&Position> {
        self.0.position()
    }

    /// Overwrite this error's position, if its kind carries one, with
    /// `pos`. Field- and row-level errors are built without knowing the
    /// reader's current position (they only know a column index), so the
    /// parser fills this in once the error reaches it.
    pub(crate) fn with_position(mut self, pos: Position) -> Error {
        if let Some(slot) = self.0.position_mut() {
            *slot = pos;
        }
        self
    }

    /// Returns true if this error poisons the parser's stream (a
    /// structural error from the line reader) as opposed to being
    /// per-record and non-poisoning.
    pub fn is_structural(&self) -> bool {
        match *self.0 {
            ErrorKind::Io(_)
            | ErrorKind::SourceUnavailable(_)
            | ErrorKind::EmptyDelimiter
            | ErrorKind::UnterminatedQuote { .. }
            | ErrorKind::UnterminatedEscape { .. }
            | ErrorKind::MultilineLimitReached { .. }
            | ErrorKind::MismatchedQuote { .. }
            | ErrorKind::ReadPastEof
            | ErrorKind::Config(_) => true,
            ErrorKind::InvalidConversion { .. }
            | ErrorKind::ValidationFailed { .. }
            | ErrorKind::FailedCheck { .. }
            | ErrorKind::ColumnCountMismatch { .. }
            | ErrorKind::HeaderIgnored
            | ErrorKind::DuplicateHeader { .. }
            | ErrorKind::UnknownField { .. }
            | ErrorKind::RepeatedField { .. }
            | ErrorKind::EmptyMapping
            | ErrorKind::MappingOutOfRange { .. }
            | ErrorKind::InvalidResplit => false,
        }
    }
}

/// A position in the input: byte offset, physical line number and record
/// index at which something was observed.
///
/// Line numbers and record indices are exposed 1-based and 0-based
/// respectively to match spec: "Line numbers are 1-based, columns are
/// 1-based" for user-facing messages; the record index itself is an
/// internal counter starting at zero.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Position {
    byte: u64,
    line: u64,
    record: u64,
}

impl Position {
    pub(crate) fn new() -> Position {
        Position { byte: 0, line: 1, record: 0 }
    }

    pub(crate) fn set_byte(&mut self, byte: u64) {
        self.byte = byte;
    }

    pub(crate) fn set_line(&mut self, line: u64) {
        self.line = line;
    }

    pub(crate) fn bump_record(&mut self) {
        self.record += 1;
    }

    pub(crate) fn set_record(&mut self, record: u64) {
        self.record = record;
    }

    /// The byte offset, starting at `0`, of this position.
    pub fn byte(&self) -> u64 {
        self.byte
    }

    /// The physical line number, starting at `1`, of this position.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The record index, starting at `0`, of this position.
    pub fn record(&self) -> u64 {
        self.record
    }
}

/// The specific kind of error that occurred. See spec's error taxonomy:
/// each row there has a variant here.
#[derive(Debug)]
pub enum ErrorKind {
    /// An I/O error while reading from a file source.
    Io(io::Error),
    /// The configured source could not be opened (including a construction
    /// time null/empty in-memory buffer).
    SourceUnavailable(String),
    /// Retrieval was called after the stream already reported end-of-input.
    ReadPastEof,
    /// The delimiter was configured as an empty byte sequence.
    EmptyDelimiter,
    /// Content followed a closing quote before the next delimiter.
    MismatchedQuote { pos: Position },
    /// End of input reached while still inside a quoted field.
    UnterminatedQuote { pos: Position },
    /// End of input reached immediately after a live escape byte.
    UnterminatedEscape { pos: Position },
    /// The multiline continuation count exceeded the configured limit.
    MultilineLimitReached { pos: Position, limit: usize },
    /// A field extractor rejected a field's bytes.
    InvalidConversion {
        pos: Position,
        column: usize,
        raw: Vec<u8>,
    },
    /// A validator predicate rejected an otherwise well-typed value.
    ValidationFailed {
        pos: Position,
        column: usize,
        message: String,
    },
    /// A caller-supplied predicate attached to a composite rejected the
    /// eventually-parsed record.
    FailedCheck { pos: Position },
    /// The input column count did not match the declared or mapped arity.
    ColumnCountMismatch {
        pos: Position,
        expected: usize,
        got: usize,
    },
    /// `use_fields` was called on a parser configured with `ignore_header`.
    HeaderIgnored,
    /// The header row contained a duplicate field name.
    DuplicateHeader { name: String },
    /// `use_fields` named a column not present in the header.
    UnknownField { name: String },
    /// `use_fields` was given the same name twice in one call.
    RepeatedField { name: String },
    /// `use_fields` was called with no names at all.
    EmptyMapping,
    /// A mapped column index was not less than the known column count.
    MappingOutOfRange { index: usize, columns: usize },
    /// Multiline resume was attempted against a buffer shorter than the
    /// previous resume point.
    InvalidResplit,
    /// A construction-time configuration contradiction (mutually
    /// exclusive matcher families, overlapping matcher bytes, error-mode
    /// conflicts, multiline enabled with neither quote nor escape).
    Config(String),
}

impl ErrorKind {
    fn position(&self) -> Option<&Position> {
        match self {
            ErrorKind::MismatchedQuote { pos }
            | ErrorKind::UnterminatedQuote { pos }
            | ErrorKind::UnterminatedEscape { pos }
            | ErrorKind::MultilineLimitReached { pos, .. }
            | ErrorKind::InvalidConversion { pos, .. }
            | ErrorKind::ValidationFailed { pos, .. }
            | ErrorKind::FailedCheck { pos }
            | ErrorKind::ColumnCountMismatch { pos, .. } => Some(pos),
            _ => None,
        }
    }

    fn position_mut(&mut self) -> Option<&mut Position> {
        match self {
            ErrorKind::MismatchedQuote { pos }
            | ErrorKind::UnterminatedQuote { pos }
            | ErrorKind::UnterminatedEscape { pos }
            | ErrorKind::MultilineLimitReached { pos, .. }
            | ErrorKind::InvalidConversion { pos, .. }
            | ErrorKind::ValidationFailed { pos, .. }
            | ErrorKind::FailedCheck { pos }
            | ErrorKind::ColumnCountMismatch { pos, .. } => Some(pos),
            _ => None,
        }
    }
}

impl From<SplitConfigError> for Error {
    fn from(err: SplitConfigError) -> Error {
        new_error(ErrorKind::Config(err.to_string()))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        new_error(ErrorKind::Io(err))
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::SourceUnavailable(ref msg) => {
                write!(f, "input source unavailable: {}", msg)
            }
            ErrorKind::ReadPastEof => {
                write!(f, "attempted to read a record past end-of-input")
            }
            ErrorKind::EmptyDelimiter => write!(f, "empty delimiter"),
            ErrorKind::MismatchedQuote { ref pos } => write!(
                f,
                "record {} (line {}): content follows a closing quote \
                 before the next delimiter",
                pos.record(),
                pos.line()
            ),
            ErrorKind::UnterminatedQuote { ref pos } => write!(
                f,
                "record {} (line {}): unterminated quote",
                pos.record(),
                pos.line()
            ),
            ErrorKind::UnterminatedEscape { ref pos } => write!(
                f,
                "record {} (line {}): unterminated escape",
                pos.record(),
                pos.line()
            ),
            ErrorKind::MultilineLimitReached { ref pos, limit } => write!(
                f,
                "record {} (line {}): multiline limit of {} reached",
                pos.record(),
                pos.line(),
                limit
            ),
            ErrorKind::InvalidConversion { ref pos, column, ref raw } => {
                write!(
                    f,
                    "record {} (line {}, column {}): invalid conversion \
                     for {:?}",
                    pos.record(),
                    pos.line(),
                    column,
                    BStr::new(raw)
                )
            }
            ErrorKind::ValidationFailed { ref pos, column, ref message } => {
                write!(
                    f,
                    "record {} (line {}, column {}): {}",
                    pos.record(),
                    pos.line(),
                    column,
                    message
                )
            }
            ErrorKind::FailedCheck { ref pos } => write!(
                f,
                "record {} (line {}): failed check",
                pos.record(),
                pos.line()
            ),
            ErrorKind::ColumnCountMismatch { ref pos, expected, got } => {
                write!(
                    f,
                    "record {} (line {}): invalid number of columns: \
                     expected {}, got {}",
                    pos.record(),
                    pos.line(),
                    expected,
                    got
                )
            }
            ErrorKind::HeaderIgnored => write!(
                f,
                "use_fields cannot be used on a parser configured with \
                 ignore_header"
            ),
            ErrorKind::DuplicateHeader { ref name } => {
                write!(f, "header contains duplicates: {}", name)
            }
            ErrorKind::UnknownField { ref name } => {
                write!(f, "unknown field: {}", name)
            }
            ErrorKind::RepeatedField { ref name } => {
                write!(f, "field given twice to use_fields: {}", name)
            }
            ErrorKind::EmptyMapping => {
                write!(f, "use_fields called with no names")
            }
            ErrorKind::MappingOutOfRange { index, columns } => write!(
                f,
                "mapped column {} is out of range for {} columns",
                index, columns
            ),
            ErrorKind::InvalidResplit => write!(
                f,
                "multiline resume attempted on a buffer shorter than the \
                 previous resume point"
            ),
            ErrorKind::Config(ref msg) => write!(f, "configuration error: {}", msg),
        }
    }
}
