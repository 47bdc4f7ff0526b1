use tabreader_core::{ByteSet, SplitConfig, SplitConfigError};

use crate::error::{new_error, Error, ErrorKind, Result};

/// What the parser does with a physical or logical line terminator when
/// reading from a file or byte stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terminator {
    /// `\r\n`, bare `\r`, and bare `\n` are all recognized; the exact
    /// bytes seen are reproduced verbatim when a multiline field spans
    /// them.
    CRLF,
    /// Only the given byte terminates a physical line.
    Any(u8),
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::CRLF
    }
}

/// How a record-level or field-level failure is surfaced to the caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorMode {
    /// Fallible accessors return `bool`; no message or error value is
    /// produced on failure.
    Flag,
    /// Fallible accessors return a human-readable message string on
    /// failure, via the record's last-error slot.
    Message,
    /// Fallible accessors return `Result<T, Error>`; failure is a full
    /// structured [`Error`](crate::Error).
    Throw,
}

impl Default for ErrorMode {
    fn default() -> ErrorMode {
        ErrorMode::Throw
    }
}

/// Declares how many additional physical lines a quoted or escaped field
/// may continue across before it is treated as an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MultilineLimit {
    /// Continuation is not allowed at all; an unterminated quote or a
    /// trailing live escape at end-of-line is always an error.
    Disabled,
    /// Continuation may happen any number of times.
    Unbounded,
    /// Continuation may happen at most this many additional times past
    /// the first physical line.
    Bounded(usize),
}

impl Default for MultilineLimit {
    fn default() -> MultilineLimit {
        MultilineLimit::Unbounded
    }
}

/// Builds a [`ReaderConfig`] through the same chained-setter style the
/// splitter configuration uses.
///
/// `ConfigBuilder` is the single source of truth for every dialect and
/// behavioral knob; [`crate::Parser`] never exposes configuration setters
/// of its own; all of them live here.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    delimiter: Vec<u8>,
    quote: Option<u8>,
    escape: ByteSet,
    trim_left: ByteSet,
    trim_right: ByteSet,
    double_quote: bool,
    terminator: Terminator,
    multiline: MultilineLimit,
    ignore_header: bool,
    ignore_empty_lines: bool,
    flexible: bool,
    error_mode: ErrorMode,
    buffer_capacity: usize,
    used_symmetric_trim: bool,
    used_directional_trim: bool,
}

impl Default for ConfigBuilder {
    fn default() -> ConfigBuilder {
        ConfigBuilder {
            delimiter: vec![b','],
            quote: None,
            escape: ByteSet::new(),
            trim_left: ByteSet::new(),
            trim_right: ByteSet::new(),
            double_quote: true,
            terminator: Terminator::default(),
            multiline: MultilineLimit::default(),
            ignore_header: false,
            ignore_empty_lines: false,
            flexible: false,
            error_mode: ErrorMode::default(),
            buffer_capacity: 8 * 1024,
            used_symmetric_trim: false,
            used_directional_trim: false,
        }
    }
}

impl ConfigBuilder {
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Set the field delimiter. Defaults to a single comma.
    pub fn delimiter(&mut self, delimiter: impl Into<Vec<u8>>) -> &mut Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the quote byte. Unset by default (no quoting dialect).
    pub fn quote(&mut self, quote: u8) -> &mut Self {
        self.quote = Some(quote);
        self
    }

    /// Remove the quote byte, disabling quoting entirely.
    pub fn no_quote(&mut self) -> &mut Self {
        self.quote = None;
        self
    }

    /// Whether two consecutive quote bytes inside a quoted field collapse
    /// to one literal quote byte. Defaults to `true`.
    pub fn double_quote(&mut self, yes: bool) -> &mut Self {
        self.double_quote = yes;
        self
    }

    /// Add an escape byte. May be called more than once to register
    /// several escape bytes.
    pub fn escape(&mut self, byte: u8) -> &mut Self {
        self.escape = push_byte(self.escape, byte);
        self
    }

    /// Add a byte to be trimmed from the left of every unquoted field.
    ///
    /// Mutually exclusive with [`ConfigBuilder::trim`]; mixing the two
    /// families is rejected at [`ConfigBuilder::build`] time.
    pub fn trim_left(&mut self, byte: u8) -> &mut Self {
        self.used_directional_trim = true;
        self.trim_left = push_byte(self.trim_left, byte);
        self
    }

    /// Add a byte to be trimmed from the right of every unquoted field.
    ///
    /// Mutually exclusive with [`ConfigBuilder::trim`]; mixing the two
    /// families is rejected at [`ConfigBuilder::build`] time.
    pub fn trim_right(&mut self, byte: u8) -> &mut Self {
        self.used_directional_trim = true;
        self.trim_right = push_byte(self.trim_right, byte);
        self
    }

    /// Add a byte to be trimmed from both sides of every unquoted field.
    ///
    /// Mutually exclusive with [`ConfigBuilder::trim_left`] and
    /// [`ConfigBuilder::trim_right`]; mixing the two families is rejected
    /// at [`ConfigBuilder::build`] time.
    pub fn trim(&mut self, byte: u8) -> &mut Self {
        self.used_symmetric_trim = true;
        self.trim_left = push_byte(self.trim_left, byte);
        self.trim_right = push_byte(self.trim_right, byte);
        self
    }

    /// Convenience for the ASCII-delimited-text convention: unit
    /// separator (`0x1F`) between fields, record separator (`0x1E`)
    /// between records, no quoting. Equivalent to
    /// `delimiter([0x1F]).terminator(Terminator::Any(0x1E))`.
    pub fn ascii(&mut self) -> &mut Self {
        self.delimiter(vec![0x1F]);
        self.terminator(Terminator::Any(0x1E));
        self
    }

    /// How physical lines are terminated. Defaults to recognizing
    /// `\r\n`, `\r`, and `\n` uniformly.
    pub fn terminator(&mut self, terminator: Terminator) -> &mut Self {
        self.terminator = terminator;
        self
    }

    /// How many additional physical lines a field may continue across.
    /// Defaults to unbounded. Has no effect unless a quote or escape byte
    /// is configured.
    pub fn multiline(&mut self, limit: MultilineLimit) -> &mut Self {
        self.multiline = limit;
        self
    }

    /// Treat the first record as a header naming the columns rather than
    /// data. Defaults to `false`.
    pub fn ignore_header(&mut self, yes: bool) -> &mut Self {
        self.ignore_header = yes;
        self
    }

    /// Skip physical lines that split to exactly one empty field before
    /// they are even considered a record. Defaults to `false`.
    pub fn ignore_empty_lines(&mut self, yes: bool) -> &mut Self {
        self.ignore_empty_lines = yes;
        self
    }

    /// Allow records to vary in column count instead of enforcing the
    /// first record's arity on every later one. Defaults to `false`.
    pub fn flexible(&mut self, yes: bool) -> &mut Self {
        self.flexible = yes;
        self
    }

    /// How a field or record failure is reported to the caller. Defaults
    /// to [`ErrorMode::Throw`].
    pub fn error_mode(&mut self, mode: ErrorMode) -> &mut Self {
        self.error_mode = mode;
        self
    }

    /// The initial capacity, in bytes, of each of the line reader's two
    /// record buffers. Defaults to 8 KiB; buffers grow past this as
    /// needed for long or multiline records.
    pub fn buffer_capacity(&mut self, bytes: usize) -> &mut Self {
        self.buffer_capacity = bytes;
        self
    }

    pub(crate) fn build(&self) -> Result<ReaderConfig> {
        if self.delimiter.is_empty() {
            return Err(new_error(ErrorKind::EmptyDelimiter));
        }
        if self.used_symmetric_trim && self.used_directional_trim {
            return Err(SplitConfigError::ConflictingTrimFamilies.into());
        }
        let split = {
            let mut c = SplitConfig::new(&self.delimiter)?;
            if let Some(q) = self.quote {
                c = c.quote(q);
            }
            c = c.escape(self.escape);
            c = c.trim_left(self.trim_left);
            c = c.trim_right(self.trim_right);
            c = c.double_quote(self.double_quote);
            c.validate()?;
            c
        };
        Ok(ReaderConfig {
            split,
            terminator: self.terminator,
            multiline: self.multiline,
            ignore_header: self.ignore_header,
            ignore_empty_lines: self.ignore_empty_lines,
            flexible: self.flexible,
            error_mode: self.error_mode,
            buffer_capacity: self.buffer_capacity.max(64),
        })
    }
}

fn push_byte(mut set: ByteSet, byte: u8) -> ByteSet {
    let mut bytes: Vec<u8> = (0..=255u16)
        .map(|b| b as u8)
        .filter(|&b| set.contains(b))
        .collect();
    if !bytes.contains(&byte) {
        bytes.push(byte);
    }
    set = ByteSet::from_bytes(&bytes).unwrap_or(set);
    set
}

/// The resolved, validated configuration a [`crate::Parser`] is built
/// from. Produced only by [`ConfigBuilder::build`].
#[derive(Clone, Debug)]
pub(crate) struct ReaderConfig {
    pub(crate) split: SplitConfig,
    pub(crate) terminator: Terminator,
    pub(crate) multiline: MultilineLimit,
    pub(crate) ignore_header: bool,
    pub(crate) ignore_empty_lines: bool,
    pub(crate) flexible: bool,
    pub(crate) error_mode: ErrorMode,
    pub(crate) buffer_capacity: usize,
}

impl ReaderConfig {
    pub(crate) fn multiline_enabled(&self) -> bool {
        !matches!(self.multiline, MultilineLimit::Disabled)
            && self.split.needs_quote_or_escape()
    }

    pub(crate) fn multiline_limit(&self) -> Option<usize> {
        match self.multiline {
            MultilineLimit::Bounded(n) => Some(n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_comma_with_throw_mode() {
        let cfg = ConfigBuilder::new().build().unwrap();
        assert_eq!(cfg.error_mode, ErrorMode::Throw);
        assert!(!cfg.ignore_header);
    }

    #[test]
    fn rejects_empty_delimiter() {
        let err = ConfigBuilder::new().delimiter(Vec::new()).build();
        assert!(err.is_err());
    }

    #[test]
    fn rejects_overlapping_matchers() {
        let err = ConfigBuilder::new()
            .quote(b'"')
            .escape(b'"')
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn ascii_sets_unit_and_record_separators() {
        let cfg = ConfigBuilder::new().ascii().build().unwrap();
        assert_eq!(cfg.split.delimiter_bytes(), &[0x1F]);
        assert_eq!(cfg.terminator, Terminator::Any(0x1E));
    }

    #[test]
    fn rejects_mixing_symmetric_and_directional_trim() {
        let err = ConfigBuilder::new()
            .trim(b' ')
            .trim_left(b'\t')
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn directional_trim_alone_is_accepted() {
        let cfg = ConfigBuilder::new()
            .trim_left(b' ')
            .trim_right(b'\t')
            .build();
        assert!(cfg.is_ok());
    }
}
