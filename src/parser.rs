//! The public-facing facade: owns the line reader and the pair of
//! look-ahead buffers/converters, and drives record-by-record advance.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use crate::config::{ConfigBuilder, ErrorMode};
use crate::convert::{Composite, Converter};
use crate::error::{new_error, Error, ErrorKind, Position, Result};
use crate::field::FromRow;
use crate::line_reader::LineReader;
use crate::record::{ColumnMapping, Header};

/// A record-oriented delimited-text parser.
///
/// Built via [`ConfigBuilder`] and one of [`Parser::from_path`],
/// [`Parser::from_reader`], or [`Parser::from_slice`]. Drive it with
/// [`Parser::advance`], then read the current record with [`Parser::parse`]
/// or [`Parser::try_next`].
pub struct Parser<R> {
    reader: LineReader<R>,
    error_mode: ErrorMode,
    flexible: bool,
    multiline_enabled: bool,
    multiline_limit: Option<usize>,
    current: Converter,
    next: Converter,
    current_buf: Vec<u8>,
    next_buf: Vec<u8>,
    pending: Option<Result<bool>>,
    header: Option<Header>,
    record_index: u64,
    first_field_count: Option<usize>,
    failed: bool,
    last_error_message: Option<String>,
}

impl<R: io::BufRead> Parser<R> {
    fn new(source: R, builder: &ConfigBuilder) -> Result<Parser<R>> {
        let config = builder.build()?;
        let reader = LineReader::new(
            source,
            config.terminator,
            config.split.escape_set(),
            config.ignore_empty_lines,
        );
        let mut parser = Parser {
            reader,
            error_mode: config.error_mode,
            flexible: config.flexible,
            multiline_enabled: config.multiline_enabled(),
            multiline_limit: config.multiline_limit(),
            current: Converter::new(config.split.clone())?,
            next: Converter::new(config.split.clone())?,
            current_buf: Vec::with_capacity(config.buffer_capacity),
            next_buf: Vec::with_capacity(config.buffer_capacity),
            pending: None,
            header: None,
            record_index: 0,
            first_field_count: None,
            failed: false,
            last_error_message: None,
        };
        if config.ignore_header {
            parser.consume_header()?;
        }
        parser.prime();
        Ok(parser)
    }

    fn assemble(
        reader: &mut LineReader<R>,
        converter: &mut Converter,
        buf: &mut Vec<u8>,
        multiline_enabled: bool,
        multiline_limit: Option<usize>,
    ) -> Result<bool> {
        use tabreader_core::SplitOutcome;

        converter.reset();
        if !reader.begin_record(buf)? {
            return Ok(false);
        }
        let mut continuations = 0usize;
        loop {
            match converter.split(buf) {
                SplitOutcome::Complete => return Ok(true),
                SplitOutcome::MismatchedQuote { .. } => {
                    return Err(new_error(ErrorKind::MismatchedQuote {
                        pos: reader_position(reader),
                    }));
                }
                SplitOutcome::UnterminatedEscape => {
                    return Err(new_error(ErrorKind::UnterminatedEscape {
                        pos: reader_position(reader),
                    }));
                }
                SplitOutcome::UnterminatedQuote => {
                    if !multiline_enabled {
                        return Err(new_error(ErrorKind::UnterminatedQuote {
                            pos: reader_position(reader),
                        }));
                    }
                    if let Some(limit) = multiline_limit {
                        if continuations >= limit {
                            return Err(new_error(
                                ErrorKind::MultilineLimitReached {
                                    pos: reader_position(reader),
                                    limit,
                                },
                            ));
                        }
                    }
                    continuations += 1;
                    if !reader.continue_record(buf)? {
                        return Err(new_error(ErrorKind::UnterminatedQuote {
                            pos: reader_position(reader),
                        }));
                    }
                }
            }
        }
    }

    fn consume_header(&mut self) -> Result<()> {
        let found = Self::assemble(
            &mut self.reader,
            &mut self.next,
            &mut self.next_buf,
            self.multiline_enabled,
            self.multiline_limit,
        )?;
        if !found {
            self.header = Some(Header::from_fields(&[])?);
            return Ok(());
        }
        let names: Vec<String> = self
            .next
            .fields(&self.next_buf)?
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        self.header = Some(Header::from_fields(&names)?);
        self.next.reset();
        Ok(())
    }

    fn prime(&mut self) {
        let outcome = Self::assemble(
            &mut self.reader,
            &mut self.next,
            &mut self.next_buf,
            self.multiline_enabled,
            self.multiline_limit,
        );
        self.pending = Some(outcome);
    }

    fn position(&self) -> Position {
        let mut pos = Position::new();
        pos.set_byte(self.reader.byte_pos());
        pos.set_line(self.reader.line_no());
        pos.set_record(self.record_index);
        pos
    }

    /// Whether a prior structural failure has permanently stopped this
    /// parser. Only ever set when the configured [`ErrorMode`] is
    /// [`ErrorMode::Flag`].
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// The message from the last structural failure, if the configured
    /// [`ErrorMode`] is [`ErrorMode::Message`] and one has occurred.
    pub fn last_error_message(&self) -> Option<&str> {
        self.last_error_message.as_deref()
    }

    /// The header record, if this parser was configured with
    /// `ignore_header(true)`.
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Whether `name` is one of this parser's header columns. Always
    /// `false` when no header was read (`ignore_header` was never set).
    pub fn field_exists(&self, name: &str) -> bool {
        self.header
            .as_ref()
            .map_or(false, |h| h.position(name).is_some())
    }

    /// Restrict and reorder declared parse-list positions to the named
    /// header columns. Requires `ignore_header(true)` to have been set.
    pub fn use_fields(&mut self, names: &[&str]) -> Result<()> {
        let header = self
            .header
            .as_ref()
            .ok_or_else(|| new_error(ErrorKind::HeaderIgnored))?;
        let mapping = ColumnMapping::from_names(header, names)?;
        self.current.set_mapping(Some(mapping.clone()));
        self.next.set_mapping(Some(mapping));
        Ok(())
    }

    /// The number of raw fields in the current record.
    pub fn current_field_count(&self) -> usize {
        self.current.raw_field_count()
    }

    /// Move to the next record. Returns `Ok(false)` at end of input.
    ///
    /// Under [`ErrorMode::Throw`] a structural failure (unterminated
    /// quote, mismatched quote, an escape dangling at end-of-input, a
    /// column-count mismatch with `flexible` off, or a multiline limit
    /// overrun) is returned as `Err`. Under [`ErrorMode::Flag`] or
    /// [`ErrorMode::Message`] the same failure instead ends the stream
    /// (`Ok(false)`), recording itself via [`Parser::failed`] or
    /// [`Parser::last_error_message`] respectively.
    pub fn advance(&mut self) -> Result<bool> {
        if self.failed {
            return Ok(false);
        }
        let outcome = self.pending.take().unwrap_or(Ok(false));
        match outcome {
            Ok(true) => {
                std::mem::swap(&mut self.current, &mut self.next);
                std::mem::swap(&mut self.current_buf, &mut self.next_buf);
                self.record_index += 1;
                if let Err(e) = self.check_arity() {
                    return self.dispatch_failure(e);
                }
                self.prime();
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => self.dispatch_failure(e),
        }
    }

    fn check_arity(&mut self) -> Result<()> {
        if self.flexible {
            return Ok(());
        }
        let n = self.current.raw_field_count();
        match self.first_field_count {
            None => {
                self.first_field_count = Some(n);
                Ok(())
            }
            Some(expected) if expected != n => {
                Err(new_error(ErrorKind::ColumnCountMismatch {
                    pos: self.position(),
                    expected,
                    got: n,
                }))
            }
            Some(_) => Ok(()),
        }
    }

    fn dispatch_failure(&mut self, e: Error) -> Result<bool> {
        match self.error_mode {
            ErrorMode::Throw => Err(e),
            ErrorMode::Message => {
                self.last_error_message = Some(e.to_string());
                self.failed = true;
                Ok(false)
            }
            ErrorMode::Flag => {
                self.failed = true;
                Ok(false)
            }
        }
    }

    /// Parse the current record as `T`.
    pub fn parse<'p, T>(&'p self) -> Result<T>
    where
        T: FromRow<'p>,
    {
        self.current
            .parse_row(&self.current_buf)
            .map_err(|e| e.with_position(self.position()))
    }

    /// Begin a composite attempt at the current record: tries the
    /// candidate row type `U` first, converting it into the eventual
    /// result type `T`. Chain further candidates with
    /// [`Composite::or_else`].
    pub fn try_next<'p, U, T>(&'p self) -> Composite<'p, 'p, T>
    where
        U: FromRow<'p> + Into<T>,
    {
        Composite::first::<U>(&self.current, &self.current_buf, self.position())
    }
}

impl Parser<BufReader<File>> {
    pub fn from_path(
        builder: &ConfigBuilder,
        path: impl AsRef<Path>,
    ) -> Result<Parser<BufReader<File>>> {
        let file = File::open(path)
            .map_err(|e| new_error(ErrorKind::SourceUnavailable(e.to_string())))?;
        Parser::new(BufReader::new(file), builder)
    }
}

impl<'d> Parser<&'d [u8]> {
    pub fn from_slice(
        builder: &ConfigBuilder,
        data: &'d [u8],
    ) -> Result<Parser<&'d [u8]>> {
        Parser::new(data, builder)
    }
}

impl<R: io::Read> Parser<BufReader<R>> {
    pub fn from_reader(
        builder: &ConfigBuilder,
        reader: R,
    ) -> Result<Parser<BufReader<R>>> {
        Parser::new(BufReader::new(reader), builder)
    }
}

fn reader_position<R>(reader: &LineReader<R>) -> Position {
    let mut pos = Position::new();
    pos.set_byte(reader.byte_pos());
    pos.set_line(reader.line_no());
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ErrorMode, Terminator};

    #[test]
    fn parses_plain_rows() {
        let builder = ConfigBuilder::new();
        let mut p = Parser::from_slice(&builder, b"1,a\n2,b\n").unwrap();
        let mut rows = Vec::new();
        while p.advance().unwrap() {
            let row: (i32, String) = p.parse().unwrap();
            rows.push(row);
        }
        assert_eq!(
            rows,
            vec![(1, "a".to_string()), (2, "b".to_string())]
        );
    }

    #[test]
    fn field_exists_checks_header_names() {
        let mut builder = ConfigBuilder::new();
        builder.ignore_header(true);
        let p = Parser::from_slice(&builder, b"id,name\n1,alice\n").unwrap();
        assert!(p.field_exists("name"));
        assert!(!p.field_exists("missing"));
    }

    #[test]
    fn field_exists_false_without_header() {
        let builder = ConfigBuilder::new();
        let p = Parser::from_slice(&builder, b"1,alice\n").unwrap();
        assert!(!p.field_exists("id"));
    }

    #[test]
    fn header_driven_use_fields_reorders_columns() {
        let mut builder = ConfigBuilder::new();
        builder.ignore_header(true);
        let mut p =
            Parser::from_slice(&builder, b"id,name\n1,alice\n2,bob\n").unwrap();
        p.use_fields(&["name", "id"]).unwrap();
        let mut rows = Vec::new();
        while p.advance().unwrap() {
            let row: (String, i32) = p.parse().unwrap();
            rows.push(row);
        }
        assert_eq!(
            rows,
            vec![
                ("alice".to_string(), 1),
                ("bob".to_string(), 2)
            ]
        );
    }

    #[test]
    fn multiline_quoted_field_spans_lines() {
        let mut builder = ConfigBuilder::new();
        builder.quote(b'"');
        let mut p =
            Parser::from_slice(&builder, b"\"a\nb\",2\n").unwrap();
        assert!(p.advance().unwrap());
        let row: (String, i32) = p.parse().unwrap();
        assert_eq!(row, ("a\nb".to_string(), 2));
        assert!(!p.advance().unwrap());
    }

    #[test]
    fn rigid_arity_rejects_ragged_rows() {
        let builder = ConfigBuilder::new();
        let mut p = Parser::from_slice(&builder, b"1,2\n3\n").unwrap();
        assert!(p.advance().unwrap());
        let err = p.advance();
        assert!(err.is_err());
    }

    #[test]
    fn flexible_allows_ragged_rows() {
        let mut builder = ConfigBuilder::new();
        builder.flexible(true);
        let mut p = Parser::from_slice(&builder, b"1,2\n3\n").unwrap();
        let mut counts = Vec::new();
        while p.advance().unwrap() {
            counts.push(p.current_field_count());
        }
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn flag_mode_stops_silently_on_unterminated_quote() {
        let mut builder = ConfigBuilder::new();
        builder.quote(b'"').error_mode(ErrorMode::Flag);
        let mut p = Parser::from_slice(&builder, b"\"unterminated\n").unwrap();
        assert!(!p.advance().unwrap());
        assert!(p.failed());
    }

    #[test]
    fn message_mode_records_a_string() {
        let mut builder = ConfigBuilder::new();
        builder.quote(b'"').error_mode(ErrorMode::Message);
        let mut p = Parser::from_slice(&builder, b"\"unterminated\n").unwrap();
        assert!(!p.advance().unwrap());
        assert!(p.last_error_message().is_some());
    }

    #[test]
    fn custom_terminator_byte() {
        let mut builder = ConfigBuilder::new();
        builder.terminator(Terminator::Any(b';'));
        let mut p = Parser::from_slice(&builder, b"1,a;2,b;").unwrap();
        let mut rows = Vec::new();
        while p.advance().unwrap() {
            let row: (i32, String) = p.parse().unwrap();
            rows.push(row);
        }
        assert_eq!(
            rows,
            vec![(1, "a".to_string()), (2, "b".to_string())]
        );
    }

    #[derive(Debug, Eq, PartialEq)]
    enum Shape {
        Wide(i32, i32, i32),
        Narrow(i32, i32),
    }

    impl From<(i32, i32, i32)> for Shape {
        fn from(t: (i32, i32, i32)) -> Shape {
            Shape::Wide(t.0, t.1, t.2)
        }
    }

    impl From<(i32, i32)> for Shape {
        fn from(t: (i32, i32)) -> Shape {
            Shape::Narrow(t.0, t.1)
        }
    }

    #[test]
    fn composite_retry_falls_back_through_candidates() {
        let mut builder = ConfigBuilder::new();
        builder.flexible(true);
        let mut p = Parser::from_slice(&builder, b"1,2\n").unwrap();
        assert!(p.advance().unwrap());
        let row: Shape = p
            .try_next::<(i32, i32, i32), Shape>()
            .or_else::<(i32, i32)>()
            .finish()
            .unwrap();
        assert_eq!(row, Shape::Narrow(1, 2));
    }
}
