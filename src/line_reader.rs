//! Physical-line assembly: turns a byte stream into successive logical
//! lines, normalizing end-of-line bytes and folding escaped line breaks
//! into the line they continue. Knows nothing about quoting or field
//! splitting; [`crate::parser::Parser`] drives quote-based continuation
//! by running its own splitter against the bytes this module hands back.

use std::io::{self, BufRead};

use tabreader_core::{trailing_escape_is_live, ByteSet};

use crate::config::Terminator;
use crate::error::Result;

pub(crate) struct LineReader<R> {
    source: R,
    terminator: Terminator,
    escape: ByteSet,
    ignore_empty_lines: bool,
    last_terminator: Vec<u8>,
    byte_pos: u64,
    line_no: u64,
    eof: bool,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(
        source: R,
        terminator: Terminator,
        escape: ByteSet,
        ignore_empty_lines: bool,
    ) -> LineReader<R> {
        LineReader {
            source,
            terminator,
            escape,
            ignore_empty_lines,
            last_terminator: Vec::new(),
            byte_pos: 0,
            line_no: 0,
            eof: false,
        }
    }

    pub(crate) fn byte_pos(&self) -> u64 {
        self.byte_pos
    }

    pub(crate) fn line_no(&self) -> u64 {
        self.line_no
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.eof
    }

    /// Clear `buf` and read physical lines into it until a non-empty one
    /// is found (or `ignore_empty_lines` is off, in which case the first
    /// physical line is used regardless) and no live trailing escape
    /// remains. Returns `false` at end-of-input with `buf` left empty.
    pub(crate) fn begin_record(&mut self, buf: &mut Vec<u8>) -> Result<bool> {
        loop {
            buf.clear();
            if !self.read_physical_line(buf)? {
                return Ok(false);
            }
            if self.ignore_empty_lines && buf.is_empty() {
                continue;
            }
            self.resolve_escape_continuation(buf)?;
            return Ok(true);
        }
    }

    /// Reinsert the terminator stripped from the previous physical line,
    /// append the next physical line, and resolve any further escape
    /// continuation. Returns `false` if end-of-input was reached with
    /// nothing more to append.
    pub(crate) fn continue_record(&mut self, buf: &mut Vec<u8>) -> Result<bool> {
        buf.extend_from_slice(&self.last_terminator);
        if !self.read_physical_line(buf)? {
            return Ok(false);
        }
        self.resolve_escape_continuation(buf)?;
        Ok(true)
    }

    fn resolve_escape_continuation(&mut self, buf: &mut Vec<u8>) -> Result<bool> {
        let mut extended = false;
        while trailing_escape_is_live(&self.escape, buf) {
            buf.extend_from_slice(&self.last_terminator);
            if !self.read_physical_line(buf)? {
                return Ok(extended);
            }
            extended = true;
        }
        Ok(extended)
    }

    fn read_physical_line(&mut self, buf: &mut Vec<u8>) -> Result<bool> {
        let n = match self.terminator {
            Terminator::Any(b) => self.source.read_until(b, buf)?,
            Terminator::CRLF => self.read_until_any_eol(buf)?,
        };
        self.byte_pos += n as u64;
        if n == 0 {
            self.eof = true;
            self.last_terminator.clear();
            return Ok(false);
        }
        self.line_no += 1;
        self.strip_terminator(buf);
        Ok(true)
    }

    fn read_until_any_eol(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let mut total = 0usize;
        loop {
            let available = match self.source.fill_buf() {
                Ok(b) => b,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                    continue
                }
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(total);
            }
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(pos) => {
                    let term = available[pos];
                    buf.extend_from_slice(&available[..=pos]);
                    let consumed = pos + 1;
                    total += consumed;
                    self.source.consume(consumed);
                    if term == b'\r' {
                        let next_is_lf = self
                            .source
                            .fill_buf()
                            .map(|b| b.first() == Some(&b'\n'))
                            .unwrap_or(false);
                        if next_is_lf {
                            buf.push(b'\n');
                            self.source.consume(1);
                            total += 1;
                        }
                    }
                    return Ok(total);
                }
                None => {
                    let n = available.len();
                    buf.extend_from_slice(available);
                    self.source.consume(n);
                    total += n;
                }
            }
        }
    }

    /// Remove a trailing CRLF/CR/LF (or single configured terminator
    /// byte) from `buf`, remembering the exact bytes removed so a
    /// subsequent continuation can put them back verbatim.
    fn strip_terminator(&mut self, buf: &mut Vec<u8>) {
        self.last_terminator.clear();
        match self.terminator {
            Terminator::Any(b) => {
                if buf.last() == Some(&b) {
                    buf.pop();
                    self.last_terminator.push(b);
                }
            }
            Terminator::CRLF => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    self.last_terminator.push(b'\n');
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                        self.last_terminator.insert(0, b'\r');
                    }
                } else if buf.last() == Some(&b'\r') {
                    buf.pop();
                    self.last_terminator.push(b'\r');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &str) -> LineReader<&[u8]> {
        LineReader::new(
            data.as_bytes(),
            Terminator::CRLF,
            ByteSet::new(),
            false,
        )
    }

    #[test]
    fn splits_on_lf() {
        let mut r = reader("a\nb\n");
        let mut buf = Vec::new();
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"a");
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"b");
        assert!(!r.begin_record(&mut buf).unwrap());
    }

    #[test]
    fn normalizes_crlf_and_bare_cr() {
        let mut r = reader("a\r\nb\rc\n");
        let mut buf = Vec::new();
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"a");
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"b");
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"c");
    }

    #[test]
    fn last_line_without_terminator_is_read() {
        let mut r = reader("a\nb");
        let mut buf = Vec::new();
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"a");
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"b");
        assert!(!r.begin_record(&mut buf).unwrap());
    }

    #[test]
    fn ignore_empty_lines_skips_blank_physical_lines() {
        let mut r = LineReader::new(
            "a\n\n\nb\n".as_bytes(),
            Terminator::CRLF,
            ByteSet::new(),
            true,
        );
        let mut buf = Vec::new();
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"a");
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"b");
    }

    #[test]
    fn escape_continuation_joins_physical_lines() {
        let escape = ByteSet::from_bytes(b"\\").unwrap();
        let mut r =
            LineReader::new("a\\\nb\n".as_bytes(), Terminator::CRLF, escape, false);
        let mut buf = Vec::new();
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"a\\\nb");
    }

    #[test]
    fn continue_record_reinserts_terminator() {
        let mut r = reader("abc\ndef\n");
        let mut buf = Vec::new();
        assert!(r.begin_record(&mut buf).unwrap());
        assert_eq!(buf, b"abc");
        assert!(r.continue_record(&mut buf).unwrap());
        assert_eq!(buf, b"abc\ndef");
    }
}
