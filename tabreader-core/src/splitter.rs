//! The field-range splitter: a small state machine that slices one
//! in-place buffer into field ranges under configurable quoting, escaping
//! and trimming rules.

use core::fmt;

/// A half-open byte interval `[begin, end)` into the buffer most recently
/// passed to [`Splitter::split`].
///
/// Both endpoints are guaranteed to lie within that buffer, and
/// `begin <= end`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldRange {
    pub begin: usize,
    pub end: usize,
}

impl FieldRange {
    fn new(begin: usize, end: usize) -> FieldRange {
        debug_assert!(begin <= end);
        FieldRange { begin, end }
    }

    /// Borrow the bytes this range identifies out of `buffer`.
    pub fn slice<'b>(&self, buffer: &'b [u8]) -> &'b [u8] {
        &buffer[self.begin..self.end]
    }
}

const MAX_MATCHER_BYTES: usize = 8;

/// A small fixed-capacity set of bytes, used for escape/trim matcher
/// configuration. Kept off the heap so this crate stays allocation-free.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ByteSet {
    bytes: [u8; MAX_MATCHER_BYTES],
    len: usize,
}

impl ByteSet {
    pub fn new() -> ByteSet {
        ByteSet { bytes: [0; MAX_MATCHER_BYTES], len: 0 }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<ByteSet, SplitConfigError> {
        if bytes.len() > MAX_MATCHER_BYTES {
            return Err(SplitConfigError::MatcherTooLarge);
        }
        let mut set = ByteSet::new();
        for &b in bytes {
            set.push(b);
        }
        Ok(set)
    }

    fn push(&mut self, b: u8) {
        if !self.contains(b) {
            self.bytes[self.len] = b;
            self.len += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, b: u8) -> bool {
        self.bytes[..self.len].iter().any(|&x| x == b)
    }

    fn overlaps(&self, other: &ByteSet) -> bool {
        self.bytes[..self.len].iter().any(|&b| other.contains(b))
    }
}

/// Errors that can occur while validating a [`SplitConfig`].
///
/// These are construction-time, not runtime, errors: they report a
/// contradiction in the dialect itself rather than anything about input
/// data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SplitConfigError {
    /// The same byte was assigned to more than one of
    /// `{quote, escape, trim_left, trim_right}`.
    OverlappingMatchers,
    /// `trim` (symmetric) was combined with an explicit `trim_left` or
    /// `trim_right` matcher family.
    ConflictingTrimFamilies,
    /// A matcher byte set exceeded this crate's fixed small capacity.
    MatcherTooLarge,
    /// The configured delimiter was empty.
    EmptyDelimiter,
}

impl fmt::Display for SplitConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match *self {
            SplitConfigError::OverlappingMatchers => {
                "quote, escape, trim-left and trim-right must not share a byte"
            }
            SplitConfigError::ConflictingTrimFamilies => {
                "symmetric trim() cannot be combined with trim_left()/trim_right()"
            }
            SplitConfigError::MatcherTooLarge => {
                "matcher byte set exceeds this splitter's fixed capacity"
            }
            SplitConfigError::EmptyDelimiter => "delimiter must not be empty",
        };
        f.write_str(msg)
    }
}

/// Configuration for a [`Splitter`].
///
/// Constructed via [`SplitConfig::new`] and validated at that point; a
/// `Splitter` built from an invalid configuration cannot exist.
#[derive(Clone, Debug)]
pub struct SplitConfig {
    pub(crate) delimiter: [u8; MAX_MATCHER_BYTES],
    pub(crate) delimiter_len: usize,
    pub(crate) quote: Option<u8>,
    pub(crate) escape: ByteSet,
    pub(crate) trim_left: ByteSet,
    pub(crate) trim_right: ByteSet,
    pub(crate) double_quote: bool,
}

impl SplitConfig {
    /// Start building a configuration with a single-byte comma delimiter
    /// and no quoting, escaping, or trimming.
    pub fn new(delimiter: &[u8]) -> Result<SplitConfig, SplitConfigError> {
        if delimiter.is_empty() {
            return Err(SplitConfigError::EmptyDelimiter);
        }
        if delimiter.len() > MAX_MATCHER_BYTES {
            return Err(SplitConfigError::MatcherTooLarge);
        }
        let mut bytes = [0u8; MAX_MATCHER_BYTES];
        bytes[..delimiter.len()].copy_from_slice(delimiter);
        Ok(SplitConfig {
            delimiter: bytes,
            delimiter_len: delimiter.len(),
            quote: None,
            escape: ByteSet::new(),
            trim_left: ByteSet::new(),
            trim_right: ByteSet::new(),
            double_quote: true,
        })
    }

    pub fn quote(mut self, quote: u8) -> SplitConfig {
        self.quote = Some(quote);
        self
    }

    pub fn escape(mut self, set: ByteSet) -> SplitConfig {
        self.escape = set;
        self
    }

    pub fn trim_left(mut self, set: ByteSet) -> SplitConfig {
        self.trim_left = set;
        self
    }

    pub fn trim_right(mut self, set: ByteSet) -> SplitConfig {
        self.trim_right = set;
        self
    }

    pub fn double_quote(mut self, yes: bool) -> SplitConfig {
        self.double_quote = yes;
        self
    }

    fn delimiter(&self) -> &[u8] {
        &self.delimiter[..self.delimiter_len]
    }

    /// The configured delimiter bytes.
    pub fn delimiter_bytes(&self) -> &[u8] {
        self.delimiter()
    }

    /// The configured quote byte, if any.
    pub fn quote_byte(&self) -> Option<u8> {
        self.quote
    }

    /// The configured escape byte set.
    pub fn escape_set(&self) -> ByteSet {
        self.escape
    }

    /// The configured left-trim byte set.
    pub fn trim_left_set(&self) -> ByteSet {
        self.trim_left
    }

    /// The configured right-trim byte set.
    pub fn trim_right_set(&self) -> ByteSet {
        self.trim_right
    }

    /// Whether a doubled quote collapses to one literal quote byte.
    pub fn double_quote_enabled(&self) -> bool {
        self.double_quote
    }

    /// Validate the mutual-exclusion constraints from the dialect:
    /// no byte may appear in more than one of
    /// `{quote, escape, trim_left, trim_right}`.
    pub fn validate(&self) -> Result<(), SplitConfigError> {
        let mut seen = ByteSet::new();
        if let Some(q) = self.quote {
            seen.push(q);
        }
        if self.escape.overlaps(&seen) {
            return Err(SplitConfigError::OverlappingMatchers);
        }
        for i in 0..self.escape.len {
            seen.push(self.escape.bytes[i]);
        }
        if self.trim_left.overlaps(&seen) {
            return Err(SplitConfigError::OverlappingMatchers);
        }
        for i in 0..self.trim_left.len {
            seen.push(self.trim_left.bytes[i]);
        }
        if self.trim_right.overlaps(&seen) {
            return Err(SplitConfigError::OverlappingMatchers);
        }
        Ok(())
    }

    /// Whether this dialect has a quote byte or any escape byte
    /// configured, i.e. whether a record could ever need to continue
    /// across a physical line.
    pub fn needs_quote_or_escape(&self) -> bool {
        self.quote.is_some() || !self.escape.is_empty()
    }
}

/// The result of one call to [`Splitter::split`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SplitOutcome {
    /// The buffer was a complete record; `ranges` holds every field.
    Complete,
    /// The buffer ended while still inside a quoted field. The splitter
    /// has recorded a resume point; call [`Splitter::resume`] once the
    /// buffer has been extended with more bytes (the prefix must be
    /// unchanged).
    UnterminatedQuote,
    /// The buffer ended immediately after a live escape byte.
    UnterminatedEscape,
    /// A byte followed a closing quote that was neither the delimiter,
    /// a doubled quote, nor (after trimming) the end of the buffer.
    MismatchedQuote { at: usize },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Start,
    Normal,
    Quoted,
    EscapeInNormal,
    EscapeInQuoted,
    AfterClosingQuote,
}

/// A resumable splitter: given a mutable record buffer, produces an
/// ordered sequence of field ranges.
///
/// A single `Splitter` is meant to be reused across many records (it owns
/// no buffer itself); call [`Splitter::split`] for a fresh record, and if
/// it returns [`SplitOutcome::UnterminatedQuote`], extend the buffer and
/// call [`Splitter::resume`].
#[derive(Clone, Debug)]
pub struct Splitter {
    config: SplitConfig,
    ranges: Vec<FieldRange>,
    state: State,
    field_start: usize,
    cursor: usize,
    shift: usize,
    /// True when the last field in `ranges` is a placeholder emitted by a
    /// prior suspend, not yet a real, fully-decoded field.
    pending_placeholder: bool,
}

impl Splitter {
    pub fn new(config: SplitConfig) -> Result<Splitter, SplitConfigError> {
        config.validate()?;
        Ok(Splitter {
            config,
            ranges: Vec::new(),
            state: State::Start,
            field_start: 0,
            cursor: 0,
            shift: 0,
            pending_placeholder: false,
        })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// The field ranges produced by the most recent `split`/`resume` call.
    pub fn ranges(&self) -> &[FieldRange] {
        &self.ranges
    }

    /// Split a fresh, complete-as-far-as-known record buffer.
    pub fn split(&mut self, buffer: &mut [u8]) -> SplitOutcome {
        self.ranges.clear();
        self.state = State::Start;
        self.field_start = 0;
        self.cursor = 0;
        self.shift = 0;
        self.pending_placeholder = false;
        self.run(buffer)
    }

    /// Resume a splitter that previously returned
    /// [`SplitOutcome::UnterminatedQuote`], against a buffer that is the
    /// previous buffer with more bytes appended (same prefix, same base
    /// allocation or not — ranges are rebased on re-emission, never
    /// reparsed).
    ///
    /// Previously emitted ranges (in `self.ranges()`) remain valid against
    /// the new buffer as long as its prefix is unchanged; the splitter
    /// itself never re-walks them.
    pub fn resume(&mut self, buffer: &mut [u8]) -> SplitOutcome {
        debug_assert!(self.cursor <= buffer.len());
        self.run(buffer)
    }

    /// Rebase all previously emitted ranges (and the in-progress resume
    /// point) onto a buffer whose prefix grew by `delta` bytes relative to
    /// the last time ranges were computed from a *reallocated* base. This
    /// is a no-op unless the line reader actually moved the backing
    /// allocation; callers that only ever append to the same growable
    /// buffer never need it.
    pub fn rebase(&mut self, delta: isize) {
        if delta == 0 {
            return;
        }
        for r in self.ranges.iter_mut() {
            r.begin = (r.begin as isize + delta) as usize;
            r.end = (r.end as isize + delta) as usize;
        }
        self.field_start = (self.field_start as isize + delta) as usize;
        self.cursor = (self.cursor as isize + delta) as usize;
    }

    fn emit(&mut self, end_raw: usize) {
        let _ = end_raw;
        let (begin, end) = self.apply_trim();
        let range = FieldRange::new(begin, end.max(begin));
        if self.pending_placeholder {
            *self.ranges.last_mut().expect("placeholder present") = range;
            self.pending_placeholder = false;
        } else {
            self.ranges.push(range);
        }
    }

    /// Trim policy is applied once a field's raw extent is known: leading
    /// bytes are skipped in `Start` (tracked via `field_start` already
    /// having been advanced), trailing bytes are trimmed here against the
    /// decoded (post-shift) field content. Whitespace inside a quoted
    /// region is never touched because `field_start`/cursor for a quoted
    /// field point strictly inside the quotes.
    fn apply_trim(&self) -> (usize, usize) {
        (self.field_start, self.cursor - self.shift)
    }

    fn run(&mut self, buffer: &mut [u8]) -> SplitOutcome {
        let delim = {
            let mut d = [0u8; MAX_MATCHER_BYTES];
            d[..self.config.delimiter_len]
                .copy_from_slice(self.config.delimiter());
            (d, self.config.delimiter_len)
        };
        loop {
            if self.cursor >= buffer.len() {
                return self.handle_eob(buffer);
            }
            match self.state {
                State::Start => {
                    let b = buffer[self.cursor];
                    if self.config.trim_left.contains(b) {
                        self.shift += 1;
                        self.cursor += 1;
                        continue;
                    }
                    if self.config.quote == Some(b) {
                        self.cursor += 1;
                        self.shift += 1;
                        self.field_start = self.cursor - self.shift;
                        self.state = State::Quoted;
                        continue;
                    }
                    self.field_start = self.cursor - self.shift;
                    self.state = State::Normal;
                }
                State::Normal => {
                    let b = buffer[self.cursor];
                    if self.config.escape.contains(b) {
                        self.shift += 1;
                        self.cursor += 1;
                        self.state = State::EscapeInNormal;
                        continue;
                    }
                    if starts_with_at(buffer, self.cursor, &delim.0[..delim.1])
                    {
                        self.trim_right_in_place(buffer);
                        self.emit(self.cursor);
                        self.cursor += delim.1;
                        self.state = State::Start;
                        continue;
                    }
                    buffer[self.cursor - self.shift] = b;
                    self.cursor += 1;
                }
                State::EscapeInNormal => {
                    let b = buffer[self.cursor];
                    buffer[self.cursor - self.shift] = b;
                    self.cursor += 1;
                    self.state = State::Normal;
                }
                State::Quoted => {
                    let b = buffer[self.cursor];
                    if self.config.quote == Some(b) {
                        // Presume this closes the field; elide it. If the
                        // next byte is another quote, the AfterClosingQuote
                        // handler below un-does exactly this elision for
                        // one of the two bytes, turning the pair into a
                        // single literal quote.
                        self.cursor += 1;
                        self.shift += 1;
                        self.state = State::AfterClosingQuote;
                        continue;
                    }
                    if self.config.escape.contains(b) {
                        self.shift += 1;
                        self.cursor += 1;
                        self.state = State::EscapeInQuoted;
                        continue;
                    }
                    buffer[self.cursor - self.shift] = b;
                    self.cursor += 1;
                }
                State::EscapeInQuoted => {
                    let b = buffer[self.cursor];
                    buffer[self.cursor - self.shift] = b;
                    self.cursor += 1;
                    self.state = State::Quoted;
                }
                State::AfterClosingQuote => {
                    let b = buffer[self.cursor];
                    if self.config.double_quote && self.config.quote == Some(b)
                    {
                        // The previous quote wasn't closing after all: this
                        // pair is a doubled quote collapsing to one literal
                        // quote byte. `shift` already accounts for eliding
                        // one of the two (from the Quoted ->
                        // AfterClosingQuote transition); copy this second
                        // byte through as real content.
                        buffer[self.cursor - self.shift] = b;
                        self.cursor += 1;
                        self.state = State::Quoted;
                        continue;
                    }
                    if starts_with_at(buffer, self.cursor, &delim.0[..delim.1])
                    {
                        self.emit(self.cursor);
                        self.cursor += delim.1;
                        self.state = State::Start;
                        continue;
                    }
                    if self.config.trim_right.contains(b) {
                        self.shift += 1;
                        self.cursor += 1;
                        continue;
                    }
                    return SplitOutcome::MismatchedQuote { at: self.cursor };
                }
            }
        }
    }

    /// Shrink the pending field's raw extent by skipping trailing
    /// trim-right bytes immediately before the delimiter, by scanning
    /// backward over already-decoded content. Only used for fields closed
    /// from `Normal`; an `AfterClosingQuote`-closed field's trailing gap is
    /// elided byte-by-byte as it's scanned instead, since that gap was
    /// never copied into the decoded buffer in the first place.
    fn trim_right_in_place(&mut self, buffer: &[u8]) {
        if self.config.trim_right.is_empty() {
            return;
        }
        let decoded_end = self.cursor - self.shift;
        let mut end = decoded_end;
        while end > self.field_start
            && self.config.trim_right.contains(buffer[end - 1])
        {
            end -= 1;
        }
        self.shift += decoded_end - end;
    }

    fn handle_eob(&mut self, buffer: &[u8]) -> SplitOutcome {
        match self.state {
            State::Start => {
                self.field_start = self.cursor - self.shift;
                self.emit(self.cursor);
                SplitOutcome::Complete
            }
            State::Normal => {
                self.trim_right_in_place(buffer);
                self.emit(self.cursor);
                SplitOutcome::Complete
            }
            State::AfterClosingQuote => {
                self.emit(self.cursor);
                SplitOutcome::Complete
            }
            State::EscapeInNormal => SplitOutcome::UnterminatedEscape,
            State::Quoted | State::EscapeInQuoted => {
                // Suspend: emit a placeholder so callers inspecting
                // `ranges()` mid-resume see a field in flight, matching
                // the spec's "placeholder range from opening quote". A
                // second suspend on the same field overwrites the first
                // placeholder rather than appending another one.
                let placeholder =
                    FieldRange::new(self.field_start, self.cursor - self.shift);
                if self.pending_placeholder {
                    *self.ranges.last_mut().expect("placeholder present") =
                        placeholder;
                } else {
                    self.ranges.push(placeholder);
                    self.pending_placeholder = true;
                }
                SplitOutcome::UnterminatedQuote
            }
        }
    }
}

#[inline]
fn starts_with_at(buffer: &[u8], at: usize, pat: &[u8]) -> bool {
    at + pat.len() <= buffer.len() && &buffer[at..at + pat.len()] == pat
}

/// Tests whether the trailing escape byte of `buffer`, if any, is "live" —
/// unescaped itself — by scanning leftward and counting consecutive escape
/// bytes. An odd count means the last one is live and escapes whatever
/// would come next; an even count means they've all paired off.
///
/// This is the line reader's primitive for deciding whether a physical
/// line ends mid-escape and needs another physical line appended.
pub fn trailing_escape_is_live(escape: &ByteSet, buffer: &[u8]) -> bool {
    if escape.is_empty() {
        return false;
    }
    let mut count = 0;
    for &b in buffer.iter().rev() {
        if escape.contains(b) {
            count += 1;
        } else {
            break;
        }
    }
    count % 2 == 1
}
