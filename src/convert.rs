//! Turns an already-split record into a caller's declared tuple type,
//! optionally through a header-driven column mapping, and supports
//! retrying a record against several candidate tuple types in turn.

use tabreader_core::{SplitConfig, SplitOutcome, Splitter};

use crate::error::{new_error, Error, ErrorKind, Result};
use crate::field::FromRow;
use crate::record::ColumnMapping;

/// Wraps one [`Splitter`] plus an optional column mapping. Each of the
/// two look-ahead buffers a [`crate::Parser`] keeps has its own
/// `Converter`, so the two never share splitter state.
pub(crate) struct Converter {
    splitter: Splitter,
    in_progress: bool,
    mapping: Option<ColumnMapping>,
}

impl Converter {
    pub(crate) fn new(config: SplitConfig) -> Result<Converter> {
        Ok(Converter {
            splitter: Splitter::new(config)?,
            in_progress: false,
            mapping: None,
        })
    }

    pub(crate) fn set_mapping(&mut self, mapping: Option<ColumnMapping>) {
        self.mapping = mapping;
    }

    pub(crate) fn mapping(&self) -> Option<&ColumnMapping> {
        self.mapping.as_ref()
    }

    /// Split (or resume splitting) `buf`. The first call after
    /// construction or after [`Converter::reset`] starts fresh; every
    /// call after that which followed an `UnterminatedQuote` resumes.
    pub(crate) fn split(&mut self, buf: &mut [u8]) -> SplitOutcome {
        let outcome = if self.in_progress {
            self.splitter.resume(buf)
        } else {
            self.splitter.split(buf)
        };
        self.in_progress = matches!(outcome, SplitOutcome::UnterminatedQuote);
        outcome
    }

    pub(crate) fn reset(&mut self) {
        self.in_progress = false;
    }

    pub(crate) fn raw_field_count(&self) -> usize {
        self.splitter.ranges().len()
    }

    fn raw_fields<'b>(&self, buf: &'b [u8]) -> Vec<&'b [u8]> {
        self.splitter.ranges().iter().map(|r| r.slice(buf)).collect()
    }

    /// The mapped field slices (identity order if no mapping is set) for
    /// an already-complete split.
    pub(crate) fn fields<'b>(&self, buf: &'b [u8]) -> Result<Vec<&'b [u8]>> {
        let raw = self.raw_fields(buf);
        match &self.mapping {
            None => Ok(raw),
            Some(mapping) => {
                mapping.validate_against(raw.len())?;
                Ok((0..mapping.len())
                    .map(|i| raw[mapping.input_column(i).unwrap()])
                    .collect())
            }
        }
    }

    /// Parse the current split record into `T`, via the mapped fields.
    pub(crate) fn parse_row<'b, T: FromRow<'b>>(
        &self,
        buf: &'b [u8],
    ) -> Result<T> {
        let fields = self.fields(buf)?;
        if fields.len() != T::width() {
            return Err(new_error(ErrorKind::ColumnCountMismatch {
                pos: Default::default(),
                expected: T::width(),
                got: fields.len(),
            }));
        }
        T::from_row(&fields)
    }
}

/// The result of a [`Composite`] attempt: which candidate type, if any,
/// the record parsed as.
pub struct Composite<'p, 'b, T> {
    converter: &'p Converter,
    buf: &'b [u8],
    pos: crate::error::Position,
    result: Option<Result<T>>,
}

impl<'p, 'b, T> Composite<'p, 'b, T> {
    pub(crate) fn first<U: FromRow<'b> + Into<T>>(
        converter: &'p Converter,
        buf: &'b [u8],
        pos: crate::error::Position,
    ) -> Composite<'p, 'b, T> {
        let result = converter.parse_row::<U>(buf).map(Into::into);
        Composite { converter, buf, pos, result: Some(result) }
    }

    /// If every attempt so far has failed, try `U` next.
    pub fn or_else<U: FromRow<'b> + Into<T>>(mut self) -> Self {
        if matches!(self.result, Some(Err(_))) || self.result.is_none() {
            self.result = Some(self.converter.parse_row::<U>(self.buf).map(Into::into));
        }
        self
    }

    /// Run a caller-supplied predicate over the eventually-parsed value;
    /// a `false` result becomes a [`ErrorKind::FailedCheck`] error.
    pub fn on_error(self, check: impl FnOnce(&T) -> bool) -> Result<T> {
        match self.result {
            Some(Ok(v)) => {
                if check(&v) {
                    Ok(v)
                } else {
                    Err(new_error(ErrorKind::FailedCheck { pos: self.pos }))
                }
            }
            Some(Err(e)) => Err(e.with_position(self.pos)),
            None => Err(new_error(ErrorKind::FailedCheck { pos: self.pos })),
        }
    }

    /// Finish without an extra predicate, keeping whichever candidate
    /// parsed (or the last attempt's error if none did).
    pub fn finish(self) -> Result<T> {
        match self.result {
            Some(r) => r.map_err(|e| e.with_position(self.pos)),
            None => Err(new_error(ErrorKind::FailedCheck { pos: self.pos })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabreader_core::SplitConfig;

    fn converter() -> Converter {
        Converter::new(SplitConfig::new(b",").unwrap()).unwrap()
    }

    #[test]
    fn parses_a_simple_row() {
        let mut conv = converter();
        let mut buf = b"3,4".to_vec();
        assert_eq!(conv.split(&mut buf), SplitOutcome::Complete);
        let row: (i32, i32) = conv.parse_row(&buf).unwrap();
        assert_eq!(row, (3, 4));
    }

    #[test]
    fn mapping_reorders_fields() {
        let mut conv = converter();
        conv.set_mapping(Some(ColumnMapping::from_names(
            &crate::record::Header::from_fields(&[
                "a".to_string(),
                "b".to_string(),
            ])
            .unwrap(),
            &["b", "a"],
        )
        .unwrap()));
        let mut buf = b"1,2".to_vec();
        assert_eq!(conv.split(&mut buf), SplitOutcome::Complete);
        let row: (i32, i32) = conv.parse_row(&buf).unwrap();
        assert_eq!(row, (2, 1));
    }

    #[test]
    fn column_count_mismatch_is_an_error() {
        let mut conv = converter();
        let mut buf = b"1".to_vec();
        assert_eq!(conv.split(&mut buf), SplitOutcome::Complete);
        let row: Result<(i32, i32)> = conv.parse_row(&buf);
        assert!(row.is_err());
    }
}
