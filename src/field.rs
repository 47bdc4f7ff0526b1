//! Typed extraction from one already-split record: the per-column parsing
//! primitives ([`FieldParse`]), the declared-position markers that make up
//! a parse list ([`Column`] and its implementors), and the glue that
//! assembles a whole row into a tuple ([`FromRow`]).

use std::str;

use crate::error::{new_error, Error, ErrorKind, Result};

/// Converts the raw bytes of a single field into a value of `Self`.
///
/// Implemented for `&str`, `String`, `bool`, the integer and float
/// primitives, and verbatim byte slices. `None` means the bytes couldn't
/// be interpreted as `Self`; the caller (a [`Column`] impl) is
/// responsible for turning that into an [`Error`] with field position
/// context attached.
pub trait FieldParse<'r>: Sized {
    fn parse_field(raw: &'r [u8]) -> Option<Self>;
}

impl<'r> FieldParse<'r> for &'r [u8] {
    fn parse_field(raw: &'r [u8]) -> Option<Self> {
        Some(raw)
    }
}

impl<'r> FieldParse<'r> for Vec<u8> {
    fn parse_field(raw: &'r [u8]) -> Option<Self> {
        Some(raw.to_vec())
    }
}

impl<'r> FieldParse<'r> for &'r str {
    fn parse_field(raw: &'r [u8]) -> Option<Self> {
        str::from_utf8(raw).ok()
    }
}

impl<'r> FieldParse<'r> for String {
    fn parse_field(raw: &'r [u8]) -> Option<Self> {
        str::from_utf8(raw).ok().map(|s| s.to_string())
    }
}

impl<'r> FieldParse<'r> for bool {
    fn parse_field(raw: &'r [u8]) -> Option<Self> {
        match raw {
            b"true" | b"1" => Some(true),
            b"false" | b"0" => Some(false),
            _ => None,
        }
    }
}

macro_rules! impl_field_parse_num {
    ($($t:ty),*) => {
        $(
            impl<'r> FieldParse<'r> for $t {
                fn parse_field(raw: &'r [u8]) -> Option<Self> {
                    str::from_utf8(raw).ok()?.trim().parse().ok()
                }
            }
        )*
    };
}

impl_field_parse_num!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);

/// `None` is produced for an empty field; `Some` wraps a successful parse
/// of a non-empty one. This is the crate's rendering of an "optional"
/// declared column: no separate marker type is needed because `Option<T>`
/// already says exactly that in ordinary Rust.
impl<'r, T: FieldParse<'r>> FieldParse<'r> for Option<T> {
    fn parse_field(raw: &'r [u8]) -> Option<Self> {
        if raw.is_empty() {
            Some(None)
        } else {
            Some(T::parse_field(raw))
        }
    }
}

/// One declared position in a parse list: knows how many consecutive
/// input columns it consumes and how to extract itself from them.
///
/// Implemented automatically for every [`FieldParse`] type (`WIDTH == 1`)
/// plus the `Skip`, `VariantN` and `AggregateN` markers below, which
/// stand in for positions a plain scalar type can't express.
pub trait Column<'r>: Sized {
    /// How many consecutive mapped input columns this position reads.
    const WIDTH: usize;

    /// Extract `Self` from `fields[start .. start + Self::WIDTH]`.
    fn extract(fields: &[&'r [u8]], start: usize) -> Result<Self>;
}

fn invalid(column: usize, raw: &[u8]) -> Error {
    new_error(ErrorKind::InvalidConversion {
        pos: Default::default(),
        column: column + 1,
        raw: raw.to_vec(),
    })
}

impl<'r, T: FieldParse<'r>> Column<'r> for T {
    const WIDTH: usize = 1;

    fn extract(fields: &[&'r [u8]], start: usize) -> Result<Self> {
        let raw = fields[start];
        T::parse_field(raw).ok_or_else(|| invalid(start, raw))
    }
}

/// A declared position whose field is read but discarded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Skip;

impl<'r> Column<'r> for Skip {
    const WIDTH: usize = 1;

    fn extract(_fields: &[&'r [u8]], _start: usize) -> Result<Self> {
        Ok(Skip)
    }
}

macro_rules! variant_enum {
    ($name:ident, $($var:ident : $t:ident),+) => {
        /// The result of a declared position that tries each of its
        /// candidate types in order and keeps the first that parses.
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub enum $name<$($t),+> {
            $($var($t)),+
        }

        impl<'r, $($t: FieldParse<'r>),+> Column<'r> for $name<$($t),+> {
            const WIDTH: usize = 1;

            #[allow(non_snake_case)]
            fn extract(fields: &[&'r [u8]], start: usize) -> Result<Self> {
                let raw = fields[start];
                $(
                    if let Some(v) = $t::parse_field(raw) {
                        return Ok($name::$var(v));
                    }
                )+
                Err(invalid(start, raw))
            }
        }
    };
}

variant_enum!(Variant2, A: A, B: B);
variant_enum!(Variant3, A: A, B: B, C: C);
variant_enum!(Variant4, A: A, B: B, C: C, D: D);

macro_rules! aggregate_tuple {
    ($width:expr, $($t:ident),+) => {
        impl<'r, $($t: FieldParse<'r>),+> Column<'r> for ($($t,)+) {
            const WIDTH: usize = $width;

            #[allow(non_snake_case, unused_assignments)]
            fn extract(fields: &[&'r [u8]], start: usize) -> Result<Self> {
                let mut i = start;
                $(
                    let raw = fields[i];
                    let $t = $t::parse_field(raw).ok_or_else(|| invalid(i, raw))?;
                    i += 1;
                )+
                Ok(($($t,)+))
            }
        }
    };
}

// A bare scalar already implements Column at WIDTH == 1 through the
// blanket FieldParse impl above. A tuple nested inside a declared row
// spans that many consecutive input columns instead — this is the
// crate's rendering of an "aggregate" position that combines several
// adjacent raw columns into one parsed unit, again using an ordinary
// Rust tuple rather than a bespoke marker type.
aggregate_tuple!(2, A, B);
aggregate_tuple!(3, A, B, C);
aggregate_tuple!(4, A, B, C, D);

/// Assembles a complete record (a slice of already-mapped raw field
/// byte-slices) into a declared tuple type `Self`, by dispatching each
/// tuple position to its [`Column`] impl in turn.
///
/// Implemented for tuples of arity 1 through 8 via macro, since Rust has
/// no variadic generics to do this once for every arity.
pub trait FromRow<'r>: Sized {
    /// The total number of input columns this row type consumes.
    fn width() -> usize;

    fn from_row(fields: &[&'r [u8]]) -> Result<Self>;
}

macro_rules! impl_from_row {
    ($($t:ident),+) => {
        impl<'r, $($t: Column<'r>),+> FromRow<'r> for ($($t,)+) {
            fn width() -> usize {
                0 $(+ $t::WIDTH)+
            }

            #[allow(non_snake_case)]
            fn from_row(fields: &[&'r [u8]]) -> Result<Self> {
                let mut start = 0usize;
                $(
                    let $t = $t::extract(fields, start)?;
                    start += $t::WIDTH;
                )+
                Ok(($($t,)+))
            }
        }
    };
}

impl_from_row!(A);
impl_from_row!(A, B);
impl_from_row!(A, B, C);
impl_from_row!(A, B, C, D);
impl_from_row!(A, B, C, D, E);
impl_from_row!(A, B, C, D, E, F);
impl_from_row!(A, B, C, D, E, F, G);
impl_from_row!(A, B, C, D, E, F, G, H);
