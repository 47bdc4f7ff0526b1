/*!
Bare bones, allocation-light field splitting for delimited text.

This crate implements exactly one thing: given a mutable byte buffer that
holds a single logical record, slice it into field ranges according to a
configurable quoting/escaping/trimming dialect. It performs this in place,
by shifting decoded payload bytes leftward within the same buffer whenever
a quote is doubled or an escape byte is removed, so that every emitted
range still points directly into the caller's buffer.

It knows nothing about files, multiline continuation, or typed conversion;
those live in the `tabreader` crate, which uses this one as its field
splitter.
*/
#![forbid(unsafe_code)]

mod splitter;

pub use splitter::{
    trailing_escape_is_live, ByteSet, FieldRange, SplitConfig,
    SplitConfigError, SplitOutcome, Splitter,
};
