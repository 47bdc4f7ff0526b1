//! Exercises the invariants from the design brief's testable-properties
//! list against the public API and the splitter directly.

use tabreader::{ColumnMapping, ConfigBuilder, Header, Parser};
use tabreader_core::{SplitConfig, SplitOutcome, Splitter};

#[test]
fn split_count_matches_delimiter_count_outside_quotes() {
    let mut sp = Splitter::new(SplitConfig::new(b",").unwrap().quote(b'"')).unwrap();
    let mut buf = b"\"a,b\",c,d".to_vec();
    assert_eq!(sp.split(&mut buf), SplitOutcome::Complete);
    assert_eq!(sp.ranges().len(), 3);
}

#[test]
fn round_trip_on_uncomplicated_ascii_tokens() {
    let mut sp = Splitter::new(SplitConfig::new(b",").unwrap()).unwrap();
    let mut buf = b"aa,bb,cc".to_vec();
    let snapshot = buf.clone();
    assert_eq!(sp.split(&mut buf), SplitOutcome::Complete);
    let fields: Vec<&[u8]> =
        sp.ranges().iter().map(|r| r.slice(&buf)).collect();
    let joined = fields.join(&b','[..]);
    assert_eq!(joined, snapshot);
}

#[test]
fn double_quote_idempotence_regardless_of_trim() {
    use tabreader_core::ByteSet;
    let set = ByteSet::from_bytes(b" ").unwrap();
    let mut sp = Splitter::new(
        SplitConfig::new(b",")
            .unwrap()
            .quote(b'"')
            .trim_left(set)
            .trim_right(set),
    )
    .unwrap();
    let mut buf = b"\"x\"\"y\"".to_vec();
    assert_eq!(sp.split(&mut buf), SplitOutcome::Complete);
    assert_eq!(sp.ranges()[0].slice(&buf), b"x\"y");
}

#[test]
fn arity_mismatch_without_mapping_is_an_error() {
    let builder = ConfigBuilder::new();
    let mut p = Parser::from_slice(&builder, b"1,2,3\n4,5\n").unwrap();
    assert!(p.advance().unwrap());
    assert!(p.advance().is_err());
}

#[test]
fn optional_absorbs_an_empty_field() {
    let builder = ConfigBuilder::new();
    let mut p = Parser::from_slice(&builder, b",5\n").unwrap();
    assert!(p.advance().unwrap());
    let row: (Option<i32>, i32) = p.parse().unwrap();
    assert_eq!(row, (None, 5));
}

#[test]
fn resume_matches_parsing_the_assembled_buffer_from_scratch() {
    let config = SplitConfig::new(b",").unwrap().quote(b'"');
    let mut incremental = Splitter::new(config.clone()).unwrap();
    let mut buf1 = b"\"ab".to_vec();
    assert_eq!(
        incremental.split(&mut buf1),
        SplitOutcome::UnterminatedQuote
    );
    let mut buf2 = b"\"ab\ncd\",e".to_vec();
    assert_eq!(incremental.resume(&mut buf2), SplitOutcome::Complete);

    let mut from_scratch = Splitter::new(config).unwrap();
    let mut whole = b"\"ab\ncd\",e".to_vec();
    assert_eq!(from_scratch.split(&mut whole), SplitOutcome::Complete);

    assert_eq!(incremental.ranges().len(), from_scratch.ranges().len());
}

#[test]
fn mapping_out_of_range_is_rejected() {
    let header =
        Header::from_fields(&["a".to_string(), "b".to_string()]).unwrap();
    let mapping = ColumnMapping::from_names(&header, &["a", "b"]).unwrap();
    assert!(mapping.validate_against(2).is_ok());
    assert!(mapping.validate_against(1).is_err());
}
