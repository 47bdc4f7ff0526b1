//! End-to-end scenarios against the public API, one module per scenario
//! family from the design brief.

use tabreader::{ConfigBuilder, Parser, Variant2};

#[test]
fn basic_header_then_records() {
    let mut builder = ConfigBuilder::new();
    builder.ignore_header(true);
    let mut p = Parser::from_slice(&builder, b"a,b,c\n1,2,3\n").unwrap();
    assert_eq!(p.header().unwrap().names(), &["a", "b", "c"]);

    assert!(p.advance().unwrap());
    let row: (String, String, String) = p.parse().unwrap();
    assert_eq!(row, ("1".to_string(), "2".to_string(), "3".to_string()));

    assert!(!p.advance().unwrap());
}

#[test]
fn quoted_field_with_internal_delimiter() {
    let mut builder = ConfigBuilder::new();
    builder.quote(b'"');
    let mut p = Parser::from_slice(&builder, b"\"x,y\",z\n").unwrap();
    assert!(p.advance().unwrap());
    let row: (String, String) = p.parse().unwrap();
    assert_eq!(row, ("x,y".to_string(), "z".to_string()));
}

#[test]
fn escaped_delimiter() {
    let mut builder = ConfigBuilder::new();
    builder.escape(b'\\');
    let mut p = Parser::from_slice(&builder, b"a\\,b,c\n").unwrap();
    assert!(p.advance().unwrap());
    let row: (String, String) = p.parse().unwrap();
    assert_eq!(row, ("a,b".to_string(), "c".to_string()));
}

#[test]
fn multiline_quoted_field() {
    let mut builder = ConfigBuilder::new();
    builder.quote(b'"');
    let mut p = Parser::from_slice(&builder, b"\"line1\nline2\",x\n").unwrap();
    assert!(p.advance().unwrap());
    let row: (String, String) = p.parse().unwrap();
    assert_eq!(row, ("line1\nline2".to_string(), "x".to_string()));
}

#[test]
fn variant_fallback_picks_first_parseable_candidate() {
    let builder = ConfigBuilder::new();
    let mut p = Parser::from_slice(&builder, b"5\n5.5\n").unwrap();

    assert!(p.advance().unwrap());
    let (first,): (Variant2<i64, f64>,) = p.parse().unwrap();
    assert_eq!(first, Variant2::A(5));

    assert!(p.advance().unwrap());
    let (second,): (Variant2<i64, f64>,) = p.parse().unwrap();
    assert_eq!(second, Variant2::B(5.5));
}

#[test]
fn use_fields_reorders_by_header_name() {
    let mut builder = ConfigBuilder::new();
    builder.ignore_header(true);
    let mut p = Parser::from_slice(&builder, b"x,y,z\n1,2,3\n").unwrap();
    p.use_fields(&["z", "x"]).unwrap();

    assert!(p.advance().unwrap());
    let row: (i32, i32) = p.parse().unwrap();
    assert_eq!(row, (3, 1));
}
