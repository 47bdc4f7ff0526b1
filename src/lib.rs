/*!
A record-oriented parser for delimited text (CSV and its dialect
siblings: TSV, pipe-separated, semicolon-separated European CSV, and
custom in-house formats) with typed, validated field extraction.

```
use tabreader::{ConfigBuilder, Parser};

let mut builder = ConfigBuilder::new();
builder.quote(b'"');
let mut parser = Parser::from_slice(&builder, b"1,hello\n2,world\n").unwrap();
while parser.advance().unwrap() {
    let (id, name): (i32, String) = parser.parse().unwrap();
    println!("{} {}", id, name);
}
```

# Layout

* [`tabreader_core`] (a separate crate) splits one record's bytes into
  field ranges in place, given a quoting/escaping/trimming dialect.
* [`field`] and [`validator`] convert and validate one field at a time.
* [`convert`] assembles a whole record into a declared tuple type, and
  supports retrying a record against several candidate types.
* [`line_reader`] assembles physical lines into logical records,
  including multiline continuation.
* [`parser`] is the public facade tying the above together.
*/

mod config;
mod convert;
mod error;
mod field;
mod line_reader;
mod parser;
mod record;
mod validator;

pub use config::{ConfigBuilder, ErrorMode, MultilineLimit, Terminator};
pub use convert::Composite;
pub use error::{Error, ErrorKind, Position, Result};
pub use field::{Column, FieldParse, FromRow, Skip, Variant2, Variant3, Variant4};
pub use parser::Parser;
pub use record::{ColumnMapping, Header};
pub use validator::{
    AllExcept, GreaterOrEqual, GreaterThan, InRange, LessOrEqual, LessThan,
    NonEmpty, NoneExcept, OutOfRange, Predicate, Validator,
};
