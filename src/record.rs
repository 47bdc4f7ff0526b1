use std::collections::HashMap;

use crate::error::{new_error, Error, ErrorKind, Result};

/// The column names read from a header record, together with a
/// name-to-index lookup.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Header {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    pub(crate) fn from_fields(fields: &[String]) -> Result<Header> {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, name) in fields.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(new_error(ErrorKind::DuplicateHeader {
                    name: name.clone(),
                }));
            }
        }
        Ok(Header { names: fields.to_vec(), index })
    }

    /// The column names, in the order the header declared them.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The number of columns named by this header.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The column index for a given name, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// A reordering from declared parse-list position to input column index,
/// built from [`crate::Parser::use_fields`] against a known [`Header`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ColumnMapping {
    /// `columns[i]` is the input column that fills declared position `i`.
    columns: Vec<usize>,
}

impl ColumnMapping {
    pub(crate) fn identity(count: usize) -> ColumnMapping {
        ColumnMapping { columns: (0..count).collect() }
    }

    pub(crate) fn from_names(
        header: &Header,
        names: &[&str],
    ) -> Result<ColumnMapping> {
        if names.is_empty() {
            return Err(new_error(ErrorKind::EmptyMapping));
        }
        let mut seen = HashMap::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for &name in names {
            if seen.insert(name, ()).is_some() {
                return Err(new_error(ErrorKind::RepeatedField {
                    name: name.to_string(),
                }));
            }
            let idx = header.position(name).ok_or_else(|| {
                new_error(ErrorKind::UnknownField { name: name.to_string() })
            })?;
            columns.push(idx);
        }
        Ok(ColumnMapping { columns })
    }

    /// The number of declared positions this mapping fills.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The input column index that fills declared position `i`.
    pub fn input_column(&self, i: usize) -> Option<usize> {
        self.columns.get(i).copied()
    }

    /// Check that every mapped input column index is within `columns`.
    pub fn validate_against(&self, columns: usize) -> Result<()> {
        for &idx in &self.columns {
            if idx >= columns {
                return Err(new_error(ErrorKind::MappingOutOfRange {
                    index: idx,
                    columns,
                }));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_rejects_duplicates() {
        let fields = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert!(Header::from_fields(&fields).is_err());
    }

    #[test]
    fn header_position_lookup() {
        let fields = vec!["id".to_string(), "name".to_string()];
        let header = Header::from_fields(&fields).unwrap();
        assert_eq!(header.position("name"), Some(1));
        assert_eq!(header.position("missing"), None);
    }

    #[test]
    fn mapping_from_names_reorders() {
        let fields =
            vec!["id".to_string(), "name".to_string(), "age".to_string()];
        let header = Header::from_fields(&fields).unwrap();
        let mapping =
            ColumnMapping::from_names(&header, &["name", "id"]).unwrap();
        assert_eq!(mapping.input_column(0), Some(1));
        assert_eq!(mapping.input_column(1), Some(0));
    }

    #[test]
    fn mapping_rejects_unknown_field() {
        let fields = vec!["id".to_string()];
        let header = Header::from_fields(&fields).unwrap();
        assert!(ColumnMapping::from_names(&header, &["nope"]).is_err());
    }

    #[test]
    fn mapping_rejects_repeated_field() {
        let fields = vec!["id".to_string(), "name".to_string()];
        let header = Header::from_fields(&fields).unwrap();
        assert!(ColumnMapping::from_names(&header, &["id", "id"]).is_err());
    }
}
