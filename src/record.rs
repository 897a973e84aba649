use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// One decoded data row.
///
/// The header list is shared with every other record of the same stream;
/// a record only owns its values. Rows shorter than the header list simply
/// have no value for the trailing columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    pub(crate) fn new(headers: Arc<[String]>, values: Vec<String>) -> Self {
        debug_assert!(values.len() <= headers.len());
        Self { headers, values }
    }

    /// Value of `column`, or `None` when the column is unknown or the row
    /// stopped short of it.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.values.get(idx).map(String::as_str)
    }

    /// `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
