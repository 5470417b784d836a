pub mod error;
pub mod output;
pub mod parse;
pub mod write;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Named string columns as read from, or written to, a text file.
///
/// Columns are stored column-major. A table read from a file may be ragged
/// when some data rows were short; the writer refuses ragged tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub columns: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>, columns: Vec<Vec<String>>) -> Self {
        Table { header, columns }
    }

    /// The `([], [])` shape the legacy reader returns on failure.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.columns.is_empty()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Length of the longest column.
    pub fn num_rows(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_rectangular(&self) -> bool {
        match self.columns.split_first() {
            Some((first, rest)) => rest.iter().all(|c| c.len() == first.len()),
            None => true,
        }
    }

    /// Position of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.column_index(name)
            .and_then(|i| self.columns.get(i))
            .map(Vec::as_slice)
    }

    /// Cells of row `row_idx`, with an empty string where a column is short.
    pub fn row(&self, row_idx: usize) -> Vec<&str> {
        self.columns
            .iter()
            .map(|col| col.get(row_idx).map_or("", String::as_str))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.num_rows()).map(move |i| self.row(i))
    }

    /// Name of column `col_idx`, falling back to its position.
    pub fn column_name(&self, col_idx: usize) -> String {
        self.header
            .get(col_idx)
            .cloned()
            .unwrap_or_else(|| col_idx.to_string())
    }

    /// Keeps only the named columns, in the order given.
    pub fn select(&self, names: &[String]) -> Option<Table> {
        let mut header = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let idx = self.column_index(name)?;
            header.push(self.header[idx].clone());
            columns.push(self.columns[idx].clone());
        }
        Some(Table { header, columns })
    }
}

pub(crate) fn duplicate_name(header: &[String]) -> Option<&str> {
    header
        .iter()
        .enumerate()
        .find(|(i, name)| header[..*i].contains(*name))
        .map(|(_, name)| name.as_str())
}

// Serializes as an ordered map of column name to values. Repeated names
// collapse onto the last column when read back by a JSON parser.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (i, col) in self.columns.iter().enumerate() {
            map.serialize_entry(&self.column_name(i), col)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
    Csv,
}
