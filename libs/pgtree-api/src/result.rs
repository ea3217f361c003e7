use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Wire encoding of the cells of one result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    #[default]
    Text,
    Binary,
}

impl std::fmt::Display for DecodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeMode::Text => write!(f, "text"),
            DecodeMode::Binary => write!(f, "binary"),
        }
    }
}

/// One result column. Position in `ResultSet::columns` is the output field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Type OID reported by the server.
    pub type_id: u32,
    /// As reported by the transport; the marshaler reports the registry's flag.
    #[serde(default)]
    pub is_array_type: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_id: u32) -> Self {
        Self {
            name: name.into(),
            type_id,
            is_array_type: false,
        }
    }
}

/// Raw cell bytes, borrowed from the transport for the duration of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCell<'r> {
    pub bytes: &'r [u8],
    pub is_null: bool,
}

impl<'r> RawCell<'r> {
    pub fn value(bytes: &'r [u8]) -> Self {
        Self { bytes, is_null: false }
    }

    /// Shortcut for text-mode cells.
    pub fn text(text: &'r str) -> Self {
        Self::value(text.as_bytes())
    }

    pub fn null() -> Self {
        Self { bytes: &[], is_null: true }
    }
}

impl<'r> From<Option<&'r [u8]>> for RawCell<'r> {
    fn from(bytes: Option<&'r [u8]>) -> Self {
        bytes.map_or_else(RawCell::null, RawCell::value)
    }
}

/// Read-only input to the marshaler: column metadata plus rows of raw cells.
///
/// Every row holds exactly one cell per column, checked on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet<'r> {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<RawCell<'r>>>,
}

impl<'r> ResultSet<'r> {
    pub fn new(
        columns: Vec<ColumnDescriptor>,
        rows: Vec<Vec<RawCell<'r>>>,
    ) -> Result<Self, DecodeError> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(DecodeError::shape(format!(
                "row {index} has {} cells, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<RawCell<'r>>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total raw payload size; used to pre-size the arena.
    pub fn payload_bytes(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .map(|cell| cell.bytes.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn rejects_ragged_rows() {
        let columns = vec![ColumnDescriptor::new("a", 23), ColumnDescriptor::new("b", 25)];
        let rows = vec![
            vec![RawCell::text("1"), RawCell::text("x")],
            vec![RawCell::text("2")],
        ];
        let err = ResultSet::new(columns, rows).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert!(err.message().contains("row 1"));
    }

    #[test]
    fn cells_from_options() {
        let bytes: &[u8] = b"42";
        assert_eq!(RawCell::from(Some(bytes)), RawCell::value(b"42"));
        assert!(RawCell::from(None::<&[u8]>).is_null);
    }

    #[test]
    fn payload_counts_cell_bytes() {
        let set = ResultSet::new(
            vec![ColumnDescriptor::new("t", 25)],
            vec![vec![RawCell::text("abc")], vec![RawCell::null()]],
        )
        .unwrap();
        assert_eq!(set.row_count(), 2);
        assert_eq!(set.payload_bytes(), 3);
    }

    #[test]
    fn mode_uses_snake_case() {
        let mode: DecodeMode = serde_json::from_str("\"binary\"").unwrap();
        assert_eq!(mode, DecodeMode::Binary);
        assert_eq!(DecodeMode::default().to_string(), "text");
    }
}
