use std::borrow::Cow;

use pgtree_api::result::{ColumnDescriptor, DecodeMode, RawCell, ResultSet};
use pgtree_engine::EngineError;
use pgtree_engine::buffer::hex_to_bytes;
use pgtree_engine::envelope::QueryOutcome;
use serde::Deserialize;

use crate::error::DumpError;

/// One result set as the transport delivered it, saved as JSON.
///
/// Cells are `null` or a string: the literal in text mode, hex of the raw
/// bytes in binary mode.
#[derive(Debug, Clone, Deserialize)]
pub struct Capture {
    #[serde(default)]
    pub status: CaptureStatus,
    /// Server message for `failed` captures.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    #[default]
    Tuples,
    Command,
    Failed,
}

/// Cell bytes of a capture, owned when they had to be hex-decoded.
pub type CellBytes<'c> = Vec<Vec<Option<Cow<'c, [u8]>>>>;

impl Capture {
    pub fn load(path: &str) -> Result<Self, DumpError> {
        let content = std::fs::read_to_string(path).map_err(|e| DumpError::Capture {
            context: path.to_string(),
            detail: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| match e {
            DumpError::Capture { detail, .. } => DumpError::Capture {
                context: path.to_string(),
                detail,
            },
            other => other,
        })
    }

    pub fn parse(json: &str) -> Result<Self, DumpError> {
        serde_json::from_str(json).map_err(|e| DumpError::Capture {
            context: "parse".to_string(),
            detail: e.to_string(),
        })
    }

    /// Raw cell bytes for `mode`.
    pub fn cells(&self, mode: DecodeMode) -> CellBytes<'_> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        cell.as_deref().map(|text| match mode {
                            DecodeMode::Text => Cow::Borrowed(text.as_bytes()),
                            DecodeMode::Binary => Cow::Owned(hex_to_bytes(text)),
                        })
                    })
                    .collect()
            })
            .collect()
    }

    pub fn outcome<'r>(&self, cells: &'r CellBytes<'_>) -> Result<QueryOutcome<'r>, DumpError> {
        let outcome = match self.status {
            CaptureStatus::Tuples => {
                let rows = cells
                    .iter()
                    .map(|row| row.iter().map(|cell| RawCell::from(cell.as_deref())).collect())
                    .collect();
                let result =
                    ResultSet::new(self.columns.clone(), rows).map_err(EngineError::Shape)?;
                QueryOutcome::Tuples(result)
            }
            CaptureStatus::Command => QueryOutcome::Command,
            CaptureStatus::Failed => QueryOutcome::Failed(self.message.clone().unwrap_or_default()),
        };
        Ok(outcome)
    }
}
