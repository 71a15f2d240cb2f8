//! Sheet documents.
//!
//! Two record shapes share one collection:
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │ CellDocument                 │   │ MetaDocument (singleton)     │
//! │   cell_id  "A1"              │   │   rows     Option<u32>       │
//! │   value    "hello" | 5 | ... │   │   columns  Option<u32>       │
//! └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                │      StoredDocument (type tag)   │
//!                └──────────────┬───────────────────┘
//!                               ▼
//!              { "type": "cell" | "meta", ... }  (JSON)
//! ```
//!
//! Only the storage layer sees [`StoredDocument`]; the service works with the
//! two typed records directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row count reported when no metadata has been stored.
pub const DEFAULT_ROWS: u32 = 10;
/// Column count reported when no metadata has been stored.
pub const DEFAULT_COLUMNS: u32 = 10;

/// Key of the metadata singleton.
pub(crate) const META_KEY: &str = "meta";
/// Key prefix for cell documents.
pub(crate) const CELL_KEY_PREFIX: &str = "cell:";

/// Raw scalar content of a cell. No formula evaluation happens anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl CellValue {
    /// Convert an arbitrary JSON value, rejecting `null`, arrays and objects.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(CellValue::Bool(b)),
            serde_json::Value::Number(n) => Some(CellValue::Number(n)),
            serde_json::Value::String(s) => Some(CellValue::Text(s)),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n.into())
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n.into())
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// A single grid cell. At most one exists per `cell_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellDocument {
    pub cell_id: String,
    pub value: CellValue,
}

impl CellDocument {
    pub fn new(cell_id: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self {
            cell_id: cell_id.into(),
            value: value.into(),
        }
    }
}

/// Sheet dimensions as written by the client. Missing fields stay `None`;
/// defaults are applied on read via [`MetaDocument::dimensions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaDocument {
    pub rows: Option<u32>,
    pub columns: Option<u32>,
}

impl MetaDocument {
    pub fn new(rows: Option<u32>, columns: Option<u32>) -> Self {
        Self { rows, columns }
    }

    /// Resolve to concrete dimensions, substituting defaults for unset fields.
    pub fn dimensions(&self) -> SheetDimensions {
        SheetDimensions {
            rows: self.rows.unwrap_or(DEFAULT_ROWS),
            columns: self.columns.unwrap_or(DEFAULT_COLUMNS),
        }
    }
}

/// Resolved sheet size returned by `load-cells`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetDimensions {
    pub rows: u32,
    pub columns: u32,
}

impl Default for SheetDimensions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
        }
    }
}

/// Storage-level envelope carrying the `type` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredDocument {
    Cell(CellDocument),
    Meta(MetaDocument),
}

impl StoredDocument {
    /// Collection key: `cell:<cell_id>` for cells, `meta` for the singleton.
    pub fn key(&self) -> String {
        match self {
            StoredDocument::Cell(cell) => cell_key(&cell.cell_id),
            StoredDocument::Meta(_) => META_KEY.to_string(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

pub(crate) fn cell_key(cell_id: &str) -> String {
    format!("{CELL_KEY_PREFIX}{cell_id}")
}
