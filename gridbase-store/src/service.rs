//! Sheet store service: the five sheet operations over an injected store.
//!
//! ```text
//! request body ──► UpdateCellRequest / UpdateMetaRequest ──► validate
//!                                                              │
//!                         SheetService ◄───────────────────────┘
//!                              │ one store call per operation
//!                              ▼
//!                      Arc<dyn SheetStore>
//! ```
//!
//! The service keeps no state between calls; everything lives in the store.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::document::{CellValue, MetaDocument, SheetDimensions};
use crate::export;
use crate::storage::{SheetStore, StoreError};

/// Service errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Client sent an unusable request
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Parse a JSON request body, reporting any failure as a malformed request.
pub fn parse_request<T: DeserializeOwned>(body: &[u8]) -> ServiceResult<T> {
    if body.is_empty() {
        return Err(ServiceError::MalformedRequest("request body is empty".into()));
    }
    serde_json::from_slice(body).map_err(|e| ServiceError::MalformedRequest(e.to_string()))
}

/// Body of `POST /update-cell`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCellRequest {
    pub cell_id: Option<String>,
    pub value: Option<serde_json::Value>,
}

impl UpdateCellRequest {
    /// Check that both fields are present and the value is a scalar.
    pub fn validate(self) -> ServiceResult<(String, CellValue)> {
        let cell_id = match self.cell_id {
            Some(id) if !id.is_empty() => id,
            Some(_) => return Err(ServiceError::MalformedRequest("cell_id must not be empty".into())),
            None => return Err(ServiceError::MalformedRequest("missing field `cell_id`".into())),
        };
        let value = self
            .value
            .ok_or_else(|| ServiceError::MalformedRequest("missing field `value`".into()))?;
        let value = CellValue::from_json(value).ok_or_else(|| {
            ServiceError::MalformedRequest("`value` must be a string, number or boolean".into())
        })?;
        Ok((cell_id, value))
    }
}

/// Body of `POST /update-meta`. Absent fields are stored as unset.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UpdateMetaRequest {
    #[serde(default)]
    pub rows: Option<u32>,
    #[serde(default)]
    pub columns: Option<u32>,
}

impl From<UpdateMetaRequest> for MetaDocument {
    fn from(req: UpdateMetaRequest) -> Self {
        MetaDocument::new(req.rows, req.columns)
    }
}

/// Everything the grid needs to render: cell values and dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSnapshot {
    pub cells: BTreeMap<String, CellValue>,
    pub rows: u32,
    pub columns: u32,
}

/// Stateless handle over a shared store.
#[derive(Clone)]
pub struct SheetService {
    store: Arc<dyn SheetStore>,
}

impl SheetService {
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SheetStore> {
        &self.store
    }

    /// All cells plus dimensions (10×10 when no metadata is stored).
    pub fn load_cells(&self) -> ServiceResult<SheetSnapshot> {
        let cells = self
            .store
            .cells()?
            .into_iter()
            .map(|cell| (cell.cell_id, cell.value))
            .collect::<BTreeMap<_, _>>();
        let dims = self.dimensions()?;

        log::debug!("Loaded {} cells ({}x{})", cells.len(), dims.rows, dims.columns);
        Ok(SheetSnapshot {
            cells,
            rows: dims.rows,
            columns: dims.columns,
        })
    }

    /// Insert or overwrite one cell.
    pub fn update_cell(&self, cell_id: &str, value: CellValue) -> ServiceResult<()> {
        if cell_id.is_empty() {
            return Err(ServiceError::MalformedRequest("cell_id must not be empty".into()));
        }
        self.store.upsert_cell(cell_id, &value)?;
        log::debug!("Updated cell {cell_id}");
        Ok(())
    }

    /// Remove every cell; metadata stays. Returns the number removed.
    pub fn delete_all(&self) -> ServiceResult<u64> {
        let removed = self.store.delete_cells()?;
        log::info!("Deleted all cells ({removed} documents)");
        Ok(removed)
    }

    /// Replace the metadata singleton.
    pub fn update_meta(&self, meta: MetaDocument) -> ServiceResult<()> {
        self.store.upsert_meta(&meta)?;
        log::debug!("Updated sheet metadata: rows={:?} columns={:?}", meta.rows, meta.columns);
        Ok(())
    }

    /// Current dimensions with defaults applied.
    pub fn dimensions(&self) -> ServiceResult<SheetDimensions> {
        Ok(self
            .store
            .meta()?
            .map(|meta| meta.dimensions())
            .unwrap_or_default())
    }

    /// All cells as CSV, in store order.
    pub fn export_csv(&self) -> ServiceResult<Vec<u8>> {
        let cells = self.store.cells()?;
        let bytes = export::to_csv_bytes(&cells)?;
        log::debug!("Exported {} cells ({} bytes)", cells.len(), bytes.len());
        Ok(bytes)
    }
}
