//! Persistent storage for sheet documents.
//!
//! Architecture:
//! ```text
//! ┌──────────────┐   Arc<dyn SheetStore>   ┌──────────────────────┐
//! │ SheetService │ ──────────────────────► │ RocksSheetStore      │
//! │ (stateless)  │                         │   CF "sheet"         │
//! └──────────────┘                         │   cell:<id> / meta   │
//!                                          ├──────────────────────┤
//!                                          │ MemorySheetStore     │
//!                                          │   (tests, ephemeral) │
//!                                          └──────────────────────┘
//! ```
//!
//! Every operation touches one document, except [`SheetStore::delete_cells`]
//! which removes all cell documents in a single batch. Metadata is never
//! deleted through this trait.

pub mod memory;
pub mod rocks;

pub use memory::MemorySheetStore;
pub use rocks::{RocksSheetStore, StoreConfig};

use crate::document::{CellDocument, CellValue, MetaDocument};

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// RocksDB internal error
    #[error("Database error: {0}")]
    Database(String),
    /// Document could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Stored bytes could not be decoded
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    /// Store is not usable (e.g. poisoned lock)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A document collection holding cell documents and the metadata singleton.
///
/// Implementations must be safe to share across request tasks. Each write
/// replaces the mutable fields of one document (last write wins).
pub trait SheetStore: Send + Sync {
    /// All cell documents, in the store's natural iteration order.
    fn cells(&self) -> StoreResult<Vec<CellDocument>>;

    /// The metadata singleton, if one was ever written.
    fn meta(&self) -> StoreResult<Option<MetaDocument>>;

    /// Insert or overwrite the cell document for `cell_id`.
    fn upsert_cell(&self, cell_id: &str, value: &CellValue) -> StoreResult<()>;

    /// Remove every cell document. Returns the number removed.
    fn delete_cells(&self) -> StoreResult<u64>;

    /// Insert or overwrite the metadata singleton.
    fn upsert_meta(&self, meta: &MetaDocument) -> StoreResult<()>;

    /// Push buffered writes to durable storage. No-op for volatile stores.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}
