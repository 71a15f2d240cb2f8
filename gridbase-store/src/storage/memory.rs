//! In-memory sheet store.
//!
//! Same key layout and tag filtering as the RocksDB store, held in a
//! `BTreeMap`. Contents are lost when the store is dropped.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{SheetStore, StoreError, StoreResult};
use crate::document::{cell_key, CellDocument, CellValue, MetaDocument, StoredDocument, META_KEY};

#[derive(Debug, Default)]
pub struct MemorySheetStore {
    docs: RwLock<BTreeMap<String, StoredDocument>>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of documents, cells and metadata included.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<String, StoredDocument>>> {
        self.docs
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<String, StoredDocument>>> {
        self.docs
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl SheetStore for MemorySheetStore {
    fn cells(&self) -> StoreResult<Vec<CellDocument>> {
        Ok(self
            .read()?
            .values()
            .filter_map(|doc| match doc {
                StoredDocument::Cell(cell) => Some(cell.clone()),
                StoredDocument::Meta(_) => None,
            })
            .collect())
    }

    fn meta(&self) -> StoreResult<Option<MetaDocument>> {
        Ok(match self.read()?.get(META_KEY) {
            Some(StoredDocument::Meta(meta)) => Some(*meta),
            _ => None,
        })
    }

    fn upsert_cell(&self, cell_id: &str, value: &CellValue) -> StoreResult<()> {
        let doc = StoredDocument::Cell(CellDocument::new(cell_id, value.clone()));
        self.write()?.insert(cell_key(cell_id), doc);
        Ok(())
    }

    fn delete_cells(&self) -> StoreResult<u64> {
        let mut docs = self.write()?;
        let before = docs.len();
        docs.retain(|_, doc| !matches!(doc, StoredDocument::Cell(_)));
        Ok((before - docs.len()) as u64)
    }

    fn upsert_meta(&self, meta: &MetaDocument) -> StoreResult<()> {
        self.write()?
            .insert(META_KEY.to_string(), StoredDocument::Meta(*meta));
        Ok(())
    }
}
