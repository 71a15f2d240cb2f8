//! RocksDB-backed sheet store.
//!
//! All documents live in one column family, `sheet`:
//! - `cell:<cell_id>`: cell documents
//! - `meta`: the metadata singleton
//!
//! Values are JSON-encoded [`StoredDocument`]s, so each one carries its
//! `type` tag. Cell reads scan the column family and filter on that tag.

use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamilyDescriptor, DBCompressionType, DBWithThreadMode,
    IteratorMode, Options, SingleThreaded, WriteBatch, WriteOptions,
};
use std::path::{Path, PathBuf};

use super::{SheetStore, StoreError, StoreResult};
use crate::document::{CellDocument, CellValue, MetaDocument, StoredDocument, META_KEY};

/// Column family holding every sheet document.
const CF_SHEET: &str = "sheet";

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database directory path
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Bloom filter bits per key (default: 10)
    pub bloom_filter_bits: i32,
    /// Enable fsync on every write (default: false)
    pub sync_writes: bool,
    /// Max open files for RocksDB (default: 256)
    pub max_open_files: i32,
    /// Write buffer size (default: 16MB)
    pub write_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("gridbase_data"),
            block_cache_size: 64 * 1024 * 1024,
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 256,
            write_buffer_size: 16 * 1024 * 1024,
        }
    }
}

impl StoreConfig {
    /// Create config for testing (small caches).
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 64,
            write_buffer_size: 4 * 1024 * 1024,
        }
    }
}

/// RocksDB-backed store.
pub struct RocksSheetStore {
    /// RocksDB instance (single-threaded mode, shared across tokio tasks)
    db: DBWithThreadMode<SingleThreaded>,
    config: StoreConfig,
}

impl RocksSheetStore {
    /// Open the store at the configured path, creating it if missing.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.set_keep_log_file_num(5);

        let cf_descriptor = ColumnFamilyDescriptor::new(CF_SHEET, Self::cf_options(&config));

        let db = DBWithThreadMode::<SingleThreaded>::open_cf_descriptors(
            &db_opts,
            &config.path,
            vec![cf_descriptor],
        )?;

        log::debug!("Opened sheet store at {}", config.path.display());
        Ok(Self { db, config })
    }

    fn cf_options(config: &StoreConfig) -> Options {
        let mut opts = Options::default();

        let mut block_opts = BlockBasedOptions::default();
        let cache = Cache::new_lru_cache(config.block_cache_size);
        block_opts.set_block_cache(&cache);
        block_opts.set_bloom_filter(config.bloom_filter_bits as f64, false);
        opts.set_block_based_table_factory(&block_opts);

        // Small values, point writes and full scans
        opts.set_compression_type(DBCompressionType::Lz4);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(2);
        opts
    }

    /// Get the database path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn cf(&self) -> StoreResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(CF_SHEET)
            .ok_or_else(|| StoreError::Database(format!("Column family '{CF_SHEET}' not found")))
    }

    fn write_opts(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }

    fn put(&self, doc: &StoredDocument) -> StoreResult<()> {
        let cf = self.cf()?;
        let bytes = doc
            .encode()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.db
            .put_cf_opt(&cf, doc.key().as_bytes(), &bytes, &self.write_opts())?;
        Ok(())
    }

    /// Decode every document in the collection, paired with its key.
    fn scan(&self) -> StoreResult<Vec<(Box<[u8]>, StoredDocument)>> {
        let cf = self.cf()?;
        let mut docs = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, value) = item?;
            let doc = StoredDocument::decode(&value)
                .map_err(|e| StoreError::Deserialization(e.to_string()))?;
            docs.push((key, doc));
        }
        Ok(docs)
    }
}

impl SheetStore for RocksSheetStore {
    fn cells(&self) -> StoreResult<Vec<CellDocument>> {
        Ok(self
            .scan()?
            .into_iter()
            .filter_map(|(_, doc)| match doc {
                StoredDocument::Cell(cell) => Some(cell),
                StoredDocument::Meta(_) => None,
            })
            .collect())
    }

    fn meta(&self) -> StoreResult<Option<MetaDocument>> {
        let cf = self.cf()?;
        match self.db.get_cf(&cf, META_KEY.as_bytes())? {
            Some(bytes) => match StoredDocument::decode(&bytes)
                .map_err(|e| StoreError::Deserialization(e.to_string()))?
            {
                StoredDocument::Meta(meta) => Ok(Some(meta)),
                StoredDocument::Cell(cell) => Err(StoreError::Deserialization(format!(
                    "expected meta document under '{META_KEY}', found cell {}",
                    cell.cell_id
                ))),
            },
            None => Ok(None),
        }
    }

    fn upsert_cell(&self, cell_id: &str, value: &CellValue) -> StoreResult<()> {
        self.put(&StoredDocument::Cell(CellDocument::new(cell_id, value.clone())))
    }

    fn delete_cells(&self) -> StoreResult<u64> {
        let cf = self.cf()?;
        let mut batch = WriteBatch::default();
        let mut count = 0u64;
        for (key, doc) in self.scan()? {
            if let StoredDocument::Cell(_) = doc {
                batch.delete_cf(&cf, &key);
                count += 1;
            }
        }

        if count > 0 {
            self.db.write_opt(batch, &self.write_opts())?;
        }
        Ok(count)
    }

    fn upsert_meta(&self, meta: &MetaDocument) -> StoreResult<()> {
        self.put(&StoredDocument::Meta(*meta))
    }

    fn flush(&self) -> StoreResult<()> {
        self.db.flush_cf(self.cf()?)?;
        Ok(())
    }
}
