//! # gridbase-store: Backing store for the Gridbase collaborative sheet
//!
//! Persists cell values and sheet dimensions and serves them over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      HTTP/JSON      ┌─────────────┐
//! │ Browser grid│ ◄─────────────────► │ SheetServer │
//! │ (external)  │      CSV export     │ (axum)      │
//! └─────────────┘                     └──────┬──────┘
//!                                            │
//!                                            ▼
//!                                     ┌─────────────┐
//!                                     │SheetService │
//!                                     │ (stateless) │
//!                                     └──────┬──────┘
//!                                            │ Arc<dyn SheetStore>
//!                                    ┌───────┴───────┐
//!                                    ▼               ▼
//!                             RocksSheetStore  MemorySheetStore
//! ```
//!
//! ## Modules
//!
//! - [`document`]: Cell and metadata records, storage envelope
//! - [`storage`]: `SheetStore` trait with RocksDB and in-memory backends
//! - [`service`]: Load / update / delete / export operations
//! - [`export`]: CSV rendering
//! - [`server`]: HTTP routes and error mapping

pub mod document;
pub mod export;
pub mod server;
pub mod service;
pub mod storage;

// Re-exports for convenience
pub use document::{CellDocument, CellValue, MetaDocument, SheetDimensions};
pub use server::{ApiError, ErrorResponse, ServerConfig, SheetServer, StatusResponse};
pub use service::{
    ServiceError, SheetService, SheetSnapshot, UpdateCellRequest, UpdateMetaRequest,
};
pub use storage::{
    MemorySheetStore, RocksSheetStore, SheetStore, StoreConfig, StoreError, StoreResult,
};
