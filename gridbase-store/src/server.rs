//! HTTP server exposing the sheet operations.
//!
//! Routes:
//! ```text
//! GET  /             → index page (file from config, or built-in)
//! GET  /load-cells   → { cells, rows, columns }
//! POST /update-cell  → { status: "success" }
//! POST /delete-all   → { status: "all_deleted" }
//! POST /update-meta  → { status: "meta_updated" }
//! GET  /export       → spreadsheet.csv (attachment)
//! ```
//!
//! Malformed bodies answer 400, store failures 500, both as
//! `{ "status": "error", "message": ... }`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::export::CSV_FILENAME;
use crate::service::{
    parse_request, ServiceError, SheetService, SheetSnapshot, UpdateCellRequest, UpdateMetaRequest,
};
use crate::storage::{MemorySheetStore, RocksSheetStore, SheetStore, StoreConfig, StoreError};

/// Served at `/` when no index page is configured.
const DEFAULT_INDEX_PAGE: &str = "<!DOCTYPE html>
<html>
<head><meta charset=\"utf-8\"><title>Gridbase</title></head>
<body>
<h1>Gridbase sheet store</h1>
<p>API: <code>GET /load-cells</code>, <code>POST /update-cell</code>,
<code>POST /delete-all</code>, <code>POST /update-meta</code>, <code>GET /export</code></p>
</body>
</html>
";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: String,
    /// Persistence storage path (None = in-memory only)
    pub storage_path: Option<PathBuf>,
    /// HTML file served at `/` (None = built-in page)
    pub index_page: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            storage_path: None,
            index_page: None,
        }
    }
}

/// Acknowledgement body of the write routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}

/// Error body for 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Index page unavailable: {0}")]
    IndexPage(#[source] std::io::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Service(ServiceError::MalformedRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Service(_) | ApiError::IndexPage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        } else {
            log::warn!("Rejected request: {self}");
        }
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Shared handler state. Cloned per request; holds no mutable data.
#[derive(Clone)]
struct AppState {
    service: SheetService,
    index_page: Option<Arc<PathBuf>>,
}

/// The sheet HTTP server.
pub struct SheetServer {
    config: ServerConfig,
    service: SheetService,
}

impl SheetServer {
    /// Create a server, opening RocksDB storage if a path is configured.
    pub fn new(config: ServerConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn SheetStore> = match &config.storage_path {
            Some(path) => {
                let store_config = StoreConfig {
                    path: path.clone(),
                    ..StoreConfig::default()
                };
                Arc::new(RocksSheetStore::open(store_config)?)
            }
            None => {
                log::warn!("No storage path configured; sheet data is kept in memory only");
                Arc::new(MemorySheetStore::new())
            }
        };
        Ok(Self::with_store(config, store))
    }

    /// Create a server over an existing store.
    pub fn with_store(config: ServerConfig, store: Arc<dyn SheetStore>) -> Self {
        Self {
            config,
            service: SheetService::new(store),
        }
    }

    /// Create with default configuration (in-memory, no persistence).
    pub fn with_defaults() -> Self {
        Self::with_store(ServerConfig::default(), Arc::new(MemorySheetStore::new()))
    }

    /// Create with persistence enabled at the given path.
    pub fn with_storage(
        bind_addr: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let config = ServerConfig {
            bind_addr: bind_addr.into(),
            storage_path: Some(path.into()),
            ..ServerConfig::default()
        };
        Self::new(config)
    }

    /// Build the axum router for this server.
    pub fn router(&self) -> Router {
        let state = AppState {
            service: self.service.clone(),
            index_page: self.config.index_page.clone().map(Arc::new),
        };

        Router::new()
            .route("/", get(index))
            .route("/load-cells", get(load_cells))
            .route("/update-cell", post(update_cell))
            .route("/delete-all", post(delete_all))
            .route("/update-meta", post(update_meta))
            .route("/export", get(export))
            .with_state(state)
    }

    /// Bind and serve until Ctrl-C.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Bind and serve until `shutdown` resolves, then flush the store.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        log::info!("Sheet server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        self.service.store().flush()?;
        log::info!("Sheet server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_addr(&self) -> &str {
        &self.config.bind_addr
    }

    pub fn service(&self) -> &SheetService {
        &self.service
    }
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    match state.index_page {
        Some(path) => {
            let page = tokio::fs::read_to_string(&*path)
                .await
                .map_err(ApiError::IndexPage)?;
            Ok(Html(page))
        }
        None => Ok(Html(DEFAULT_INDEX_PAGE.to_string())),
    }
}

async fn load_cells(State(state): State<AppState>) -> Result<Json<SheetSnapshot>, ApiError> {
    Ok(Json(state.service.load_cells()?))
}

async fn update_cell(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let (cell_id, value) = parse_request::<UpdateCellRequest>(&body)?.validate()?;
    state.service.update_cell(&cell_id, value)?;
    Ok(Json(StatusResponse::new("success")))
}

async fn delete_all(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    state.service.delete_all()?;
    Ok(Json(StatusResponse::new("all_deleted")))
}

async fn update_meta(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let req = parse_request::<UpdateMetaRequest>(&body)?;
    state.service.update_meta(req.into())?;
    Ok(Json(StatusResponse::new("meta_updated")))
}

async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let csv = state.service.export_csv()?;
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{CSV_FILENAME}\""),
        ),
    ];
    Ok((headers, csv))
}
