//! HTTP surface: upload, list, headers, parse.

use crate::config::ServiceConfig;
use crate::engine::{run_query, Filter};
use crate::headers::read_headers;
use crate::mapper::{
    status_for, ErrorBody, FilesResponse, HeadersResponse, QueryParams, QueryResponse,
    UploadResponse,
};
use crate::registry::FileRegistry;
use crate::rows::ReadMode;
use crate::{CsvQueryError, CsvResult};
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::TryStreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::io::StreamReader;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "csvfile";

pub struct AppState {
    pub registry: FileRegistry,
    pub max_limit: u64,
    pub read_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            registry: FileRegistry::new(&config.upload_dir).with_charset(config.charset),
            max_limit: config.max_limit,
            read_timeout: config.read_timeout,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Run a read under the configured deadline; expiry is a storage failure.
    async fn bounded<T>(&self, read: impl Future<Output = CsvResult<T>>) -> CsvResult<T> {
        tokio::time::timeout(self.read_timeout, read)
            .await
            .map_err(|_| {
                CsvQueryError::Storage(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("read exceeded {:?}", self.read_timeout),
                ))
            })?
    }
}

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] CsvQueryError),
    #[error("No file uploaded")]
    MissingFile,
    #[error("Invalid upload: {0}")]
    BadUpload(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Query(err) => status_for(err),
            ApiError::MissingFile | ApiError::BadUpload(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: self.to_string(),
                },
            ),
        };
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        } else {
            debug!(error = %self, %status, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}

/// POST /upload: store a CSV file and return its parsed rows.
async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::MissingFile)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadUpload(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let media_type = field.content_type().unwrap_or_default().to_string();
        let body = StreamReader::new(Box::pin(field.map_err(|e| std::io::Error::other(e.to_string()))));

        let name = state
            .registry
            .register(&original_name, &media_type, body)
            .await?;
        let data = state
            .bounded(async {
                let rows = state.registry.open(&name, ReadMode::Full).await?;
                rows.into_stream().try_collect::<Vec<_>>().await
            })
            .await?;
        return Ok(Json(UploadResponse { file: name, data }));
    }
    Err(ApiError::MissingFile)
}

/// GET /listFiles
async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<FilesResponse>, ApiError> {
    let files = state.registry.list().await?;
    Ok(Json(FilesResponse { files }))
}

/// GET /headers/:file
async fn file_headers(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<Json<HeadersResponse>, ApiError> {
    let headers = state.bounded(read_headers(&state.registry, &file)).await?;
    Ok(Json(HeadersResponse { headers }))
}

/// GET /parse/:file?searchField=&searchValue=&page=&limit=
async fn parse_file(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    // an unparseable query string (e.g. a repeated key) gets the same defaults
    // as missing or malformed values
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "query string ignored");
            QueryParams::default()
        }
    };
    let filter = Filter::from_params(params, state.max_limit);
    let result = state
        .bounded(async {
            let mut rows = state.registry.open(&file, ReadMode::Full).await?;
            run_query(&mut rows, &filter).await
        })
        .await?;
    Ok(Json(QueryResponse::new(result, &filter)))
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/listFiles", get(list_files))
        .route("/headers/:file", get(file_headers))
        .route("/parse/:file", get(parse_file))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(&config));
    state.registry.ensure_root().await?;

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        addr = %listener.local_addr()?,
        upload_dir = %config.upload_dir.display(),
        "csv query service listening"
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
