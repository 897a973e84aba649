//! Streaming CSV query service: upload, list, headers, filter + paginate.
//!
//! - Files live in a [`FileRegistry`] directory, one flat entry per upload.
//! - Every query opens a fresh [`RowStream`] and scans it once; memory stays
//!   bounded by the page size, not the file size.
//! - Stored entries may be gzip/zstd compressed (by suffix) and in any
//!   `encoding_rs` charset; rows are decoded to UTF-8 text on the fly.
//!
//! Data shape:
//! - [`Record`]: header-keyed cell values, serialized as a JSON object
//! - [`QueryResult`] `{ data, matched }` → [`QueryResponse`] on the wire
#![cfg_attr(docsrs, feature(doc_cfg))]
//
mod codec;
pub mod config;
pub mod engine;
pub mod headers;
mod io;
pub mod mapper;
mod record;
pub mod registry;
pub mod rows;
pub mod server;

pub use crate::config::ServiceConfig;
pub use crate::engine::{run_query, Filter, QueryResult};
pub use crate::headers::read_headers;
pub use crate::io::{open_source, Compression, SourceMeta};
pub use crate::mapper::{
    status_for, total_pages, ErrorBody, FilesResponse, HeadersResponse, QueryParams,
    QueryResponse, UploadResponse,
};
pub use crate::record::Record;
pub use crate::registry::FileRegistry;
pub use crate::rows::{ReadMode, RowStream};

use thiserror::Error;

/// Error type returned by this crate.
///
/// The four variants are the whole taxonomy; only [`mapper::status_for`]
/// turns them into user-facing statuses.
#[derive(Debug, Error)]
pub enum CsvQueryError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Malformed CSV: {0}")]
    Decode(String),
    #[error(transparent)]
    Storage(#[from] std::io::Error),
}

/// Payload-free view of [`CsvQueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    UnsupportedFormat,
    Decode,
    Storage,
}

impl CsvQueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CsvQueryError::NotFound(_) => ErrorKind::NotFound,
            CsvQueryError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            CsvQueryError::Decode(_) => ErrorKind::Decode,
            CsvQueryError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<csv_async::Error> for CsvQueryError {
    fn from(err: csv_async::Error) -> Self {
        if let csv_async::ErrorKind::Io(io_err) = err.kind() {
            // Corrupt gzip/zstd frames and bad transcoding surface as io errors
            // from the byte pipeline, but they are content problems.
            return match io_err.kind() {
                std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => {
                    CsvQueryError::Decode(io_err.to_string())
                }
                kind => CsvQueryError::Storage(std::io::Error::new(kind, io_err.to_string())),
            };
        }
        CsvQueryError::Decode(err.to_string())
    }
}

pub type CsvResult<T> = std::result::Result<T, CsvQueryError>;
