//! Service configuration from environment variables.

use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    /// Directory holding uploaded entries.
    pub upload_dir: PathBuf,
    /// Largest page size a client may request.
    pub max_limit: u64,
    /// Upper bound on a single headers/parse read.
    pub read_timeout: Duration,
    pub max_upload_bytes: usize,
    /// Charset of stored entries.
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8001)),
            upload_dir: PathBuf::from("./uploads"),
            max_limit: 1000,
            read_timeout: Duration::from_secs(30),
            max_upload_bytes: 1 << 30,
            charset: encoding_rs::UTF_8,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bind: std::env::var("CSV_QUERY_BIND")
                .map(|v| v.parse().context("Invalid CSV_QUERY_BIND"))
                .unwrap_or(Ok(defaults.bind))?,
            upload_dir: std::env::var("CSV_QUERY_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_limit: std::env::var("CSV_QUERY_MAX_LIMIT")
                .unwrap_or_else(|_| defaults.max_limit.to_string())
                .parse()
                .context("Invalid CSV_QUERY_MAX_LIMIT")?,
            read_timeout: Duration::from_secs(
                std::env::var("CSV_QUERY_READ_TIMEOUT_SECS")
                    .unwrap_or_else(|_| defaults.read_timeout.as_secs().to_string())
                    .parse()
                    .context("Invalid CSV_QUERY_READ_TIMEOUT_SECS")?,
            ),
            max_upload_bytes: std::env::var("CSV_QUERY_MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| defaults.max_upload_bytes.to_string())
                .parse()
                .context("Invalid CSV_QUERY_MAX_UPLOAD_BYTES")?,
            charset: match std::env::var("CSV_QUERY_CHARSET") {
                Ok(label) => parse_charset(&label)?,
                Err(_) => defaults.charset,
            },
        })
    }
}

/// Look up an `encoding_rs` charset by WHATWG label (`utf-8`, `latin1`, ...).
pub fn parse_charset(label: &str) -> Result<&'static encoding_rs::Encoding> {
    encoding_rs::Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| anyhow!("Unknown charset label '{label}'"))
}
