//! File Registry: the storage namespace for uploaded CSV entries.
//!
//! One flat directory, one file per entry, no sidecars. Names are
//! `<stem>-<uuid v4>.csv`, so concurrent registrations never collide and no
//! lock is needed. Content is written to a hidden `.part` file and renamed
//! into place, so `list()` and readers only ever see complete entries.

use crate::rows::{ReadMode, RowStream};
use crate::{CsvQueryError, CsvResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

/// The only media type accepted by [`FileRegistry::register`].
pub const CSV_MEDIA_TYPE: &str = "text/csv";
const CSV_EXTENSION: &str = "csv";

#[derive(Debug, Clone)]
pub struct FileRegistry {
    root: PathBuf,
    charset: &'static encoding_rs::Encoding,
}

impl FileRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            charset: encoding_rs::UTF_8,
        }
    }

    /// Charset stored entries are decoded with.
    pub fn with_charset(mut self, charset: &'static encoding_rs::Encoding) -> Self {
        self.charset = charset;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory if it does not exist yet.
    pub async fn ensure_root(&self) -> CsvResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Names of all complete entries, in directory order.
    pub async fn list(&self) -> CsvResult<Vec<String>> {
        let mut dir = fs::read_dir(&self.root).await?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }

    /// Map a client-supplied identifier to a stored entry.
    ///
    /// Exact names win; a bare identifier without extension also tries
    /// `<id>.csv`. Anything that could escape the root is `NotFound`.
    pub async fn resolve(&self, id: &str) -> CsvResult<PathBuf> {
        if !is_plain_name(id) {
            return Err(CsvQueryError::NotFound(id.to_string()));
        }

        let exact = self.root.join(id);
        if is_file(&exact).await? {
            return Ok(exact);
        }
        if Path::new(id).extension().is_none() {
            let with_ext = self.root.join(format!("{id}.{CSV_EXTENSION}"));
            if is_file(&with_ext).await? {
                return Ok(with_ext);
            }
        }
        Err(CsvQueryError::NotFound(id.to_string()))
    }

    /// Resolve `id` and open it as a row stream.
    pub async fn open(&self, id: &str, mode: ReadMode) -> CsvResult<RowStream> {
        let path = self.resolve(id).await?;
        RowStream::open(&path, self.charset, mode).await
    }

    /// Persist `content` under a fresh unique name and return that name.
    ///
    /// Rejects anything not declared as `text/csv` before writing a byte.
    pub async fn register<R>(
        &self,
        original_name: &str,
        media_type: &str,
        mut content: R,
    ) -> CsvResult<String>
    where
        R: AsyncRead + Unpin,
    {
        if !is_csv_media_type(media_type) {
            warn!(original_name, media_type, "rejected upload");
            return Err(CsvQueryError::UnsupportedFormat(
                "Only CSV files are allowed".to_string(),
            ));
        }

        let token = Uuid::new_v4();
        let name = format!("{}-{token}.{CSV_EXTENSION}", sanitized_stem(original_name));
        let part = self.root.join(format!(".{token}.part"));
        let target = self.root.join(&name);

        let written = match write_part(&part, &mut content).await {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                return Err(e.into());
            }
        };
        if let Err(e) = fs::rename(&part, &target).await {
            let _ = fs::remove_file(&part).await;
            return Err(e.into());
        }

        info!(name = %name, bytes = written, "registered upload");
        Ok(name)
    }
}

async fn write_part<R: AsyncRead + Unpin>(part: &Path, content: &mut R) -> std::io::Result<u64> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(part)
        .await?;
    let written = tokio::io::copy(content, &mut file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

async fn is_file(path: &Path) -> CsvResult<bool> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn is_plain_name(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\', '\0'])
        && id != ".."
}

/// `text/csv`, ignoring case and parameters such as `charset`.
pub fn is_csv_media_type(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case(CSV_MEDIA_TYPE)
}

/// Base name of the upload without directories or extension, restricted to
/// characters that are safe in a flat file name.
fn sanitized_stem(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let stem = Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
