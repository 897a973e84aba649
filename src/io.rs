use crate::codec::CharsetDecoder;
use crate::{CsvQueryError, CsvResult};
use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

/// Compression applied to a stored entry, chosen from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".gz") {
            Compression::Gzip
        } else if lower.ends_with(".zst") {
            Compression::Zstd
        } else {
            Compression::None
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceMeta {
    /// just the entry name (used for compression detection)
    pub name_hint: String,
    /// Which character encoding the stored bytes use (defaults to UTF-8)
    pub charset: &'static encoding_rs::Encoding,
    /// Read buffer size in bytes
    pub buffer_capacity: usize,
}

impl Default for SourceMeta {
    fn default() -> Self {
        Self {
            name_hint: String::new(),
            charset: encoding_rs::UTF_8,
            buffer_capacity: 1 << 20,
        }
    }
}

/// Wrap a raw byte source with optional decompression and UTF-8 transcoding.
pub fn build_source<R>(raw: R, meta: &SourceMeta) -> Box<dyn AsyncRead + Unpin + Send>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buf = BufReader::with_capacity(meta.buffer_capacity, raw);
    let decompressed: Box<dyn AsyncRead + Unpin + Send> = match Compression::from_name(&meta.name_hint) {
        Compression::Gzip => Box::new(GzipDecoder::new(buf)),
        Compression::Zstd => Box::new(ZstdDecoder::new(buf)),
        Compression::None => Box::new(buf),
    };

    // UTF-8 passes through untouched; anything else is re-framed as UTF-8 chunks
    if meta.charset == encoding_rs::UTF_8 {
        decompressed
    } else {
        let framed = FramedRead::new(decompressed, CharsetDecoder::new(meta.charset));
        Box::new(StreamReader::new(framed))
    }
}

/// Open a local file as a decoded byte source.
///
/// A missing file is `NotFound`; any other open failure is `Storage`.
pub async fn open_source(path: &Path, mut meta: SourceMeta) -> CsvResult<Box<dyn AsyncRead + Unpin + Send>> {
    let file = File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CsvQueryError::NotFound(path.display().to_string()),
        _ => CsvQueryError::Storage(e),
    })?;

    if meta.name_hint.is_empty() {
        meta.name_hint = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
    }
    Ok(build_source(file, &meta))
}
