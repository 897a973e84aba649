//! Header Extractor.

use crate::registry::FileRegistry;
use crate::rows::ReadMode;
use crate::CsvResult;

/// Column names of a stored file, read from its first line only.
///
/// The stream is dropped right after the header is decoded, so nothing
/// past the first line is ever parsed.
pub async fn read_headers(registry: &FileRegistry, id: &str) -> CsvResult<Vec<String>> {
    let rows = registry.open(id, ReadMode::HeadersOnly).await?;
    Ok(rows.headers().to_vec())
}
