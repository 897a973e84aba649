//! Row Stream Reader: a forward-only, non-restartable sequence of records.
//!
//! A [`RowStream`] owns the open file for as long as it lives. Dropping it,
//! whether after the last row, after an error, or halfway through, closes
//! the handle.

use crate::io::{open_source, SourceMeta};
use crate::record::Record;
use crate::{CsvQueryError, CsvResult};
use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord, Trim};
use futures::stream::{self, Stream};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncRead;

type Source = Box<dyn AsyncRead + Unpin + Send>;

/// How much of the stream the caller intends to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Every row; large buffer to cut syscalls.
    Full,
    /// Header line only; small buffer so little beyond it is pulled in.
    HeadersOnly,
}

impl ReadMode {
    fn buffer_capacity(self) -> usize {
        match self {
            ReadMode::Full => 1 << 20,
            ReadMode::HeadersOnly => 8 << 10,
        }
    }
}

pub struct RowStream {
    reader: AsyncReader<Source>,
    headers: Arc<[String]>,
    current: StringRecord,
    rows_read: u64,
}

impl RowStream {
    /// Open a stored file and decode its header line.
    pub async fn open(
        path: &Path,
        charset: &'static encoding_rs::Encoding,
        mode: ReadMode,
    ) -> CsvResult<Self> {
        let meta = SourceMeta {
            charset,
            buffer_capacity: mode.buffer_capacity(),
            ..Default::default()
        };
        let source = open_source(path, meta).await?;
        Self::from_reader(source, mode).await
    }

    /// Build a stream over any UTF-8 byte source.
    pub async fn from_reader<R>(reader: R, mode: ReadMode) -> CsvResult<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let source: Source = Box::new(reader);
        let mut reader = AsyncReaderBuilder::new()
            .has_headers(true)
            // short rows are allowed; long rows are rejected in `advance`
            .flexible(true)
            .trim(Trim::Headers)
            .buffer_capacity(mode.buffer_capacity())
            .create_reader(source);

        let header_record = reader.headers().await?;
        let mut seen = HashSet::with_capacity(header_record.len());
        for name in header_record.iter() {
            if !seen.insert(name) {
                return Err(CsvQueryError::Decode(format!(
                    "duplicate column name '{name}' in header line"
                )));
            }
        }
        let headers: Arc<[String]> = header_record.iter().map(str::to_string).collect();

        Ok(Self {
            reader,
            headers,
            current: StringRecord::new(),
            rows_read: 0,
        })
    }

    /// Column names, trimmed, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows consumed so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Move to the next row without materializing a [`Record`].
    ///
    /// Returns `false` once the stream is exhausted.
    pub async fn advance(&mut self) -> CsvResult<bool> {
        if !self.reader.read_record(&mut self.current).await? {
            return Ok(false);
        }
        self.rows_read += 1;

        if self.current.len() > self.headers.len() {
            let line = self.current.position().map(|p| p.line()).unwrap_or(0);
            return Err(CsvQueryError::Decode(format!(
                "line {line}: {} fields but the header has {}",
                self.current.len(),
                self.headers.len()
            )));
        }
        Ok(true)
    }

    /// Cell `idx` of the row last reached by [`advance`](Self::advance).
    pub fn current_value(&self, idx: usize) -> Option<&str> {
        self.current.get(idx)
    }

    /// Materialize the row last reached by [`advance`](Self::advance).
    pub fn current_record(&self) -> Record {
        Record::new(
            Arc::clone(&self.headers),
            self.current.iter().map(str::to_string).collect(),
        )
    }

    pub async fn next_record(&mut self) -> CsvResult<Option<Record>> {
        if self.advance().await? {
            Ok(Some(self.current_record()))
        } else {
            Ok(None)
        }
    }

    /// Consume into a `futures` stream of records.
    pub fn into_stream(self) -> impl Stream<Item = CsvResult<Record>> + Send {
        stream::try_unfold(self, |mut rows| async move {
            Ok(rows.next_record().await?.map(|rec| (rec, rows)))
        })
    }
}
