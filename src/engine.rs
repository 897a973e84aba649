//! Single-pass filter + paginate over a [`RowStream`].
//!
//! Every row is visited once so that `matched` counts the whole file; only
//! rows whose rank among matches lands in the requested page window are
//! turned into [`Record`]s. Auxiliary memory is the page itself plus a few
//! counters.

use crate::record::Record;
use crate::rows::RowStream;
use crate::CsvResult;
use tracing::debug;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Field/substring filter plus the page window to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Column to search; empty disables filtering.
    pub search_field: String,
    /// Case-sensitive substring; empty matches any present value.
    pub search_value: String,
    /// 1-based page number.
    pub page: u64,
    /// Page size, at least 1.
    pub limit: u64,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            search_field: String::new(),
            search_value: String::new(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Filter {
    /// Unfiltered page `page` of size `limit` (both floored at 1).
    pub fn page(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            ..Default::default()
        }
    }

    pub fn with_search(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.search_field = field.into();
        self.search_value = value.into();
        self
    }

    /// Half-open rank window `(start, end]` of this page.
    fn window(&self) -> (u64, u64) {
        let limit = self.limit.max(1);
        let start = self.page.max(1).saturating_sub(1).saturating_mul(limit);
        (start, start.saturating_add(limit))
    }
}

/// One page of matches plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryResult {
    pub data: Vec<Record>,
    pub matched: u64,
}

/// Where the search column sits in this stream's header.
enum Column {
    Any,
    At(usize),
    Missing,
}

/// Scan `rows` to the end, counting every match and keeping the page.
pub async fn run_query(rows: &mut RowStream, filter: &Filter) -> CsvResult<QueryResult> {
    let column = if filter.search_field.is_empty() {
        Column::Any
    } else {
        match rows.headers().iter().position(|h| *h == filter.search_field) {
            Some(idx) => Column::At(idx),
            None => Column::Missing,
        }
    };
    let (start, end) = filter.window();
    let mut result = QueryResult {
        data: Vec::with_capacity(filter.limit.clamp(1, 1024) as usize),
        matched: 0,
    };

    // An unknown column never matches, but the scan still runs so that a
    // malformed file fails the same way regardless of the filter.
    while rows.advance().await? {
        let hit = match column {
            Column::Any => true,
            Column::At(idx) => rows
                .current_value(idx)
                .is_some_and(|v| v.contains(filter.search_value.as_str())),
            Column::Missing => false,
        };
        if !hit {
            continue;
        }
        result.matched += 1;
        if result.matched > start && result.matched <= end {
            result.data.push(rows.current_record());
        }
    }

    debug!(
        scanned = rows.rows_read(),
        matched = result.matched,
        returned = result.data.len(),
        page = filter.page,
        limit = filter.limit,
        "query scan finished"
    );
    Ok(result)
}
