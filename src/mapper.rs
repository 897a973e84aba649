//! Request/Response Mapper: query parameters in, wire shapes out.
//!
//! This is the only place an error kind becomes a user-facing status.

use crate::engine::{Filter, QueryResult, DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::record::Record;
use crate::CsvQueryError;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Raw query string of a parse request. Everything arrives as text so that
/// malformed numbers can fall back to defaults instead of rejecting.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub search_field: Option<String>,
    pub search_value: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl Filter {
    /// Validate and default request parameters.
    ///
    /// Absent, non-numeric, zero or negative `page`/`limit` become 1/10;
    /// `limit` is clamped to `max_limit`.
    pub fn from_params(params: QueryParams, max_limit: u64) -> Self {
        let limit = positive_or(params.limit.as_deref(), DEFAULT_LIMIT).min(max_limit.max(1));
        Filter {
            search_field: params.search_field.unwrap_or_default(),
            search_value: params.search_value.unwrap_or_default(),
            page: positive_or(params.page.as_deref(), DEFAULT_PAGE),
            limit,
        }
    }
}

fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    match raw.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(n)) if n > 0 => n as u64,
        _ => default,
    }
}

/// `ceil(matched / limit)`; no matches means no pages.
pub fn total_pages(matched: u64, limit: u64) -> u64 {
    matched.div_ceil(limit.max(1))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub data: Vec<Record>,
    /// Total matches across the file, not the page length.
    pub row_count: u64,
    pub current_page: u64,
    pub total_pages: u64,
}

impl QueryResponse {
    pub fn new(result: QueryResult, filter: &Filter) -> Self {
        Self {
            total_pages: total_pages(result.matched, filter.limit),
            row_count: result.matched,
            current_page: filter.page,
            data: result.data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadersResponse {
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilesResponse {
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Name the upload was stored under.
    pub file: String,
    pub data: Vec<Record>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Status and client-facing message for a core error.
///
/// Only `NotFound` and `UnsupportedFormat` expose details; decode and
/// storage failures are reported generically.
pub fn status_for(err: &CsvQueryError) -> (StatusCode, ErrorBody) {
    let (status, message) = match err {
        CsvQueryError::NotFound(_) => (StatusCode::NOT_FOUND, "File not found".to_string()),
        CsvQueryError::UnsupportedFormat(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
        CsvQueryError::Decode(_) | CsvQueryError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };
    (status, ErrorBody { error: message })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, limit: Option<&str>) -> QueryParams {
        QueryParams {
            page: page.map(String::from),
            limit: limit.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_when_absent() {
        let filter = Filter::from_params(QueryParams::default(), 1000);
        assert_eq!(filter, Filter::default());
        assert_eq!((filter.page, filter.limit), (1, 10));
    }

    #[test]
    fn invalid_numbers_fall_back() {
        for bad in ["abc", "0", "-3", "", "1.5"] {
            let filter = Filter::from_params(params(Some(bad), Some(bad)), 1000);
            assert_eq!((filter.page, filter.limit), (1, 10), "input {bad:?}");
        }
        let filter = Filter::from_params(params(Some(" 4 "), Some("25")), 1000);
        assert_eq!((filter.page, filter.limit), (4, 25));
    }

    #[test]
    fn limit_is_capped() {
        let filter = Filter::from_params(params(None, Some("5000")), 100);
        assert_eq!(filter.limit, 100);
    }

    #[test]
    fn page_count_rounds_up_and_zero_stays_zero() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(50, 10), 5);
        assert_eq!(total_pages(51, 10), 6);
    }

    #[test]
    fn query_params_read_camel_case() {
        let params: QueryParams = serde_json::from_value(serde_json::json!({
            "searchField": "header1",
            "searchValue": "value1_39",
            "page": "2",
        }))
        .unwrap();
        let filter = Filter::from_params(params, 1000);
        assert_eq!(filter.search_field, "header1");
        assert_eq!(filter.search_value, "value1_39");
        assert_eq!(filter.page, 2);
    }

    #[test]
    fn response_uses_wire_names() {
        let filter = Filter::page(2, 10);
        let result = QueryResult {
            data: Vec::new(),
            matched: 25,
        };
        let json = serde_json::to_value(QueryResponse::new(result, &filter)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "data": [], "rowCount": 25, "currentPage": 2, "totalPages": 3 })
        );
    }

    #[test]
    fn not_found_is_distinct_from_other_failures() {
        let (status, body) = status_for(&CsvQueryError::NotFound("x.csv".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "File not found");

        let (status, _) = status_for(&CsvQueryError::Decode("bad".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) =
            status_for(&CsvQueryError::UnsupportedFormat("Only CSV files are allowed".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Only CSV files are allowed");
    }
}
