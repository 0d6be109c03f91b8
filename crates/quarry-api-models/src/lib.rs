#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Quarry database service API.
//!
//! These types mirror the wire contract exposed by the remote service so
//! the client and CLI agree on one encoding. The query endpoint is the
//! exception: its success body is shape-inconsistent across server code
//! paths and is therefore decoded as raw JSON and classified by the
//! client's normalizer rather than a DTO here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker the server places in a 401 `detail` field when the bearer
/// credential itself is invalid or expired. Any other 401 body must not
/// be treated as a session loss.
pub const INVALID_TOKEN_DETAIL: &str = "Invalid token";

/// Failure envelope returned by the service on non-2xx responses.
///
/// The `detail` field is a string, an array of validation issues, or
/// absent entirely; [`ErrorEnvelope::message`] collapses all three into
/// one renderable string so callers never surface a raw JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// Server-provided diagnostic payload, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ErrorDetail>,
}

/// The polymorphic `detail` payload of an [`ErrorEnvelope`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// Plain diagnostic message.
    Text(String),
    /// Validation issues, one per offending input field.
    Validation(Vec<ValidationIssue>),
}

/// One entry of a validation-error `detail` array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Human-readable description of the failed check.
    #[serde(default)]
    pub msg: Option<String>,
}

impl ErrorEnvelope {
    /// Collapse the envelope into a single user-facing message, falling
    /// back to `fallback` when the server sent nothing usable.
    #[must_use]
    pub fn message(&self, fallback: &str) -> String {
        match &self.detail {
            Some(ErrorDetail::Text(text)) if !text.trim().is_empty() => text.clone(),
            Some(ErrorDetail::Validation(issues)) => {
                let parts: Vec<&str> = issues
                    .iter()
                    .filter_map(|issue| issue.msg.as_deref())
                    .filter(|msg| !msg.trim().is_empty())
                    .collect();
                if parts.is_empty() {
                    fallback.to_string()
                } else {
                    parts.join(", ")
                }
            }
            _ => fallback.to_string(),
        }
    }

    /// Whether this envelope carries the invalid-credential marker.
    #[must_use]
    pub fn signals_invalid_token(&self) -> bool {
        matches!(&self.detail, Some(ErrorDetail::Text(text)) if text == INVALID_TOKEN_DETAIL)
    }
}

/// Login request body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Registration request body for `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    /// Desired account username.
    pub username: String,
    /// Contact email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Success body of the authentication endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    /// Bearer credential for subsequent requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Legacy field name some server builds use for the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Token scheme, `"bearer"` in practice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Username the credential was issued to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl AuthResponse {
    /// The issued credential, preferring the current field name over the
    /// legacy one.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.access_token.as_deref().or_else(|| self.token.as_deref())
    }
}

/// One uploaded data file, as listed by `GET /files`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInfo {
    /// Stored file name.
    pub filename: String,
    /// File size in bytes.
    pub size: u64,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
}

/// Success body of `POST /files/upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileUploadResponse {
    /// Name the file was stored under.
    pub filename: String,
    /// Server acknowledgement message.
    pub message: String,
}

/// Column value types supported by the service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 64-bit signed integer.
    #[serde(rename = "INT")]
    Int,
    /// Double-precision float.
    #[serde(rename = "FLOAT")]
    Float,
    /// Calendar date.
    #[serde(rename = "DATE")]
    Date,
    /// Bounded string; pair with [`ColumnSpec::size`].
    #[serde(rename = "VARCHAR")]
    Varchar,
    /// Boolean flag.
    #[serde(rename = "BOOLEAN")]
    Boolean,
    /// Fixed-length float vector.
    #[serde(rename = "ARRAY[FLOAT]")]
    ArrayFloat,
}

/// Index structures a column may be backed by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexKind {
    /// Self-balancing binary search tree.
    Avl,
    /// Extendible hash index.
    Hash,
    /// B+ tree index.
    Btree,
    /// Inverted index for text search.
    Gin,
    /// Indexed sequential access file.
    Isam,
    /// Spatial R-tree.
    Rtree,
    /// Inverted file index over vectors.
    Ivf,
    /// Locality-sensitive hash over vectors.
    Ish,
}

/// Column definition supplied when creating a table and echoed back in
/// table listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// Value type.
    pub data_type: ColumnType,
    /// Length bound for `VARCHAR(n)` columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Index backing the column, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_type: Option<IndexKind>,
}

/// One table owned by the authenticated user, as listed by `GET /tables`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableInfo {
    /// Table name.
    pub name: String,
    /// Column definitions in declaration order.
    pub columns: Vec<ColumnSpec>,
    /// Number of stored rows.
    pub row_count: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Success body of `POST /tables/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableCreatedResponse {
    /// Server acknowledgement message.
    pub message: String,
    /// Name of the created table.
    pub table_name: String,
    /// Rows ingested from the source file.
    pub rows_inserted: u64,
}

/// Paginated slice of table rows returned by
/// `GET /tables/{name}/data?page={n}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TablePageResponse {
    /// Column names, in table order.
    pub columns: Vec<String>,
    /// Row-major cell values for this page.
    pub data: Vec<Vec<Value>>,
    /// Total rows in the table.
    pub total_rows: u64,
    /// 1-based index of this page.
    pub current_page: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Server-side page size.
    pub page_size: u64,
}

/// Request body for `POST /query`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    /// Query text to execute.
    pub query: String,
}

/// Per-user service metrics from `GET /metrics`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    /// Queries executed so far.
    pub total_queries: u64,
    /// Mean query execution time.
    pub avg_execution_time_ms: f64,
    /// Cumulative I/O operations.
    pub total_io_operations: u64,
    /// Buffer cache hit ratio in `0.0..=1.0`.
    pub buffer_cache_hit_ratio: f64,
    /// Tables currently defined.
    pub active_tables: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_envelope_collapses_text_detail() {
        let envelope: ErrorEnvelope =
            serde_json::from_value(json!({"detail": "table not found"})).expect("decode");
        assert_eq!(envelope.message("fallback"), "table not found");
        assert!(!envelope.signals_invalid_token());
    }

    #[test]
    fn error_envelope_joins_validation_issues() {
        let envelope: ErrorEnvelope = serde_json::from_value(json!({
            "detail": [
                {"msg": "username is required", "loc": ["body", "username"]},
                {"msg": "password too short"}
            ]
        }))
        .expect("decode");
        assert_eq!(
            envelope.message("fallback"),
            "username is required, password too short"
        );
    }

    #[test]
    fn error_envelope_falls_back_when_detail_absent() {
        let envelope: ErrorEnvelope = serde_json::from_value(json!({})).expect("decode");
        assert_eq!(envelope.message("generic failure"), "generic failure");
    }

    #[test]
    fn error_envelope_detects_invalid_token_marker() {
        let invalid: ErrorEnvelope =
            serde_json::from_value(json!({"detail": "Invalid token"})).expect("decode");
        assert!(invalid.signals_invalid_token());

        let other: ErrorEnvelope =
            serde_json::from_value(json!({"detail": "insufficient permissions"})).expect("decode");
        assert!(!other.signals_invalid_token());
    }

    #[test]
    fn auth_response_prefers_access_token_over_legacy_field() {
        let both: AuthResponse = serde_json::from_value(json!({
            "access_token": "abc",
            "token": "legacy",
            "token_type": "bearer",
            "username": "ada"
        }))
        .expect("decode");
        assert_eq!(both.bearer_token(), Some("abc"));

        let legacy: AuthResponse =
            serde_json::from_value(json!({"token": "legacy"})).expect("decode");
        assert_eq!(legacy.bearer_token(), Some("legacy"));

        let neither: AuthResponse = serde_json::from_value(json!({})).expect("decode");
        assert_eq!(neither.bearer_token(), None);
    }

    #[test]
    fn column_spec_round_trips_wire_names() {
        let spec = ColumnSpec {
            name: "price".to_string(),
            data_type: ColumnType::Varchar,
            size: Some(32),
            index_type: Some(IndexKind::Btree),
        };
        let value = serde_json::to_value(&spec).expect("encode");
        assert_eq!(
            value,
            json!({"name": "price", "data_type": "VARCHAR", "size": 32, "index_type": "BTREE"})
        );
    }

    #[test]
    fn table_page_response_decodes_row_major_data() {
        let page: TablePageResponse = serde_json::from_value(json!({
            "columns": ["id", "name"],
            "data": [[1, "ore"], [2, null]],
            "total_rows": 230,
            "current_page": 3,
            "total_pages": 5,
            "page_size": 50
        }))
        .expect("decode");
        assert_eq!(page.columns, vec!["id", "name"]);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[1][1], Value::Null);
        assert_eq!(page.current_page, 3);
    }
}
