//! SQL execution through `POST /query`.

use quarry_api_models::QueryRequest;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::normalize::{QueryOutcome, normalize};

/// Execute a query and fold the server's response into a
/// [`QueryOutcome`].
///
/// The response body is taken as loose JSON first; shape detection and
/// validation live in [`normalize`], so callers see one outcome type no
/// matter which of the server's formats answered.
///
/// # Errors
///
/// A blank query fails locally. Server errors propagate as-is; a body
/// that fits none of the known shapes is an unexpected-format error.
pub async fn execute_query(client: &ApiClient, query: &str) -> ClientResult<QueryOutcome> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ClientError::precondition("query must not be empty"));
    }

    let request = QueryRequest {
        query: query.to_string(),
    };
    let payload: Value = client.post_json("/query", &request).await?;
    normalize(&payload)
}
