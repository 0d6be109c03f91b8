//! Per-user service metrics.

use quarry_api_models::MetricsSnapshot;

use crate::error::ClientResult;
use crate::http::ApiClient;

/// `GET /metrics`: counters the server accumulates for the
/// authenticated user.
///
/// # Errors
///
/// Propagates transport and API failures from the client.
pub async fn fetch_metrics(client: &ApiClient) -> ClientResult<MetricsSnapshot> {
    client.get_json("/metrics").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenStore;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn metrics_decode_into_a_snapshot() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/metrics");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "total_queries": 42,
                    "avg_execution_time_ms": 12.25,
                    "total_io_operations": 9000,
                    "buffer_cache_hit_ratio": 0.875,
                    "active_tables": 3
                }));
        });

        let tokens = Arc::new(TokenStore::ephemeral());
        tokens.set("tok");
        let base_url = server.base_url().parse().expect("valid URL");
        let client = ApiClient::with_default_timeout(base_url, tokens).expect("build client");
        let snapshot = fetch_metrics(&client).await.expect("metrics ok");
        assert_eq!(snapshot.total_queries, 42);
        assert!((snapshot.buffer_cache_hit_ratio - 0.875).abs() < f64::EPSILON);
        assert_eq!(snapshot.active_tables, 3);
        mock.assert();
    }
}
