//! Page-indexed fetching for table-browsing views.
//!
//! The browser drives `GET /tables/{name}/data?page={n}` and keeps one
//! whole page as its display state. Each load replaces that state
//! atomically; overlapping loads are resolved by a monotonic sequence
//! guard so the last *issued* request wins regardless of network
//! resolution order.

use std::sync::{Mutex, MutexGuard, PoisonError};

use quarry_api_models::TablePageResponse;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// Fixed page size the service slices table data into.
pub const PAGE_SIZE: u64 = 50;

/// Lifecycle of the browser's display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// No load attempted yet.
    Idle,
    /// A load is in flight.
    Loading,
    /// The current page loaded successfully.
    Loaded,
    /// The most recent load failed.
    Errored,
}

/// One fully-loaded page of table rows with its display bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    /// Column names, in table order.
    pub columns: Vec<String>,
    /// Row-major cell values; at most [`PAGE_SIZE`] rows.
    pub rows: Vec<Vec<Value>>,
    /// 1-based index of this page.
    pub current_page: u64,
    /// Total number of pages (at least 1).
    pub total_pages: u64,
    /// Total rows in the table.
    pub total_rows: u64,
}

impl TablePage {
    /// Validate a wire payload into a display page.
    ///
    /// The server reports zero pages for empty tables; both counters are
    /// clamped to 1 so the page invariants hold for rendering.
    fn from_response(response: TablePageResponse) -> ClientResult<Self> {
        let current_page = response.current_page.max(1);
        let total_pages = response.total_pages.max(1);
        if current_page > total_pages {
            return Err(ClientError::unexpected_format(format!(
                "page {current_page} reported beyond {total_pages} total pages"
            )));
        }
        if u64::try_from(response.data.len()).unwrap_or(u64::MAX) > PAGE_SIZE {
            return Err(ClientError::unexpected_format(format!(
                "page carries {} rows, more than the {PAGE_SIZE}-row page size",
                response.data.len()
            )));
        }
        Ok(Self {
            columns: response.columns,
            rows: response.data,
            current_page,
            total_pages,
            total_rows: response.total_rows,
        })
    }

    /// 1-based ordinal of this page's first row within the table.
    #[must_use]
    pub const fn first_row_ordinal(&self) -> u64 {
        (self.current_page - 1) * PAGE_SIZE + 1
    }

    /// 1-based ordinal of this page's last row within the table.
    #[must_use]
    pub fn last_row_ordinal(&self) -> u64 {
        (self.current_page * PAGE_SIZE).min(self.total_rows)
    }
}

#[derive(Debug)]
struct BrowserState {
    state: FetchState,
    page: Option<TablePage>,
    total_pages: Option<u64>,
    issued: u64,
}

/// Re-entrant page fetcher for one table.
#[derive(Debug)]
pub struct PageBrowser {
    table: String,
    keep_stale: bool,
    inner: Mutex<BrowserState>,
}

impl PageBrowser {
    /// Browse the named table, clearing the display on failed loads.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_stale_policy(table, false)
    }

    /// Browse the named table; `keep_stale` keeps the last good page on
    /// display after a failed load instead of clearing it.
    #[must_use]
    pub fn with_stale_policy(table: impl Into<String>, keep_stale: bool) -> Self {
        Self {
            table: table.into(),
            keep_stale,
            inner: Mutex::new(BrowserState {
                state: FetchState::Idle,
                page: None,
                total_pages: None,
                issued: 0,
            }),
        }
    }

    fn guard(&self) -> MutexGuard<'_, BrowserState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Table this browser is bound to.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> FetchState {
        self.guard().state
    }

    /// The currently displayed page, if any.
    #[must_use]
    pub fn page(&self) -> Option<TablePage> {
        self.guard().page.clone()
    }

    /// Total pages learned from the last committed load.
    #[must_use]
    pub fn known_total_pages(&self) -> Option<u64> {
        self.guard().total_pages
    }

    /// Load `page` and replace the display state with the result.
    ///
    /// Returns `Ok(None)` when the resolution was superseded by a newer
    /// load and therefore discarded.
    ///
    /// # Errors
    ///
    /// Rejects out-of-range page numbers locally (no network call once
    /// the page count is known) and propagates request failures after
    /// transitioning to [`FetchState::Errored`].
    pub async fn load_page(
        &self,
        client: &ApiClient,
        page: u64,
    ) -> ClientResult<Option<TablePage>> {
        if page == 0 {
            return Err(ClientError::precondition("page numbers start at 1"));
        }

        let ticket = {
            let mut inner = self.guard();
            if let Some(total) = inner.total_pages
                && page > total
            {
                return Err(ClientError::precondition(format!(
                    "page {page} is beyond the table's {total} pages"
                )));
            }
            inner.state = FetchState::Loading;
            inner.issued += 1;
            inner.issued
        };

        // No lock is held across the await; overlapping loads race only
        // on the commit below.
        let path = format!("/tables/{}/data?page={page}", self.table);
        let result = client
            .get_json::<TablePageResponse>(&path)
            .await
            .and_then(TablePage::from_response);

        let mut inner = self.guard();
        if ticket != inner.issued {
            tracing::debug!(table = %self.table, page, "discarding superseded page load");
            return Ok(None);
        }

        match result {
            Ok(loaded) => {
                inner.total_pages = Some(loaded.total_pages);
                inner.page = Some(loaded.clone());
                inner.state = FetchState::Loaded;
                Ok(Some(loaded))
            }
            Err(err) => {
                inner.state = FetchState::Errored;
                if !self.keep_stale {
                    inner.page = None;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenStore;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn client_for(server: &MockServer) -> ApiClient {
        let base_url = server.base_url().parse().expect("valid URL");
        ApiClient::with_default_timeout(base_url, Arc::new(TokenStore::ephemeral()))
            .expect("build client")
    }

    fn page_body(current_page: u64, total_pages: u64, total_rows: u64) -> serde_json::Value {
        json!({
            "columns": ["id", "name"],
            "data": [[1, "ore"], [2, "slate"]],
            "total_rows": total_rows,
            "current_page": current_page,
            "total_pages": total_pages,
            "page_size": 50
        })
    }

    #[tokio::test]
    async fn load_replaces_state_and_derives_ordinals() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/tables/minerals/data")
                .query_param("page", "3");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page_body(3, 5, 230));
        });

        let client = client_for(&server);
        let browser = PageBrowser::new("minerals");
        assert_eq!(browser.state(), FetchState::Idle);

        let page = browser
            .load_page(&client, 3)
            .await
            .expect("load ok")
            .expect("committed");

        assert_eq!(browser.state(), FetchState::Loaded);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.first_row_ordinal(), 101);
        assert_eq!(page.last_row_ordinal(), 150);
        assert_eq!(browser.known_total_pages(), Some(5));
    }

    #[tokio::test]
    async fn last_page_ordinal_is_bounded_by_total_rows() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/tables/minerals/data")
                .query_param("page", "5");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page_body(5, 5, 230));
        });

        let client = client_for(&server);
        let browser = PageBrowser::new("minerals");
        let page = browser
            .load_page(&client, 5)
            .await
            .expect("load ok")
            .expect("committed");
        assert_eq!(page.first_row_ordinal(), 201);
        assert_eq!(page.last_row_ordinal(), 230);
    }

    #[tokio::test]
    async fn rejects_pages_past_known_total_without_a_request() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/tables/minerals/data")
                .query_param("page", "1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page_body(1, 2, 60));
        });
        let out_of_range = server.mock(|when, then| {
            when.method(GET)
                .path("/tables/minerals/data")
                .query_param("page", "7");
            then.status(200);
        });

        let client = client_for(&server);
        let browser = PageBrowser::new("minerals");
        browser.load_page(&client, 1).await.expect("first load ok");

        let err = browser
            .load_page(&client, 7)
            .await
            .expect_err("out-of-range page should be rejected locally");
        assert!(matches!(err, ClientError::Precondition { .. }));
        out_of_range.assert_calls(0);
    }

    #[tokio::test]
    async fn zero_page_number_is_rejected_locally() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);
        let browser = PageBrowser::new("minerals");
        let err = browser
            .load_page(&client, 0)
            .await
            .expect_err("page 0 is invalid");
        assert!(matches!(err, ClientError::Precondition { .. }));
    }

    #[tokio::test]
    async fn failed_load_clears_the_display_by_default() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/tables/minerals/data")
                .query_param("page", "1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page_body(1, 2, 60));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/tables/minerals/data")
                .query_param("page", "2");
            then.status(500)
                .header("content-type", "application/json")
                .json_body(json!({"detail": "storage failure"}));
        });

        let client = client_for(&server);
        let browser = PageBrowser::new("minerals");
        browser.load_page(&client, 1).await.expect("first load ok");
        assert!(browser.page().is_some());

        let err = browser
            .load_page(&client, 2)
            .await
            .expect_err("second load fails");
        assert!(matches!(err, ClientError::Api { status: 500, .. }));
        assert_eq!(browser.state(), FetchState::Errored);
        assert_eq!(browser.page(), None);
    }

    #[tokio::test]
    async fn keep_stale_policy_preserves_last_good_page() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/tables/minerals/data")
                .query_param("page", "1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page_body(1, 2, 60));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/tables/minerals/data")
                .query_param("page", "2");
            then.status(500);
        });

        let client = client_for(&server);
        let browser = PageBrowser::with_stale_policy("minerals", true);
        browser.load_page(&client, 1).await.expect("first load ok");

        let _ = browser
            .load_page(&client, 2)
            .await
            .expect_err("second load fails");
        let displayed = browser.page().expect("stale page kept");
        assert_eq!(displayed.current_page, 1);
        assert_eq!(browser.state(), FetchState::Errored);
    }

    #[tokio::test]
    async fn slow_superseded_load_is_discarded() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/tables/minerals/data")
                .query_param("page", "1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page_body(1, 5, 230))
                .delay(Duration::from_millis(300));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/tables/minerals/data")
                .query_param("page", "2");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page_body(2, 5, 230));
        });

        let client = client_for(&server);
        let browser = Arc::new(PageBrowser::new("minerals"));

        let slow = {
            let browser = Arc::clone(&browser);
            let client = client.clone();
            tokio::spawn(async move { browser.load_page(&client, 1).await })
        };
        // Give the first request time to leave before superseding it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fast = browser.load_page(&client, 2).await.expect("fast load ok");
        assert_eq!(fast.expect("committed").current_page, 2);

        let slow = slow.await.expect("task join").expect("slow load ok");
        assert_eq!(slow, None);

        let displayed = browser.page().expect("page displayed");
        assert_eq!(displayed.current_page, 2);
    }

    #[tokio::test]
    async fn empty_table_page_counters_are_clamped() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/tables/empty/data")
                .query_param("page", "1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "columns": ["id"],
                    "data": [],
                    "total_rows": 0,
                    "current_page": 1,
                    "total_pages": 0,
                    "page_size": 50
                }));
        });

        let client = client_for(&server);
        let browser = PageBrowser::new("empty");
        let page = browser
            .load_page(&client, 1)
            .await
            .expect("load ok")
            .expect("committed");
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.rows.len(), 0);
        assert_eq!(page.last_row_ordinal(), 0);
    }
}
