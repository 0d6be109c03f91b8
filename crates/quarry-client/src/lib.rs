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

//! Session and data-access layer for the Quarry database service.
//!
//! Everything here is UI-agnostic: a consumer owns an [`ApiClient`]
//! (which carries the [`TokenStore`]) and calls the operation modules;
//! session expiry, response normalization, and page/upload state
//! tracking are handled inside this crate.
//!
//! Layout:
//! - `token.rs`: credential cell with pluggable persistence
//! - `http.rs`: configured request pipeline and 401 interception
//! - `auth.rs`, `files.rs`, `tables.rs`, `query.rs`, `metrics.rs`:
//!   one module per endpoint group
//! - `normalize.rs`: folds the query endpoint's response shapes into
//!   one outcome type
//! - `pages.rs`: paginated table browsing with stale-response discard
//! - `upload.rs`: file selection, drag state, and progress-reporting
//!   multipart upload

pub mod auth;
pub mod error;
pub mod files;
pub mod http;
pub mod metrics;
pub mod normalize;
pub mod pages;
pub mod query;
pub mod tables;
pub mod token;
pub mod upload;

pub use error::{ClientError, ClientResult};
pub use http::{ApiClient, DEFAULT_TIMEOUT_SECS, HEADER_REQUEST_ID};
pub use normalize::{QueryOutcome, normalize};
pub use pages::{FetchState, PAGE_SIZE, PageBrowser, TablePage};
pub use token::{EphemeralPersistence, FileTokenPersistence, TokenPersistence, TokenStore};
pub use upload::{SelectedFile, UploadController, UploadPhase};
