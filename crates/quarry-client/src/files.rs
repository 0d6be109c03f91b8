//! Listing and removal of uploaded files.
//!
//! Uploads themselves go through [`crate::upload::UploadController`],
//! which owns the progress-reporting multipart stream.

use quarry_api_models::FileInfo;

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// `GET /files`: every file the authenticated user has uploaded.
///
/// # Errors
///
/// Propagates transport and API failures from the client.
pub async fn list_files(client: &ApiClient) -> ClientResult<Vec<FileInfo>> {
    client.get_json("/files").await
}

/// `DELETE /files/{name}`.
///
/// # Errors
///
/// An empty name fails locally; a file unknown to the server surfaces
/// as the server's 404 payload.
pub async fn delete_file(client: &ApiClient, name: &str) -> ClientResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientError::precondition("file name must not be empty"));
    }
    client.delete(&format!("/files/{name}")).await
}
