//! Table inventory, creation from an uploaded file, and removal.

use quarry_api_models::{ColumnSpec, TableCreatedResponse, TableInfo};
use reqwest::multipart::{Form, Part};

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::upload::SelectedFile;

/// `GET /tables`: every table visible to the authenticated user.
///
/// # Errors
///
/// Propagates transport and API failures from the client.
pub async fn list_tables(client: &ApiClient) -> ClientResult<Vec<TableInfo>> {
    client.get_json("/tables").await
}

/// `POST /tables/create`: build a table by ingesting `file` with the
/// given schema. The column definitions travel as a JSON-encoded field
/// of the multipart form, alongside the raw file part.
///
/// # Errors
///
/// An empty table name or an empty schema fails locally; schema
/// serialization failures and server rejections propagate.
pub async fn create_table(
    client: &ApiClient,
    table_name: &str,
    file: SelectedFile,
    columns: &[ColumnSpec],
    has_header: bool,
) -> ClientResult<TableCreatedResponse> {
    let table_name = table_name.trim();
    if table_name.is_empty() {
        return Err(ClientError::precondition("table name must not be empty"));
    }
    if columns.is_empty() {
        return Err(ClientError::precondition(
            "at least one column definition is required",
        ));
    }

    let schema = serde_json::to_string(columns)
        .map_err(|err| ClientError::unexpected_format(format!("unencodable schema: {err}")))?;
    let part = Part::bytes(file.bytes).file_name(file.name);
    let form = Form::new()
        .part("file", part)
        .text("table_name", table_name.to_string())
        .text("columns", schema)
        .text("has_header", if has_header { "true" } else { "false" });

    client.post_multipart("/tables/create", form).await
}

/// `DELETE /tables/{name}`.
///
/// # Errors
///
/// An empty name fails locally; server rejections propagate.
pub async fn delete_table(client: &ApiClient, name: &str) -> ClientResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientError::precondition("table name must not be empty"));
    }
    client.delete(&format!("/tables/{name}")).await
}
