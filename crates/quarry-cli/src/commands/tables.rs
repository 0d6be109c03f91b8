use std::fs;

use anyhow::Context;
use quarry_client::upload::SelectedFile;
use quarry_client::{PageBrowser, tables};

use crate::cli::{OutputFormat, TableCreateArgs, TableDataArgs, TableRemoveArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_table_list, render_table_page};

pub(crate) async fn handle_list(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    let listing = tables::list_tables(&ctx.api).await?;
    render_table_list(&listing, output)
}

pub(crate) async fn handle_create(ctx: &AppContext, args: TableCreateArgs) -> CliResult<()> {
    let bytes = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))
        .map_err(CliError::failure)?;
    let name = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::validation(format!("path '{}' has no usable file name", args.file.display()))
        })?;

    let file = SelectedFile { name, bytes };
    let created =
        tables::create_table(&ctx.api, &args.name, file, &args.columns, !args.no_header).await?;
    println!(
        "Created table '{}' ({} row(s) ingested): {}",
        created.table_name, created.rows_inserted, created.message
    );
    Ok(())
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: TableRemoveArgs) -> CliResult<()> {
    tables::delete_table(&ctx.api, &args.name).await?;
    println!("Dropped table '{}'.", args.name);
    Ok(())
}

pub(crate) async fn handle_data(
    ctx: &AppContext,
    args: TableDataArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let browser = PageBrowser::new(&args.name);
    let page = browser
        .load_page(&ctx.api, args.page)
        .await?
        .ok_or_else(|| CliError::failure(anyhow::anyhow!("page load was superseded")))?;
    render_table_page(&page, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use quarry_api_models::{ColumnSpec, ColumnType};
    use serde_json::json;
    use std::env;
    use std::path::PathBuf;
    use url::Url;
    use uuid::Uuid;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!(
            "quarry-cli-test-{}-{}-{name}",
            std::process::id(),
            Uuid::new_v4()
        ))
    }

    fn context_for(server: &MockServer) -> AppContext {
        let base_url: Url = server.base_url().parse().expect("valid URL");
        let ctx = AppContext::build(base_url, 10, Some(temp_path("token"))).expect("build context");
        ctx.api.tokens().set("tok");
        ctx
    }

    #[tokio::test]
    async fn create_posts_the_file_with_its_schema() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/tables/create")
                .body_includes("id,city\n1,Lisbon\n")
                .body_includes("\"data_type\":\"INT\"");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "message": "table created",
                    "table_name": "trips",
                    "rows_inserted": 1
                }));
        });

        let source = temp_path("trips.csv");
        fs::write(&source, "id,city\n1,Lisbon\n").expect("write source");

        let ctx = context_for(&server);
        let args = TableCreateArgs {
            name: "trips".to_string(),
            file: source.clone(),
            columns: vec![ColumnSpec {
                name: "id".to_string(),
                data_type: ColumnType::Int,
                size: None,
                index_type: None,
            }],
            no_header: false,
        };
        handle_create(&ctx, args).await.expect("create should succeed");
        mock.assert();
        let _ = fs::remove_file(source);
    }

    #[tokio::test]
    async fn data_fetches_the_requested_page() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/tables/trips/data")
                .query_param("page", "2");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "columns": ["id", "city"],
                    "data": [[51, "Faro"]],
                    "total_rows": 51,
                    "current_page": 2,
                    "total_pages": 2,
                    "page_size": 50
                }));
        });

        let ctx = context_for(&server);
        handle_data(
            &ctx,
            TableDataArgs {
                name: "trips".to_string(),
                page: 2,
            },
            OutputFormat::Table,
        )
        .await
        .expect("page load should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn remove_issues_a_delete_request() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/tables/trips");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"message": "dropped"}));
        });

        let ctx = context_for(&server);
        handle_remove(
            &ctx,
            TableRemoveArgs {
                name: "trips".to_string(),
            },
        )
        .await
        .expect("remove should succeed");
        mock.assert();
    }
}
