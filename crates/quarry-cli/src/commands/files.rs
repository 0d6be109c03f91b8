use std::fs;
use std::io::{self, Write};

use anyhow::Context;
use quarry_client::files;
use quarry_client::upload::{SelectedFile, UploadController};

use crate::cli::{FileRemoveArgs, FileUploadArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{format_bytes, render_file_list};

pub(crate) async fn handle_list(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    let listing = files::list_files(&ctx.api).await?;
    render_file_list(&listing, output)
}

pub(crate) async fn handle_upload(ctx: &AppContext, args: FileUploadArgs) -> CliResult<()> {
    let bytes = fs::read(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))
        .map_err(CliError::failure)?;
    let name = args
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::validation(format!("path '{}' has no usable file name", args.path.display()))
        })?;
    let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);

    let controller = UploadController::default();
    controller.select(SelectedFile { name, bytes });
    let response = controller
        .submit(&ctx.api, |percent| {
            eprint!("\ruploading: {percent:>3}%");
            let _ = io::stderr().flush();
        })
        .await;
    eprintln!();
    let response = response?;

    println!(
        "Uploaded '{}' ({}): {}",
        response.filename,
        format_bytes(size),
        response.message
    );
    Ok(())
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: FileRemoveArgs) -> CliResult<()> {
    files::delete_file(&ctx.api, &args.name).await?;
    println!("Deleted file '{}'.", args.name);
    Ok(())
}
