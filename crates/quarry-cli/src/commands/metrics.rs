use quarry_client::metrics;

use crate::cli::OutputFormat;
use crate::client::{AppContext, CliResult};
use crate::output::render_metrics;

pub(crate) async fn handle_metrics(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    let snapshot = metrics::fetch_metrics(&ctx.api).await?;
    render_metrics(&snapshot, output)
}
