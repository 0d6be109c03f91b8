use quarry_client::query;

use crate::cli::{OutputFormat, QueryArgs};
use crate::client::{AppContext, CliResult};
use crate::output::render_query_outcome;

pub(crate) async fn handle_query(
    ctx: &AppContext,
    args: QueryArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let outcome = query::execute_query(&ctx.api, &args.sql).await?;
    render_query_outcome(&outcome, output)
}
