use std::io::{self, IsTerminal};

use anyhow::anyhow;
use quarry_client::auth;

use crate::cli::{LoginArgs, RegisterArgs};
use crate::client::{AppContext, CliError, CliResult};

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let password = resolve_password(args.password)?;
    let response = auth::login(&ctx.api, &args.username, &password).await?;
    let display_name = response.username.as_deref().unwrap_or(&args.username);
    println!("Signed in as '{display_name}'.");
    Ok(())
}

pub(crate) async fn handle_register(ctx: &AppContext, args: RegisterArgs) -> CliResult<()> {
    let password = resolve_password(args.password)?;
    let response = auth::register(&ctx.api, &args.username, &args.email, &password).await?;
    let display_name = response.username.as_deref().unwrap_or(&args.username);
    println!("Account '{display_name}' created and signed in.");
    Ok(())
}

pub(crate) fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    auth::logout(&ctx.api);
    println!("Signed out.");
    Ok(())
}

fn resolve_password(flag: Option<String>) -> CliResult<String> {
    if let Some(value) = flag {
        if value.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        return Ok(value);
    }

    if io::stdin().is_terminal() {
        let pass = rpassword::prompt_password("Password: ").map_err(|err| {
            CliError::failure(anyhow!("failed to read password from stdin: {err}"))
        })?;
        if pass.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        Ok(pass)
    } else {
        Err(CliError::validation(
            "password required; supply via --password or QUARRY_PASSWORD when running non-interactively",
        ))
    }
}
