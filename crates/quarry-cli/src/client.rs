//! Shared error types and client construction for the CLI.

use std::env;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use quarry_client::{ApiClient, ClientError, FileTokenPersistence, TokenStore};
use url::Url;

/// Failure split for the terminal surface: rejected input versus a
/// command that could not complete.
#[derive(Debug)]
pub(crate) enum CliError {
    /// The invocation was refused before doing any work (exit 2).
    Validation(String),
    /// The command ran and failed (exit 3).
    Failure(anyhow::Error),
}

/// Result alias used by every command handler.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    /// Text printed to stderr before the process exits.
    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("command failed")
    }
}

impl std::error::Error for CliError {}

impl From<ClientError> for CliError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Precondition { message } => Self::validation(message),
            ClientError::SessionExpired => {
                Self::validation("session expired; run 'quarry login' to sign in again")
            }
            other => Self::failure(anyhow!(other)),
        }
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) api: ApiClient,
}

impl AppContext {
    /// Build the API client with a file-backed token store so the
    /// session survives across invocations.
    pub(crate) fn build(base_url: Url, timeout_secs: u64, token_file: Option<PathBuf>) -> CliResult<Self> {
        let path = token_file.unwrap_or_else(default_token_path);
        let tokens = Arc::new(TokenStore::new(FileTokenPersistence::new(path)));
        let api = ApiClient::new(base_url, Duration::from_secs(timeout_secs), tokens)
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
        Ok(Self { api })
    }
}

/// Where the session token lives when `--token-file` is not given.
pub(crate) fn default_token_path() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || env::temp_dir().join("quarry-token"),
        |home| {
            let mut path = PathBuf::from(home);
            path.push(".quarry");
            path.push("token");
            path
        },
    )
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}
