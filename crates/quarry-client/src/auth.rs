//! Login, registration, and logout against the auth endpoints.
//!
//! Successful authentication is the only place a credential is created;
//! the token lands in the client's [`crate::token::TokenStore`] before
//! the call returns, so the next request already carries it.

use quarry_api_models::{AuthResponse, LoginRequest, RegisterRequest};

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// `POST /auth/login`, storing the issued credential on success.
///
/// # Errors
///
/// Empty credentials fail locally; a success body without a token field
/// is an unexpected-format error (the session is not half-opened).
pub async fn login(client: &ApiClient, username: &str, password: &str) -> ClientResult<AuthResponse> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ClientError::precondition("username must not be empty"));
    }
    if password.is_empty() {
        return Err(ClientError::precondition("password must not be empty"));
    }

    let request = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    let response: AuthResponse = client.post_json("/auth/login", &request).await?;
    store_credential(client, &response)?;
    Ok(response)
}

/// `POST /auth/register`, storing the issued credential on success.
///
/// # Errors
///
/// Empty fields fail locally; otherwise as [`login`].
pub async fn register(
    client: &ApiClient,
    username: &str,
    email: &str,
    password: &str,
) -> ClientResult<AuthResponse> {
    let username = username.trim();
    let email = email.trim();
    if username.is_empty() {
        return Err(ClientError::precondition("username must not be empty"));
    }
    if email.is_empty() {
        return Err(ClientError::precondition("email must not be empty"));
    }
    if password.is_empty() {
        return Err(ClientError::precondition("password must not be empty"));
    }

    let request = RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };
    let response: AuthResponse = client.post_json("/auth/register", &request).await?;
    store_credential(client, &response)?;
    Ok(response)
}

/// Drop the session locally. No network call is involved; the server
/// keeps no session state beyond the token itself.
pub fn logout(client: &ApiClient) {
    client.tokens().clear();
}

fn store_credential(client: &ApiClient, response: &AuthResponse) -> ClientResult<()> {
    let token = response.bearer_token().ok_or_else(|| {
        ClientError::unexpected_format("authentication succeeded but no token was issued")
    })?;
    client.tokens().set(token);
    Ok(())
}
