//! This file defines the log-in route and its handler.

use std::str::FromStr;

use axum::{Json, extract::State};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::{Error, app_state::AccountState, auth::encode_token, models::User, stores::UserStore};

/// The credentials a client exchanges for a bearer token.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Email entered during sign-in.
    pub email: String,
    /// Password entered during sign-in.
    pub password: String,
}

/// A bearer token paired with the user it identifies.
///
/// Returned by both the log-in and the registration route.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The bearer token to use on subsequent requests.
    pub token: String,
    /// The authenticated user.
    pub user: User,
}

/// Handler for log-in requests.
///
/// # Errors
///
/// Every failure mode (malformed email, unknown email, wrong password) is
/// reported as [Error::InvalidCredentials] so the response does not reveal
/// which part was wrong.
pub async fn log_in<U>(
    State(state): State<AccountState<U>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AuthResponse>, Error>
where
    U: UserStore + Clone + Send + Sync,
{
    let email =
        EmailAddress::from_str(credentials.email.trim()).map_err(|_| Error::InvalidCredentials)?;

    let user = state
        .user_store
        .get_by_email(&email)
        .map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?;

    let password_is_correct = user
        .password_hash()
        .verify(&credentials.password)
        .map_err(|error| {
            tracing::error!("Error verifying password: {error}");
            Error::HashingError(error.to_string())
        })?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(user.id(), state.token_duration, &state.encoding_key)?;

    Ok(Json(AuthResponse { token, user }))
}
