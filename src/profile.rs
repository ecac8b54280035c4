//! This file defines the routes for managing the authenticated user's account:
//! reading and updating the profile, changing the password, and deleting the
//! account.

use std::str::FromStr;

use axum::{Extension, Json, extract::State};
use email_address::EmailAddress;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error,
    app_state::AccountState,
    models::{PasswordHash, User},
    stores::UserStore,
};

/// A route handler for reading the authenticated user's profile.
pub async fn get_profile(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// A partial update to the authenticated user's profile.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    /// Replace the display name.
    pub name: Option<String>,
    /// Replace the email address. Must not be in use by another account.
    pub email: Option<String>,
}

/// A route handler for updating the authenticated user's name and/or email.
///
/// Fields absent from the request body are left unchanged.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if a blank name is provided,
/// - [Error::InvalidEmail] if the email cannot be parsed,
/// - or [Error::DuplicateEmail] if the email belongs to another account.
pub async fn update_profile<U>(
    State(mut state): State<AccountState<U>>,
    Extension(user): Extension<User>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, Error>
where
    U: UserStore + Clone + Send + Sync,
{
    let name = match update.name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::EmptyName);
            }
            Some(name)
        }
        None => None,
    };

    let email = match update.email {
        Some(email) => Some(
            EmailAddress::from_str(email.trim()).map_err(|_| Error::InvalidEmail(email.clone()))?,
        ),
        None => None,
    };

    let updated_user = state.user_store.update_profile(user.id(), name, email)?;

    Ok(Json(updated_user))
}

/// The data a client submits to change their password.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    /// The password currently on the account.
    pub current_password: String,
    /// The replacement password. Checked for strength before hashing.
    pub new_password: String,
}

/// A route handler for changing the authenticated user's password.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCredentials] if the current password is wrong,
/// - or [Error::TooWeak] if the new password is too easy to guess.
pub async fn change_password<U>(
    State(mut state): State<AccountState<U>>,
    Extension(user): Extension<User>,
    Json(password_change): Json<PasswordChange>,
) -> Result<Json<Value>, Error>
where
    U: UserStore + Clone + Send + Sync,
{
    let current_is_correct = user
        .password_hash()
        .verify(&password_change.current_password)
        .map_err(|error| {
            tracing::error!("Error verifying password: {error}");
            Error::HashingError(error.to_string())
        })?;

    if !current_is_correct {
        return Err(Error::InvalidCredentials);
    }

    let password_hash = PasswordHash::from_raw_password(
        &password_change.new_password,
        PasswordHash::DEFAULT_COST,
    )?;

    state.user_store.update_password(user.id(), password_hash)?;

    Ok(Json(json!({
        "message": "password updated",
    })))
}

/// A route handler for deleting the authenticated user's account.
///
/// The user's transactions are deleted along with the account. Tokens issued
/// for the account remain validly signed but fail closed at the auth
/// middleware's user lookup.
pub async fn delete_account<U>(
    State(mut state): State<AccountState<U>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, Error>
where
    U: UserStore + Clone + Send + Sync,
{
    state.user_store.delete(user.id())?;

    Ok(Json(json!({
        "message": "account deleted",
    })))
}
