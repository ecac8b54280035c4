//! This file defines the registration route and its handler.

use std::str::FromStr;

use axum::{Json, extract::State, http::StatusCode};
use email_address::EmailAddress;
use serde::Deserialize;

use crate::{
    Error,
    app_state::AccountState,
    auth::encode_token,
    log_in::AuthResponse,
    models::PasswordHash,
    stores::UserStore,
};

/// The data a client submits to create an account.
#[derive(Debug, Deserialize)]
pub struct RegisterData {
    /// The display name for the new account.
    pub name: String,
    /// The email address for the new account. Must not be in use.
    pub email: String,
    /// The password for the new account. Checked for strength before hashing.
    pub password: String,
}

/// Handler for creating a new account.
///
/// Responds with 201 and the same token+user payload as the log-in route so
/// clients can treat registration as an implicit log in.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if the name is empty or whitespace,
/// - [Error::InvalidEmail] if the email cannot be parsed,
/// - [Error::TooWeak] if the password is too easy to guess,
/// - or [Error::DuplicateEmail] if the email is already registered.
pub async fn register_user<U>(
    State(mut state): State<AccountState<U>>,
    Json(register_data): Json<RegisterData>,
) -> Result<(StatusCode, Json<AuthResponse>), Error>
where
    U: UserStore + Clone + Send + Sync,
{
    let name = register_data.name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    let email = EmailAddress::from_str(register_data.email.trim())
        .map_err(|_| Error::InvalidEmail(register_data.email.clone()))?;

    let password_hash =
        PasswordHash::from_raw_password(&register_data.password, PasswordHash::DEFAULT_COST)?;

    let user = state.user_store.create(name, email, password_hash)?;
    let token = encode_token(user.id(), state.token_duration, &state.encoding_key)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[cfg(test)]
mod register_user_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        routing::build_router,
        stores::sqlite::{SQLAppState, create_app_state},
    };

    const TEST_PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_state() -> SQLAppState {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        create_app_state(db_connection, "foobar").expect("Could not create app state.")
    }

    fn get_test_server() -> TestServer {
        TestServer::new(build_router(get_test_state()))
    }

    #[tokio::test]
    async fn register_creates_account_and_logs_in() {
        let server = get_test_server();

        let response = server
            .post("/auth/register")
            .content_type("application/json")
            .json(&json!({
                "name": "Jo Bloggs",
                "email": "test@test.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);

        let body: serde_json::Value = response.json();
        assert_eq!(body["user"]["name"], "Jo Bloggs");
        assert_eq!(body["user"]["email"], "test@test.com");

        // The returned token should work on protected routes straight away.
        let token = body["token"].as_str().unwrap().to_string();
        server
            .get("/auth/profile")
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn register_fails_on_duplicate_email() {
        let server = get_test_server();

        let register = || {
            server
                .post("/auth/register")
                .content_type("application/json")
                .json(&json!({
                    "name": "Jo Bloggs",
                    "email": "test@test.com",
                    "password": TEST_PASSWORD,
                }))
        };

        register().await.assert_status(StatusCode::CREATED);
        register().await.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn register_fails_on_weak_password() {
        let server = get_test_server();

        server
            .post("/auth/register")
            .content_type("application/json")
            .json(&json!({
                "name": "Jo Bloggs",
                "email": "test@test.com",
                "password": "hunter2",
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_fails_on_invalid_email() {
        let server = get_test_server();

        server
            .post("/auth/register")
            .content_type("application/json")
            .json(&json!({
                "name": "Jo Bloggs",
                "email": "not an email",
                "password": TEST_PASSWORD,
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_fails_on_blank_name() {
        let server = get_test_server();

        server
            .post("/auth/register")
            .content_type("application/json")
            .json(&json!({
                "name": "   ",
                "email": "test@test.com",
                "password": TEST_PASSWORD,
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
