//! Authentication middleware that resolves bearer tokens to users, and the
//! ownership middleware that gates single-transaction routes.

use axum::{
    Json, RequestExt,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde_json::json;

use crate::{
    Error,
    app_state::{AuthState, TransactionState},
    auth::decode_token,
    models::{DatabaseID, User},
    stores::{TransactionStore, UserStore},
};

/// The ways resolving a bearer token to a user can fail.
///
/// Every variant maps to 401 so that clients get a single, uniform signal to
/// re-authenticate.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token was attached to the request.
    MissingToken,
    /// The token was malformed or failed signature validation, or its user no
    /// longer exists.
    InvalidToken,
    /// The token was valid but is past its expiry.
    ExpiredToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let error_message = match self {
            AuthError::MissingToken => "authentication required",
            AuthError::InvalidToken => "invalid bearer token",
            AuthError::ExpiredToken => "bearer token has expired",
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Middleware function that checks for a valid bearer token and attaches the
/// resolved [User] to the request.
///
/// The user is looked up in the store on every request, so tokens held for
/// deleted accounts fail closed even though they are still validly signed.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user): Extension<User>` to receive the authenticated user.
pub async fn auth_guard<U>(
    State(state): State<AuthState<U>>,
    mut request: Request,
    next: Next,
) -> Response
where
    U: UserStore + Clone + Send + Sync + 'static,
{
    let bearer = match request
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
    {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(_) => return AuthError::MissingToken.into_response(),
    };

    let claims = match decode_token(bearer.token(), &state.decoding_key) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    let user = match state.user_store.get(claims.user_id()) {
        Ok(user) => user,
        Err(Error::NotFound) => return AuthError::InvalidToken.into_response(),
        Err(error) => return error.into_response(),
    };

    request.extensions_mut().insert(user);

    next.run(request).await
}

/// Middleware function that loads the transaction named in the path and checks
/// that it belongs to the authenticated user.
///
/// Must be layered inside [auth_guard] so the authenticated [User] is already
/// in the request extensions.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(transaction): Extension<Transaction>` to receive the loaded
/// transaction and avoid a second lookup.
pub async fn ownership_guard<T>(
    State(state): State<TransactionState<T>>,
    Path(transaction_id): Path<DatabaseID>,
    mut request: Request,
    next: Next,
) -> Response
where
    T: TransactionStore + Clone + Send + Sync + 'static,
{
    let Some(user) = request.extensions().get::<User>().cloned() else {
        return AuthError::MissingToken.into_response();
    };

    let transaction = match state.transaction_store.get(transaction_id) {
        Ok(transaction) => transaction,
        Err(error) => return error.into_response(),
    };

    if transaction.user_id() != user.id() {
        // Respond with 404 not found so that unauthorized users cannot know
        // whether another user's resource exists.
        return Error::NotFound.into_response();
    }

    request.extensions_mut().insert(transaction);

    next.run(request).await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{Json, Router, middleware, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        app_state::AuthState,
        auth::{auth_guard, encode_token},
        models::{PasswordHash, User},
        stores::{
            UserStore,
            sqlite::{SQLAppState, SQLiteUserStore, create_app_state},
        },
    };

    async fn test_handler() -> Json<&'static str> {
        Json("Hello, World!")
    }

    const TEST_PROTECTED_ROUTE: &str = "/protected";

    fn get_test_state() -> SQLAppState {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        create_app_state(db_connection, "foobar").expect("Could not create app state.")
    }

    fn get_test_server(state: SQLAppState) -> TestServer {
        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_guard::<SQLiteUserStore>,
            ))
            .with_state(state);

        TestServer::new(app)
    }

    fn create_test_user(state: &mut SQLAppState) -> User {
        state
            .user_store
            .create(
                "Jo Bloggs",
                "test@test.com".parse().unwrap(),
                PasswordHash::new_unchecked("hunter2"),
            )
            .expect("Could not create test user.")
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_token() {
        let mut state = get_test_state();
        let user = create_test_user(&mut state);
        let token = encode_token(user.id(), state.token_duration, &state.encoding_key).unwrap();
        let server = get_test_server(state);

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn get_protected_route_with_missing_header() {
        let server = get_test_server(get_test_state());

        server
            .get(TEST_PROTECTED_ROUTE)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn get_protected_route_with_garbage_token() {
        let server = get_test_server(get_test_state());

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer("FOOBAR")
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn get_protected_route_with_token_for_deleted_user() {
        let mut state = get_test_state();
        let user = create_test_user(&mut state);
        let token = encode_token(user.id(), state.token_duration, &state.encoding_key).unwrap();
        state.user_store.delete(user.id()).unwrap();
        let server = get_test_server(state);

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn get_protected_route_with_wrong_signing_key() {
        let mut state = get_test_state();
        let user = create_test_user(&mut state);
        let other_state = AuthState {
            decoding_key: jsonwebtoken::DecodingKey::from_secret("other-secret".as_bytes()),
            user_store: state.user_store.clone(),
        };
        let token = encode_token(user.id(), state.token_duration, &state.encoding_key).unwrap();

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(
                other_state,
                auth_guard::<SQLiteUserStore>,
            ));
        let server = TestServer::new(app);

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await
            .assert_status_unauthorized();
    }
}
