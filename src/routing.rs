//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};

use crate::{
    app_state::AppState,
    auth::{auth_guard, ownership_guard},
    endpoints,
    log_in::log_in,
    logging::logging_middleware,
    profile::{change_password, delete_account, get_profile, update_profile},
    register_user::register_user,
    stats::get_stats_endpoint,
    stores::{TransactionStore, UserStore},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        get_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router<T, U>(state: AppState<T, U>) -> Router
where
    T: TransactionStore + Clone + Send + Sync + 'static,
    U: UserStore + Clone + Send + Sync + 'static,
{
    let single_transaction_routes = Router::new()
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint::<T>)
                .delete(delete_transaction_endpoint::<T>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            ownership_guard::<T>,
        ));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint::<T>).post(create_transaction_endpoint::<T>),
        )
        .route(endpoints::TRANSACTION_STATS, get(get_stats_endpoint::<T>))
        .route(
            endpoints::PROFILE,
            get(get_profile)
                .put(update_profile::<U>)
                .delete(delete_account::<U>),
        )
        .route(endpoints::PASSWORD, put(change_password::<U>))
        .merge(single_transaction_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_guard::<U>,
        ));

    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::REGISTER, post(register_user::<U>))
        .route(endpoints::LOG_IN, post(log_in::<U>));

    unprotected_routes
        .merge(protected_routes)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_coffee() -> impl IntoResponse {
    StatusCode::IM_A_TEAPOT
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{routing::build_router, stores::sqlite::create_app_state};

    fn get_test_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = create_app_state(db_connection, "foobar").expect("Could not create app state.");

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn coffee_route_is_a_teapot() {
        let server = get_test_server();

        server
            .get("/coffee")
            .await
            .assert_status(StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        server
            .get("/definitely/not/a/route")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn transaction_routes_are_protected() {
        let server = get_test_server();

        server.get("/transactions").await.assert_status_unauthorized();
        server
            .get("/transactions/stats")
            .await
            .assert_status_unauthorized();
        server
            .get("/transactions/1")
            .await
            .assert_status_unauthorized();
    }
}
