//! Implements the state shared by the REST server's routes, and the substates
//! that individual handlers and middleware borrow from it.

use axum::extract::FromRef;
use chrono::Duration;
use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::{
    auth::default_token_duration,
    stores::{TransactionStore, UserStore},
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState<T, U>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    /// The key used for signing bearer tokens.
    pub encoding_key: EncodingKey,
    /// The key used for verifying bearer tokens.
    pub decoding_key: DecodingKey,
    /// The duration for which bearer tokens are valid.
    pub token_duration: Duration,
    /// The store for managing user [transactions](crate::models::Transaction).
    pub transaction_store: T,
    /// The store for managing [users](crate::models::User).
    pub user_store: U,
}

impl<T, U> AppState<T, U>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    /// Create a new [AppState].
    ///
    /// The signing and verification keys are both derived from `token_secret`.
    pub fn new(token_secret: &str, transaction_store: T, user_store: U) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(token_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(token_secret.as_bytes()),
            token_duration: default_token_duration(),
            transaction_store,
            user_store,
        }
    }
}

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState<U>
where
    U: UserStore + Clone + Send + Sync,
{
    /// The key used for verifying bearer tokens.
    pub decoding_key: DecodingKey,
    /// The store used to resolve token subjects to users.
    pub user_store: U,
}

impl<T, U> FromRef<AppState<T, U>> for AuthState<U>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    fn from_ref(state: &AppState<T, U>) -> Self {
        Self {
            decoding_key: state.decoding_key.clone(),
            user_store: state.user_store.clone(),
        }
    }
}

/// The state needed for the account routes (register, log in, profile).
#[derive(Clone)]
pub struct AccountState<U>
where
    U: UserStore + Clone + Send + Sync,
{
    /// The key used for signing bearer tokens.
    pub encoding_key: EncodingKey,
    /// The duration for which bearer tokens are valid.
    pub token_duration: Duration,
    /// The store for managing users.
    pub user_store: U,
}

impl<T, U> FromRef<AppState<T, U>> for AccountState<U>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    fn from_ref(state: &AppState<T, U>) -> Self {
        Self {
            encoding_key: state.encoding_key.clone(),
            token_duration: state.token_duration,
            user_store: state.user_store.clone(),
        }
    }
}

/// The state needed for the transaction routes and the statistics route.
#[derive(Clone)]
pub struct TransactionState<T>
where
    T: TransactionStore + Clone + Send + Sync,
{
    /// The store for managing user transactions.
    pub transaction_store: T,
}

impl<T, U> FromRef<AppState<T, U>> for TransactionState<T>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    fn from_ref(state: &AppState<T, U>) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}
