//! This file defines the routes for creating, reading, updating and deleting
//! the authenticated user's transactions.

use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error,
    app_state::TransactionState,
    models::{Transaction, TransactionPatch, TransactionType, User},
    stores::{SortOrder, TransactionQuery, TransactionStore},
};

/// The data a client submits to create a transaction.
///
/// The transaction type is taken as a string and parsed explicitly so that an
/// unknown type is reported as a validation error rather than a generic
/// deserialization failure.
#[derive(Debug, Deserialize)]
pub struct CreateTransaction {
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// The amount of money, must be greater than zero.
    pub amount: f64,
    /// The label that groups related transactions.
    pub category: String,
    /// Optional free-text note.
    pub note: Option<String>,
    /// When the transaction happened. Defaults to today when omitted.
    pub date: Option<NaiveDate>,
}

/// A route handler for creating a new transaction owned by the authenticated
/// user.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidTransactionType] if the type is not `income` or `expense`,
/// - [Error::NonPositiveAmount] if the amount is zero or less,
/// - or [Error::EmptyCategory] if the category is empty or whitespace.
pub async fn create_transaction_endpoint<T>(
    State(mut state): State<TransactionState<T>>,
    Extension(user): Extension<User>,
    Json(data): Json<CreateTransaction>,
) -> Result<(StatusCode, Json<Transaction>), Error>
where
    T: TransactionStore + Clone + Send + Sync,
{
    let transaction_type = TransactionType::parse(&data.transaction_type)?;

    let mut builder =
        Transaction::build(transaction_type, data.amount, &data.category, user.id())?
            .note(data.note);

    if let Some(date) = data.date {
        builder = builder.date(date);
    }

    let transaction = state.transaction_store.create(builder)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for listing all of the authenticated user's transactions,
/// most recent first.
pub async fn get_transactions_endpoint<T>(
    State(state): State<TransactionState<T>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Transaction>>, Error>
where
    T: TransactionStore + Clone + Send + Sync,
{
    let transactions = state.transaction_store.get_by_user(
        user.id(),
        TransactionQuery {
            sort_date: Some(SortOrder::Descending),
            ..Default::default()
        },
    )?;

    Ok(Json(transactions))
}

/// A route handler for getting a single transaction.
///
/// The ownership middleware has already loaded the transaction and verified
/// that it belongs to the authenticated user.
pub async fn get_transaction_endpoint(
    Extension(transaction): Extension<Transaction>,
) -> Json<Transaction> {
    Json(transaction)
}

/// A partial update to a transaction.
///
/// Fields absent from the request body leave the stored values untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateTransaction {
    /// Replace the transaction type.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Replace the amount. Re-validated with the creation rules.
    pub amount: Option<f64>,
    /// Replace the category. Re-validated with the creation rules.
    pub category: Option<String>,
    /// Replace the note.
    pub note: Option<String>,
    /// Replace the occurrence date.
    pub date: Option<NaiveDate>,
}

/// A route handler for partially updating an ownership-checked transaction.
///
/// # Errors
/// Returns the same validation errors as
/// [create_transaction_endpoint] for the fields that are present.
pub async fn update_transaction_endpoint<T>(
    State(mut state): State<TransactionState<T>>,
    Extension(transaction): Extension<Transaction>,
    Json(data): Json<UpdateTransaction>,
) -> Result<Json<Transaction>, Error>
where
    T: TransactionStore + Clone + Send + Sync,
{
    let transaction_type = data
        .transaction_type
        .as_deref()
        .map(TransactionType::parse)
        .transpose()?;

    let updated = transaction.merge_patch(TransactionPatch {
        transaction_type,
        amount: data.amount,
        category: data.category,
        note: data.note,
        date: data.date,
    })?;

    state.transaction_store.update(&updated)?;

    Ok(Json(updated))
}

/// A route handler for deleting an ownership-checked transaction.
pub async fn delete_transaction_endpoint<T>(
    State(mut state): State<TransactionState<T>>,
    Extension(transaction): Extension<Transaction>,
) -> Result<Json<Value>, Error>
where
    T: TransactionStore + Clone + Send + Sync,
{
    state.transaction_store.delete(transaction.id())?;

    Ok(Json(json!({
        "message": "transaction deleted",
    })))
}
