//! This file defines the type `Transaction`, the core type of the finance
//! tracking part of the application, along with its validation rules.

use std::fmt::Display;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    models::{DatabaseID, UserID},
};

/// Whether a transaction brought money in or sent money out.
///
/// This is a closed, two-value enumeration: the direction of a transaction is
/// carried here and the amount is always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received, e.g. salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// Parse a transaction type from its wire representation.
    ///
    /// # Errors
    /// Returns [Error::InvalidTransactionType] if `value` is not `income` or
    /// `expense`.
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::InvalidTransactionType(other.to_string())),
        }
    }

    /// The wire and database representation of the transaction type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().and_then(|text| {
            TransactionType::parse(text)
                .map_err(|_| FromSqlError::Other("invalid transaction type".into()))
        })
    }
}

/// Check that a transaction amount is strictly positive.
///
/// # Errors
/// Returns [Error::NonPositiveAmount] if `amount` is zero or less.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::NonPositiveAmount)
    }
}

/// Check that a category label is not empty or whitespace.
///
/// # Errors
/// Returns [Error::EmptyCategory] if `category` contains no visible characters.
pub fn validate_category(category: &str) -> Result<(), Error> {
    if category.trim().is_empty() {
        Err(Error::EmptyCategory)
    } else {
        Ok(())
    }
}

/// An income or expense record owned by a user.
///
/// To create a new transaction use [Transaction::build] and pass the builder
/// to a [TransactionStore](crate::stores::TransactionStore). Ownership is
/// fixed at creation and cannot be changed by [Transaction::merge_patch].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: DatabaseID,
    user_id: UserID,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    amount: f64,
    category: String,
    note: Option<String>,
    date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Start building a new transaction owned by `user_id`.
    ///
    /// Shortcut for [TransactionBuilder::new] for discoverability.
    ///
    /// # Errors
    /// Returns an error if `amount` or `category` is invalid, see
    /// [TransactionBuilder::new].
    pub fn build(
        transaction_type: TransactionType,
        amount: f64,
        category: &str,
        user_id: UserID,
    ) -> Result<TransactionBuilder, Error> {
        TransactionBuilder::new(transaction_type, amount, category, user_id)
    }

    /// Create a transaction from its parts without validation.
    ///
    /// This is intended for store implementations mapping database rows that
    /// were validated on the way in.
    #[allow(clippy::too_many_arguments)]
    pub fn new_unchecked(
        id: DatabaseID,
        user_id: UserID,
        transaction_type: TransactionType,
        amount: f64,
        category: String,
        note: Option<String>,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            transaction_type,
            amount,
            category,
            note,
            date,
            created_at,
        }
    }

    /// The ID of the transaction.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The ID of the user that owns this transaction.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// Whether this transaction is an income or an expense.
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// The amount of money received or spent in this transaction.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// The user-defined label that groups related transactions.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// An optional free-text note.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// When the transaction happened.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// When the transaction record was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Apply a partial update, field by field, re-running the creation
    /// validation rules on the fields that are present.
    ///
    /// The ID, owner and creation timestamp are never touched.
    ///
    /// # Errors
    /// Returns the same errors as [TransactionBuilder::new] when a provided
    /// field fails validation. The transaction is returned unchanged in spirit:
    /// on error nothing should be persisted.
    pub fn merge_patch(mut self, patch: TransactionPatch) -> Result<Self, Error> {
        if let Some(transaction_type) = patch.transaction_type {
            self.transaction_type = transaction_type;
        }

        if let Some(amount) = patch.amount {
            self.amount = validate_amount(amount)?;
        }

        if let Some(category) = patch.category {
            validate_category(&category)?;
            self.category = category;
        }

        if let Some(note) = patch.note {
            self.note = Some(note);
        }

        if let Some(date) = patch.date {
            self.date = date;
        }

        Ok(self)
    }
}

/// A partial update to a [Transaction].
///
/// Each field is applied only if it is `Some`, so absent request fields leave
/// the stored value untouched.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionPatch {
    /// Replace the transaction type.
    pub transaction_type: Option<TransactionType>,
    /// Replace the amount. Re-validated on merge.
    pub amount: Option<f64>,
    /// Replace the category label. Re-validated on merge.
    pub category: Option<String>,
    /// Replace the note.
    pub note: Option<String>,
    /// Replace the occurrence date.
    pub date: Option<NaiveDate>,
}

/// Builder for creating a new [Transaction].
///
/// The date defaults to today and can be overridden with
/// [TransactionBuilder::date]. Finalize the builder by passing it to
/// [TransactionStore::create](crate::stores::TransactionStore::create).
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    user_id: UserID,
    transaction_type: TransactionType,
    amount: f64,
    category: String,
    note: Option<String>,
    date: NaiveDate,
}

impl TransactionBuilder {
    /// Create a builder for a new transaction owned by `user_id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NonPositiveAmount] if `amount` is zero or less,
    /// - or [Error::EmptyCategory] if `category` is empty or whitespace.
    pub fn new(
        transaction_type: TransactionType,
        amount: f64,
        category: &str,
        user_id: UserID,
    ) -> Result<Self, Error> {
        validate_amount(amount)?;
        validate_category(category)?;

        Ok(Self {
            user_id,
            transaction_type,
            amount,
            category: category.to_string(),
            note: None,
            date: Utc::now().date_naive(),
        })
    }

    /// Set the note for the transaction.
    pub fn note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Set the date for the transaction, overriding the default of today.
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// The ID of the owning user.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// Whether the new transaction is an income or an expense.
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// The validated amount.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// The validated category label.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The optional note.
    pub fn note_value(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// The occurrence date.
    pub fn date_value(&self) -> NaiveDate {
        self.date
    }
}

#[cfg(test)]
mod transaction_type_tests {
    use crate::{Error, models::TransactionType};

    #[test]
    fn parse_accepts_both_variants() {
        assert_eq!(
            TransactionType::parse("income"),
            Ok(TransactionType::Income)
        );
        assert_eq!(
            TransactionType::parse("expense"),
            Ok(TransactionType::Expense)
        );
    }

    #[test]
    fn parse_rejects_unknown_type() {
        assert_eq!(
            TransactionType::parse("loan"),
            Err(Error::InvalidTransactionType("loan".to_string()))
        );
    }

    #[test]
    fn parse_rejects_wrong_case() {
        assert!(TransactionType::parse("Income").is_err());
    }
}

#[cfg(test)]
mod transaction_builder_tests {
    use chrono::{NaiveDate, Utc};

    use crate::{
        Error,
        models::{TransactionBuilder, TransactionType, UserID},
    };

    #[test]
    fn new_fails_on_zero_amount() {
        let result =
            TransactionBuilder::new(TransactionType::Expense, 0.0, "Groceries", UserID::new(1));

        assert_eq!(result, Err(Error::NonPositiveAmount));
    }

    #[test]
    fn new_fails_on_negative_amount() {
        let result =
            TransactionBuilder::new(TransactionType::Expense, -12.5, "Groceries", UserID::new(1));

        assert_eq!(result, Err(Error::NonPositiveAmount));
    }

    #[test]
    fn new_fails_on_whitespace_category() {
        let result =
            TransactionBuilder::new(TransactionType::Income, 100.0, "   ", UserID::new(1));

        assert_eq!(result, Err(Error::EmptyCategory));
    }

    #[test]
    fn new_defaults_date_to_today() {
        let builder =
            TransactionBuilder::new(TransactionType::Income, 100.0, "Salary", UserID::new(1))
                .unwrap();

        assert_eq!(builder.date_value(), Utc::now().date_naive());
    }

    #[test]
    fn date_overrides_default() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let builder =
            TransactionBuilder::new(TransactionType::Income, 100.0, "Salary", UserID::new(1))
                .unwrap()
                .date(date);

        assert_eq!(builder.date_value(), date);
    }
}
