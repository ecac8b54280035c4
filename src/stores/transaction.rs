//! Defines the transaction store trait.

use chrono::NaiveDate;

use crate::{
    Error,
    models::{DatabaseID, Transaction, TransactionBuilder, UserID},
};

/// Handles the creation and retrieval of transactions.
pub trait TransactionStore {
    /// Create a new transaction in the store from a validated builder.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve a transaction from the store by its ID.
    ///
    /// Returns [Error::NotFound] if no transaction with the given ID exists.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error>;

    /// Retrieve the transactions owned by `user_id` in the way defined by `query`.
    ///
    /// An empty vector is returned if the user has no matching transactions.
    fn get_by_user(
        &self,
        user_id: UserID,
        query: TransactionQuery,
    ) -> Result<Vec<Transaction>, Error>;

    /// Write back an updated transaction.
    ///
    /// Returns [Error::UpdateMissingTransaction] if the transaction does not
    /// exist in the store.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error>;

    /// Remove a transaction from the store.
    ///
    /// Returns [Error::DeleteMissingTransaction] if the transaction does not
    /// exist in the store.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error>;
}

/// Defines how transactions should be fetched from [TransactionStore::get_by_user].
///
/// The date bounds are inclusive and independently optional: an absent bound
/// leaves that side of the range unbounded.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionQuery {
    /// Include transactions on or after this date.
    pub start_date: Option<NaiveDate>,
    /// Include transactions on or before this date.
    pub end_date: Option<NaiveDate>,
    /// Orders transactions by date in the order `sort_date`. None returns
    /// transactions in the order they are stored.
    pub sort_date: Option<SortOrder>,
}

/// The order to sort transactions in a [TransactionQuery].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}
