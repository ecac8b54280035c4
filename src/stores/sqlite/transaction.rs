//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{DatabaseID, Transaction, TransactionBuilder, UserID},
    stores::{SortOrder, TransactionQuery, TransactionStore},
};

/// Stores transactions in a SQLite database.
///
/// Note that because a transaction belongs to a [User](crate::models::User),
/// the user table must be set up in the database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, kind, amount, category, note, date, created_at FROM \"transaction\"";

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// The creation timestamp is set to the current time.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let created_at = Utc::now();

        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "INSERT INTO \"transaction\" (user_id, kind, amount, category, note, date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING id, user_id, kind, amount, category, note, date, created_at",
            )?
            .query_row(
                (
                    builder.user_id().as_i64(),
                    builder.transaction_type(),
                    builder.amount(),
                    builder.category(),
                    builder.note_value(),
                    builder.date_value(),
                    created_at,
                ),
                Self::map_row,
            )?;

        Ok(transaction)
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error> {
        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!("{SELECT_COLUMNS} WHERE id = :id"))?
            .query_row(&[(":id", &id)], Self::map_row)?;

        Ok(transaction)
    }

    /// Query for the transactions of `user_id` in the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL error.
    fn get_by_user(
        &self,
        user_id: UserID,
        query: TransactionQuery,
    ) -> Result<Vec<Transaction>, Error> {
        let mut query_string_parts = vec![SELECT_COLUMNS.to_string()];
        let mut where_clause_parts = vec!["user_id = ?1".to_string()];
        let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

        if let Some(start_date) = query.start_date {
            where_clause_parts.push(format!("date >= ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(start_date.to_string()));
        }

        if let Some(end_date) = query.end_date {
            where_clause_parts.push(format!("date <= ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(end_date.to_string()));
        }

        query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));

        match query.sort_date {
            Some(SortOrder::Ascending) => query_string_parts.push("ORDER BY date ASC".to_string()),
            Some(SortOrder::Descending) => {
                query_string_parts.push("ORDER BY date DESC".to_string())
            }
            None => {}
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_map(params, Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect()
    }

    fn update(&mut self, transaction: &Transaction) -> Result<(), Error> {
        let rows_updated = self.connection.lock().unwrap().execute(
            "UPDATE \"transaction\"
             SET kind = ?1, amount = ?2, category = ?3, note = ?4, date = ?5
             WHERE id = ?6",
            (
                transaction.transaction_type(),
                transaction.amount(),
                transaction.category(),
                transaction.note(),
                transaction.date(),
                transaction.id(),
            ),
        )?;

        if rows_updated == 0 {
            return Err(Error::UpdateMissingTransaction);
        }

        Ok(())
    }

    fn delete(&mut self, id: DatabaseID) -> Result<(), Error> {
        let rows_deleted = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

        if rows_deleted == 0 {
            return Err(Error::DeleteMissingTransaction);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    amount REAL NOT NULL,
                    category TEXT NOT NULL,
                    note TEXT,
                    date TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let user_id = UserID::new(row.get(offset + 1)?);
        let transaction_type = row.get(offset + 2)?;
        let amount = row.get(offset + 3)?;
        let category = row.get(offset + 4)?;
        let note = row.get(offset + 5)?;
        let date = row.get(offset + 6)?;
        let created_at = row.get(offset + 7)?;

        Ok(Transaction::new_unchecked(
            id,
            user_id,
            transaction_type,
            amount,
            category,
            note,
            date,
            created_at,
        ))
    }
}

#[cfg(test)]
mod sqlite_transaction_store_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use chrono::{NaiveDate, Utc};
    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        models::{PasswordHash, Transaction, TransactionPatch, TransactionType, User, UserID},
        stores::{
            SortOrder, TransactionQuery, TransactionStore, UserStore,
            sqlite::{SQLiteTransactionStore, SQLiteUserStore},
        },
    };

    fn get_store_and_user() -> (SQLiteTransactionStore, User) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let connection = Arc::new(Mutex::new(conn));

        let user = SQLiteUserStore::new(connection.clone())
            .create(
                "Jo Bloggs",
                EmailAddress::from_str("test@test.com").unwrap(),
                PasswordHash::new_unchecked("hunter2"),
            )
            .unwrap();

        (SQLiteTransactionStore::new(connection), user)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn create_succeeds() {
        let (mut store, user) = get_store_and_user();

        let transaction = store
            .create(
                Transaction::build(TransactionType::Expense, 12.3, "Groceries", user.id())
                    .unwrap()
                    .note(Some("weekly shop".to_string()))
                    .date(date(2024, 1, 5)),
            )
            .unwrap();

        assert!(transaction.id() > 0);
        assert_eq!(transaction.user_id(), user.id());
        assert_eq!(transaction.transaction_type(), TransactionType::Expense);
        assert_eq!(transaction.amount(), 12.3);
        assert_eq!(transaction.category(), "Groceries");
        assert_eq!(transaction.note(), Some("weekly shop"));
        assert_eq!(transaction.date(), date(2024, 1, 5));
    }

    #[test]
    fn create_sets_creation_timestamp() {
        let (mut store, user) = get_store_and_user();
        let before = Utc::now();

        let transaction = store
            .create(
                Transaction::build(TransactionType::Income, 100.0, "Salary", user.id()).unwrap(),
            )
            .unwrap();

        let after = Utc::now();
        assert!(transaction.created_at() >= before && transaction.created_at() <= after);
    }

    #[test]
    fn get_transaction_by_id_succeeds() {
        let (mut store, user) = get_store_and_user();
        let transaction = store
            .create(
                Transaction::build(TransactionType::Income, 100.0, "Salary", user.id()).unwrap(),
            )
            .unwrap();

        let selected_transaction = store.get(transaction.id());

        assert_eq!(Ok(transaction), selected_transaction);
    }

    #[test]
    fn get_transaction_fails_on_invalid_id() {
        let (mut store, user) = get_store_and_user();
        let transaction = store
            .create(
                Transaction::build(TransactionType::Income, 100.0, "Salary", user.id()).unwrap(),
            )
            .unwrap();

        let maybe_transaction = store.get(transaction.id() + 654);

        assert_eq!(maybe_transaction, Err(Error::NotFound));
    }

    #[test]
    fn get_by_user_returns_only_that_users_transactions() {
        let (mut store, user) = get_store_and_user();
        let own_transaction = store
            .create(
                Transaction::build(TransactionType::Expense, 12.3, "Groceries", user.id())
                    .unwrap(),
            )
            .unwrap();
        store
            .create(
                Transaction::build(
                    TransactionType::Expense,
                    99.9,
                    "Rent",
                    UserID::new(user.id().as_i64() + 1),
                )
                .unwrap(),
            )
            .unwrap();

        let transactions = store
            .get_by_user(user.id(), TransactionQuery::default())
            .unwrap();

        assert_eq!(transactions, vec![own_transaction]);
    }

    #[test]
    fn get_by_user_filters_by_date_range() {
        let (mut store, user) = get_store_and_user();

        let mut insert_on = |day| {
            store
                .create(
                    Transaction::build(TransactionType::Expense, 10.0, "Groceries", user.id())
                        .unwrap()
                        .date(date(2024, 1, day)),
                )
                .unwrap()
        };

        let _too_early = insert_on(1);
        let want = vec![insert_on(10), insert_on(15)];
        let _too_late = insert_on(20);

        let got = store
            .get_by_user(
                user.id(),
                TransactionQuery {
                    start_date: Some(date(2024, 1, 10)),
                    end_date: Some(date(2024, 1, 15)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(got, want);
    }

    #[test]
    fn get_by_user_with_only_start_date_is_unbounded_above() {
        let (mut store, user) = get_store_and_user();

        let mut insert_on = |day| {
            store
                .create(
                    Transaction::build(TransactionType::Expense, 10.0, "Groceries", user.id())
                        .unwrap()
                        .date(date(2024, 1, day)),
                )
                .unwrap()
        };

        let _too_early = insert_on(1);
        let want = vec![insert_on(10), insert_on(31)];

        let got = store
            .get_by_user(
                user.id(),
                TransactionQuery {
                    start_date: Some(date(2024, 1, 10)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(got, want);
    }

    #[test]
    fn get_by_user_with_only_end_date_is_unbounded_below() {
        let (mut store, user) = get_store_and_user();

        let mut insert_on = |day| {
            store
                .create(
                    Transaction::build(TransactionType::Expense, 10.0, "Groceries", user.id())
                        .unwrap()
                        .date(date(2024, 1, day)),
                )
                .unwrap()
        };

        let want = vec![insert_on(1), insert_on(10)];
        let _too_late = insert_on(31);

        let got = store
            .get_by_user(
                user.id(),
                TransactionQuery {
                    end_date: Some(date(2024, 1, 10)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(got, want);
    }

    #[test]
    fn get_by_user_descending_date() {
        let (mut store, user) = get_store_and_user();

        let mut want = vec![];
        for day in 1..=3 {
            let transaction = store
                .create(
                    Transaction::build(TransactionType::Expense, day as f64, "Groceries", user.id())
                        .unwrap()
                        .date(date(2024, 1, day)),
                )
                .unwrap();
            want.push(transaction);
        }

        want.sort_by(|a, b| b.date().cmp(&a.date()));

        let got = store
            .get_by_user(
                user.id(),
                TransactionQuery {
                    sort_date: Some(SortOrder::Descending),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(
            got, want,
            "got transactions that were not sorted in descending order."
        );
    }

    #[test]
    fn update_writes_back_changed_fields() {
        let (mut store, user) = get_store_and_user();
        let transaction = store
            .create(
                Transaction::build(TransactionType::Expense, 12.3, "Groceries", user.id())
                    .unwrap(),
            )
            .unwrap();

        let updated = transaction
            .merge_patch(TransactionPatch {
                amount: Some(45.6),
                category: Some("Eating Out".to_string()),
                ..Default::default()
            })
            .unwrap();
        store.update(&updated).unwrap();

        assert_eq!(store.get(updated.id()), Ok(updated));
    }

    #[test]
    fn update_fails_on_missing_transaction() {
        let (mut store, user) = get_store_and_user();
        let transaction = store
            .create(
                Transaction::build(TransactionType::Expense, 12.3, "Groceries", user.id())
                    .unwrap(),
            )
            .unwrap();
        store.delete(transaction.id()).unwrap();

        let result = store.update(&transaction);

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_removes_transaction() {
        let (mut store, user) = get_store_and_user();
        let transaction = store
            .create(
                Transaction::build(TransactionType::Expense, 12.3, "Groceries", user.id())
                    .unwrap(),
            )
            .unwrap();

        store.delete(transaction.id()).unwrap();

        assert_eq!(store.get(transaction.id()), Err(Error::NotFound));
    }

    #[test]
    fn delete_fails_on_missing_transaction() {
        let (mut store, _) = get_store_and_user();

        assert_eq!(store.delete(999), Err(Error::DeleteMissingTransaction));
    }
}
