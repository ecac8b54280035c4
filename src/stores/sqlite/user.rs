//! Implements a SQLite backed user store.

use std::sync::{Arc, Mutex};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{PasswordHash, User, UserID},
    stores::UserStore,
};

/// Stores users in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// # Panics
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if `email` is taken, or
    /// [Error::SqlError] if an unexpected SQL error occurred.
    fn create(
        &mut self,
        name: &str,
        email: EmailAddress,
        password_hash: PasswordHash,
    ) -> Result<User, Error> {
        let connection = self.connection.lock().unwrap();

        connection.execute(
            "INSERT INTO user (name, email, password) VALUES (?1, ?2, ?3)",
            (name, email.to_string(), password_hash.to_string()),
        )?;

        let id = UserID::new(connection.last_insert_rowid());

        Ok(User::new(id, name.to_string(), email, password_hash))
    }

    /// Get the user from the database that has the specified `id`, or return
    /// [Error::NotFound] if such user does not exist.
    ///
    /// # Panics
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    fn get(&self, id: UserID) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, name, email, password FROM user WHERE id = :id")?
            .query_row(&[(":id", &id.as_i64())], Self::map_row)
            .map_err(|e| e.into())
    }

    /// Get the user from the database that has the specified `email` address,
    /// or return [Error::NotFound] if such user does not exist.
    ///
    /// # Panics
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, name, email, password FROM user WHERE email = :email")?
            .query_row(&[(":email", &email.to_string())], Self::map_row)
            .map_err(|e| e.into())
    }

    fn update_profile(
        &mut self,
        id: UserID,
        name: Option<String>,
        email: Option<EmailAddress>,
    ) -> Result<User, Error> {
        let current = self.get(id)?;

        let name = name.unwrap_or_else(|| current.name().to_string());
        let email = email.unwrap_or_else(|| current.email().to_owned());

        let rows_updated = self.connection.lock().unwrap().execute(
            "UPDATE user SET name = ?1, email = ?2 WHERE id = ?3",
            (&name, email.to_string(), id.as_i64()),
        )?;

        if rows_updated == 0 {
            return Err(Error::NotFound);
        }

        Ok(User::new(id, name, email, current.password_hash().clone()))
    }

    fn update_password(&mut self, id: UserID, password_hash: PasswordHash) -> Result<(), Error> {
        let rows_updated = self.connection.lock().unwrap().execute(
            "UPDATE user SET password = ?1 WHERE id = ?2",
            (password_hash.to_string(), id.as_i64()),
        )?;

        if rows_updated == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete the user `id` and all of their transactions.
    ///
    /// Both deletes run inside one SQL transaction so an account is never left
    /// half deleted.
    fn delete(&mut self, id: UserID) -> Result<(), Error> {
        let connection = self.connection.lock().unwrap();
        let tx = connection.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM \"transaction\" WHERE user_id = ?1",
            [id.as_i64()],
        )?;
        let rows_deleted = tx.execute("DELETE FROM user WHERE id = ?1", [id.as_i64()])?;

        if rows_deleted == 0 {
            return Err(Error::NotFound);
        }

        tx.commit()?;

        Ok(())
    }
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    password TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_id = row.get(offset)?;
        let name: String = row.get(offset + 1)?;
        let raw_email: String = row.get(offset + 2)?;
        let raw_password_hash: String = row.get(offset + 3)?;

        let id = UserID::new(raw_id);
        let email = EmailAddress::new_unchecked(raw_email);
        let password_hash = PasswordHash::new_unchecked(&raw_password_hash);

        Ok(User::new(id, name, email, password_hash))
    }
}
