//! Defines the user store trait.

use email_address::EmailAddress;

use crate::{
    Error,
    models::{PasswordHash, User, UserID},
};

/// Handles the creation and retrieval of user records.
pub trait UserStore {
    /// Create a new user.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if `email` is already registered.
    fn create(
        &mut self,
        name: &str,
        email: EmailAddress,
        password_hash: PasswordHash,
    ) -> Result<User, Error>;

    /// Get a user by their ID.
    ///
    /// Returns [Error::NotFound] if no user with the given ID exists.
    fn get(&self, id: UserID) -> Result<User, Error>;

    /// Get a user by their email.
    ///
    /// Returns [Error::NotFound] if no user with the given email exists.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error>;

    /// Update the name and/or email of the user `id`.
    ///
    /// Fields that are `None` are left unchanged.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the user does not exist, or
    /// [Error::DuplicateEmail] if the new email is already registered.
    fn update_profile(
        &mut self,
        id: UserID,
        name: Option<String>,
        email: Option<EmailAddress>,
    ) -> Result<User, Error>;

    /// Replace the password hash of the user `id`.
    ///
    /// Returns [Error::NotFound] if the user does not exist.
    fn update_password(&mut self, id: UserID, password_hash: PasswordHash) -> Result<(), Error>;

    /// Delete the user `id` along with all of their transactions.
    ///
    /// Returns [Error::NotFound] if the user does not exist.
    fn delete(&mut self, id: UserID) -> Result<(), Error>;
}
