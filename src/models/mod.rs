//! Defines the domain types of the application and their validation rules.

mod password;
mod transaction;
mod user;

pub use password::{PasswordHash, ValidatedPassword};
pub use transaction::{
    Transaction, TransactionBuilder, TransactionPatch, TransactionType, validate_amount,
    validate_category,
};
pub use user::{User, UserID};

/// Alias for the integer type used for database row IDs.
pub type DatabaseID = i64;
