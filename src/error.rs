//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an email/password combination that does not match a
    /// registered account, or a wrong current password when changing it.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// A transaction amount of zero or less was provided.
    ///
    /// Amounts record how much money changed hands, so they must be strictly
    /// positive; the direction is carried by the transaction type.
    #[error("transaction amounts must be greater than zero")]
    NonPositiveAmount,

    /// The transaction type was not one of `income` or `expense`.
    #[error("\"{0}\" is not a valid transaction type, expected \"income\" or \"expense\"")]
    InvalidTransactionType(String),

    /// An empty string was used as a transaction category.
    #[error("transaction category cannot be empty")]
    EmptyCategory,

    /// An empty string was used as a display name.
    #[error("name cannot be empty")]
    EmptyName,

    /// The string could not be parsed as an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A date query parameter could not be parsed as a calendar date.
    ///
    /// Callers should pass in the string that caused the error.
    #[error("could not parse \"{0}\" as a date, expected the format YYYY-MM-DD")]
    InvalidDateFormat(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The email used to create or update an account is already in use.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// The requested resource was not found.
    ///
    /// Also returned when the resource exists but belongs to another user, so
    /// that clients cannot probe for other users' resources.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error message indicating an internal server
    /// error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A bearer token could not be created for a user.
    #[error("token creation failed: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Error::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            Error::NonPositiveAmount
            | Error::InvalidTransactionType(_)
            | Error::EmptyCategory
            | Error::EmptyName
            | Error::InvalidEmail(_)
            | Error::InvalidDateFormat(_)
            | Error::TooWeak(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::DuplicateEmail => (StatusCode::CONFLICT, self.to_string()),
            Error::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Error::UpdateMissingTransaction | Error::DeleteMissingTransaction => {
                (StatusCode::NOT_FOUND, Error::NotFound.to_string())
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an unexpected error occurred, check the server logs for more details"
                        .to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let cases = [
            Error::NonPositiveAmount,
            Error::InvalidTransactionType("loan".to_string()),
            Error::EmptyCategory,
            Error::EmptyName,
            Error::InvalidEmail("not-an-email".to_string()),
            Error::InvalidDateFormat("2024-13-01".to_string()),
            Error::TooWeak("add more words".to_string()),
        ];

        for error in cases {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn missing_row_errors_map_to_not_found() {
        let cases = [
            Error::NotFound,
            Error::UpdateMissingTransaction,
            Error::DeleteMissingTransaction,
        ];

        for error in cases {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn duplicate_email_maps_to_conflict() {
        let response = Error::DuplicateEmail.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn sql_no_rows_converts_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(error, Error::NotFound);
    }
}
