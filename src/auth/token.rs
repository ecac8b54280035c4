//! Creation and verification of the JSON Web Tokens used as bearer credentials.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::AuthError, models::UserID};

/// How long bearer tokens are valid for by default.
///
/// Tokens are stateless and cannot be revoked, so their validity is bounded
/// here; a deleted user's token fails closed at the per-request user lookup.
pub fn default_token_duration() -> Duration {
    Duration::days(7)
}

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: i64,
    /// The time the token was issued.
    pub iat: usize,
    /// The expiry time of the token.
    pub exp: usize,
}

impl Claims {
    /// The ID of the user the token was issued to.
    pub fn user_id(&self) -> UserID {
        UserID::new(self.sub)
    }
}

/// Create a signed bearer token for `user_id` that is valid for `duration`.
///
/// # Errors
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.as_i64(),
        iat: now.timestamp() as usize,
        exp: (now + duration).timestamp() as usize,
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of a bearer token and return its claims.
///
/// # Errors
/// Returns [AuthError::ExpiredToken] if the token is past its expiry, or
/// [AuthError::InvalidToken] for any other validation failure.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, AuthError> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| match error.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })
}
