//! The URIs for the API endpoints.
//!
//! The paths form an external contract with the client application and must
//! not be changed without coordinating a client release.

use crate::models::DatabaseID;

/// Liveness probe. Responds with 418.
pub const COFFEE: &str = "/coffee";
/// Create an account and receive a bearer token.
pub const REGISTER: &str = "/auth/register";
/// Exchange credentials for a bearer token.
pub const LOG_IN: &str = "/auth/login";
/// Read, update or delete the authenticated user's account.
pub const PROFILE: &str = "/auth/profile";
/// Change the authenticated user's password.
pub const PASSWORD: &str = "/auth/password";
/// List or create the authenticated user's transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// Aggregate statistics over the authenticated user's transactions.
pub const TRANSACTION_STATS: &str = "/transactions/stats";
/// Read, update or delete a single transaction by ID.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";

/// Fill in the ID path parameter of `endpoint`.
///
/// Returns the endpoint unchanged if it has no path parameter.
pub fn format_endpoint(endpoint: &str, id: DatabaseID) -> String {
    match (endpoint.find('{'), endpoint.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            format!("{}{}{}", &endpoint[..start], id, &endpoint[end + 1..])
        }
        _ => endpoint.to_string(),
    }
}

#[cfg(test)]
mod endpoint_tests {
    use super::{TRANSACTION, TRANSACTIONS, format_endpoint};

    #[test]
    fn format_endpoint_fills_in_id() {
        assert_eq!(format_endpoint(TRANSACTION, 42), "/transactions/42");
    }

    #[test]
    fn format_endpoint_leaves_plain_paths_alone() {
        assert_eq!(format_endpoint(TRANSACTIONS, 42), TRANSACTIONS);
    }
}
