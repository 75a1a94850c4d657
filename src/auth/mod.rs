//! Credential and token lifecycle.
//!
//! - [`Credential`] holds the static client identity, loaded once.
//! - [`TokenIssuer`] performs the client-credentials exchange.
//! - [`TokenCache`] keeps at most one access token and refreshes it with
//!   single-flight semantics.

mod cache;
mod credential;
mod issuer;
mod token;

pub use cache::TokenCache;
pub use credential::{hash_app_key, Credential};
pub use issuer::{HttpTokenIssuer, TokenIssuer};
pub use token::{AccessToken, TokenInfo, TokenResponse};

#[cfg(test)]
pub(crate) use cache::tests;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Token endpoint rejected the request or could not be reached.
    /// `status` is `None` for transport failures.
    #[error("OAuth token request failed{}: {body}", status_suffix(.status))]
    TokenIssuance { status: Option<u16>, body: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl AuthError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TokenIssuance {
            status: None,
            body: message.into(),
        }
    }
}
