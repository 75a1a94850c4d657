//! Single-slot token cache with single-flight refresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;

use super::{AccessToken, AuthError, Credential, TokenIssuer};

/// Holds at most one access token.
///
/// The slot mutex is held for the whole refresh, so callers that arrive while
/// an issuance is in flight wait for it and then reuse the token it stored
/// instead of starting a second exchange.
pub struct TokenCache {
    credential: Arc<Credential>,
    issuer: Arc<dyn TokenIssuer>,
    skew: ChronoDuration,
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(credential: Arc<Credential>, issuer: Arc<dyn TokenIssuer>, skew: Duration) -> Self {
        let skew = ChronoDuration::from_std(skew).unwrap_or_else(|_| ChronoDuration::minutes(5));
        Self {
            credential,
            issuer,
            skew,
            slot: Mutex::new(None),
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Return a usable token, issuing a new one when forced, empty, or stale.
    ///
    /// Issuance failures are not retried here.
    pub async fn get_token(&self, force_refresh: bool) -> Result<AccessToken, AuthError> {
        let mut slot = self.slot.lock().await;

        if !force_refresh {
            if let Some(token) = slot.as_ref() {
                if token.is_usable_at(Utc::now(), self.skew) {
                    tracing::debug!("Using cached access token");
                    return Ok(token.clone());
                }
            }
        }

        tracing::info!(
            "Requesting new access token{}",
            if force_refresh { " (forced refresh)" } else { "" }
        );
        // Drop the stale token first so a failed issuance leaves the slot empty.
        *slot = None;
        let token = self.issuer.issue(&self.credential).await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Reset to empty so the next `get_token` issues a fresh token.
    pub async fn clear(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
        tracing::info!("Token cache cleared");
    }

    /// Drop the cached token only if it is still `rejected`. Returns whether
    /// the slot was cleared; a token issued after the rejected one is kept.
    pub async fn invalidate(&self, rejected: &AccessToken) -> bool {
        let mut slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(current) if current.value() == rejected.value() => {
                *slot = None;
                tracing::info!("Rejected access token dropped from cache");
                true
            }
            _ => {
                tracing::debug!("Rejected token already replaced, keeping cached token");
                false
            }
        }
    }

    /// Whether a token is currently cached, usable or not.
    pub async fn is_holding(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}
