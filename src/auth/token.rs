//! Access token model.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

/// Wire shape of the token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_expires_in() -> i64 {
    3600
}

/// An issued bearer token. Owned by the [`super::TokenCache`].
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    token_type: String,
    issued_at: DateTime<Utc>,
    ttl_seconds: i64,
}

impl AccessToken {
    pub fn new(
        value: impl Into<String>,
        token_type: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            value: value.into(),
            token_type: token_type.into(),
            issued_at,
            ttl_seconds,
        }
    }

    /// Build a token from an endpoint response, stamped with `issued_at`.
    pub fn from_response(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        Self::new(
            response.access_token,
            response.token_type,
            issued_at,
            response.expires_in,
        )
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + ChronoDuration::seconds(self.ttl_seconds)
    }

    /// A token is usable while `now < expires_at - skew`. The boundary itself
    /// counts as expired.
    pub fn is_usable_at(&self, now: DateTime<Utc>, skew: ChronoDuration) -> bool {
        now < self.expires_at() - skew
    }

    /// `Authorization` header value. Always `Bearer`, whatever the endpoint
    /// reports as the type casing.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.value)
    }

    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            token_preview: preview(&self.value),
            token_length: self.value.chars().count(),
            token_type: self.token_type.clone(),
            expires_at: self.expires_at(),
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &preview(&self.value))
            .field("token_type", &self.token_type)
            .field("issued_at", &self.issued_at)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

/// Redacted view of the current token, safe to hand to tools and logs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub token_preview: String,
    pub token_length: usize,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

fn preview(value: &str) -> String {
    const PREVIEW_CHARS: usize = 20;
    if value.chars().count() > PREVIEW_CHARS {
        let head: String = value.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token_at(issued_at: DateTime<Utc>, ttl: i64) -> AccessToken {
        AccessToken::new("tok", "Bearer", issued_at, ttl)
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let skew = ChronoDuration::minutes(5);
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        // expires_at == now + skew -> expired
        let at_boundary = token_at(now, 300);
        assert_eq!(at_boundary.expires_at(), now + skew);
        assert!(!at_boundary.is_usable_at(now, skew));

        // one microsecond later -> valid
        let just_after = token_at(now + ChronoDuration::microseconds(1), 300);
        assert!(just_after.is_usable_at(now, skew));
    }

    #[test]
    fn response_defaults() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);
        assert!(response.scope.is_none());
    }

    #[test]
    fn info_previews_long_tokens() {
        let token = AccessToken::new("x".repeat(64), "Bearer", Utc::now(), 3600);
        let info = token.info();
        assert_eq!(info.token_length, 64);
        assert_eq!(info.token_preview, format!("{}...", "x".repeat(20)));
        assert!(!format!("{:?}", token).contains(&"x".repeat(64)));
    }
}
