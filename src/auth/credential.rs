//! Static client identity.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Client identity for the OAuth-protected backend. Immutable after load.
#[derive(Clone)]
pub struct Credential {
    host: String,
    client_id: String,
    client_secret: String,
    app_key: String,
    enterprise_id: String,
}

impl Credential {
    pub fn new(
        host: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        app_key: impl Into<String>,
        enterprise_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            app_key: app_key.into(),
            enterprise_id: enterprise_id.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn enterprise_id(&self) -> &str {
        &self.enterprise_id
    }

    /// `Basic <base64(client_id:client_secret)>`
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw.as_bytes()))
    }

    /// Value of the `HashedAppKey` header. Recomputed on every call.
    pub fn hashed_app_key(&self) -> String {
        hash_app_key(&self.app_key)
    }

    /// Token endpoint URL.
    pub fn token_url(&self) -> String {
        format!("{}/oauth/v1/tokens", self.host)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("app_key", &"<redacted>")
            .field("enterprise_id", &self.enterprise_id)
            .finish()
    }
}

/// Lowercase hex SHA-256 of the application key.
pub fn hash_app_key(app_key: &str) -> String {
    let digest = Sha256::digest(app_key.as_bytes());
    hex::encode(digest)
}
