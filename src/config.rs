//! Configuration management for the OHIP agent.
//!
//! Configuration is read from environment variables:
//! - `OHIP_HOSTNAME` - Required. Backend base URL (e.g. `https://api.example.com`).
//! - `OHIP_CLIENT_ID` - Required. OAuth client id.
//! - `OHIP_CLIENT_SECRET` - Required. OAuth client secret.
//! - `OHIP_APP_KEY` - Required. Application key sent as `x-app-key` and hashed into `HashedAppKey`.
//! - `OHIP_ENTERPRISE_ID` - Optional. Tenant id sent as `enterpriseId`. Defaults to `PSALES`.
//! - `OHIP_SCOPE` - Optional. Token scope. Defaults to `urn:opc:hgbu:ws:__myscopes__`.
//! - `OHIP_TIMEOUT_SECS` - Optional. Token and backend request timeout. Defaults to `30`.
//! - `OHIP_TOKEN_SKEW_SECS` - Optional. Refresh margin before token expiry. Defaults to `300`.
//! - `OHIP_RETRY_ON_401` - Optional. Retry a call once after a 401. Defaults to `false`.
//! - `GEMINI_API_KEY` - Required. Key for the text-completion service.
//! - `GEMINI_MODEL` - Optional. Defaults to `gemini-2.5-flash`.
//! - `GEMINI_BASE_URL` - Optional. Defaults to `https://generativelanguage.googleapis.com`.
//! - `GEMINI_TIMEOUT_SECS` - Optional. Defaults to `60`.
//! - `HOST` / `PORT` - Optional. HTTP bind address. Defaults to `127.0.0.1:8000`.
//! - `MAX_SESSIONS` - Optional. Chat sessions kept before the least recently used is evicted. Defaults to `1000`.
//! - `HISTORY_MAX_TURNS` - Optional. Conversation bound. Defaults to `20`.
//! - `HISTORY_CONTEXT_TURNS` - Optional. Turns shown to the decision prompt. Defaults to `6`.
//! - `HISTORY_TURN_CHARS` - Optional. Per-turn prompt budget. Defaults to `200`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::auth::Credential;

pub const DEFAULT_ENTERPRISE_ID: &str = "PSALES";
pub const DEFAULT_SCOPE: &str = "urn:opc:hgbu:ws:__myscopes__";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Backend (OAuth-protected API) configuration.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL without trailing slash
    pub host: String,
    pub client_id: String,
    pub client_secret: String,
    /// Application key, also the source of the `HashedAppKey` digest
    pub app_key: String,
    pub enterprise_id: String,
    pub scope: String,
    /// Applies to both token issuance and resource calls
    pub request_timeout: Duration,
    /// Tokens are refreshed this long before they expire
    pub token_skew: Duration,
    /// Retry once with a fresh token after a 401
    pub retry_on_unauthorized: bool,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("host", &self.host)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("app_key", &"<redacted>")
            .field("enterprise_id", &self.enterprise_id)
            .field("scope", &self.scope)
            .field("request_timeout", &self.request_timeout)
            .field("token_skew", &self.token_skew)
            .field("retry_on_unauthorized", &self.retry_on_unauthorized)
            .finish()
    }
}

impl BackendConfig {
    /// Build the immutable credential used by the auth layer.
    pub fn credential(&self) -> Credential {
        Credential::new(
            self.host.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
            self.app_key.clone(),
            self.enterprise_id.clone(),
        )
    }
}

/// Text-completion service configuration.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Conversation memory limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum turns kept per session
    pub max_turns: usize,

    /// Most recent turns included in the decision prompt
    pub context_turns: usize,

    /// Character budget per turn inside the decision prompt
    pub turn_chars: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: 20,
            context_turns: 6,
            turn_chars: 200,
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,

    pub llm: LlmConfig,

    pub history: HistoryConfig,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Chat sessions kept in memory
    pub max_sessions: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if a required variable is unset and
    /// `ConfigError::InvalidValue` if a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let host = required("OHIP_HOSTNAME")?;
        let host = normalize_host(&host)
            .map_err(|e| ConfigError::InvalidValue("OHIP_HOSTNAME".to_string(), e))?;

        let backend = BackendConfig {
            host,
            client_id: required("OHIP_CLIENT_ID")?,
            client_secret: required("OHIP_CLIENT_SECRET")?,
            app_key: required("OHIP_APP_KEY")?,
            enterprise_id: lookup("OHIP_ENTERPRISE_ID")
                .unwrap_or_else(|| DEFAULT_ENTERPRISE_ID.to_string()),
            scope: lookup("OHIP_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            request_timeout: Duration::from_secs(parse_or(&lookup, "OHIP_TIMEOUT_SECS", 30)?),
            token_skew: Duration::from_secs(parse_or(&lookup, "OHIP_TOKEN_SKEW_SECS", 300)?),
            retry_on_unauthorized: lookup("OHIP_RETRY_ON_401")
                .map(|v| {
                    parse_bool(&v)
                        .map_err(|e| ConfigError::InvalidValue("OHIP_RETRY_ON_401".to_string(), e))
                })
                .transpose()?
                .unwrap_or(false),
        };

        let llm = LlmConfig {
            api_key: required("GEMINI_API_KEY")?,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(parse_or(&lookup, "GEMINI_TIMEOUT_SECS", 60)?),
        };

        let defaults = HistoryConfig::default();
        let history = HistoryConfig {
            max_turns: parse_or(&lookup, "HISTORY_MAX_TURNS", defaults.max_turns)?,
            context_turns: parse_or(&lookup, "HISTORY_CONTEXT_TURNS", defaults.context_turns)?,
            turn_chars: parse_or(&lookup, "HISTORY_TURN_CHARS", defaults.turn_chars)?,
        };
        if history.max_turns == 0 {
            return Err(ConfigError::InvalidValue(
                "HISTORY_MAX_TURNS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let host_bind = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", 8000u16)?;
        let max_sessions = parse_or(&lookup, "MAX_SESSIONS", crate::api::DEFAULT_MAX_SESSIONS)?;
        if max_sessions == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_SESSIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            backend,
            llm,
            history,
            host: host_bind,
            port,
            max_sessions,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), format!("{}", e))),
        None => Ok(default),
    }
}

/// Validate the backend URL and strip any trailing slash.
fn normalize_host(raw: &str) -> Result<String, String> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| format!("{}", e))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme: {}", other)),
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("OHIP_HOSTNAME", "https://ohip.example.com/"),
            ("OHIP_CLIENT_ID", "client"),
            ("OHIP_CLIENT_SECRET", "secret"),
            ("OHIP_APP_KEY", "app-key"),
            ("GEMINI_API_KEY", "gemini"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|k| env.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_applied() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.backend.host, "https://ohip.example.com");
        assert_eq!(config.backend.enterprise_id, "PSALES");
        assert_eq!(config.backend.scope, DEFAULT_SCOPE);
        assert_eq!(config.backend.request_timeout, Duration::from_secs(30));
        assert_eq!(config.backend.token_skew, Duration::from_secs(300));
        assert!(!config.backend.retry_on_unauthorized);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.history, HistoryConfig::default());
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_sessions, 1000);
    }

    #[test]
    fn missing_required_var() {
        let mut env = base_env();
        env.remove("OHIP_CLIENT_SECRET");
        match load(&env) {
            Err(ConfigError::MissingEnvVar(name)) => assert_eq!(name, "OHIP_CLIENT_SECRET"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn rejects_non_http_host() {
        let mut env = base_env();
        env.insert("OHIP_HOSTNAME", "ftp://ohip.example.com");
        assert!(matches!(load(&env), Err(ConfigError::InvalidValue(..))));
    }

    #[test]
    fn parses_overrides() {
        let mut env = base_env();
        env.insert("OHIP_RETRY_ON_401", "yes");
        env.insert("OHIP_TOKEN_SKEW_SECS", "60");
        env.insert("HISTORY_MAX_TURNS", "4");
        env.insert("MAX_SESSIONS", "50");
        let config = load(&env).unwrap();
        assert_eq!(config.max_sessions, 50);
        assert!(config.backend.retry_on_unauthorized);
        assert_eq!(config.backend.token_skew, Duration::from_secs(60));
        assert_eq!(config.history.max_turns, 4);
    }

    #[test]
    fn invalid_number_reported() {
        let mut env = base_env();
        env.insert("PORT", "eighty");
        match load(&env) {
            Err(ConfigError::InvalidValue(key, _)) => assert_eq!(key, "PORT"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn zero_session_capacity_rejected() {
        let mut env = base_env();
        env.insert("MAX_SESSIONS", "0");
        match load(&env) {
            Err(ConfigError::InvalidValue(key, _)) => assert_eq!(key, "MAX_SESSIONS"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = load(&base_env()).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("\"secret\""));
        assert!(!rendered.contains("app-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
