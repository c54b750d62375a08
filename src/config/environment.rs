// ABOUTME: Environment-based configuration for token signing, sessions, OAuth state and storage
// ABOUTME: Parses and validates variables once at startup; secrets never appear in Debug output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::oauth::OAuthProvidersConfig;
use crate::constants::{limits, service_names, time};
use crate::crypto::secret_fingerprint;
use crate::errors::{AuthError, AuthResult};
use crate::utils::http_client::HttpTimeouts;

/// Key material used to sign and verify access tokens
#[derive(Clone)]
pub enum TokenKeyMaterial {
    /// Shared secret for HS256/HS384/HS512
    Secret(Zeroizing<Vec<u8>>),
    /// PEM-encoded RSA keys for RS256/RS384/RS512
    Rsa {
        /// PKCS#1 or PKCS#8 private key
        private_pem: Zeroizing<String>,
        /// SPKI or PKCS#1 public key
        public_pem: String,
    },
}

impl fmt::Debug for TokenKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secret(secret) => f
                .debug_struct("Secret")
                .field("length", &secret.len())
                .finish_non_exhaustive(),
            Self::Rsa { public_pem, .. } => f
                .debug_struct("Rsa")
                .field("public_key_fingerprint", &secret_fingerprint(public_pem))
                .finish_non_exhaustive(),
        }
    }
}

/// Access token signing configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Signing algorithm
    pub algorithm: Algorithm,
    /// Signing and verification keys
    pub key: TokenKeyMaterial,
    /// `iss` claim written and required
    pub issuer: String,
    /// Access token lifetime
    pub ttl: Duration,
}

impl TokenConfig {
    /// HS256 configuration with default issuer and lifetime
    #[must_use]
    pub fn hmac(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            key: TokenKeyMaterial::Secret(Zeroizing::new(secret.into())),
            issuer: service_names::CONCIERGE_AUTH.to_owned(),
            ttl: Duration::seconds(time::DEFAULT_ACCESS_TOKEN_TTL_SECS),
        }
    }

    /// Load from `AUTH_TOKEN_*` variables
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` when the algorithm is unsupported or key material is missing
    pub fn from_env() -> AuthResult<Self> {
        let algorithm_name = env_or("AUTH_TOKEN_ALGORITHM", "HS256");
        let algorithm = Algorithm::from_str(&algorithm_name).map_err(|_| {
            AuthError::Config(format!("unsupported AUTH_TOKEN_ALGORITHM '{algorithm_name}'"))
        })?;

        let key = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                let secret = env::var("AUTH_TOKEN_SECRET").map_err(|_| {
                    AuthError::Config("AUTH_TOKEN_SECRET is required for HMAC signing".into())
                })?;
                TokenKeyMaterial::Secret(Zeroizing::new(secret.into_bytes()))
            }
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => TokenKeyMaterial::Rsa {
                private_pem: Zeroizing::new(pem_from_env("AUTH_TOKEN_PRIVATE_KEY_PEM")?),
                public_pem: pem_from_env("AUTH_TOKEN_PUBLIC_KEY_PEM")?,
            },
            other => {
                return Err(AuthError::Config(format!(
                    "AUTH_TOKEN_ALGORITHM {other:?} is not supported for access tokens"
                )))
            }
        };

        let config = Self {
            algorithm,
            key,
            issuer: env_or("AUTH_TOKEN_ISSUER", service_names::CONCIERGE_AUTH),
            ttl: Duration::seconds(parse_env(
                "AUTH_TOKEN_TTL_SECS",
                time::DEFAULT_ACCESS_TOKEN_TTL_SECS,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check key strength and lifetime
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` for a short secret, an empty issuer or a non-positive TTL
    pub fn validate(&self) -> AuthResult<()> {
        if let TokenKeyMaterial::Secret(secret) = &self.key {
            if secret.len() < limits::MIN_SIGNING_SECRET_BYTES {
                return Err(AuthError::Config(format!(
                    "token signing secret must be at least {} bytes",
                    limits::MIN_SIGNING_SECRET_BYTES
                )));
            }
        }
        if self.issuer.trim().is_empty() {
            return Err(AuthError::Config("token issuer must not be empty".into()));
        }
        if self.ttl <= Duration::zero() {
            return Err(AuthError::Config("token TTL must be positive".into()));
        }
        Ok(())
    }
}

/// Session lifetime policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Lifetime of a new session
    pub ttl: Duration,
    /// Sliding extension applied on token refresh; `None` disables sliding
    pub refresh_extension: Option<Duration>,
    /// Number of distinct client IPs remembered per session
    pub ip_history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(time::DEFAULT_SESSION_TTL_HOURS),
            refresh_extension: Some(Duration::hours(
                time::DEFAULT_SESSION_REFRESH_EXTENSION_HOURS,
            )),
            ip_history_limit: limits::DEFAULT_IP_HISTORY_LIMIT,
        }
    }
}

impl SessionConfig {
    /// Load from `SESSION_*` variables
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` when a value does not parse or is out of range
    pub fn from_env() -> AuthResult<Self> {
        let ttl_hours: i64 = parse_env("SESSION_TTL_HOURS", time::DEFAULT_SESSION_TTL_HOURS)?;
        let extension_hours: i64 = parse_env(
            "SESSION_REFRESH_EXTENSION_HOURS",
            time::DEFAULT_SESSION_REFRESH_EXTENSION_HOURS,
        )?;
        let ip_history_limit =
            parse_env("SESSION_IP_HISTORY_LIMIT", limits::DEFAULT_IP_HISTORY_LIMIT)?;

        if ttl_hours <= 0 {
            return Err(AuthError::Config("SESSION_TTL_HOURS must be positive".into()));
        }
        if extension_hours < 0 {
            return Err(AuthError::Config(
                "SESSION_REFRESH_EXTENSION_HOURS must not be negative".into(),
            ));
        }
        if ip_history_limit == 0 {
            return Err(AuthError::Config(
                "SESSION_IP_HISTORY_LIMIT must be at least 1".into(),
            ));
        }

        Ok(Self {
            ttl: Duration::hours(ttl_hours),
            refresh_extension: (extension_hours > 0).then(|| Duration::hours(extension_hours)),
            ip_history_limit,
        })
    }
}

/// OAuth state token policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OAuthStateConfig {
    /// Lifetime of a state token
    pub ttl: Duration,
}

impl Default for OAuthStateConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(time::DEFAULT_OAUTH_STATE_TTL_SECS),
        }
    }
}

/// Where state tokens and sessions are persisted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageConfig {
    /// Process memory; lost on restart
    #[default]
    InMemory,
    /// `SQLite` database at the given sqlx URL
    Sqlite {
        /// Connection URL, e.g. `sqlite:./data/auth.db` or `sqlite::memory:`
        url: String,
    },
}

impl StorageConfig {
    /// Parse `DATABASE_URL`; unset means in-memory
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` for a non-SQLite URL
    pub fn parse(database_url: Option<&str>) -> AuthResult<Self> {
        match database_url.map(str::trim) {
            None | Some("") => Ok(Self::InMemory),
            Some(url) if url.starts_with("sqlite:") => Ok(Self::Sqlite {
                url: url.to_owned(),
            }),
            Some(other) => Err(AuthError::Config(format!(
                "unsupported DATABASE_URL scheme in '{}'",
                other.split(':').next().unwrap_or_default()
            ))),
        }
    }
}

/// Complete configuration of the authentication core
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token signing
    pub token: TokenConfig,
    /// Session lifetimes
    pub session: SessionConfig,
    /// OAuth state lifetimes
    pub oauth_state: OAuthStateConfig,
    /// Provider credentials
    pub oauth: OAuthProvidersConfig,
    /// Persistence backend
    pub storage: StorageConfig,
    /// Provider call timeouts
    pub http_timeouts: HttpTimeouts,
    /// Period of the expired-record sweeper
    pub maintenance_interval: StdDuration,
}

impl AuthConfig {
    /// Configuration with the given token settings and defaults everywhere else
    #[must_use]
    pub fn new(token: TokenConfig) -> Self {
        Self {
            token,
            session: SessionConfig::default(),
            oauth_state: OAuthStateConfig::default(),
            oauth: OAuthProvidersConfig::default(),
            storage: StorageConfig::default(),
            http_timeouts: HttpTimeouts::default(),
            maintenance_interval: StdDuration::from_secs(time::DEFAULT_MAINTENANCE_INTERVAL_SECS),
        }
    }

    /// Load the full configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` when any variable is missing, unparseable or out of range
    pub fn from_env() -> AuthResult<Self> {
        let state_ttl: i64 = parse_env("OAUTH_STATE_TTL_SECS", time::DEFAULT_OAUTH_STATE_TTL_SECS)?;
        if state_ttl <= 0 {
            return Err(AuthError::Config("OAUTH_STATE_TTL_SECS must be positive".into()));
        }

        let config = Self {
            token: TokenConfig::from_env()?,
            session: SessionConfig::from_env()?,
            oauth_state: OAuthStateConfig {
                ttl: Duration::seconds(state_ttl),
            },
            oauth: OAuthProvidersConfig::from_env(),
            storage: StorageConfig::parse(env::var("DATABASE_URL").ok().as_deref())?,
            http_timeouts: HttpTimeouts {
                request: StdDuration::from_secs(parse_env(
                    "OAUTH_HTTP_TIMEOUT_SECS",
                    time::OAUTH_HTTP_TIMEOUT_SECS,
                )?),
                connect: StdDuration::from_secs(parse_env(
                    "OAUTH_HTTP_CONNECT_TIMEOUT_SECS",
                    time::OAUTH_HTTP_CONNECT_TIMEOUT_SECS,
                )?),
            },
            maintenance_interval: StdDuration::from_secs(parse_env(
                "MAINTENANCE_INTERVAL_SECS",
                time::DEFAULT_MAINTENANCE_INTERVAL_SECS,
            )?),
        };
        config.log_summary();
        Ok(config)
    }

    /// Log a secret-free summary of the loaded configuration
    pub fn log_summary(&self) {
        info!(
            algorithm = ?self.token.algorithm,
            issuer = %self.token.issuer,
            token_ttl_secs = self.token.ttl.num_seconds(),
            session_ttl_hours = self.session.ttl.num_hours(),
            sliding_refresh = self.session.refresh_extension.is_some(),
            state_ttl_secs = self.oauth_state.ttl.num_seconds(),
            storage = ?self.storage,
            "Authentication configuration loaded"
        );
        let providers = self.oauth.configured_providers();
        if providers.is_empty() {
            warn!("No OAuth providers configured; only first-party logins are available");
        }
        self.oauth.validate_and_log();
    }
}

/// Get environment variable or default value
fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env<T: FromStr>(key: &str, default: T) -> AuthResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AuthError::Config(format!("{key} has an invalid value '{raw}'"))),
        Err(_) => Ok(default),
    }
}

/// Read a PEM value, accepting `\n` escapes from single-line env files
pub(crate) fn pem_from_env(key: &str) -> AuthResult<String> {
    env::var(key)
        .map(|value| value.replace("\\n", "\n"))
        .map_err(|_| AuthError::Config(format!("{key} is required")))
}
