// ABOUTME: Verification of Sign in with Apple identity tokens against Apple's published JWKS
// ABOUTME: Caches the key set and refetches once when a token names an unknown key id
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Async-IO.org

//! Apple identity token verification
//!
//! Identity tokens are RS256 JWTs. A token is accepted only when its signature
//! verifies against a key from Apple's key set, `iss` is Apple, `aud` is our
//! service id, and the clock lies within `nbf`/`exp` (with a small skew
//! allowance).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::client::OAuthClient;
use crate::clock::SharedClock;
use crate::constants::oauth::APPLE_ISSUER;
use crate::constants::time::APPLE_JWKS_CACHE_TTL_SECS;
use crate::errors::{AuthError, AuthResult, ProviderFailure};
use crate::models::OAuthProviderKind;

/// Clock skew tolerated between Apple and us
const IDENTITY_TOKEN_LEEWAY_SECS: i64 = 60;

/// JWK (JSON Web Key) as published by Apple
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type ("RSA")
    pub kty: String,
    /// Key ID referenced from token headers
    pub kid: String,
    /// Algorithm ("RS256")
    #[serde(default)]
    pub alg: Option<String>,
    /// Public key use ("sig")
    #[serde(rename = "use", default)]
    pub key_use: Option<String>,
    /// RSA modulus (base64url encoded)
    pub n: String,
    /// RSA exponent (base64url encoded)
    pub e: String,
}

/// JWKS (JSON Web Key Set) container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// Published keys
    pub keys: Vec<JsonWebKey>,
}

/// Verified claims of an Apple identity token
#[derive(Debug, Clone, Deserialize)]
pub struct AppleIdentityClaims {
    /// Issuer (always Apple)
    pub iss: String,
    /// Stable user identifier for this team
    pub sub: String,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Issued at (seconds since epoch)
    #[serde(default)]
    pub iat: Option<i64>,
    /// Not before (seconds since epoch)
    #[serde(default)]
    pub nbf: Option<i64>,
    /// Email address; a relay address when the user hides their email
    #[serde(default)]
    pub email: Option<String>,
    /// Apple sends this as a boolean or as the string "true"/"false"
    #[serde(default, deserialize_with = "lenient_bool")]
    pub email_verified: Option<bool>,
    /// Whether `email` is a private relay address
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_private_email: Option<bool>,
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::String(text)) => match text.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

struct CachedKeys {
    keys: HashMap<String, JsonWebKey>,
    fetched_at: DateTime<Utc>,
}

/// Fetches, caches and applies Apple's identity-token signing keys
pub struct AppleKeyCache {
    client: OAuthClient,
    cache: RwLock<Option<CachedKeys>>,
    ttl: Duration,
    clock: SharedClock,
}

impl AppleKeyCache {
    pub(crate) fn new(client: OAuthClient, clock: SharedClock) -> Self {
        Self {
            client,
            cache: RwLock::new(None),
            ttl: Duration::seconds(APPLE_JWKS_CACHE_TTL_SECS),
            clock,
        }
    }

    /// Verify `id_token` and return its claims
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuthProfile` when the key set cannot be fetched or the token
    /// fails signature, issuer, audience or time checks
    pub async fn verify_identity_token(&self, id_token: &str) -> AuthResult<AppleIdentityClaims> {
        let header = decode_header(id_token)
            .map_err(|e| rejected(format!("identity token header is invalid: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(rejected(format!(
                "identity token uses unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| rejected("identity token header has no key id".into()))?;
        let jwk = self.key_for(&kid).await?;
        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| rejected(format!("Apple key {kid} is unusable: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client.client_id()]);
        validation.set_issuer(&[APPLE_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;

        let claims = decode::<AppleIdentityClaims>(id_token, &decoding_key, &validation)
            .map_err(|e| rejected(format!("identity token verification failed: {e}")))?
            .claims;

        let now = self.clock.now().timestamp();
        if now >= claims.exp + IDENTITY_TOKEN_LEEWAY_SECS {
            return Err(rejected("identity token has expired".into()));
        }
        if claims
            .nbf
            .is_some_and(|nbf| now + IDENTITY_TOKEN_LEEWAY_SECS < nbf)
        {
            return Err(rejected("identity token is not yet valid".into()));
        }
        Ok(claims)
    }

    /// Key for `kid`, refetching the set when the cache is stale or lacks the key
    async fn key_for(&self, kid: &str) -> AuthResult<JsonWebKey> {
        let now = self.clock.now();
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if now - cached.fetched_at < self.ttl {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        let keys = self.fetch_keys().await?;
        let key = keys.get(kid).cloned();
        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: now,
        });
        key.ok_or_else(|| {
            warn!(kid = %kid, "Apple identity token signed with an unknown key");
            rejected(format!("no Apple signing key with id {kid}"))
        })
    }

    async fn fetch_keys(&self) -> AuthResult<HashMap<String, JsonWebKey>> {
        let set: JsonWebKeySet = self
            .client
            .get_public(self.client.user_info_endpoint())
            .await?;
        let keys: HashMap<String, JsonWebKey> = set
            .keys
            .into_iter()
            .filter(|key| key.kty == "RSA")
            .map(|key| (key.kid.clone(), key))
            .collect();
        if keys.is_empty() {
            return Err(rejected("Apple key set contains no RSA keys".into()));
        }
        info!(count = keys.len(), "Fetched Apple identity signing keys");
        debug!(kids = ?keys.keys().collect::<Vec<_>>(), "Apple key ids");
        Ok(keys)
    }
}

fn rejected(reason: String) -> AuthError {
    AuthError::profile(OAuthProviderKind::Apple, ProviderFailure::Malformed(reason))
}
