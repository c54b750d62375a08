// ABOUTME: Signs and verifies short-lived access tokens bound to a session id
// ABOUTME: Only allow-listed display claims are embedded; expiry is checked against the injected clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Access token codec
//!
//! Access tokens are compact JWTs. Signature, algorithm and issuer are always
//! verified; expiry is verified separately so callers that need the session id
//! of an expired token (logout) can still read it from an authentic token.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::clock::SharedClock;
use crate::config::{TokenConfig, TokenKeyMaterial};
use crate::crypto::generate_token_id;
use crate::errors::{AuthError, AuthResult};

/// Optional identity attributes carried in an access token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayClaims {
    /// Login name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Name shown in the UI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Role used by the access guard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Fine-grained grants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    /// Account status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl DisplayClaims {
    /// Keep the allow-listed keys of `attributes` whose values have the expected type
    #[must_use]
    pub fn from_attributes(attributes: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            attributes
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        let permissions = attributes
            .get("permissions")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            });

        Self {
            username: text("username"),
            display_name: text("display_name"),
            role: text("role"),
            permissions,
            status: text("status"),
            email: text("email"),
        }
    }
}

/// Claims of an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User id
    pub sub: String,
    /// Session id
    pub sid: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Token id
    pub jti: String,
    /// Allow-listed display claims
    #[serde(flatten)]
    pub display: DisplayClaims,
}

impl AccessTokenClaims {
    /// Expiry as a timestamp
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp(self.exp)
    }

    /// Issue time as a timestamp
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        timestamp(self.iat)
    }
}

/// A freshly signed access token
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    /// Compact JWT
    pub token: String,
    /// `jti` of the token
    pub token_id: String,
    /// `iat` of the token
    pub issued_at: DateTime<Utc>,
    /// `exp` of the token
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token_id", &self.token_id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Stateless access token signer and verifier
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    default_ttl: Duration,
    clock: SharedClock,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from configuration
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` when the configuration is invalid or the PEM keys do not parse
    pub fn new(config: &TokenConfig, clock: SharedClock) -> AuthResult<Self> {
        config.validate()?;
        let (encoding_key, decoding_key) = match (&config.key, config.algorithm) {
            (
                TokenKeyMaterial::Secret(secret),
                Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512,
            ) => (
                EncodingKey::from_secret(secret),
                DecodingKey::from_secret(secret),
            ),
            (
                TokenKeyMaterial::Rsa {
                    private_pem,
                    public_pem,
                },
                Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512,
            ) => (
                EncodingKey::from_rsa_pem(private_pem.as_bytes())
                    .map_err(|e| AuthError::Config(format!("invalid RSA private key: {e}")))?,
                DecodingKey::from_rsa_pem(public_pem.as_bytes())
                    .map_err(|e| AuthError::Config(format!("invalid RSA public key: {e}")))?,
            ),
            (_, algorithm) => {
                return Err(AuthError::Config(format!(
                    "key material does not match algorithm {algorithm:?}"
                )))
            }
        };

        Ok(Self {
            algorithm: config.algorithm,
            encoding_key,
            decoding_key,
            issuer: config.issuer.clone(),
            default_ttl: config.ttl,
            clock,
        })
    }

    /// Lifetime used when the caller has no preference
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a token for `user_id` bound to `session_id`
    ///
    /// Only allow-listed keys of `claims` are embedded; everything else is dropped.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` for empty ids or a non-positive TTL, and
    /// `AuthError::Config` if signing fails
    pub fn issue(
        &self,
        session_id: &str,
        user_id: &str,
        claims: &Map<String, Value>,
        ttl: Duration,
    ) -> AuthResult<IssuedToken> {
        if session_id.is_empty() || user_id.is_empty() {
            return Err(AuthError::InvalidInput(
                "session id and user id are required".into(),
            ));
        }
        if ttl <= Duration::zero() {
            return Err(AuthError::InvalidInput("token TTL must be positive".into()));
        }

        let now = self.clock.now();
        let iat = now.timestamp();
        let exp = iat + ttl.num_seconds().max(1);
        let token_claims = AccessTokenClaims {
            sub: user_id.to_owned(),
            sid: session_id.to_owned(),
            iat,
            exp,
            iss: self.issuer.clone(),
            jti: generate_token_id(),
            display: DisplayClaims::from_attributes(claims),
        };

        let token = encode(
            &Header::new(self.algorithm),
            &token_claims,
            &self.encoding_key,
        )
        .map_err(|e| AuthError::Config(format!("failed to sign access token: {e}")))?;

        debug!(
            user_id = %user_id,
            token_id = %token_claims.jti,
            expires_at = exp,
            "Issued access token"
        );
        Ok(IssuedToken {
            token,
            token_id: token_claims.jti,
            issued_at: timestamp(iat),
            expires_at: timestamp(exp),
        })
    }

    /// Verify `token` and return its claims
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for a bad signature, algorithm, issuer or structure,
    /// and `AuthError::ExpiredToken` when `verify_expiry` is set and the token has expired
    pub fn decode(&self, token: &str, verify_expiry: bool) -> AuthResult<AccessTokenClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let claims = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| convert_jwt_error(&e))?
            .claims;

        if verify_expiry && self.clock.now().timestamp() >= claims.exp {
            debug!(token_id = %claims.jti, "Access token expired");
            return Err(AuthError::ExpiredToken);
        }
        Ok(claims)
    }
}

fn timestamp(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn convert_jwt_error(error: &JwtError) -> AuthError {
    let reason = match error.kind() {
        ErrorKind::InvalidSignature => "signature verification failed".to_owned(),
        ErrorKind::InvalidAlgorithm => "unexpected signing algorithm".to_owned(),
        ErrorKind::InvalidIssuer => "unexpected issuer".to_owned(),
        ErrorKind::MissingRequiredClaim(claim) => format!("missing claim '{claim}'"),
        ErrorKind::InvalidToken => "token format is invalid".to_owned(),
        ErrorKind::Base64(e) => format!("token contains invalid base64: {e}"),
        ErrorKind::Json(e) => format!("token contains invalid claims: {e}"),
        ErrorKind::Utf8(e) => format!("token contains invalid UTF-8: {e}"),
        _ => format!("token validation failed: {error}"),
    };
    warn!("Access token rejected: {reason}");
    AuthError::InvalidToken(reason)
}
