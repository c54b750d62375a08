// ABOUTME: Sign in with Apple adapter; the profile comes from the verified identity token
// ABOUTME: Client secrets are static or generated per exchange as ES256 JWTs signed with the team key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use zeroize::Zeroizing;

use super::apple_keys::AppleKeyCache;
use super::client::OAuthClient;
use crate::clock::SharedClock;
use crate::config::{AppleOAuthConfig, AppleSigningKey};
use crate::constants::oauth::{APPLE_AUTHORIZATION_EXTRAS, APPLE_ISSUER};
use crate::constants::time::APPLE_CLIENT_SECRET_TTL_SECS;
use crate::errors::{AuthError, AuthResult, ProviderFailure};
use crate::models::{OAuthProviderKind, OAuthProviderProfile};
use crate::oauth::ProviderTokens;

/// Claims of a generated Apple client secret
#[derive(Debug, Serialize)]
struct ClientSecretClaims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    aud: &'a str,
    sub: &'a str,
}

enum ClientSecret {
    Static(Zeroizing<String>),
    Signed {
        team_id: String,
        key_id: String,
        key: EncodingKey,
    },
}

/// Sign in with Apple
pub struct AppleAdapter {
    client: OAuthClient,
    secret: ClientSecret,
    keys: AppleKeyCache,
    clock: SharedClock,
}

impl AppleAdapter {
    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` when the service id, secret or signing key is missing or invalid
    pub fn new(config: &AppleOAuthConfig, http: Client, clock: SharedClock) -> AuthResult<Self> {
        let client = OAuthClient::new(OAuthProviderKind::Apple, &config.provider, http)?;
        let secret = match (&config.provider.client_secret, &config.signing_key) {
            (Some(secret), _) if !secret.is_empty() => {
                ClientSecret::Static(Zeroizing::new(secret.clone()))
            }
            (_, Some(signing_key)) => signing_secret(signing_key)?,
            _ => {
                return Err(AuthError::Config(
                    "apple requires APPLE_CLIENT_SECRET or a team signing key".into(),
                ))
            }
        };

        Ok(Self {
            keys: AppleKeyCache::new(client.clone(), clock.clone()),
            client,
            secret,
            clock,
        })
    }

    pub(crate) const fn client(&self) -> &OAuthClient {
        &self.client
    }

    pub(crate) fn build_authorization_url(&self, state: &str) -> String {
        self.client
            .authorization_url(state, APPLE_AUTHORIZATION_EXTRAS)
    }

    pub(crate) async fn exchange_code(&self, code: &str) -> AuthResult<ProviderTokens> {
        let client_secret = self.client_secret()?;
        let tokens = self.client.exchange_code(code, &client_secret).await?;
        if tokens.id_token.is_none() {
            return Err(AuthError::exchange(
                OAuthProviderKind::Apple,
                ProviderFailure::Malformed("token response has no identity token".into()),
            ));
        }
        Ok(tokens)
    }

    pub(crate) async fn fetch_profile(
        &self,
        tokens: &ProviderTokens,
    ) -> AuthResult<OAuthProviderProfile> {
        let id_token = tokens.id_token.as_deref().ok_or_else(|| {
            AuthError::profile(
                OAuthProviderKind::Apple,
                ProviderFailure::Malformed("identity token is missing".into()),
            )
        })?;
        let claims = self.keys.verify_identity_token(id_token).await?;

        let email = claims.email.filter(|email| !email.is_empty()).ok_or_else(|| {
            AuthError::profile(
                OAuthProviderKind::Apple,
                ProviderFailure::Malformed("identity token has no email address".into()),
            )
        })?;

        Ok(OAuthProviderProfile {
            provider: OAuthProviderKind::Apple,
            provider_id: claims.sub,
            email,
            // Apple shares the name only in the first authorization response
            name: None,
            avatar_url: None,
            verified_email: claims.email_verified.unwrap_or(true),
        })
    }

    /// Static secret, or a freshly signed ES256 JWT
    fn client_secret(&self) -> AuthResult<Zeroizing<String>> {
        match &self.secret {
            ClientSecret::Static(secret) => Ok(secret.clone()),
            ClientSecret::Signed {
                team_id,
                key_id,
                key,
            } => {
                let iat = self.clock.now().timestamp();
                let claims = ClientSecretClaims {
                    iss: team_id,
                    iat,
                    exp: iat + APPLE_CLIENT_SECRET_TTL_SECS,
                    aud: APPLE_ISSUER,
                    sub: self.client.client_id(),
                };
                let mut header = Header::new(Algorithm::ES256);
                header.kid = Some(key_id.clone());
                encode(&header, &claims, key).map(Zeroizing::new).map_err(|e| {
                    AuthError::Config(format!("failed to sign Apple client secret: {e}"))
                })
            }
        }
    }
}

fn signing_secret(signing_key: &AppleSigningKey) -> AuthResult<ClientSecret> {
    let key = EncodingKey::from_ec_pem(signing_key.private_key_pem.as_bytes())
        .map_err(|e| AuthError::Config(format!("APPLE_PRIVATE_KEY is not a valid EC key: {e}")))?;
    Ok(ClientSecret::Signed {
        team_id: signing_key.team_id.clone(),
        key_id: signing_key.key_id.clone(),
        key,
    })
}
