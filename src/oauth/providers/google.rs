// ABOUTME: Google OAuth adapter using the OpenID Connect user-info endpoint
// ABOUTME: Requests offline access with a consent prompt so a refresh token is always returned
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use reqwest::Client;
use serde::Deserialize;
use zeroize::Zeroizing;

use super::client::OAuthClient;
use crate::config::OAuthProviderConfig;
use crate::constants::oauth::GOOGLE_AUTHORIZATION_EXTRAS;
use crate::errors::{AuthError, AuthResult, ProviderFailure};
use crate::models::{OAuthProviderKind, OAuthProviderProfile};
use crate::oauth::ProviderTokens;

/// Google user-info payload (OIDC `sub` or legacy v2 `id`)
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    #[serde(alias = "id")]
    sub: String,
    email: Option<String>,
    #[serde(alias = "verified_email")]
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

/// Sign in with Google
#[derive(Debug, Clone)]
pub struct GoogleAdapter {
    client: OAuthClient,
    client_secret: Zeroizing<String>,
}

impl GoogleAdapter {
    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` when credentials or endpoints are missing or invalid
    pub fn new(config: &OAuthProviderConfig, http: Client) -> AuthResult<Self> {
        let client_secret = config
            .client_secret
            .clone()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| AuthError::Config("google client_secret is not set".into()))?;
        Ok(Self {
            client: OAuthClient::new(OAuthProviderKind::Google, config, http)?,
            client_secret: Zeroizing::new(client_secret),
        })
    }

    pub(crate) const fn client(&self) -> &OAuthClient {
        &self.client
    }

    pub(crate) fn build_authorization_url(&self, state: &str) -> String {
        self.client
            .authorization_url(state, GOOGLE_AUTHORIZATION_EXTRAS)
    }

    pub(crate) async fn exchange_code(&self, code: &str) -> AuthResult<ProviderTokens> {
        self.client.exchange_code(code, &self.client_secret).await
    }

    pub(crate) async fn fetch_profile(
        &self,
        tokens: &ProviderTokens,
    ) -> AuthResult<OAuthProviderProfile> {
        let info: GoogleUserInfo = self
            .client
            .get_with_bearer(self.client.user_info_endpoint(), &tokens.access_token)
            .await?;

        let email = info.email.filter(|email| !email.is_empty()).ok_or_else(|| {
            AuthError::profile(
                OAuthProviderKind::Google,
                ProviderFailure::Malformed("profile has no email address".into()),
            )
        })?;

        Ok(OAuthProviderProfile {
            provider: OAuthProviderKind::Google,
            provider_id: info.sub,
            email,
            name: info.name,
            avatar_url: info.picture,
            verified_email: info.email_verified.unwrap_or(true),
        })
    }
}
