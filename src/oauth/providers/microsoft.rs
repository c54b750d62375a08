// ABOUTME: Microsoft identity platform adapter reading the profile from Microsoft Graph
// ABOUTME: Falls back to the user principal name when the account has no mail attribute
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use reqwest::Client;
use serde::Deserialize;
use zeroize::Zeroizing;

use super::client::OAuthClient;
use crate::config::OAuthProviderConfig;
use crate::constants::oauth::MICROSOFT_AUTHORIZATION_EXTRAS;
use crate::errors::{AuthError, AuthResult, ProviderFailure};
use crate::models::{OAuthProviderKind, OAuthProviderProfile};
use crate::oauth::ProviderTokens;

/// Microsoft Graph `/me` payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphUser {
    id: String,
    mail: Option<String>,
    user_principal_name: Option<String>,
    display_name: Option<String>,
}

/// Sign in with Microsoft
#[derive(Debug, Clone)]
pub struct MicrosoftAdapter {
    client: OAuthClient,
    client_secret: Zeroizing<String>,
}

impl MicrosoftAdapter {
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
            .ok_or_else(|| AuthError::Config("microsoft client_secret is not set".into()))?;
        Ok(Self {
            client: OAuthClient::new(OAuthProviderKind::Microsoft, config, http)?,
            client_secret: Zeroizing::new(client_secret),
        })
    }

    pub(crate) const fn client(&self) -> &OAuthClient {
        &self.client
    }

    pub(crate) fn build_authorization_url(&self, state: &str) -> String {
        self.client
            .authorization_url(state, MICROSOFT_AUTHORIZATION_EXTRAS)
    }

    pub(crate) async fn exchange_code(&self, code: &str) -> AuthResult<ProviderTokens> {
        self.client.exchange_code(code, &self.client_secret).await
    }

    pub(crate) async fn fetch_profile(
        &self,
        tokens: &ProviderTokens,
    ) -> AuthResult<OAuthProviderProfile> {
        let user: GraphUser = self
            .client
            .get_with_bearer(self.client.user_info_endpoint(), &tokens.access_token)
            .await?;

        let email = user
            .mail
            .filter(|mail| !mail.is_empty())
            .or(user.user_principal_name)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| {
                AuthError::profile(
                    OAuthProviderKind::Microsoft,
                    ProviderFailure::Malformed("profile has no email address".into()),
                )
            })?;

        Ok(OAuthProviderProfile {
            provider: OAuthProviderKind::Microsoft,
            provider_id: user.id,
            email,
            name: user.display_name,
            avatar_url: None,
            verified_email: true,
        })
    }
}
