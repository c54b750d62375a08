// ABOUTME: Provider adapters translating Google, Microsoft and Apple OAuth into one profile shape
// ABOUTME: ProviderAdapter is the closed set of supported providers dispatched by kind
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Sign in with Apple
pub mod apple;
/// Apple identity token verification
pub mod apple_keys;
mod client;
/// Google OpenID Connect
pub mod google;
/// Microsoft identity platform
pub mod microsoft;

pub use apple::AppleAdapter;
pub use apple_keys::{AppleIdentityClaims, AppleKeyCache, JsonWebKey, JsonWebKeySet};
pub use google::GoogleAdapter;
pub use microsoft::MicrosoftAdapter;

use reqwest::Client;
use tracing::warn;

use crate::clock::SharedClock;
use crate::config::OAuthProvidersConfig;
use crate::errors::AuthResult;
use crate::models::{OAuthProviderKind, OAuthProviderProfile};
use crate::oauth::ProviderTokens;

/// A configured identity provider
pub enum ProviderAdapter {
    /// Google
    Google(GoogleAdapter),
    /// Microsoft
    Microsoft(MicrosoftAdapter),
    /// Apple
    Apple(AppleAdapter),
}

impl ProviderAdapter {
    /// Which provider this adapter talks to
    #[must_use]
    pub const fn kind(&self) -> OAuthProviderKind {
        match self {
            Self::Google(_) => OAuthProviderKind::Google,
            Self::Microsoft(_) => OAuthProviderKind::Microsoft,
            Self::Apple(_) => OAuthProviderKind::Apple,
        }
    }

    /// Callback URI registered with the provider
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        match self {
            Self::Google(adapter) => adapter.client().redirect_uri(),
            Self::Microsoft(adapter) => adapter.client().redirect_uri(),
            Self::Apple(adapter) => adapter.client().redirect_uri(),
        }
    }

    /// Consent page URL carrying `state`
    #[must_use]
    pub fn build_authorization_url(&self, state: &str) -> String {
        match self {
            Self::Google(adapter) => adapter.build_authorization_url(state),
            Self::Microsoft(adapter) => adapter.build_authorization_url(state),
            Self::Apple(adapter) => adapter.build_authorization_url(state),
        }
    }

    /// Exchange an authorization code for provider tokens
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuthExchange` when the provider rejects the code or is unreachable
    pub async fn exchange_code(&self, code: &str) -> AuthResult<ProviderTokens> {
        match self {
            Self::Google(adapter) => adapter.exchange_code(code).await,
            Self::Microsoft(adapter) => adapter.exchange_code(code).await,
            Self::Apple(adapter) => adapter.exchange_code(code).await,
        }
    }

    /// Fetch and normalize the user's profile
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuthProfile` when the profile cannot be fetched, verified or parsed
    pub async fn fetch_profile(&self, tokens: &ProviderTokens) -> AuthResult<OAuthProviderProfile> {
        match self {
            Self::Google(adapter) => adapter.fetch_profile(tokens).await,
            Self::Microsoft(adapter) => adapter.fetch_profile(tokens).await,
            Self::Apple(adapter) => adapter.fetch_profile(tokens).await,
        }
    }
}

/// Build adapters for every provider whose credentials validate
///
/// Providers that are configured but fail to build are logged and skipped so one
/// broken provider does not take the others down.
#[must_use]
pub fn adapters_from_config(
    config: &OAuthProvidersConfig,
    http: &Client,
    clock: &SharedClock,
) -> Vec<ProviderAdapter> {
    let mut adapters = Vec::new();

    if config.google.is_configured() {
        push_or_warn(
            &mut adapters,
            OAuthProviderKind::Google,
            GoogleAdapter::new(&config.google, http.clone()).map(ProviderAdapter::Google),
        );
    }
    if config.microsoft.is_configured() {
        push_or_warn(
            &mut adapters,
            OAuthProviderKind::Microsoft,
            MicrosoftAdapter::new(&config.microsoft, http.clone()).map(ProviderAdapter::Microsoft),
        );
    }
    if config.apple.is_configured() {
        push_or_warn(
            &mut adapters,
            OAuthProviderKind::Apple,
            AppleAdapter::new(&config.apple, http.clone(), clock.clone())
                .map(ProviderAdapter::Apple),
        );
    }

    adapters
}

fn push_or_warn(
    adapters: &mut Vec<ProviderAdapter>,
    kind: OAuthProviderKind,
    built: AuthResult<ProviderAdapter>,
) {
    match built {
        Ok(adapter) => adapters.push(adapter),
        Err(e) => warn!(provider = %kind, error = %e, "OAuth provider disabled"),
    }
}
