// ABOUTME: Composes the state store and provider adapters into start-login and complete-login
// ABOUTME: The only component aware of every configured provider at once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use super::providers::{adapters_from_config, ProviderAdapter};
use super::{OAuthStateStore, StateMetadata};
use crate::clock::SharedClock;
use crate::config::OAuthProvidersConfig;
use crate::errors::{AuthError, AuthResult};
use crate::models::{OAuthProviderKind, OAuthProviderProfile};

/// Where to send the user to start a login
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequest {
    /// Provider consent page
    pub authorization_url: String,
    /// State token the callback must present
    pub state: String,
}

/// OAuth login entry points for all configured providers
///
/// Constructed once at startup and shared by reference.
pub struct OAuthOrchestrator {
    adapters: BTreeMap<OAuthProviderKind, ProviderAdapter>,
    state_store: Arc<dyn OAuthStateStore>,
}

impl OAuthOrchestrator {
    /// Orchestrator with no providers
    #[must_use]
    pub fn new(state_store: Arc<dyn OAuthStateStore>) -> Self {
        Self {
            adapters: BTreeMap::new(),
            state_store,
        }
    }

    /// Register `adapter`, replacing any adapter of the same kind
    #[must_use]
    pub fn with_adapter(mut self, adapter: ProviderAdapter) -> Self {
        info!(provider = %adapter.kind(), "OAuth provider registered");
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    /// Orchestrator with an adapter for every provider whose configuration is usable
    #[must_use]
    pub fn from_config(
        config: &OAuthProvidersConfig,
        state_store: Arc<dyn OAuthStateStore>,
        http: &Client,
        clock: &SharedClock,
    ) -> Self {
        adapters_from_config(config, http, clock)
            .into_iter()
            .fold(Self::new(state_store), Self::with_adapter)
    }

    /// Providers with a configured adapter
    #[must_use]
    pub fn available_providers(&self) -> BTreeSet<OAuthProviderKind> {
        self.adapters.keys().copied().collect()
    }

    /// Mint a state token and build the provider's consent URL
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProviderUnavailable` for unknown or unconfigured providers,
    /// or a storage error when the state cannot be saved
    pub async fn start_login(
        &self,
        provider: &str,
        metadata: StateMetadata,
    ) -> AuthResult<AuthorizationRequest> {
        let adapter = self.adapter(provider)?;
        let state = self
            .state_store
            .create(adapter.kind(), adapter.redirect_uri(), metadata)
            .await?;

        Ok(AuthorizationRequest {
            authorization_url: adapter.build_authorization_url(&state),
            state,
        })
    }

    /// Consume `state`, exchange `code` and return the normalized profile
    ///
    /// The state is spent even when the exchange fails; the user restarts the login.
    /// The token exchange always sends the adapter's configured redirect URI. A state
    /// minted under a different one (an instance sharing the store with another
    /// callback, or a state persisted before the callback changed) is rejected.
    ///
    /// # Errors
    ///
    /// - `AuthError::ProviderUnavailable` for unknown or unconfigured providers
    /// - `AuthError::InvalidOAuthState` when the state is unknown, expired, already used,
    ///   bound to another provider or minted for another configured redirect URI
    /// - `AuthError::OAuthExchange` / `AuthError::OAuthProfile` when the provider fails
    pub async fn complete_login(
        &self,
        provider: &str,
        code: &str,
        state: &str,
    ) -> AuthResult<OAuthProviderProfile> {
        let adapter = self.adapter(provider)?;
        let kind = adapter.kind();

        let Some(consumed) = self.state_store.validate_and_consume(state, kind).await? else {
            warn!(provider = %kind, "OAuth callback with invalid state");
            return Err(AuthError::InvalidOAuthState);
        };
        // Differs only when the store is shared with an adapter configured for another callback
        if consumed.redirect_uri != adapter.redirect_uri() {
            warn!(
                provider = %kind,
                expected = adapter.redirect_uri(),
                issued_for = %consumed.redirect_uri,
                "OAuth state was issued for a different redirect URI"
            );
            return Err(AuthError::InvalidOAuthState);
        }

        let tokens = adapter.exchange_code(code).await?;
        let profile = adapter.fetch_profile(&tokens).await?;
        info!(
            provider = %kind,
            provider_id = %profile.provider_id,
            "OAuth login completed"
        );
        Ok(profile)
    }

    /// Remove expired states; returns how many were deleted
    ///
    /// # Errors
    ///
    /// Returns a storage error when the backend fails
    pub async fn cleanup_expired_states(&self) -> AuthResult<usize> {
        self.state_store.cleanup_expired().await
    }

    fn adapter(&self, provider: &str) -> AuthResult<&ProviderAdapter> {
        let kind: OAuthProviderKind = provider.parse()?;
        self.adapters
            .get(&kind)
            .ok_or_else(|| AuthError::ProviderUnavailable(kind.to_string()))
    }
}
