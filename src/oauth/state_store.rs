// ABOUTME: Single-use CSRF state tokens binding an authorization attempt to a provider
// ABOUTME: Consumption is atomic per token, so concurrent callbacks yield exactly one success
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use tracing::{debug, warn};

use super::{OAuthState, StateMetadata};
use crate::clock::SharedClock;
use crate::crypto::generate_state_token;
use crate::errors::{AuthError, AuthResult};
use crate::models::OAuthProviderKind;

/// Storage of OAuth state tokens
///
/// Absence, expiry and provider mismatch all resolve to `Ok(None)`; errors are
/// reserved for backend failures.
#[async_trait]
pub trait OAuthStateStore: Send + Sync {
    /// Mint and store a state token for `provider` and `redirect_uri`
    async fn create(
        &self,
        provider: OAuthProviderKind,
        redirect_uri: &str,
        metadata: StateMetadata,
    ) -> AuthResult<String>;

    /// Atomically remove and return the state if it exists, is unexpired and matches `provider`
    ///
    /// A provider mismatch leaves the state in place. A found-but-expired state is pruned.
    async fn validate_and_consume(
        &self,
        state_token: &str,
        provider: OAuthProviderKind,
    ) -> AuthResult<Option<OAuthState>>;

    /// Delete every expired state; returns how many were removed
    async fn cleanup_expired(&self) -> AuthResult<usize>;
}

/// Reject empty redirect URIs before anything is stored
pub(crate) fn ensure_redirect_uri(redirect_uri: &str) -> AuthResult<()> {
    if redirect_uri.trim().is_empty() {
        return Err(AuthError::InvalidInput("redirect URI is required".into()));
    }
    Ok(())
}

/// State store living in process memory
pub struct InMemoryOAuthStateStore {
    states: DashMap<String, OAuthState>,
    ttl: Duration,
    clock: SharedClock,
}

impl InMemoryOAuthStateStore {
    /// Empty store issuing states that live for `ttl`
    #[must_use]
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            states: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Number of stored states, including expired ones not yet swept
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no state is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[async_trait]
impl OAuthStateStore for InMemoryOAuthStateStore {
    async fn create(
        &self,
        provider: OAuthProviderKind,
        redirect_uri: &str,
        metadata: StateMetadata,
    ) -> AuthResult<String> {
        ensure_redirect_uri(redirect_uri)?;
        let now = self.clock.now();
        let state = OAuthState {
            state_token: generate_state_token(),
            provider,
            redirect_uri: redirect_uri.to_owned(),
            metadata,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let token = state.state_token.clone();
        self.states.insert(token.clone(), state);
        debug!(provider = %provider, "Created OAuth state");
        Ok(token)
    }

    async fn validate_and_consume(
        &self,
        state_token: &str,
        provider: OAuthProviderKind,
    ) -> AuthResult<Option<OAuthState>> {
        let now = self.clock.now();

        // remove_if holds the shard lock across check and removal
        if let Some((_, state)) = self.states.remove_if(state_token, |_, state| {
            state.provider == provider && !state.is_expired_at(now)
        }) {
            debug!(provider = %provider, "Consumed OAuth state");
            return Ok(Some(state));
        }

        if self
            .states
            .remove_if(state_token, |_, state| state.is_expired_at(now))
            .is_some()
        {
            warn!(provider = %provider, "Rejected expired OAuth state");
        } else if self.states.contains_key(state_token) {
            warn!(provider = %provider, "Rejected OAuth state issued for another provider");
        } else {
            warn!(provider = %provider, "Rejected unknown OAuth state");
        }
        Ok(None)
    }

    async fn cleanup_expired(&self) -> AuthResult<usize> {
        let now = self.clock.now();
        let mut removed = 0;
        self.states.retain(|_, state| {
            let expired = state.is_expired_at(now);
            if expired {
                removed += 1;
            }
            !expired
        });
        if removed > 0 {
            debug!(removed, "Cleaned up expired OAuth states");
        }
        Ok(removed)
    }
}
