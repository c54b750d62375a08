// ABOUTME: OAuth module organizing third-party login for Google, Microsoft and Apple
// ABOUTME: Defines state records, provider token responses and the orchestrating entry points
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # OAuth Login
//!
//! A login starts by minting a single-use state token bound to a provider and
//! redirect URI, then sends the user to the provider's consent page. The
//! callback consumes the state exactly once, exchanges the authorization code
//! and normalizes the provider's profile. Linking the profile to a user record
//! is left to the caller.

/// Login orchestration across providers
pub mod orchestrator;
/// Provider adapters
pub mod providers;
/// Single-use CSRF state tokens
pub mod state_store;

pub use orchestrator::{AuthorizationRequest, OAuthOrchestrator};
pub use providers::ProviderAdapter;
pub use state_store::{InMemoryOAuthStateStore, OAuthStateStore};

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::OAuthProviderKind;

/// Opaque key/value context carried from start to completion (client IP, user agent, ...)
pub type StateMetadata = BTreeMap<String, String>;

/// One in-flight authorization attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    /// Random URL-safe token sent as the `state` parameter
    pub state_token: String,
    /// Provider the attempt is bound to
    pub provider: OAuthProviderKind,
    /// Callback URI the attempt is bound to
    pub redirect_uri: String,
    /// Caller context
    pub metadata: StateMetadata,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// End of validity
    pub expires_at: DateTime<Utc>,
}

impl OAuthState {
    /// Whether the state can no longer be used at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Token endpoint response
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderTokens {
    /// Bearer token for the provider's APIs
    pub access_token: String,
    /// Usually `Bearer`
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Refresh token, when offline access was granted
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Granted scopes
    #[serde(default)]
    pub scope: Option<String>,
    /// OpenID Connect identity token (always present for Apple)
    #[serde(default)]
    pub id_token: Option<String>,
}

impl fmt::Debug for ProviderTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderTokens")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("scope", &self.scope)
            .field("has_id_token", &self.id_token.is_some())
            .finish_non_exhaustive()
    }
}
