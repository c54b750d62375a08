// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for token, session and OAuth state lifetimes and limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single large file.

/// OAuth provider endpoints, scopes and authorization parameters
pub mod oauth;

/// Service identity
pub mod service_names {
    /// Default service name used in logs and as the token issuer
    pub const CONCIERGE_AUTH: &str = "concierge-auth";
}

/// Lifetimes and intervals
pub mod time {
    /// Access token lifetime (15 minutes)
    pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
    /// Session lifetime
    pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
    /// Sliding extension applied when a session is refreshed
    pub const DEFAULT_SESSION_REFRESH_EXTENSION_HOURS: i64 = 24;
    /// OAuth state token lifetime (10 minutes)
    pub const DEFAULT_OAUTH_STATE_TTL_SECS: i64 = 10 * 60;
    /// Period of the background sweeper
    pub const DEFAULT_MAINTENANCE_INTERVAL_SECS: u64 = 5 * 60;
    /// Lifetime of a generated Apple client secret
    pub const APPLE_CLIENT_SECRET_TTL_SECS: i64 = 5 * 60;
    /// How long a fetched Apple key set is trusted before refetching
    pub const APPLE_JWKS_CACHE_TTL_SECS: i64 = 60 * 60;
    /// Provider request timeout
    pub const OAUTH_HTTP_TIMEOUT_SECS: u64 = 15;
    /// Provider connect timeout
    pub const OAUTH_HTTP_CONNECT_TIMEOUT_SECS: u64 = 5;
}

/// Sizes and bounds
pub mod limits {
    /// Random bytes behind state tokens, session ids and token ids
    pub const RANDOM_TOKEN_BYTES: usize = 32;
    /// Number of distinct client IPs remembered per session
    pub const DEFAULT_IP_HISTORY_LIMIT: usize = 5;
    /// Minimum length of an HMAC signing secret
    pub const MIN_SIGNING_SECRET_BYTES: usize = 32;
}

/// Role names understood by the access guard
pub mod roles {
    /// Role allowed to act on any user's resources
    pub const ADMIN: &str = "admin";
}
