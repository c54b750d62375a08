// ABOUTME: Authentication error taxonomy shared by OAuth, token and session components
// ABOUTME: Maps each failure kind onto an ErrorCode and HTTP status without exposing secrets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use thiserror::Error;

use super::{AppError, ErrorCode};
use crate::models::OAuthProviderKind;

/// Why a call to an OAuth provider failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    /// Provider answered with a non-success status; `body` is the raw response text
    Rejected {
        /// HTTP status returned by the provider
        status: u16,
        /// Raw response body for diagnostics
        body: String,
    },
    /// Provider could not be reached (DNS, TLS, connect or request timeout)
    Transport(String),
    /// Provider answered 2xx but the payload could not be used
    Malformed(String),
}

impl ProviderFailure {
    /// Whether the failure means the provider was unreachable rather than refusing
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { status, body } => write!(f, "HTTP {status}: {body}"),
            Self::Transport(reason) => write!(f, "transport error: {reason}"),
            Self::Malformed(reason) => write!(f, "malformed response: {reason}"),
        }
    }
}

/// Errors raised by the authentication core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Provider name is unknown or the provider has no credentials configured
    #[error("OAuth provider '{0}' is not available")]
    ProviderUnavailable(String),

    /// State token is unknown, expired, consumed, or bound to another provider
    #[error("OAuth state is invalid, expired, or already used")]
    InvalidOAuthState,

    /// Authorization code could not be exchanged for tokens
    #[error("OAuth token exchange with {provider} failed: {failure}")]
    OAuthExchange {
        /// Provider that was called
        provider: OAuthProviderKind,
        /// What went wrong
        failure: ProviderFailure,
    },

    /// User profile could not be fetched or the identity token failed verification
    #[error("OAuth profile retrieval from {provider} failed: {failure}")]
    OAuthProfile {
        /// Provider that was called
        provider: OAuthProviderKind,
        /// What went wrong
        failure: ProviderFailure,
    },

    /// Access token signature, algorithm, issuer or structure is wrong
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// Access token is authentic but past its expiry
    #[error("Access token has expired")]
    ExpiredToken,

    /// Generic rejection: session missing, inactive, or owned by someone else
    #[error("Authentication required")]
    Unauthorized,

    /// Caller supplied malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persistence backend failed
    #[error("Storage operation failed: {0}")]
    Storage(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Token exchange failure for `provider`
    #[must_use]
    pub const fn exchange(provider: OAuthProviderKind, failure: ProviderFailure) -> Self {
        Self::OAuthExchange { provider, failure }
    }

    /// Profile retrieval failure for `provider`
    #[must_use]
    pub const fn profile(provider: OAuthProviderKind, failure: ProviderFailure) -> Self {
        Self::OAuthProfile { provider, failure }
    }

    /// Storage failure from any displayable backend error
    pub fn storage(error: impl fmt::Display) -> Self {
        Self::Storage(error.to_string())
    }

    /// Standard error code for this failure
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ProviderUnavailable(_) => ErrorCode::ProviderUnavailable,
            Self::InvalidOAuthState => ErrorCode::InvalidOAuthState,
            Self::OAuthExchange { failure, .. } | Self::OAuthProfile { failure, .. } => {
                if failure.is_transport() {
                    ErrorCode::ExternalServiceUnavailable
                } else {
                    ErrorCode::ExternalServiceError
                }
            }
            Self::InvalidToken(_) => ErrorCode::AuthInvalid,
            Self::ExpiredToken => ErrorCode::AuthExpired,
            Self::Unauthorized => ErrorCode::AuthRequired,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::Storage(_) => ErrorCode::StorageError,
            Self::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// HTTP status the edge layer should answer with
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code().http_status()
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        let code = error.code();
        match &error {
            // Storage details stay in the logs
            AuthError::Storage(_) => Self::new(code, "Storage operation failed").with_source(error),
            _ => Self::new(code, error.to_string()),
        }
    }
}
