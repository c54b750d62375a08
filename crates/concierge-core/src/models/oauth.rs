// ABOUTME: OAuth provider identifiers and the normalized identity every provider maps into
// ABOUTME: Provider names parse case-insensitively; unknown names are reported as unavailable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AuthError;

/// Supported third-party login providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProviderKind {
    /// Google accounts
    Google,
    /// Microsoft personal and work accounts
    Microsoft,
    /// Sign in with Apple
    Apple,
}

impl OAuthProviderKind {
    /// Every supported provider
    pub const ALL: [Self; 3] = [Self::Google, Self::Microsoft, Self::Apple];

    /// Canonical lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Microsoft => "microsoft",
            Self::Apple => "apple",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Microsoft => "Microsoft",
            Self::Apple => "Apple",
        }
    }
}

impl fmt::Display for OAuthProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProviderKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| AuthError::ProviderUnavailable(name.to_owned()))
    }
}

/// Identity returned by a provider after a successful login, normalized across providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthProviderProfile {
    /// Provider that vouched for this identity
    pub provider: OAuthProviderKind,
    /// Provider's stable subject identifier
    pub provider_id: String,
    /// Email address reported by the provider
    pub email: String,
    /// Display name, when shared
    pub name: Option<String>,
    /// Avatar URL, when shared
    pub avatar_url: Option<String>,
    /// Whether the provider verified the email (true when it does not say)
    pub verified_email: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!(
            "google".parse::<OAuthProviderKind>().unwrap(),
            OAuthProviderKind::Google
        );
        assert_eq!(
            " Microsoft ".parse::<OAuthProviderKind>().unwrap(),
            OAuthProviderKind::Microsoft
        );
        assert_eq!(
            "github".parse::<OAuthProviderKind>(),
            Err(AuthError::ProviderUnavailable("github".into()))
        );
    }

    #[test]
    fn test_provider_serde_is_lowercase() {
        let json = serde_json::to_string(&OAuthProviderKind::Apple).unwrap();
        assert_eq!(json, "\"apple\"");
    }
}
