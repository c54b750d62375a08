// ABOUTME: User session record, lifecycle status and client metadata
// ABOUTME: Expired is derived from the clock; only Active and Terminated are ever persisted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::OAuthProviderKind;
use crate::errors::AuthError;

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Usable until `expires_at`
    Active,
    /// Past `expires_at`; derived, never stored
    Expired,
    /// Explicitly ended; one-way
    Terminated,
}

impl SessionStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Terminated => "terminated",
        }
    }

    /// Parse the storage representation
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` for an unknown value
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        match value {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "terminated" => Ok(Self::Terminated),
            other => Err(AuthError::Storage(format!(
                "unknown session status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the user established the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LoginMethod {
    /// First-party credentials checked by the caller
    #[default]
    Password,
    /// Third-party login
    #[serde(rename = "oauth")]
    OAuth {
        /// Provider used
        provider: OAuthProviderKind,
    },
}

/// Client details captured at login
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// `User-Agent` header
    pub user_agent: Option<String>,
    /// Device label chosen by the client
    pub device_label: Option<String>,
    /// How the session was established
    pub login_method: LoginMethod,
    /// Client IP at login
    pub ip_address: Option<String>,
}

impl ClientMetadata {
    /// Metadata for a login through `method`
    #[must_use]
    pub fn new(login_method: LoginMethod) -> Self {
        Self {
            login_method,
            ..Self::default()
        }
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the device label
    #[must_use]
    pub fn with_device_label(mut self, device_label: impl Into<String>) -> Self {
        self.device_label = Some(device_label.into());
        self
    }

    /// Set the client IP
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}

/// One logical login of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    /// Random, unguessable identifier; never changes
    pub id: String,
    /// Owning identity
    pub user_id: String,
    /// Stored status (`Active` or `Terminated`)
    pub status: SessionStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last time the session authenticated a request
    pub last_accessed_at: DateTime<Utc>,
    /// End of validity; moved forward by refresh
    pub expires_at: DateTime<Utc>,
    /// `User-Agent` at login
    pub user_agent: Option<String>,
    /// Device label at login
    pub device_label: Option<String>,
    /// How the session was established
    pub login_method: LoginMethod,
    /// Most recent distinct client IPs, oldest first; audit only
    pub ip_history: Vec<String>,
}

impl UserSession {
    /// Open a new active session at `now` lasting `ttl`
    #[must_use]
    pub fn open(
        id: String,
        user_id: String,
        metadata: ClientMetadata,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id,
            user_id,
            status: SessionStatus::Active,
            created_at: now,
            last_accessed_at: now,
            expires_at: now + ttl,
            user_agent: metadata.user_agent,
            device_label: metadata.device_label,
            login_method: metadata.login_method,
            ip_history: metadata.ip_address.into_iter().collect(),
        }
    }

    /// Whether the session can authenticate requests at `now`
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Active && now < self.expires_at
    }

    /// Whether the session can authenticate requests right now
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Status including the derived `Expired` state
    #[must_use]
    pub fn effective_status_at(&self, now: DateTime<Utc>) -> SessionStatus {
        match self.status {
            SessionStatus::Active if now >= self.expires_at => SessionStatus::Expired,
            status => status,
        }
    }

    /// Whether the session is eligible for physical removal
    #[must_use]
    pub fn is_sweepable_at(&self, now: DateTime<Utc>) -> bool {
        self.effective_status_at(now) != SessionStatus::Active
    }

    /// Append `ip` unless it repeats the latest entry, keeping at most `limit` entries
    ///
    /// Returns whether the history changed.
    pub fn record_ip(&mut self, ip: &str, limit: usize) -> bool {
        if self.ip_history.last().is_some_and(|last| last == ip) {
            return false;
        }
        self.ip_history.push(ip.to_owned());
        if self.ip_history.len() > limit {
            let excess = self.ip_history.len() - limit;
            self.ip_history.drain(..excess);
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn session_at(now: DateTime<Utc>) -> UserSession {
        UserSession::open(
            "s1".into(),
            "u1".into(),
            ClientMetadata::default().with_ip_address("10.0.0.1"),
            now,
            Duration::hours(24),
        )
    }

    #[test]
    fn test_active_predicate() {
        let now = Utc::now();
        let mut session = session_at(now);
        assert!(session.is_active_at(now));
        assert!(!session.is_active_at(now + Duration::hours(24)));
        assert_eq!(
            session.effective_status_at(now + Duration::hours(25)),
            SessionStatus::Expired
        );

        session.status = SessionStatus::Terminated;
        assert!(!session.is_active_at(now));
        assert_eq!(session.effective_status_at(now), SessionStatus::Terminated);
    }

    #[test]
    fn test_ip_history_is_bounded_and_deduplicated() {
        let mut session = session_at(Utc::now());
        assert!(!session.record_ip("10.0.0.1", 3));
        assert!(session.record_ip("10.0.0.2", 3));
        assert!(session.record_ip("10.0.0.3", 3));
        assert!(session.record_ip("10.0.0.4", 3));
        assert_eq!(session.ip_history, vec!["10.0.0.2", "10.0.0.3", "10.0.0.4"]);
        // Only consecutive repeats are collapsed
        assert!(session.record_ip("10.0.0.2", 3));
        assert_eq!(session.ip_history, vec!["10.0.0.3", "10.0.0.4", "10.0.0.2"]);
    }

    #[test]
    fn test_login_method_serialization() {
        let method = LoginMethod::OAuth {
            provider: OAuthProviderKind::Google,
        };
        let json = serde_json::to_string(&method).unwrap();
        assert_eq!(json, r#"{"method":"oauth","provider":"google"}"#);
        let back: LoginMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, method);
    }
}
