// ABOUTME: In-memory session store backed by a concurrent map
// ABOUTME: Per-entry map guards serialize mutations of one session without a global lock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use tracing::{debug, info};

use super::SessionStore;
use crate::clock::SharedClock;
use crate::config::SessionConfig;
use crate::crypto::generate_session_id;
use crate::errors::{AuthError, AuthResult};
use crate::models::{ClientMetadata, SessionStatus, UserSession};

/// Session store living in process memory
pub struct InMemorySessionStore {
    sessions: DashMap<String, UserSession>,
    config: SessionConfig,
    clock: SharedClock,
}

impl InMemorySessionStore {
    /// Empty store using `config` for lifetimes and IP history
    #[must_use]
    pub fn new(config: SessionConfig, clock: SharedClock) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
            clock,
        }
    }

    /// Number of stored sessions, including expired and terminated ones
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, user_id: &str, metadata: ClientMetadata) -> AuthResult<UserSession> {
        if user_id.is_empty() {
            return Err(AuthError::InvalidInput("user id is required".into()));
        }
        let session = UserSession::open(
            generate_session_id(),
            user_id.to_owned(),
            metadata,
            self.clock.now(),
            self.config.ttl,
        );
        self.sessions.insert(session.id.clone(), session.clone());
        debug!(user_id = %user_id, "Created session");
        Ok(session)
    }

    async fn get(&self, session_id: &str) -> AuthResult<Option<UserSession>> {
        Ok(self.sessions.get(session_id).map(|entry| entry.clone()))
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        active_only: bool,
    ) -> AuthResult<Vec<UserSession>> {
        let now = self.clock.now();
        let mut sessions: Vec<UserSession> = self
            .sessions
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .filter(|entry| !active_only || entry.is_active_at(now))
            .map(|entry| entry.clone())
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn refresh(
        &self,
        session_id: &str,
        extend_by: Duration,
    ) -> AuthResult<Option<UserSession>> {
        if extend_by <= Duration::zero() {
            return Err(AuthError::InvalidInput(
                "session extension must be positive".into(),
            ));
        }
        let Some(mut entry) = self.sessions.get_mut(session_id) else {
            return Ok(None);
        };
        let now = self.clock.now();
        if !entry.is_active_at(now) {
            return Ok(None);
        }
        entry.expires_at = now + extend_by;
        entry.last_accessed_at = now;
        Ok(Some(entry.clone()))
    }

    async fn record_access(&self, session_id: &str, client_ip: Option<&str>) -> AuthResult<()> {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            entry.last_accessed_at = self.clock.now();
            if let Some(ip) = client_ip.filter(|ip| !ip.is_empty()) {
                entry.record_ip(ip, self.config.ip_history_limit);
            }
        }
        Ok(())
    }

    async fn terminate(&self, session_id: &str) -> AuthResult<bool> {
        let Some(mut entry) = self.sessions.get_mut(session_id) else {
            return Ok(false);
        };
        if entry.status == SessionStatus::Terminated {
            return Ok(false);
        }
        entry.status = SessionStatus::Terminated;
        debug!(user_id = %entry.user_id, "Terminated session");
        Ok(true)
    }

    async fn terminate_all_for_user(&self, user_id: &str) -> AuthResult<usize> {
        let mut terminated = 0;
        for mut entry in self.sessions.iter_mut() {
            if entry.user_id == user_id && entry.status != SessionStatus::Terminated {
                entry.status = SessionStatus::Terminated;
                terminated += 1;
            }
        }
        info!(user_id = %user_id, terminated, "Terminated all sessions for user");
        Ok(terminated)
    }

    async fn sweep_expired(&self) -> AuthResult<usize> {
        let now = self.clock.now();
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let keep = !session.is_sweepable_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            debug!(removed, "Swept expired sessions");
        }
        Ok(removed)
    }
}
