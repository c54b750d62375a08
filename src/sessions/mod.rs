// ABOUTME: Session store abstraction with in-memory and SQLite backends
// ABOUTME: Sessions are independent of how they were established and only the sweep deletes them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Session storage
//!
//! A session is one logical login. Tokens reference sessions by id, so
//! terminating a session revokes every token issued for it. Mutations of a
//! single session are serialized by each backend; a terminate racing a
//! refresh never resurrects the session.

/// In-memory backend
pub mod memory;

pub use memory::InMemorySessionStore;

use async_trait::async_trait;
use chrono::Duration;

use crate::errors::AuthResult;
use crate::models::{ClientMetadata, UserSession};

/// Persistence of user sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a new active session for `user_id` lasting the configured default TTL
    async fn create(&self, user_id: &str, metadata: ClientMetadata) -> AuthResult<UserSession>;

    /// Look up a session by id
    async fn get(&self, session_id: &str) -> AuthResult<Option<UserSession>>;

    /// Look up a session by id, only if it belongs to `user_id`
    async fn get_for_user_and_id(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> AuthResult<Option<UserSession>> {
        Ok(self
            .get(session_id)
            .await?
            .filter(|session| session.user_id == user_id))
    }

    /// Sessions of `user_id`, newest first
    async fn list_for_user(&self, user_id: &str, active_only: bool)
        -> AuthResult<Vec<UserSession>>;

    /// Move the expiry of an active session to `now + extend_by`
    ///
    /// Returns `None` when the session is missing, expired or terminated.
    async fn refresh(
        &self,
        session_id: &str,
        extend_by: Duration,
    ) -> AuthResult<Option<UserSession>>;

    /// Bump `last_accessed_at` and remember `client_ip` if it differs from the latest one
    async fn record_access(&self, session_id: &str, client_ip: Option<&str>) -> AuthResult<()>;

    /// End a session; returns whether anything changed
    async fn terminate(&self, session_id: &str) -> AuthResult<bool>;

    /// End every session of `user_id`; returns how many changed
    async fn terminate_all_for_user(&self, user_id: &str) -> AuthResult<usize>;

    /// Delete expired and terminated sessions; returns how many were removed
    async fn sweep_expired(&self) -> AuthResult<usize>;
}
