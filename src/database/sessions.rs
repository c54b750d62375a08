// ABOUTME: SQLite-backed session store
// ABOUTME: Status transitions are conditional updates; IP history updates serialize per session id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::Duration;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};

use super::{from_millis, to_millis, Database};
use crate::clock::SharedClock;
use crate::config::SessionConfig;
use crate::crypto::generate_session_id;
use crate::errors::{AuthError, AuthResult};
use crate::models::{ClientMetadata, LoginMethod, SessionStatus, UserSession};
use crate::sessions::SessionStore;
use crate::utils::keyed_lock::KeyedLocks;

const SESSION_COLUMNS: &str = "id, user_id, status, created_at, last_accessed_at, expires_at, \
                               user_agent, device_label, login_method, ip_history";

/// Session store persisted in `SQLite`
pub struct SqliteSessionStore {
    database: Database,
    config: SessionConfig,
    clock: SharedClock,
    locks: KeyedLocks,
}

impl SqliteSessionStore {
    /// Store over `database` using `config` for lifetimes and IP history
    #[must_use]
    pub fn new(database: Database, config: SessionConfig, clock: SharedClock) -> Self {
        Self {
            database,
            config,
            clock,
            locks: KeyedLocks::new(),
        }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        binds: &[&str],
    ) -> AuthResult<Option<UserSession>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM user_sessions WHERE {clause}");
        let mut query = sqlx::query(&sql);
        for value in binds {
            query = query.bind(*value);
        }
        query
            .fetch_optional(self.database.pool())
            .await
            .map_err(AuthError::storage)?
            .as_ref()
            .map(row_to_session)
            .transpose()
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
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
        let login_method =
            serde_json::to_string(&session.login_method).map_err(AuthError::storage)?;
        let ip_history = serde_json::to_string(&session.ip_history).map_err(AuthError::storage)?;

        sqlx::query(
            r"
            INSERT INTO user_sessions (
                id, user_id, status, created_at, last_accessed_at, expires_at,
                user_agent, device_label, login_method, ip_history
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.status.as_str())
        .bind(to_millis(session.created_at))
        .bind(to_millis(session.last_accessed_at))
        .bind(to_millis(session.expires_at))
        .bind(&session.user_agent)
        .bind(&session.device_label)
        .bind(login_method)
        .bind(ip_history)
        .execute(self.database.pool())
        .await
        .map_err(AuthError::storage)?;

        debug!(user_id = %user_id, "Created session");
        Ok(session)
    }

    async fn get(&self, session_id: &str) -> AuthResult<Option<UserSession>> {
        self.fetch_one_where("id = $1", &[session_id]).await
    }

    async fn get_for_user_and_id(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> AuthResult<Option<UserSession>> {
        self.fetch_one_where("id = $1 AND user_id = $2", &[session_id, user_id])
            .await
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        active_only: bool,
    ) -> AuthResult<Vec<UserSession>> {
        let sql = if active_only {
            format!(
                "SELECT {SESSION_COLUMNS} FROM user_sessions \
                 WHERE user_id = $1 AND status = 'active' AND expires_at > $2 \
                 ORDER BY created_at DESC"
            )
        } else {
            format!(
                "SELECT {SESSION_COLUMNS} FROM user_sessions \
                 WHERE user_id = $1 ORDER BY created_at DESC"
            )
        };
        let mut query = sqlx::query(&sql).bind(user_id);
        if active_only {
            query = query.bind(to_millis(self.clock.now()));
        }
        query
            .fetch_all(self.database.pool())
            .await
            .map_err(AuthError::storage)?
            .iter()
            .map(row_to_session)
            .collect()
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
        let now = self.clock.now();
        let sql = format!(
            "UPDATE user_sessions SET expires_at = $2, last_accessed_at = $3 \
             WHERE id = $1 AND status = 'active' AND expires_at > $3 \
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query(&sql)
            .bind(session_id)
            .bind(to_millis(now + extend_by))
            .bind(to_millis(now))
            .fetch_optional(self.database.pool())
            .await
            .map_err(AuthError::storage)?
            .as_ref()
            .map(row_to_session)
            .transpose()
    }

    async fn record_access(&self, session_id: &str, client_ip: Option<&str>) -> AuthResult<()> {
        let now = self.clock.now();
        let Some(ip) = client_ip.filter(|ip| !ip.is_empty()) else {
            sqlx::query("UPDATE user_sessions SET last_accessed_at = $2 WHERE id = $1")
                .bind(session_id)
                .bind(to_millis(now))
                .execute(self.database.pool())
                .await
                .map_err(AuthError::storage)?;
            return Ok(());
        };

        let _guard = self.locks.lock(session_id).await;
        let Some(mut session) = self.get(session_id).await? else {
            return Ok(());
        };
        session.record_ip(ip, self.config.ip_history_limit);
        let ip_history = serde_json::to_string(&session.ip_history).map_err(AuthError::storage)?;

        sqlx::query(
            "UPDATE user_sessions SET last_accessed_at = $2, ip_history = $3 WHERE id = $1",
        )
        .bind(session_id)
        .bind(to_millis(now))
        .bind(ip_history)
        .execute(self.database.pool())
        .await
        .map_err(AuthError::storage)?;
        Ok(())
    }

    async fn terminate(&self, session_id: &str) -> AuthResult<bool> {
        let changed = sqlx::query(
            "UPDATE user_sessions SET status = 'terminated' WHERE id = $1 AND status != 'terminated'",
        )
        .bind(session_id)
        .execute(self.database.pool())
        .await
        .map_err(AuthError::storage)?
        .rows_affected();
        if changed > 0 {
            debug!("Terminated session");
        }
        Ok(changed > 0)
    }

    async fn terminate_all_for_user(&self, user_id: &str) -> AuthResult<usize> {
        let changed = sqlx::query(
            "UPDATE user_sessions SET status = 'terminated' \
             WHERE user_id = $1 AND status != 'terminated'",
        )
        .bind(user_id)
        .execute(self.database.pool())
        .await
        .map_err(AuthError::storage)?
        .rows_affected();
        let terminated = usize::try_from(changed).unwrap_or(usize::MAX);
        info!(user_id = %user_id, terminated, "Terminated all sessions for user");
        Ok(terminated)
    }

    async fn sweep_expired(&self) -> AuthResult<usize> {
        let removed = sqlx::query(
            "DELETE FROM user_sessions WHERE status = 'terminated' OR expires_at <= $1",
        )
        .bind(to_millis(self.clock.now()))
        .execute(self.database.pool())
        .await
        .map_err(AuthError::storage)?
        .rows_affected();
        if removed > 0 {
            debug!(removed, "Swept expired sessions");
        }
        Ok(usize::try_from(removed).unwrap_or(usize::MAX))
    }
}

fn row_to_session(row: &SqliteRow) -> AuthResult<UserSession> {
    let status: String = row.try_get("status").map_err(AuthError::storage)?;
    let login_method: String = row.try_get("login_method").map_err(AuthError::storage)?;
    let ip_history: String = row.try_get("ip_history").map_err(AuthError::storage)?;
    Ok(UserSession {
        id: row.try_get("id").map_err(AuthError::storage)?,
        user_id: row.try_get("user_id").map_err(AuthError::storage)?,
        status: SessionStatus::parse(&status)?,
        created_at: from_millis(row.try_get("created_at").map_err(AuthError::storage)?)?,
        last_accessed_at: from_millis(
            row.try_get("last_accessed_at")
                .map_err(AuthError::storage)?,
        )?,
        expires_at: from_millis(row.try_get("expires_at").map_err(AuthError::storage)?)?,
        user_agent: row.try_get("user_agent").map_err(AuthError::storage)?,
        device_label: row.try_get("device_label").map_err(AuthError::storage)?,
        login_method: serde_json::from_str::<LoginMethod>(&login_method)
            .map_err(AuthError::storage)?,
        ip_history: serde_json::from_str(&ip_history).map_err(AuthError::storage)?,
    })
}
