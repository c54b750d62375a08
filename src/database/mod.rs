// ABOUTME: SQLite persistence for OAuth state tokens and user sessions
// ABOUTME: Owns the connection pool and the idempotent schema migration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! Durable backends for [`crate::oauth::OAuthStateStore`] and
//! [`crate::sessions::SessionStore`]. Timestamps are stored as milliseconds since
//! the epoch; structured fields are stored as JSON text.

mod oauth_states;
mod sessions;

pub use oauth_states::SqliteOAuthStateStore;
pub use sessions::SqliteSessionStore;

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::{AuthError, AuthResult};

/// Connection pool with the auth schema applied
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at `database_url` and migrate it
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` when the URL is invalid, the file cannot be opened
    /// or the migration fails
    pub async fn connect(database_url: &str) -> AuthResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(AuthError::storage)?
            .create_if_missing(true);

        // Every connection to `:memory:` is a separate database; keep exactly one alive
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new().connect_with(options).await
        }
        .map_err(AuthError::storage)?;

        let database = Self { pool };
        database.migrate().await?;
        info!("Database ready");
        Ok(database)
    }

    /// Private in-memory database
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` when the migration fails
    pub async fn in_memory() -> AuthResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` when a statement fails
    pub async fn migrate(&self) -> AuthResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth_states (
                state_token TEXT PRIMARY KEY,
                provider TEXT NOT NULL,
                redirect_uri TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(AuthError::storage)?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('active', 'terminated')),
                created_at INTEGER NOT NULL,
                last_accessed_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                user_agent TEXT,
                device_label TEXT,
                login_method TEXT NOT NULL,
                ip_history TEXT NOT NULL DEFAULT '[]'
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(AuthError::storage)?;

        for statement in [
            "CREATE INDEX IF NOT EXISTS idx_oauth_states_expires_at ON oauth_states(expires_at)",
            "CREATE INDEX IF NOT EXISTS idx_user_sessions_user_id ON user_sessions(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_user_sessions_expires_at ON user_sessions(expires_at)",
        ] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(AuthError::storage)?;
        }
        Ok(())
    }
}

pub(crate) fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> AuthResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| AuthError::Storage(format!("timestamp {millis} is out of range")))
}
