// ABOUTME: SQLite-backed OAuth state store
// ABOUTME: Consumption is a single conditional DELETE ... RETURNING, so only one caller can win
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::Duration;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, warn};

use super::{from_millis, to_millis, Database};
use crate::clock::SharedClock;
use crate::crypto::generate_state_token;
use crate::errors::{AuthError, AuthResult};
use crate::models::OAuthProviderKind;
use crate::oauth::state_store::ensure_redirect_uri;
use crate::oauth::{OAuthState, OAuthStateStore, StateMetadata};

/// State store persisted in `SQLite`
pub struct SqliteOAuthStateStore {
    database: Database,
    ttl: Duration,
    clock: SharedClock,
}

impl SqliteOAuthStateStore {
    /// Store over `database` issuing states that live for `ttl`
    #[must_use]
    pub fn new(database: Database, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            database,
            ttl,
            clock,
        }
    }
}

#[async_trait]
impl OAuthStateStore for SqliteOAuthStateStore {
    async fn create(
        &self,
        provider: OAuthProviderKind,
        redirect_uri: &str,
        metadata: StateMetadata,
    ) -> AuthResult<String> {
        ensure_redirect_uri(redirect_uri)?;
        let state_token = generate_state_token();
        let now = self.clock.now();
        let metadata = serde_json::to_string(&metadata).map_err(AuthError::storage)?;

        sqlx::query(
            r"
            INSERT INTO oauth_states (
                state_token, provider, redirect_uri, metadata, created_at, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&state_token)
        .bind(provider.as_str())
        .bind(redirect_uri)
        .bind(metadata)
        .bind(to_millis(now))
        .bind(to_millis(now + self.ttl))
        .execute(self.database.pool())
        .await
        .map_err(AuthError::storage)?;

        debug!(provider = %provider, "Created OAuth state");
        Ok(state_token)
    }

    async fn validate_and_consume(
        &self,
        state_token: &str,
        provider: OAuthProviderKind,
    ) -> AuthResult<Option<OAuthState>> {
        let now = to_millis(self.clock.now());
        let consumed = sqlx::query(
            r"
            DELETE FROM oauth_states
            WHERE state_token = $1 AND provider = $2 AND expires_at > $3
            RETURNING state_token, provider, redirect_uri, metadata, created_at, expires_at
            ",
        )
        .bind(state_token)
        .bind(provider.as_str())
        .bind(now)
        .fetch_optional(self.database.pool())
        .await
        .map_err(AuthError::storage)?;

        if let Some(row) = consumed {
            debug!(provider = %provider, "Consumed OAuth state");
            return row_to_state(&row).map(Some);
        }

        let pruned =
            sqlx::query("DELETE FROM oauth_states WHERE state_token = $1 AND expires_at <= $2")
                .bind(state_token)
                .bind(now)
                .execute(self.database.pool())
                .await
                .map_err(AuthError::storage)?
                .rows_affected();
        if pruned > 0 {
            debug!(provider = %provider, "Pruned expired OAuth state");
        }
        warn!(provider = %provider, "OAuth state rejected");
        Ok(None)
    }

    async fn cleanup_expired(&self) -> AuthResult<usize> {
        let removed = sqlx::query("DELETE FROM oauth_states WHERE expires_at <= $1")
            .bind(to_millis(self.clock.now()))
            .execute(self.database.pool())
            .await
            .map_err(AuthError::storage)?
            .rows_affected();
        if removed > 0 {
            debug!(removed, "Cleaned up expired OAuth states");
        }
        Ok(usize::try_from(removed).unwrap_or(usize::MAX))
    }
}

fn row_to_state(row: &SqliteRow) -> AuthResult<OAuthState> {
    let provider: String = row.try_get("provider").map_err(AuthError::storage)?;
    let metadata: String = row.try_get("metadata").map_err(AuthError::storage)?;
    Ok(OAuthState {
        state_token: row.try_get("state_token").map_err(AuthError::storage)?,
        provider: provider
            .parse()
            .map_err(|_| AuthError::Storage(format!("unknown provider '{provider}'")))?,
        redirect_uri: row.try_get("redirect_uri").map_err(AuthError::storage)?,
        metadata: serde_json::from_str(&metadata).map_err(AuthError::storage)?,
        created_at: from_millis(row.try_get("created_at").map_err(AuthError::storage)?)?,
        expires_at: from_millis(row.try_get("expires_at").map_err(AuthError::storage)?)?,
    })
}
