// ABOUTME: Dependency injection root building every auth component once from configuration
// ABOUTME: Handlers receive the context by reference instead of reaching for globals
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::auth::{AuthSessionService, IdentityDirectory, TokenCodec};
use crate::clock::{system_clock, SharedClock};
use crate::config::{AuthConfig, StorageConfig};
use crate::database::{Database, SqliteOAuthStateStore, SqliteSessionStore};
use crate::errors::AuthResult;
use crate::oauth::{InMemoryOAuthStateStore, OAuthOrchestrator, OAuthStateStore};
use crate::sessions::{InMemorySessionStore, SessionStore};
use crate::utils::http_client::create_client_with_timeout;

/// Shared authentication components
///
/// # Dependencies
/// - `orchestrator`: OAuth login across configured providers
/// - `sessions`: session and access token lifecycle
/// - `database`: present when `DATABASE_URL` selects `SQLite`
#[derive(Clone)]
pub struct AuthContext {
    orchestrator: Arc<OAuthOrchestrator>,
    sessions: Arc<AuthSessionService>,
    database: Option<Database>,
    clock: SharedClock,
    maintenance_interval: Duration,
}

impl AuthContext {
    /// Build all components using wall-clock time
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` for invalid token or HTTP settings and
    /// `AuthError::Storage` when the database cannot be opened
    pub async fn from_config(
        config: &AuthConfig,
        directory: Arc<dyn IdentityDirectory>,
    ) -> AuthResult<Self> {
        Self::with_clock(config, directory, system_clock()).await
    }

    /// Build all components reading time from `clock`
    ///
    /// # Errors
    ///
    /// See [`AuthContext::from_config`]
    pub async fn with_clock(
        config: &AuthConfig,
        directory: Arc<dyn IdentityDirectory>,
        clock: SharedClock,
    ) -> AuthResult<Self> {
        let codec = TokenCodec::new(&config.token, clock.clone())?;
        let http = create_client_with_timeout(config.http_timeouts)?;
        let state_ttl = config.oauth_state.ttl;

        let (database, state_store, session_store): (
            Option<Database>,
            Arc<dyn OAuthStateStore>,
            Arc<dyn SessionStore>,
        ) = match &config.storage {
            StorageConfig::InMemory => (
                None,
                Arc::new(InMemoryOAuthStateStore::new(state_ttl, clock.clone())),
                Arc::new(InMemorySessionStore::new(config.session, clock.clone())),
            ),
            StorageConfig::Sqlite { url } => {
                let database = Database::connect(url).await?;
                (
                    Some(database.clone()),
                    Arc::new(SqliteOAuthStateStore::new(
                        database.clone(),
                        state_ttl,
                        clock.clone(),
                    )),
                    Arc::new(SqliteSessionStore::new(
                        database,
                        config.session,
                        clock.clone(),
                    )),
                )
            }
        };

        let orchestrator =
            OAuthOrchestrator::from_config(&config.oauth, state_store, &http, &clock);
        let sessions = AuthSessionService::new(
            session_store,
            codec,
            directory,
            &config.session,
            clock.clone(),
        );

        info!(
            providers = ?orchestrator.available_providers(),
            persistent = database.is_some(),
            "Auth context initialized"
        );
        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            sessions: Arc::new(sessions),
            database,
            clock,
            maintenance_interval: config.maintenance_interval,
        })
    }

    /// OAuth login entry points
    #[must_use]
    pub const fn orchestrator(&self) -> &Arc<OAuthOrchestrator> {
        &self.orchestrator
    }

    /// Session and token lifecycle
    #[must_use]
    pub const fn sessions(&self) -> &Arc<AuthSessionService> {
        &self.sessions
    }

    /// Database, when persistent storage is configured
    #[must_use]
    pub const fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// Time source shared by every component
    #[must_use]
    pub const fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Period used by `maintenance::spawn_configured_sweeper`
    #[must_use]
    pub const fn maintenance_interval(&self) -> Duration {
        self.maintenance_interval
    }
}
