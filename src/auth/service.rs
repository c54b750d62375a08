// ABOUTME: Session service pairing server-side sessions with short-lived signed access tokens
// ABOUTME: Every authenticated request verifies the token and then the session it names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::identity::IdentityDirectory;
use super::token::{AccessTokenClaims, DisplayClaims, IssuedToken, TokenCodec};
use crate::clock::SharedClock;
use crate::config::SessionConfig;
use crate::constants::roles;
use crate::errors::{AuthError, AuthResult};
use crate::models::{ClientMetadata, UserSession};
use crate::sessions::SessionStore;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Newly opened session
    pub session: UserSession,
    /// Access token bound to the session
    pub access_token: IssuedToken,
}

/// Who is asking, as established by a verified token and an active session
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedIdentity {
    /// Token subject
    pub user_id: String,
    /// Session the token is bound to
    pub session_id: String,
    /// Token `jti`
    pub token_id: String,
    /// When the presented token stops being accepted
    pub token_expires_at: DateTime<Utc>,
    /// Display claims carried by the token
    pub claims: DisplayClaims,
    /// Session as it was when the request was authenticated
    pub session: UserSession,
}

impl AuthenticatedIdentity {
    /// Role claim, if any
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.claims.role.as_deref()
    }

    /// Whether the role claim is `admin`
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Some(roles::ADMIN)
    }

    /// Whether `permission` is in the permission claim
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.claims
            .permissions
            .as_ref()
            .is_some_and(|granted| granted.iter().any(|p| p == permission))
    }
}

/// Login, authenticate, refresh and logout over a session store and token codec
pub struct AuthSessionService {
    sessions: Arc<dyn SessionStore>,
    codec: TokenCodec,
    directory: Arc<dyn IdentityDirectory>,
    refresh_extension: Option<Duration>,
    clock: SharedClock,
}

impl AuthSessionService {
    /// Compose the service
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        codec: TokenCodec,
        directory: Arc<dyn IdentityDirectory>,
        config: &SessionConfig,
        clock: SharedClock,
    ) -> Self {
        Self {
            sessions,
            codec,
            directory,
            refresh_extension: config.refresh_extension,
            clock,
        }
    }

    /// Token codec in use
    #[must_use]
    pub const fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Open a session for `user_id` and issue an access token for it
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` when the directory does not know the user,
    /// or a storage error from the session store
    pub async fn login(&self, user_id: &str, metadata: ClientMetadata) -> AuthResult<LoginOutcome> {
        let attributes = self
            .directory
            .identity_attributes(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let session = self.sessions.create(user_id, metadata).await?;
        let access_token =
            self.codec
                .issue(&session.id, user_id, &attributes, self.codec.default_ttl())?;

        info!(
            user_id = %user_id,
            login_method = ?session.login_method,
            "User logged in"
        );
        Ok(LoginOutcome {
            session,
            access_token,
        })
    }

    /// Verify `token` and the session it names, recording the access
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` for any token or session failure without saying
    /// which check failed; storage errors are passed through
    pub async fn authenticate(
        &self,
        token: &str,
        client_ip: Option<&str>,
    ) -> AuthResult<AuthenticatedIdentity> {
        let claims = self.decode(token, true)?;
        let Some(mut session) = self
            .sessions
            .get_for_user_and_id(&claims.sid, &claims.sub)
            .await?
        else {
            debug!(user_id = %claims.sub, "Token names an unknown session");
            return Err(AuthError::Unauthorized);
        };

        let now = self.clock.now();
        if !session.is_active_at(now) {
            debug!(
                user_id = %claims.sub,
                status = ?session.effective_status_at(now),
                "Session not active"
            );
            return Err(AuthError::Unauthorized);
        }

        self.sessions.record_access(&session.id, client_ip).await?;
        session.last_accessed_at = now;

        Ok(AuthenticatedIdentity {
            token_expires_at: claims.expires_at(),
            user_id: claims.sub,
            session_id: claims.sid,
            token_id: claims.jti,
            claims: claims.display,
            session,
        })
    }

    /// Exchange a valid token for a fresh one, sliding the session deadline when enabled
    ///
    /// Display claims are re-read from the directory, so role and permission changes
    /// take effect here.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` when the token or session is not valid, or the
    /// user has left the directory
    pub async fn refresh(&self, token: &str) -> AuthResult<IssuedToken> {
        let identity = self.authenticate(token, None).await?;

        if let Some(extension) = self.refresh_extension {
            self.sessions
                .refresh(&identity.session_id, extension)
                .await?
                .ok_or(AuthError::Unauthorized)?;
        }

        let attributes = self
            .directory
            .identity_attributes(&identity.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let issued = self.codec.issue(
            &identity.session_id,
            &identity.user_id,
            &attributes,
            self.codec.default_ttl(),
        )?;
        debug!(user_id = %identity.user_id, "Refreshed access token");
        Ok(issued)
    }

    /// Terminate the session named by `token`
    ///
    /// An expired token is accepted here; its signature is still verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` for invalid tokens and unknown or foreign sessions
    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        let claims = self.decode(token, false)?;
        if self
            .sessions
            .get_for_user_and_id(&claims.sid, &claims.sub)
            .await?
            .is_none()
        {
            return Err(AuthError::Unauthorized);
        }

        self.sessions.terminate(&claims.sid).await?;
        info!(user_id = %claims.sub, "User logged out");
        Ok(())
    }

    /// Terminate every session of the token's user; returns how many were active
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` when the token or its session is not valid
    pub async fn logout_everywhere(&self, token: &str) -> AuthResult<usize> {
        let identity = self.authenticate(token, None).await?;
        self.sessions.terminate_all_for_user(&identity.user_id).await
    }

    /// Active sessions of the authenticated user, newest first
    ///
    /// # Errors
    ///
    /// Returns a storage error from the session store
    pub async fn list_sessions(
        &self,
        identity: &AuthenticatedIdentity,
    ) -> AuthResult<Vec<UserSession>> {
        self.sessions.list_for_user(&identity.user_id, true).await
    }

    /// Physically remove expired and terminated sessions
    ///
    /// # Errors
    ///
    /// Returns a storage error from the session store
    pub async fn sweep_expired_sessions(&self) -> AuthResult<usize> {
        self.sessions.sweep_expired().await
    }

    fn decode(&self, token: &str, verify_expiry: bool) -> AuthResult<AccessTokenClaims> {
        let claims = self.codec.decode(token, verify_expiry).map_err(|e| {
            debug!(error = %e, "Access token not accepted");
            AuthError::Unauthorized
        })?;
        if claims.sid.is_empty() || claims.sub.is_empty() {
            return Err(AuthError::Unauthorized);
        }
        Ok(claims)
    }
}
