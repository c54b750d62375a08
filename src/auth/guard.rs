// ABOUTME: Typed access guards deciding whether an authenticated identity may act on a resource
// ABOUTME: Ownership and permission checks return explicit decisions convertible to 403 errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Access Guards
//!
//! Handlers receive the [`AuthenticatedIdentity`] and the owner of the resource they
//! are about to touch as ordinary parameters and ask for a decision:
//!
//! ```rust,no_run
//! use concierge_auth::auth::{authorize_owner, AuthenticatedIdentity, ResourceOwnerId};
//! use concierge_auth::errors::AppResult;
//!
//! fn delete_device(identity: &AuthenticatedIdentity, owner: &str) -> AppResult<()> {
//!     authorize_owner(identity, &ResourceOwnerId::new(owner)).into_result()?;
//!     Ok(())
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::service::AuthenticatedIdentity;
use crate::errors::{AppError, AppResult};

/// User id owning the resource being accessed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceOwnerId(String);

impl ResourceOwnerId {
    /// Wrap an owner id
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self(owner.into())
    }

    /// Owner id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceOwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Proceed
    Allow,
    /// Refuse, with a reason safe to show the caller
    Deny(String),
}

impl AccessDecision {
    /// Whether access is granted
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// `Ok(())` when allowed, a `PermissionDenied` error otherwise
    ///
    /// # Errors
    ///
    /// Returns `AppError` with `ErrorCode::PermissionDenied` (403) on deny
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(AppError::permission_denied(reason)),
        }
    }
}

/// Allow when `identity` owns the resource or is an admin
#[must_use]
pub fn authorize_owner(
    identity: &AuthenticatedIdentity,
    owner: &ResourceOwnerId,
) -> AccessDecision {
    if identity.user_id == owner.as_str() || identity.is_admin() {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny("resource belongs to another user".into())
    }
}

/// Allow when `identity` carries `permission` or is an admin
#[must_use]
pub fn require_permission(identity: &AuthenticatedIdentity, permission: &str) -> AccessDecision {
    if identity.has_permission(permission) || identity.is_admin() {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny(format!("missing permission '{permission}'"))
    }
}
