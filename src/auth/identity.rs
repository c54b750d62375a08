// ABOUTME: Seam to the external user store supplying display attributes for access tokens
// ABOUTME: Includes a map-backed directory for embedding and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::errors::AuthResult;

/// Read-only view of the user store
///
/// Returned attributes are filtered through the token allow-list, so a directory may
/// return its whole user record.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Attributes of `user_id`, or `None` when the user does not exist
    async fn identity_attributes(&self, user_id: &str) -> AuthResult<Option<Map<String, Value>>>;
}

/// Directory held in memory
#[derive(Debug, Default)]
pub struct StaticIdentityDirectory {
    users: DashMap<String, Map<String, Value>>,
}

impl StaticIdentityDirectory {
    /// Empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user
    pub fn upsert(&self, user_id: impl Into<String>, attributes: Map<String, Value>) {
        self.users.insert(user_id.into(), attributes);
    }

    /// Remove a user; returns whether it existed
    pub fn remove(&self, user_id: &str) -> bool {
        self.users.remove(user_id).is_some()
    }
}

#[async_trait]
impl IdentityDirectory for StaticIdentityDirectory {
    async fn identity_attributes(&self, user_id: &str) -> AuthResult<Option<Map<String, Value>>> {
        Ok(self.users.get(user_id).map(|entry| entry.clone()))
    }
}
