// ABOUTME: Core data models shared across the authentication core
// ABOUTME: OAuth provider identities, normalized profiles, and user session records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// OAuth provider kinds and normalized profiles
pub mod oauth;
/// User session records and client metadata
pub mod session;

pub use oauth::{OAuthProviderKind, OAuthProviderProfile};
pub use session::{ClientMetadata, LoginMethod, SessionStatus, UserSession};
