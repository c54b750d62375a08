// ABOUTME: Authentication module tying sessions, signed access tokens and identity lookups together
// ABOUTME: Exposes the session service, the token codec and typed access guards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication
//!
//! A login opens a long-lived server-side session and hands out a short-lived
//! access token naming it. Every authenticated request verifies the token and
//! then the session, so terminating a session revokes all of its tokens even
//! before they expire.

/// Explicit allow/deny decisions over authenticated identities
pub mod guard;
/// Lookup of the attributes embedded into access tokens
pub mod identity;
/// Login, authenticate, refresh and logout
pub mod service;
/// Access token signing and verification
pub mod token;

pub use guard::{authorize_owner, require_permission, AccessDecision, ResourceOwnerId};
pub use identity::{IdentityDirectory, StaticIdentityDirectory};
pub use service::{AuthSessionService, AuthenticatedIdentity, LoginOutcome};
pub use token::{AccessTokenClaims, DisplayClaims, IssuedToken, TokenCodec};
