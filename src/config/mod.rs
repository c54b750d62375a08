// ABOUTME: Configuration management module for the authentication core
// ABOUTME: Loads token, session, OAuth state, storage and provider settings from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! Environment-only configuration:
//!
//! - **Environment**: token signing, session and state lifetimes, storage, timeouts
//! - **OAuth**: Google, Microsoft and Apple client credentials and endpoints

/// Token, session, storage and runtime configuration
pub mod environment;
/// OAuth provider credentials and endpoints
pub mod oauth;

pub use environment::{
    AuthConfig, OAuthStateConfig, SessionConfig, StorageConfig, TokenConfig, TokenKeyMaterial,
};
pub use oauth::{AppleOAuthConfig, AppleSigningKey, OAuthProviderConfig, OAuthProvidersConfig};
