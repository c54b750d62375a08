// ABOUTME: Library entry point for the Concierge authentication core
// ABOUTME: OAuth login for Google, Microsoft and Apple plus session-backed access tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// deny(unsafe_code): zero-tolerance unsafe policy
#![deny(unsafe_code)]

//! # Concierge Auth
//!
//! Authentication core for the Concierge assistant: third-party login through
//! Google, Microsoft and Apple, server-side sessions, and short-lived signed
//! access tokens that are only honored while their session is active.
//!
//! ## Architecture
//!
//! - **OAuth**: single-use state tokens, provider adapters and the orchestrator
//!   exposing start-login and complete-login
//! - **Sessions**: session records with sliding expiry and audit IP history
//! - **Auth**: token codec, session service and access guards
//! - **Database**: `SQLite` backends for states and sessions
//! - **Context**: builds every component once from configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use concierge_auth::auth::StaticIdentityDirectory;
//! use concierge_auth::config::AuthConfig;
//! use concierge_auth::context::AuthContext;
//! use concierge_auth::errors::AuthResult;
//! use concierge_auth::models::ClientMetadata;
//!
//! #[tokio::main]
//! async fn main() -> AuthResult<()> {
//!     let config = AuthConfig::from_env()?;
//!     let directory = Arc::new(StaticIdentityDirectory::new());
//!     let context = AuthContext::from_config(&config, directory).await?;
//!
//!     let login = context
//!         .orchestrator()
//!         .start_login("google", Default::default())
//!         .await?;
//!     println!("Redirect to {}", login.authorization_url);
//!
//!     let outcome = context
//!         .sessions()
//!         .login("user-1", ClientMetadata::default())
//!         .await?;
//!     println!("Session {} opened", outcome.session.id);
//!     Ok(())
//! }
//! ```

/// Login, token and access-guard logic
pub mod auth;

/// Time source abstraction
pub mod clock;

/// Configuration loaded from the environment
pub mod config;

/// Application constants
pub mod constants;

/// Dependency injection root
pub mod context;

/// Random tokens and fingerprints
pub mod crypto;

/// `SQLite` persistence
pub mod database;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Background sweeping of expired records
pub mod maintenance;

/// Shared data model
pub mod models;

/// OAuth login across providers
pub mod oauth;

/// Session storage
pub mod sessions;

/// HTTP client and locking helpers
pub mod utils;
