// ABOUTME: Core types and constants for the Concierge authentication core
// ABOUTME: Foundation crate with error handling, OAuth and session models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Concierge Core
//!
//! Foundation crate providing shared types and constants for the Concierge
//! authentication core. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and the `AuthError` taxonomy
//! - **constants**: Application-wide constants organized by domain
//! - **models**: OAuth provider identities and user session records

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and configuration values organized by domain
pub mod constants;

/// Core data models (OAuth providers and profiles, user sessions)
pub mod models;
