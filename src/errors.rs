// ABOUTME: Re-exports the unified error system from concierge-core
// ABOUTME: AppError, ErrorCode and the AuthError taxonomy used throughout the crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! The error types live in `concierge-core` so every crate in the workspace
//! shares one taxonomy; this module re-exports them under the usual path.

pub use concierge_core::errors::{
    AppError, AppResult, AuthError, ErrorCode, ErrorContext, ErrorResponse, ErrorResponseDetails,
    ProviderFailure,
};

/// Result alias for authentication core operations
pub type AuthResult<T> = Result<T, AuthError>;
