// ABOUTME: Data models re-exported from concierge-core
// ABOUTME: OAuth provider kinds, normalized profiles and user sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use concierge_core::models::*;
