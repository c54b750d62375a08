// ABOUTME: System-wide constants re-exported from concierge-core
// ABOUTME: Lifetimes, limits, claim names and provider endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use concierge_core::constants::*;
