// ABOUTME: Cryptography module for random identifiers and secret fingerprints
// ABOUTME: Centralizes token generation so every identifier draws from the OS CSPRNG
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Cryptographic utilities for the authentication core

pub mod tokens;

pub use tokens::{
    generate_session_id, generate_state_token, generate_token_id, secret_fingerprint,
};
