// ABOUTME: Random URL-safe identifiers for state tokens, sessions and access-token ids
// ABOUTME: Also derives short SHA-256 fingerprints so secrets can be logged without exposure
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::constants::limits::RANDOM_TOKEN_BYTES;

fn random_url_safe(bytes: usize) -> String {
    let mut buffer = vec![0_u8; bytes];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}

/// CSRF state token for an OAuth authorization attempt (43 URL-safe characters)
#[must_use]
pub fn generate_state_token() -> String {
    random_url_safe(RANDOM_TOKEN_BYTES)
}

/// Session identifier
#[must_use]
pub fn generate_session_id() -> String {
    random_url_safe(RANDOM_TOKEN_BYTES)
}

/// Access token id (`jti`)
#[must_use]
pub fn generate_token_id() -> String {
    random_url_safe(RANDOM_TOKEN_BYTES / 2)
}

/// First 8 hex characters of the SHA-256 of `secret`, safe to log
#[must_use]
pub fn secret_fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    hex::encode(&digest[..4])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_state_tokens_are_url_safe_and_unique() {
        let tokens: HashSet<String> = (0..64).map(|_| generate_state_token()).collect();
        assert_eq!(tokens.len(), 64);
        for token in &tokens {
            assert_eq!(token.len(), 43);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let fingerprint = secret_fingerprint("super-secret");
        assert_eq!(fingerprint.len(), 8);
        assert_eq!(fingerprint, secret_fingerprint("super-secret"));
        assert_ne!(fingerprint, secret_fingerprint("other-secret"));
    }
}
