// ABOUTME: Integration tests for access token issuing and verification
// ABOUTME: Covers the claim allow-list, expiry enforcement, issuer checks and RSA signing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use concierge_auth::auth::TokenCodec;
use concierge_auth::config::{TokenConfig, TokenKeyMaterial};
use concierge_auth::errors::{AppError, AuthError, ErrorCode};
use jsonwebtoken::Algorithm;
use serde_json::{json, Value};
use zeroize::Zeroizing;

const RSA_PRIVATE: &str = include_str!("fixtures/rsa_primary_private.pem");
const RSA_PUBLIC: &str = include_str!("fixtures/rsa_primary_public.pem");

fn payload_of(token: &str) -> Value {
    let payload = token.split('.').nth(1).unwrap();
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
}

#[test]
fn test_round_trip_keeps_only_allow_listed_claims() {
    let clock = common::frozen_clock();
    let codec = common::codec(&clock);
    let attributes = common::attributes(json!({
        "username": "ada",
        "role": "user",
        "permissions": ["sessions:read"],
        "email": "ada@example.com",
        "password_hash": "$argon2id$secret",
        "api_key": "sk_live_123",
    }));

    let issued = codec
        .issue("sess-1", "u1", &attributes, Duration::minutes(15))
        .unwrap();
    let claims = codec.decode(&issued.token, true).unwrap();

    assert_eq!(claims.sub, "u1");
    assert_eq!(claims.sid, "sess-1");
    assert_eq!(claims.jti, issued.token_id);
    assert_eq!(claims.iss, "concierge-auth");
    assert_eq!(claims.display.username.as_deref(), Some("ada"));
    assert_eq!(claims.display.role.as_deref(), Some("user"));
    assert_eq!(
        claims.display.permissions,
        Some(vec!["sessions:read".to_owned()])
    );
    assert_eq!(claims.issued_at(), issued.issued_at);
    assert_eq!(claims.expires_at(), issued.expires_at);

    let payload = payload_of(&issued.token);
    let mut keys: Vec<&str> = payload
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["email", "exp", "iat", "iss", "jti", "permissions", "role", "sid", "sub", "username"]
    );
}

#[test]
fn test_token_ids_are_unique() {
    let clock = common::frozen_clock();
    let codec = common::codec(&clock);
    let empty = serde_json::Map::new();
    let first = codec.issue("s", "u", &empty, Duration::minutes(1)).unwrap();
    let second = codec.issue("s", "u", &empty, Duration::minutes(1)).unwrap();
    assert_ne!(first.token_id, second.token_id);
    assert_ne!(first.token, second.token);
}

#[test]
fn test_expiry_enforced_only_when_requested() {
    let clock = common::frozen_clock();
    let codec = common::codec(&clock);
    let issued = codec
        .issue("sess-1", "u1", &serde_json::Map::new(), Duration::minutes(15))
        .unwrap();

    clock.advance(Duration::minutes(15) - Duration::seconds(1));
    assert!(codec.decode(&issued.token, true).is_ok());

    clock.advance(Duration::seconds(1));
    assert_eq!(
        codec.decode(&issued.token, true).unwrap_err(),
        AuthError::ExpiredToken
    );

    clock.advance(Duration::days(30));
    let claims = codec.decode(&issued.token, false).unwrap();
    assert_eq!(claims.sid, "sess-1");
}

#[test]
fn test_expired_and_invalid_map_to_distinct_codes() {
    assert_eq!(
        AppError::from(AuthError::ExpiredToken).code,
        ErrorCode::AuthExpired
    );
    assert_eq!(
        AppError::from(AuthError::InvalidToken("bad".into())).code,
        ErrorCode::AuthInvalid
    );
    assert_eq!(AppError::from(AuthError::ExpiredToken).http_status(), 401);
}

#[test]
fn test_foreign_issuer_is_rejected() {
    let clock = common::frozen_clock();
    let ours = common::codec(&clock);
    let mut other_config = common::token_config();
    other_config.issuer = "someone-else".to_owned();
    let theirs = TokenCodec::new(&other_config, common::shared(&clock)).unwrap();

    let issued = theirs
        .issue("s", "u", &serde_json::Map::new(), Duration::minutes(5))
        .unwrap();
    assert!(matches!(
        ours.decode(&issued.token, false),
        Err(AuthError::InvalidToken(_))
    ));
}

#[test]
fn test_rsa_signed_tokens() {
    let clock = common::frozen_clock();
    let config = TokenConfig {
        algorithm: Algorithm::RS256,
        key: TokenKeyMaterial::Rsa {
            private_pem: Zeroizing::new(RSA_PRIVATE.to_owned()),
            public_pem: RSA_PUBLIC.to_owned(),
        },
        issuer: "concierge-auth".to_owned(),
        ttl: Duration::minutes(15),
    };
    let codec = TokenCodec::new(&config, common::shared(&clock)).unwrap();
    let issued = codec
        .issue("sess-9", "u9", &serde_json::Map::new(), codec.default_ttl())
        .unwrap();
    assert_eq!(codec.decode(&issued.token, true).unwrap().sub, "u9");

    // An HMAC verifier must not accept an RSA-signed token
    let hmac = common::codec(&clock);
    assert!(matches!(
        hmac.decode(&issued.token, false),
        Err(AuthError::InvalidToken(_))
    ));
}

#[test]
fn test_invalid_configurations_are_rejected() {
    let clock = common::frozen_clock();

    let short = TokenConfig::hmac(b"too-short".to_vec());
    assert!(matches!(
        TokenCodec::new(&short, common::shared(&clock)),
        Err(AuthError::Config(_))
    ));

    let mut mismatched = common::token_config();
    mismatched.algorithm = Algorithm::RS256;
    assert!(matches!(
        TokenCodec::new(&mismatched, common::shared(&clock)),
        Err(AuthError::Config(_))
    ));

    let mut no_ttl = common::token_config();
    no_ttl.ttl = Duration::zero();
    assert!(matches!(
        TokenCodec::new(&no_ttl, common::shared(&clock)),
        Err(AuthError::Config(_))
    ));
}

#[test]
fn test_non_positive_ttl_is_rejected_at_issue() {
    let clock = common::frozen_clock();
    let codec = common::codec(&clock);
    assert!(matches!(
        codec.issue("s", "u", &serde_json::Map::new(), Duration::zero()),
        Err(AuthError::InvalidInput(_))
    ));
}
