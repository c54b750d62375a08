// ABOUTME: Integration tests for the in-memory OAuth state store
// ABOUTME: Covers single use, provider isolation, expiry, cleanup and concurrent consumption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use concierge_auth::errors::AuthError;
use concierge_auth::models::OAuthProviderKind;
use concierge_auth::oauth::{InMemoryOAuthStateStore, OAuthStateStore};

const REDIRECT: &str = "https://app.example.com/api/oauth/google/callback";

fn store() -> (Arc<concierge_auth::clock::ManualClock>, InMemoryOAuthStateStore) {
    common::init_test_logging();
    let clock = common::frozen_clock();
    let store = InMemoryOAuthStateStore::new(Duration::minutes(10), common::shared(&clock));
    (clock, store)
}

#[tokio::test]
async fn test_state_token_is_url_safe_and_long() {
    let (_, store) = store();
    let token = store
        .create(OAuthProviderKind::Google, REDIRECT, BTreeMap::new())
        .await
        .unwrap();

    assert!(token.len() >= 32);
    assert!(token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[tokio::test]
async fn test_state_is_single_use() {
    let (_, store) = store();
    let mut metadata = BTreeMap::new();
    metadata.insert("client_ip".to_owned(), "203.0.113.7".to_owned());
    let token = store
        .create(OAuthProviderKind::Google, REDIRECT, metadata.clone())
        .await
        .unwrap();

    let state = store
        .validate_and_consume(&token, OAuthProviderKind::Google)
        .await
        .unwrap()
        .expect("first consumption succeeds");
    assert_eq!(state.provider, OAuthProviderKind::Google);
    assert_eq!(state.redirect_uri, REDIRECT);
    assert_eq!(state.metadata, metadata);

    for provider in OAuthProviderKind::ALL {
        assert!(store
            .validate_and_consume(&token, provider)
            .await
            .unwrap()
            .is_none());
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_wrong_provider_does_not_consume() {
    let (_, store) = store();
    let token = store
        .create(OAuthProviderKind::Microsoft, REDIRECT, BTreeMap::new())
        .await
        .unwrap();

    assert!(store
        .validate_and_consume(&token, OAuthProviderKind::Google)
        .await
        .unwrap()
        .is_none());
    assert_eq!(store.len(), 1);

    assert!(store
        .validate_and_consume(&token, OAuthProviderKind::Microsoft)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_state_expires_after_ttl() {
    let (clock, store) = store();
    let expiring = store
        .create(OAuthProviderKind::Apple, REDIRECT, BTreeMap::new())
        .await
        .unwrap();
    let swept = store
        .create(OAuthProviderKind::Apple, REDIRECT, BTreeMap::new())
        .await
        .unwrap();

    clock.advance(Duration::minutes(10) + Duration::seconds(1));

    assert!(store
        .validate_and_consume(&expiring, OAuthProviderKind::Apple)
        .await
        .unwrap()
        .is_none());
    // The failed lookup pruned its own entry
    assert_eq!(store.len(), 1);

    assert_eq!(store.cleanup_expired().await.unwrap(), 1);
    assert_eq!(store.cleanup_expired().await.unwrap(), 0);
    assert!(store
        .validate_and_consume(&swept, OAuthProviderKind::Apple)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_state_valid_until_exact_deadline() {
    let (clock, store) = store();
    let token = store
        .create(OAuthProviderKind::Google, REDIRECT, BTreeMap::new())
        .await
        .unwrap();

    clock.advance(Duration::minutes(10) - Duration::milliseconds(1));
    assert!(store
        .validate_and_consume(&token, OAuthProviderKind::Google)
        .await
        .unwrap()
        .is_some());

    let late = store
        .create(OAuthProviderKind::Google, REDIRECT, BTreeMap::new())
        .await
        .unwrap();
    clock.advance(Duration::minutes(10));
    assert!(store
        .validate_and_consume(&late, OAuthProviderKind::Google)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_cleanup_keeps_live_states() {
    let (clock, store) = store();
    store
        .create(OAuthProviderKind::Google, REDIRECT, BTreeMap::new())
        .await
        .unwrap();
    clock.advance(Duration::minutes(5));
    store
        .create(OAuthProviderKind::Google, REDIRECT, BTreeMap::new())
        .await
        .unwrap();
    clock.advance(Duration::minutes(6));

    assert_eq!(store.cleanup_expired().await.unwrap(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_unknown_token_is_rejected() {
    let (_, store) = store();
    assert!(store
        .validate_and_consume("never-issued", OAuthProviderKind::Google)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_empty_redirect_uri_is_rejected() {
    let (_, store) = store();
    let error = store
        .create(OAuthProviderKind::Google, "  ", BTreeMap::new())
        .await
        .unwrap_err();
    assert!(matches!(error, AuthError::InvalidInput(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_consumption_has_one_winner() {
    let (_, store) = store();
    let store = Arc::new(store);
    let token = store
        .create(OAuthProviderKind::Google, REDIRECT, BTreeMap::new())
        .await
        .unwrap();

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let store = store.clone();
            let token = token.clone();
            tokio::spawn(async move {
                store
                    .validate_and_consume(&token, OAuthProviderKind::Google)
                    .await
                    .unwrap()
                    .is_some()
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}
