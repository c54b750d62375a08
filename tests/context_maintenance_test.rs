// ABOUTME: Tests for building the auth context from configuration and sweeping expired records
// ABOUTME: Exercises both storage backends and the background sweeper task
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use concierge_auth::clock::ManualClock;
use concierge_auth::config::{AuthConfig, StorageConfig};
use concierge_auth::context::AuthContext;
use concierge_auth::errors::AuthError;
use concierge_auth::maintenance::{
    run_once, spawn_configured_sweeper, spawn_sweeper, MaintenanceReport,
};
use concierge_auth::models::{ClientMetadata, LoginMethod, OAuthProviderKind};

fn config(storage: StorageConfig) -> AuthConfig {
    let mut config = AuthConfig::new(common::token_config());
    config.oauth.google = common::provider_config("https://accounts.example.com", "google-client");
    config.storage = storage;
    config
}

async fn context(storage: StorageConfig) -> (Arc<ManualClock>, AuthContext) {
    common::init_test_logging();
    let clock = common::frozen_clock();
    let context = AuthContext::with_clock(
        &config(storage),
        common::directory(),
        common::shared(&clock),
    )
    .await
    .unwrap();
    (clock, context)
}

/// One stale state, one live state, one terminated session, one expired session, one live session
async fn seed(clock: &ManualClock, context: &AuthContext) {
    let orchestrator = context.orchestrator();
    orchestrator
        .start_login("google", BTreeMap::new())
        .await
        .unwrap();

    let sessions = context.sessions();
    let terminated = sessions
        .login("u1", ClientMetadata::new(LoginMethod::Password))
        .await
        .unwrap();
    sessions.logout(&terminated.access_token.token).await.unwrap();
    sessions
        .login("u2", ClientMetadata::new(LoginMethod::Password))
        .await
        .unwrap();

    clock.advance(Duration::hours(24));
    orchestrator
        .start_login("google", BTreeMap::new())
        .await
        .unwrap();
    sessions
        .login("u1", ClientMetadata::new(LoginMethod::Password))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_in_memory_context_wires_configured_providers() {
    let (_, context) = context(StorageConfig::InMemory).await;
    assert!(context.database().is_none());
    assert_eq!(
        context.orchestrator().available_providers(),
        BTreeSet::from([OAuthProviderKind::Google])
    );

    let request = context
        .orchestrator()
        .start_login("google", BTreeMap::new())
        .await
        .unwrap();
    assert!(request
        .authorization_url
        .starts_with("https://accounts.example.com/authorize?"));
    assert!(matches!(
        context
            .orchestrator()
            .start_login("apple", BTreeMap::new())
            .await,
        Err(AuthError::ProviderUnavailable(name)) if name == "apple"
    ));
}

#[tokio::test]
async fn test_invalid_token_config_fails_context() {
    let mut config = config(StorageConfig::InMemory);
    config.token.ttl = Duration::zero();
    assert!(matches!(
        AuthContext::from_config(&config, common::directory()).await,
        Err(AuthError::Config(_))
    ));
}

#[tokio::test]
async fn test_run_once_removes_only_dead_records() {
    for storage in [
        StorageConfig::InMemory,
        StorageConfig::Sqlite {
            url: "sqlite::memory:".into(),
        },
    ] {
        let (clock, context) = context(storage.clone()).await;
        seed(&clock, &context).await;

        let report = run_once(&context).await.unwrap();
        assert_eq!(
            report,
            MaintenanceReport {
                states_removed: 1,
                sessions_removed: 2,
            },
            "{storage:?}"
        );
        assert_eq!(
            run_once(&context).await.unwrap(),
            MaintenanceReport::default(),
            "{storage:?}"
        );
    }
}

#[tokio::test]
async fn test_sweeper_runs_in_background() {
    let (clock, context) = context(StorageConfig::Sqlite {
        url: "sqlite::memory:".into(),
    })
    .await;
    seed(&clock, &context).await;

    let pool = context.database().unwrap().pool().clone();
    let handle = spawn_sweeper(context.clone(), StdDuration::from_millis(20));

    let mut remaining = i64::MAX;
    for _ in 0..100 {
        remaining = sqlx::query_scalar("SELECT COUNT(*) FROM user_sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        if remaining == 1 {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
    handle.abort();
    assert_eq!(remaining, 1);
}

#[tokio::test]
async fn test_configured_sweeper_uses_maintenance_interval() {
    common::init_test_logging();
    let clock = common::frozen_clock();
    let mut config = config(StorageConfig::Sqlite {
        url: "sqlite::memory:".into(),
    });
    config.maintenance_interval = StdDuration::from_millis(20);
    let context = AuthContext::with_clock(&config, common::directory(), common::shared(&clock))
        .await
        .unwrap();
    assert_eq!(context.maintenance_interval(), StdDuration::from_millis(20));
    seed(&clock, &context).await;

    let pool = context.database().unwrap().pool().clone();
    let handle = spawn_configured_sweeper(context.clone());

    let mut remaining = i64::MAX;
    for _ in 0..100 {
        remaining = sqlx::query_scalar("SELECT COUNT(*) FROM user_sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        if remaining == 1 {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
    handle.abort();
    assert_eq!(remaining, 1);
}
