// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging, a frozen clock, token configs, directories and provider configs
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `concierge_auth`

use std::sync::{Arc, Once};

use chrono::{TimeZone, Utc};
use concierge_auth::auth::{AuthSessionService, StaticIdentityDirectory, TokenCodec};
use concierge_auth::clock::{ManualClock, SharedClock};
use concierge_auth::config::{OAuthProviderConfig, SessionConfig, TokenConfig};
use concierge_auth::sessions::InMemorySessionStore;
use serde_json::{json, Map, Value};

static INIT_LOGGER: Once = Once::new();

/// 32+ byte HMAC secret used across tests
pub const TEST_SECRET: &str = "concierge-test-signing-secret-0123456789";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Clock frozen at 2025-03-01T12:00:00Z
pub fn frozen_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    ))
}

/// Upcast a manual clock for components
pub fn shared(clock: &Arc<ManualClock>) -> SharedClock {
    clock.clone()
}

pub fn token_config() -> TokenConfig {
    TokenConfig::hmac(TEST_SECRET.as_bytes().to_vec())
}

pub fn codec(clock: &Arc<ManualClock>) -> TokenCodec {
    TokenCodec::new(&token_config(), shared(clock)).unwrap()
}

pub fn attributes(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Directory knowing `u1` (regular user), `u2` (regular user) and `root` (admin)
pub fn directory() -> Arc<StaticIdentityDirectory> {
    let directory = StaticIdentityDirectory::new();
    directory.upsert(
        "u1",
        attributes(json!({
            "username": "ada",
            "display_name": "Ada Lovelace",
            "role": "user",
            "permissions": ["sessions:read"],
            "status": "active",
            "email": "ada@example.com",
            "password_hash": "$argon2id$not-for-tokens",
        })),
    );
    directory.upsert(
        "u2",
        attributes(json!({ "username": "grace", "role": "user" })),
    );
    directory.upsert(
        "root",
        attributes(json!({ "username": "root", "role": "admin" })),
    );
    Arc::new(directory)
}

pub struct ServiceFixture {
    pub clock: Arc<ManualClock>,
    pub directory: Arc<StaticIdentityDirectory>,
    pub store: Arc<InMemorySessionStore>,
    pub service: AuthSessionService,
}

/// In-memory session service over a frozen clock
pub fn service_fixture() -> ServiceFixture {
    service_fixture_with(SessionConfig::default())
}

pub fn service_fixture_with(config: SessionConfig) -> ServiceFixture {
    init_test_logging();
    let clock = frozen_clock();
    let directory = directory();
    let store = Arc::new(InMemorySessionStore::new(config, shared(&clock)));
    let service = AuthSessionService::new(
        store.clone(),
        codec(&clock),
        directory.clone(),
        &config,
        shared(&clock),
    );
    ServiceFixture {
        clock,
        directory,
        store,
        service,
    }
}

/// Provider configuration pointing every endpoint at `base_url`
pub fn provider_config(base_url: &str, client_id: &str) -> OAuthProviderConfig {
    OAuthProviderConfig {
        client_id: Some(client_id.to_owned()),
        client_secret: Some("test-client-secret".to_owned()),
        redirect_uri: "https://app.example.com/api/oauth/callback".to_owned(),
        scopes: vec!["openid".to_owned(), "email".to_owned()],
        authorization_endpoint: format!("{base_url}/authorize"),
        token_endpoint: format!("{base_url}/token"),
        user_info_endpoint: format!("{base_url}/userinfo"),
    }
}
