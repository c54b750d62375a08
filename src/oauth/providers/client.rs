// ABOUTME: Shared OAuth 2.0 client plumbing used by every provider adapter
// ABOUTME: Builds authorization URLs, posts code exchanges and reads JSON with uniform error mapping
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::OAuthProviderConfig;
use crate::errors::{AuthError, AuthResult, ProviderFailure};
use crate::models::OAuthProviderKind;
use crate::oauth::ProviderTokens;

/// Which step of the flow a provider call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Exchange,
    Profile,
}

impl Phase {
    const fn error(self, provider: OAuthProviderKind, failure: ProviderFailure) -> AuthError {
        match self {
            Self::Exchange => AuthError::exchange(provider, failure),
            Self::Profile => AuthError::profile(provider, failure),
        }
    }
}

/// Configuration-bound OAuth 2.0 client for a single provider
#[derive(Debug, Clone)]
pub(crate) struct OAuthClient {
    provider: OAuthProviderKind,
    client_id: String,
    redirect_uri: String,
    scopes: Vec<String>,
    authorization_endpoint: Url,
    token_endpoint: String,
    user_info_endpoint: String,
    http: Client,
}

impl OAuthClient {
    pub(crate) fn new(
        provider: OAuthProviderKind,
        config: &OAuthProviderConfig,
        http: Client,
    ) -> AuthResult<Self> {
        let client_id = config
            .client_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AuthError::Config(format!("{provider} client_id is not set")))?;
        let authorization_endpoint = Url::parse(&config.authorization_endpoint).map_err(|e| {
            AuthError::Config(format!("{provider} authorization endpoint is invalid: {e}"))
        })?;
        if config.redirect_uri.trim().is_empty() {
            return Err(AuthError::Config(format!(
                "{provider} redirect_uri is not set"
            )));
        }

        Ok(Self {
            provider,
            client_id,
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            authorization_endpoint,
            token_endpoint: config.token_endpoint.clone(),
            user_info_endpoint: config.user_info_endpoint.clone(),
            http,
        })
    }

    pub(crate) fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub(crate) fn user_info_endpoint(&self) -> &str {
        &self.user_info_endpoint
    }

    pub(crate) const fn http(&self) -> &Client {
        &self.http
    }

    /// `authorization_endpoint?client_id&redirect_uri&response_type=code&scope&state&<extras>`
    pub(crate) fn authorization_url(&self, state: &str, extras: &[(&str, &str)]) -> String {
        let mut url = self.authorization_endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &self.scopes.join(" "))
                .append_pair("state", state);
            for (key, value) in extras {
                query.append_pair(key, value);
            }
        }
        url.into()
    }

    /// Form POST of the authorization code to the token endpoint
    pub(crate) async fn exchange_code(
        &self,
        code: &str,
        client_secret: &str,
    ) -> AuthResult<ProviderTokens> {
        if code.trim().is_empty() {
            return Err(AuthError::InvalidInput("authorization code is required".into()));
        }
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", client_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_endpoint)
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| Phase::Exchange.error(self.provider, transport_failure(&e)))?;

        let tokens: ProviderTokens = self.read_json(response, Phase::Exchange).await?;
        debug!(
            provider = %self.provider,
            has_refresh_token = tokens.refresh_token.is_some(),
            has_id_token = tokens.id_token.is_some(),
            "Exchanged authorization code"
        );
        Ok(tokens)
    }

    /// GET `url` with a bearer token and decode the JSON body
    pub(crate) async fn get_with_bearer<T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> AuthResult<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Phase::Profile.error(self.provider, transport_failure(&e)))?;
        self.read_json(response, Phase::Profile).await
    }

    /// GET a public JSON document (signing keys)
    pub(crate) async fn get_public<T: DeserializeOwned>(&self, url: &str) -> AuthResult<T> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Phase::Profile.error(self.provider, transport_failure(&e)))?;
        self.read_json(response, Phase::Profile).await
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: Response,
        phase: Phase,
    ) -> AuthResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| phase.error(self.provider, transport_failure(&e)))?;

        if !status.is_success() {
            warn!(
                provider = %self.provider,
                status = status.as_u16(),
                phase = ?phase,
                "OAuth provider returned an error"
            );
            return Err(phase.error(
                self.provider,
                ProviderFailure::Rejected {
                    status: status.as_u16(),
                    body,
                },
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| phase.error(self.provider, ProviderFailure::Malformed(e.to_string())))
    }
}

fn transport_failure(error: &reqwest::Error) -> ProviderFailure {
    let reason = if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    };
    ProviderFailure::Transport(reason)
}
