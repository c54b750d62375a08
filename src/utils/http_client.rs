// ABOUTME: HTTP client construction for outbound OAuth provider calls
// ABOUTME: Every client carries bounded request and connect timeouts

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::constants::time::{OAUTH_HTTP_CONNECT_TIMEOUT_SECS, OAUTH_HTTP_TIMEOUT_SECS};
use crate::errors::AuthError;

/// Timeouts applied to provider calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Whole-request timeout
    pub request: Duration,
    /// TCP/TLS connect timeout
    pub connect: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(OAUTH_HTTP_TIMEOUT_SECS),
            connect: Duration::from_secs(OAUTH_HTTP_CONNECT_TIMEOUT_SECS),
        }
    }
}

/// Create a new HTTP client with custom timeout settings
///
/// # Errors
///
/// Returns `AuthError::Config` if the TLS backend cannot be initialized
pub fn create_client_with_timeout(timeouts: HttpTimeouts) -> Result<Client, AuthError> {
    ClientBuilder::new()
        .timeout(timeouts.request)
        .connect_timeout(timeouts.connect)
        .user_agent(concat!("concierge-auth/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AuthError::Config(format!("failed to build HTTP client: {e}")))
}
