// ABOUTME: OAuth provider endpoints, default scopes and fixed authorization parameters
// ABOUTME: Google, Microsoft identity platform and Sign in with Apple defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Callback path template; `{provider}` is replaced with the provider name
pub const CALLBACK_PATH_TEMPLATE: &str = "/api/oauth/{provider}/callback";

/// Default public base URL used to derive redirect URIs
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

// Google

/// Google authorization endpoint
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Google token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Google OpenID Connect user-info endpoint
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
/// Google default scopes
pub const GOOGLE_DEFAULT_SCOPES: &str = "openid email profile";
/// Request a refresh token and always show the consent screen
pub const GOOGLE_AUTHORIZATION_EXTRAS: &[(&str, &str)] = &[
    ("access_type", "offline"),
    ("prompt", "consent"),
    ("include_granted_scopes", "true"),
];

// Microsoft

/// Microsoft identity platform authority
pub const MICROSOFT_AUTHORITY: &str = "https://login.microsoftonline.com";
/// Tenant used when none is configured (personal and work accounts)
pub const MICROSOFT_DEFAULT_TENANT: &str = "common";
/// Authorization path below `{authority}/{tenant}`
pub const MICROSOFT_AUTHORIZE_PATH: &str = "oauth2/v2.0/authorize";
/// Token path below `{authority}/{tenant}`
pub const MICROSOFT_TOKEN_PATH: &str = "oauth2/v2.0/token";
/// Microsoft Graph profile endpoint
pub const MICROSOFT_USERINFO_URL: &str = "https://graph.microsoft.com/v1.0/me";
/// Microsoft default scopes
pub const MICROSOFT_DEFAULT_SCOPES: &str = "openid email profile offline_access User.Read";
/// Return the code in the query string
pub const MICROSOFT_AUTHORIZATION_EXTRAS: &[(&str, &str)] = &[("response_mode", "query")];

// Apple

/// Sign in with Apple authorization endpoint
pub const APPLE_AUTH_URL: &str = "https://appleid.apple.com/auth/authorize";
/// Sign in with Apple token endpoint
pub const APPLE_TOKEN_URL: &str = "https://appleid.apple.com/auth/token";
/// Apple's published identity-token signing keys
pub const APPLE_JWKS_URL: &str = "https://appleid.apple.com/auth/keys";
/// Issuer of Apple identity tokens and audience of Apple client secrets
pub const APPLE_ISSUER: &str = "https://appleid.apple.com";
/// Apple default scopes
pub const APPLE_DEFAULT_SCOPES: &str = "name email";
/// Apple requires `form_post` whenever name or email scopes are requested
pub const APPLE_AUTHORIZATION_EXTRAS: &[(&str, &str)] = &[("response_mode", "form_post")];
