// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Google OAuth2 client.
//!
//! Implements the authorization-code flow against Google's documented
//! endpoints: build the consent URL, exchange the returned code for an
//! access token, fetch the OpenID userinfo document.

use serde::Deserialize;
use thiserror::Error;

/// Google consent screen.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Code-for-token exchange endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// OpenID userinfo endpoint (v3).
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Errors from the provider flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The provider redirected back with an error payload.
    #[error("provider returned an error: {0}")]
    Provider(String),
    /// The user cancelled the sign-in at the consent screen.
    #[error("sign-in was cancelled")]
    Cancelled,
    /// HTTP failure talking to the provider.
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider response is missing a required field.
    #[error("provider response missing {0}")]
    MissingField(&'static str),
    /// The callback carried an unknown or expired state token.
    #[error("login state is unknown or expired")]
    UnknownState,
}

/// Attributes Google reports for the signed-in user.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    /// Provider-assigned subject id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    /// Display name ("First Last")
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Client credentials plus endpoints for one Google application.
#[derive(Debug, Clone)]
pub struct GoogleOAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    userinfo_url: String,
    http: reqwest::Client,
}

impl GoogleOAuth {
    /// Create a client against Google's production endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Point the token/userinfo calls at a different base (tests).
    #[cfg(test)]
    pub fn with_endpoints(mut self, token_url: impl Into<String>, userinfo_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    /// Build the consent-screen URL carrying our one-shot state token.
    pub fn authorize_url(&self, state: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state)
            .finish();
        format!("{GOOGLE_AUTH_URL}?{query}")
    }

    /// Exchange the authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?
            .error_for_status()?;

        let body: TokenResponse = response.json().await?;
        body.access_token.ok_or(OAuthError::MissingField("access_token"))
    }

    /// Fetch the userinfo document for an access token.
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, OAuthError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
