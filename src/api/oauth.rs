// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Google sign-in endpoints: consent redirect and provider callback.
//!
//! The callback never surfaces an error page of its own; every failure
//! becomes a redirect to the front-end with a generic indicator
//! (`oauth_cancelled` when the user backed out at the consent screen,
//! `oauth_failed` for everything else).

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
};
use serde::Deserialize;

use crate::{
    audit_log,
    auth::AuthError,
    error::ApiError,
    oauth::{reconcile, OAuthError, ProviderIdentity, ReconcileOutcome, GOOGLE_PROVIDER},
    state::AppState,
    storage::{AuditEventType, StorageError},
};

/// Query parameters Google sends to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum CallbackError {
    #[error(transparent)]
    OAuth(#[from] OAuthError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Start the Google sign-in flow.
///
/// Mints a one-shot state token and redirects the browser to the consent
/// screen.
#[utoipa::path(
    get,
    path = "/oauth2/authorization/google",
    tag = "OAuth",
    responses(
        (status = 303, description = "Redirect to Google's consent screen"),
        (status = 503, description = "Google sign-in is not configured")
    )
)]
pub async fn authorize_google(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let google = state.google().ok_or_else(|| {
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Google sign-in is not configured")
    })?;

    let login_state = state.pending().begin().await;
    Ok(Redirect::to(&google.authorize_url(&login_state)))
}

/// Provider callback: reconcile the identity and hand the browser a token.
#[utoipa::path(
    get,
    path = "/login/oauth2/code/google",
    tag = "OAuth",
    responses(
        (status = 303, description = "Redirect to the front-end, with a token on success")
    )
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    match handle_callback(&state, params).await {
        Ok(redirect) => redirect,
        Err(CallbackError::OAuth(OAuthError::Cancelled)) => {
            tracing::info!("google sign-in cancelled by the user");
            Redirect::to(&format!("{}/login?error=oauth_cancelled", state.frontend_url()))
        }
        Err(e) => {
            tracing::error!(error = %e, "google sign-in failed");
            Redirect::to(&format!("{}/login?error=oauth_failed", state.frontend_url()))
        }
    }
}

async fn handle_callback(
    state: &AppState,
    params: CallbackParams,
) -> Result<Redirect, CallbackError> {
    // Provider-reported outcome first: a cancelled consent screen arrives as
    // an error payload, not as a missing code.
    if let Some(error) = params.error {
        if error == "access_denied" {
            return Err(OAuthError::Cancelled.into());
        }
        return Err(OAuthError::Provider(error).into());
    }

    let google = state
        .google()
        .ok_or(OAuthError::Provider("not configured".to_string()))?;

    let login_state = params.state.ok_or(OAuthError::MissingField("state"))?;
    if !state.pending().consume(&login_state).await {
        return Err(OAuthError::UnknownState.into());
    }

    let code = params.code.ok_or(OAuthError::MissingField("code"))?;
    let access_token = google.exchange_code(&code).await?;
    let info = google.fetch_user_info(&access_token).await?;

    let email = info
        .email
        .filter(|e| !e.is_empty())
        .ok_or(OAuthError::MissingField("email"))?;

    let identity = ProviderIdentity {
        provider: GOOGLE_PROVIDER.to_string(),
        provider_id: info.sub,
        email,
        email_verified: info.email_verified,
        display_name: info.name,
        picture: info.picture,
    };

    let (user, outcome) = reconcile(state.storage(), &identity)?;
    let token = state.tokens().issue(&user.email)?;

    let event = match outcome {
        ReconcileOutcome::Created => AuditEventType::OauthUserCreated,
        ReconcileOutcome::Linked => AuditEventType::OauthAccountLinked,
        ReconcileOutcome::Existing => AuditEventType::OauthLogin,
    };
    audit_log!(
        state.storage(),
        event,
        &user.email,
        format!("{}/{}", identity.provider, identity.provider_id)
    );

    Ok(Redirect::to(&format!(
        "{}/?oauth_success=true&token={}",
        state.frontend_url(),
        token
    )))
}
