// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Authentication gate.
//!
//! Runs once per inbound request, before the access policy. A valid bearer
//! token establishes a [`CurrentUser`] in the request extensions; anything
//! else (missing header, bad token, unknown subject) degrades to an
//! anonymous request. The gate never rejects - rejection is the policy's job.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::{AuthError, CurrentUser};
use crate::state::AppState;
use crate::storage::UserRepository;

/// Middleware establishing the request identity from a bearer token.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_bearer(&state, request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
        }
        Err(AuthError::MissingAuthHeader) => {
            // No credentials presented; anonymous request.
        }
        Err(e) => {
            tracing::debug!(error = %e, "bearer token rejected, continuing as anonymous");
        }
    }
    next.run(request).await
}

/// Resolve a bearer token from the headers into an identity.
///
/// Shared by the gate middleware and the handler extractors.
pub fn resolve_bearer(state: &AppState, headers: &HeaderMap) -> Result<CurrentUser, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();

    let email = state.tokens().extract_subject(token)?;

    let repo = UserRepository::new(state.storage());
    let user = repo
        .get_by_email(&email)
        .map_err(|_| AuthError::UnknownUser)?;
    if !user.active {
        return Err(AuthError::UnknownUser);
    }

    // Subject must match the user's login identifier exactly.
    if !state.tokens().is_valid(token, &user.email) {
        return Err(AuthError::InvalidSignature);
    }

    Ok(CurrentUser::from(&user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use crate::storage::UserRepository;
    use axum::http::HeaderValue;

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn missing_header_is_anonymous() {
        let (state, _temp) = test_state();
        let result = resolve_bearer(&state, &HeaderMap::new());
        assert_eq!(result.unwrap_err(), AuthError::MissingAuthHeader);
    }

    #[test]
    fn non_bearer_header_is_rejected() {
        let (state, _temp) = test_state();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        let result = resolve_bearer(&state, &headers);
        assert_eq!(result.unwrap_err(), AuthError::InvalidAuthHeader);
    }

    #[test]
    fn valid_token_resolves_user() {
        let (state, _temp) = test_state();
        let user = crate::state::test_support::seed_user(&state, 1, "gate@example.com");
        let token = state.tokens().issue(&user.email).unwrap();

        let resolved = resolve_bearer(&state, &headers_with(&token)).unwrap();
        assert_eq!(resolved.user_id, 1);
        assert_eq!(resolved.email, "gate@example.com");
    }

    #[test]
    fn token_for_unknown_user_is_rejected() {
        let (state, _temp) = test_state();
        let token = state.tokens().issue("ghost@example.com").unwrap();

        let result = resolve_bearer(&state, &headers_with(&token));
        assert_eq!(result.unwrap_err(), AuthError::UnknownUser);
    }

    #[test]
    fn inactive_user_is_rejected() {
        let (state, _temp) = test_state();
        let mut user = crate::state::test_support::seed_user(&state, 1, "inactive@example.com");
        user.active = false;
        UserRepository::new(state.storage()).update(&user).unwrap();
        let token = state.tokens().issue(&user.email).unwrap();

        let result = resolve_bearer(&state, &headers_with(&token));
        assert_eq!(result.unwrap_err(), AuthError::UnknownUser);
    }
}
