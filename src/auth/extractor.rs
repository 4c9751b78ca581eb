// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is CurrentUser
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{gate, AuthError, CurrentUser};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Prefers the identity the gate middleware already placed in the request
/// extensions; falls back to verifying the Authorization header directly so
/// handlers also work when called without the middleware stack.
pub struct Auth(pub CurrentUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>().cloned() {
            return Ok(Auth(user));
        }

        let user = gate::resolve_bearer(state, &parts.headers)?;
        Ok(Auth(user))
    }
}

/// Extractor that requires the administrative surface (ADMIN or ROOT).
pub struct AdminOnly(pub CurrentUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` instead of rejecting when no valid identity is present.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(user)) => Ok(OptionalAuth(Some(user))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::state::test_support::{seed_user, test_state};
    use axum::http::Request;

    fn bare_parts() -> Parts {
        Request::builder().uri("/test").body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _temp) = test_state();
        let mut parts = bare_parts();

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_token() {
        let (state, _temp) = test_state();
        let user = seed_user(&state, 1, "extract@example.com");
        let token = state.tokens().issue(&user.email).unwrap();

        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.email, "extract@example.com");
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let (state, _temp) = test_state();
        let mut parts = bare_parts();

        let user = CurrentUser {
            user_id: 42,
            email: "from-gate@example.com".to_string(),
            role: Role::Public,
        };
        parts.extensions.insert(user);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.user_id, 42);
    }

    #[tokio::test]
    async fn admin_only_rejects_public_role() {
        let (state, _temp) = test_state();
        let mut parts = bare_parts();

        parts.extensions.insert(CurrentUser {
            user_id: 1,
            email: "user@example.com".to_string(),
            role: Role::Public,
        });

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn admin_only_accepts_root() {
        let (state, _temp) = test_state();
        let mut parts = bare_parts();

        parts.extensions.insert(CurrentUser {
            user_id: 1,
            email: "root@example.com".to_string(),
            role: Role::Root,
        });

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_user() {
        let (state, _temp) = test_state();
        let mut parts = bare_parts();

        let result = OptionalAuth::from_request_parts(&mut parts, &state).await;
        assert!(result.unwrap().0.is_none());
    }
}
