// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Access policy.
//!
//! A declarative ordered list of (path pattern, requirement) rules evaluated
//! top-to-bottom, first match wins. The enforcement middleware runs after the
//! authentication gate and consumes the identity the gate established.
//!
//! Unauthenticated access to a protected path yields a structured JSON 401
//! when the request looks API-originated, otherwise a redirect to the Google
//! sign-in entry point. An authenticated but under-privileged identity gets
//! a 403.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use super::{AuthError, CurrentUser, Role};
use crate::state::AppState;

/// Requirement attached to a path pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Allowed regardless of identity
    Public,
    /// Requires any authenticated identity
    Authenticated,
    /// Requires at least the given role
    Role(Role),
}

/// One (pattern, requirement) rule.
///
/// Patterns are exact paths, or a prefix followed by `/**` which matches the
/// prefix itself and everything below it.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    pattern: &'static str,
    access: Access,
}

/// Ordered access rules; first match wins, unmatched paths fall back to
/// requiring authentication.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<PolicyRule>,
    fallback: Access,
}

impl AccessPolicy {
    /// The route policy for this service.
    pub fn standard() -> Self {
        let rules = [
            ("/auth/register", Access::Public),
            ("/auth/login", Access::Public),
            ("/auth/logout", Access::Public),
            ("/auth/profile", Access::Authenticated),
            ("/oauth2/**", Access::Public),
            ("/login/oauth2/**", Access::Public),
            ("/visitor/**", Access::Public),
            ("/upload/**", Access::Authenticated),
            ("/uploads/**", Access::Public),
            ("/admin/**", Access::Role(Role::Admin)),
            ("/health/**", Access::Public),
            ("/docs/**", Access::Public),
            ("/api-doc/**", Access::Public),
        ];

        Self {
            rules: rules
                .into_iter()
                .map(|(pattern, access)| PolicyRule { pattern, access })
                .collect(),
            fallback: Access::Authenticated,
        }
    }

    /// Evaluate the requirement for a request path.
    pub fn evaluate(&self, path: &str) -> Access {
        for rule in &self.rules {
            if pattern_matches(rule.pattern, path) {
                return rule.access;
            }
        }
        self.fallback
    }
}

/// Match an exact path or a `prefix/**` pattern (prefix itself included).
fn pattern_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix("/**") {
        Some(prefix) => path == prefix || path.starts_with(&format!("{prefix}/")),
        None => path == pattern,
    }
}

/// Enforcement middleware. Must run after the authentication gate.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let access = state.policy().evaluate(request.uri().path());
    let identity = request.extensions().get::<CurrentUser>().cloned();

    match access {
        Access::Public => next.run(request).await,
        Access::Authenticated => {
            if identity.is_some() {
                next.run(request).await
            } else {
                unauthorized(request.headers())
            }
        }
        Access::Role(required) => match identity {
            Some(user) if user.has_privilege(required) => next.run(request).await,
            Some(_) => AuthError::InsufficientPermissions.into_response(),
            None => unauthorized(request.headers()),
        },
    }
}

/// 401 JSON for API-style requests, OAuth redirect for browser-style ones.
fn unauthorized(headers: &HeaderMap) -> Response {
    if is_api_request(headers) {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Unauthorized",
                "message": "Authentication required"
            })),
        )
            .into_response()
    } else {
        Redirect::to("/oauth2/authorization/google").into_response()
    }
}

/// Heuristic: does this request come from an API client rather than a
/// browser navigation?
fn is_api_request(headers: &HeaderMap) -> bool {
    let header_contains = |name: header::HeaderName, needle: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains(needle))
            .unwrap_or(false)
    };

    header_contains(header::ACCEPT, "application/json")
        || header_contains(header::CONTENT_TYPE, "application/json")
        || headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
            .unwrap_or(false)
        || headers.contains_key(header::AUTHORIZATION)
}
