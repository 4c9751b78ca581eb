// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Account API endpoints: registration, login, profile, logout.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    audit_log,
    auth::{password, Auth, AuthError, Role},
    error::ApiError,
    state::AppState,
    storage::{AuditEventType, StorageError, StoredUser, UserRepository, UserSummary},
};

/// Request to register a local account.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Response after a successful registration.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Request to log in with email + password.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response after a successful login.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub user: UserSummary,
}

/// Profile payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Profile update: either a password change (both password fields) or a
/// name edit. The email is immutable.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Logout acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Register a new local account.
///
/// Sends a verification email through the collaborator (best effort).
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Duplicate email or invalid input")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let email = request.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    if request.password.len() < 8 {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }

    let repo = UserRepository::new(state.storage());

    let hash = password::hash_password(&request.password).map_err(ApiError::internal)?;
    let now = Utc::now();
    let user = StoredUser {
        user_id: repo.allocate_id()?,
        email: email.clone(),
        password_hash: Some(hash),
        first_name: request.first_name.filter(|s| !s.trim().is_empty()),
        last_name: request.last_name.filter(|s| !s.trim().is_empty()),
        role: Role::default(),
        email_verified: false,
        active: true,
        provider: None,
        provider_id: None,
        profile_image_url: None,
        created_at: now,
        updated_at: now,
    };

    match repo.create(&user) {
        Ok(()) => {}
        Err(StorageError::AlreadyExists(_)) => {
            return Err(ApiError::bad_request("Email is already in use"));
        }
        Err(e) => return Err(e.into()),
    }

    // Best effort: a failed send must not fail the registration.
    let verification_token = uuid::Uuid::new_v4().to_string();
    if !state.mailer().send_verification(&user.email, &verification_token) {
        tracing::warn!(email = %user.email, "verification email was not accepted");
    }

    audit_log!(state.storage(), AuditEventType::UserRegistered, &user.email);

    Ok(Json(RegisterResponse {
        message: "User registered successfully! Please verify your email.".to_string(),
        user: user.into(),
    }))
}

/// Log in with email + password, receiving a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let repo = UserRepository::new(state.storage());

    // One uniform failure for unknown email, wrong password and social-only
    // accounts: the API must not reveal whether an email is registered.
    let user = match repo.get_by_email(request.email.trim()) {
        Ok(user) => user,
        Err(_) => return Err(AuthError::InvalidCredentials.into()),
    };

    let password_matches = user
        .password_hash
        .as_deref()
        .map(|hash| password::verify_password(&request.password, hash))
        .unwrap_or(false);

    if !user.active || !password_matches {
        audit_log!(state.storage(), AuditEventType::LoginFailure, &user.email);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens().issue(&user.email).map_err(ApiError::internal)?;

    audit_log!(state.storage(), AuditEventType::LoginSuccess, &user.email);

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        expires_in: state.tokens().ttl_secs(),
        user: user.into(),
    }))
}

/// Get the caller's profile.
#[utoipa::path(
    get,
    path = "/auth/profile",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile information", body = ProfileResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(
    Auth(current): Auth,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = UserRepository::new(state.storage()).get(current.user_id)?;

    Ok(Json(ProfileResponse {
        message: "Profile information retrieved successfully".to_string(),
        user: user.into(),
    }))
}

/// Update the caller's profile: password change or name edit.
#[utoipa::path(
    put,
    path = "/auth/profile",
    tag = "Auth",
    security(("bearer" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Current password does not match"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_profile(
    Auth(current): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let repo = UserRepository::new(state.storage());
    let mut user = repo.get(current.user_id)?;

    match (&request.current_password, &request.new_password) {
        (Some(current_password), Some(new_password)) => {
            let matches = user
                .password_hash
                .as_deref()
                .map(|hash| password::verify_password(current_password, hash))
                .unwrap_or(false);
            if !matches {
                return Err(ApiError::bad_request("Current password does not match"));
            }
            if new_password.len() < 8 {
                return Err(ApiError::bad_request("Password must be at least 8 characters"));
            }

            user.password_hash = Some(password::hash_password(new_password).map_err(ApiError::internal)?);
            user.updated_at = Utc::now();
            repo.update(&user)?;

            audit_log!(state.storage(), AuditEventType::PasswordChanged, &user.email);
        }
        _ => {
            if let Some(first_name) = request.first_name {
                user.first_name = Some(first_name);
            }
            if let Some(last_name) = request.last_name {
                user.last_name = Some(last_name);
            }
            // The email is immutable: it anchors both token subjects and the
            // OAuth account linkage.
            user.updated_at = Utc::now();
            repo.update(&user)?;

            audit_log!(state.storage(), AuditEventType::ProfileUpdated, &user.email);
        }
    }

    Ok(Json(ProfileResponse {
        message: "Profile successfully updated".to_string(),
        user: user.into(),
    }))
}

/// Log out.
///
/// Purely an acknowledgement: there is no server-side session, and tokens
/// stay valid until they expire. Clients discard the token.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse)
    )
)]
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        success: true,
        message: "Successfully logged out".to_string(),
    })
}
