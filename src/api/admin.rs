// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Admin-only API endpoints for system management.
//!
//! These endpoints require the ADMIN or ROOT role and provide:
//! - System statistics
//! - User overview
//! - The destructive bulk-delete escape hatch

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    audit_log,
    auth::AdminOnly,
    error::ApiError,
    state::AppState,
    storage::{AuditEventType, UserRepository, UserSummary, VisitorRepository},
};

/// System statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatsResponse {
    /// Total number of user accounts.
    pub total_users: usize,
    /// Accounts with a verified email.
    pub verified_users: usize,
    /// Accounts linked to an OAuth provider.
    pub social_accounts: usize,
    /// Accounts with the ADMIN or ROOT role.
    pub admin_users: usize,
    /// Distinct visitor addresses across all recorded days.
    pub total_unique_visitors: usize,
    /// Server uptime in seconds.
    pub uptime_seconds: u64,
    /// Current timestamp.
    pub timestamp: String,
}

/// Response for the admin user list.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserListResponse {
    /// All user accounts.
    pub users: Vec<UserSummary>,
    /// Total count.
    pub total: usize,
}

/// Response after the bulk delete.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClearDataResponse {
    pub message: String,
    /// How many user records were removed.
    pub users_deleted: usize,
}

lazy_static::lazy_static! {
    static ref SERVER_START: std::time::Instant = std::time::Instant::now();
}

/// Get system statistics.
#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "System statistics", body = SystemStatsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn get_system_stats(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<SystemStatsResponse>, ApiError> {
    let repo = UserRepository::new(state.storage());
    let users = repo.list_all()?;

    let verified_users = users.iter().filter(|u| u.email_verified).count();
    let social_accounts = users.iter().filter(|u| u.provider.is_some()).count();
    let admin_users = users.iter().filter(|u| u.role.is_admin()).count();

    let total_unique_visitors = VisitorRepository::new(state.storage())
        .total_unique()
        .unwrap_or_default();

    audit_log!(state.storage(), AuditEventType::AdminAccess, &user.email);

    Ok(Json(SystemStatsResponse {
        total_users: users.len(),
        verified_users,
        social_accounts,
        admin_users,
        total_unique_visitors,
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// List all user accounts (admin view).
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users", body = AdminUserListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_users(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<AdminUserListResponse>, ApiError> {
    let users: Vec<UserSummary> = UserRepository::new(state.storage())
        .list_all()?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = users.len();

    audit_log!(state.storage(), AuditEventType::AdminAccess, &user.email);

    Ok(Json(AdminUserListResponse { users, total }))
}

/// Delete every user record.
///
/// Destructive operator escape hatch; indexes and the id counter go with
/// the records.
#[utoipa::path(
    delete,
    path = "/admin/clear-data",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All user data removed", body = ClearDataResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn clear_data(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<ClearDataResponse>, ApiError> {
    let repo = UserRepository::new(state.storage());
    let users_deleted = repo.count()?;
    repo.delete_all()?;

    audit_log!(state.storage(), AuditEventType::DataCleared, &user.email);
    tracing::warn!(by = %user.email, users_deleted, "all user data cleared");

    Ok(Json(ClearDataResponse {
        message: "All data cleared successfully".to_string(),
        users_deleted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::state::test_support::{seed_user, seed_user_with_role, test_state};

    #[tokio::test]
    async fn stats_aggregate_user_counts() {
        let (state, _temp) = test_state();
        let root = seed_user_with_role(&state, 1, "root@example.com", Role::Root);
        seed_user(&state, 2, "a@example.com");
        seed_user(&state, 3, "b@example.com");

        let response = get_system_stats(AdminOnly((&root).into()), State(state.clone()))
            .await
            .unwrap();

        assert_eq!(response.0.total_users, 3);
        assert_eq!(response.0.admin_users, 1);
        assert_eq!(response.0.verified_users, 3);
        assert_eq!(response.0.social_accounts, 0);
    }

    #[tokio::test]
    async fn list_users_returns_summaries() {
        let (state, _temp) = test_state();
        let admin = seed_user_with_role(&state, 1, "admin@example.com", Role::Admin);
        seed_user(&state, 2, "user@example.com");

        let response = list_users(AdminOnly((&admin).into()), State(state.clone()))
            .await
            .unwrap();

        assert_eq!(response.0.total, 2);
        assert_eq!(response.0.users[0].email, "admin@example.com");
    }

    #[tokio::test]
    async fn clear_data_removes_everything() {
        let (state, _temp) = test_state();
        let root = seed_user_with_role(&state, 1, "root@example.com", Role::Root);
        seed_user(&state, 2, "victim@example.com");

        let response = clear_data(AdminOnly((&root).into()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(response.0.users_deleted, 2);

        let repo = UserRepository::new(state.storage());
        assert_eq!(repo.count().unwrap(), 0);
        assert!(!repo.email_exists("victim@example.com"));
    }
}
