// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Request-scoped identity established by the authentication gate.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use crate::storage::StoredUser;

/// The authenticated identity attached to a request.
///
/// Built by the gate from a valid bearer token and the matching user record;
/// cheap to clone into request extensions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    /// Numeric user id
    pub user_id: u64,
    /// Login identifier (token subject)
    pub email: String,
    /// Role-derived authority
    pub role: Role,
}

impl CurrentUser {
    /// Check if the user has at least the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }

    /// Check if this user may access the administrative surface.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&StoredUser> for CurrentUser {
    fn from(user: &StoredUser) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl From<StoredUser> for CurrentUser {
    fn from(user: StoredUser) -> Self {
        Self::from(&user)
    }
}
