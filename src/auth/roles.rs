// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles, ordered by privilege.
///
/// ## Role Hierarchy
///
/// - `Public` - Normal site user (read, like, manage own profile)
/// - `Admin` - Site administrator (blog authoring, admin endpoints)
/// - `Root` - Root administrator (everything, including destructive tooling)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Normal site user
    Public,
    /// Site administrator
    Admin,
    /// Root administrator
    Root,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    ///
    /// Roles are strictly ordered, so this is just the derived ordering.
    pub fn has_privilege(&self, required: Role) -> bool {
        *self >= required
    }

    /// Whether this role may access the administrative API surface.
    pub fn is_admin(&self) -> bool {
        self.has_privilege(Role::Admin)
    }

    /// Parse a role from its wire code (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_uppercase().as_str() {
            "PUBLIC" => Some(Role::Public),
            "ADMIN" => Some(Role::Admin),
            "ROOT" => Some(Role::Root),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is Public (least privilege).
    fn default() -> Self {
        Role::Public
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Public => write!(f, "PUBLIC"),
            Role::Admin => write!(f, "ADMIN"),
            Role::Root => write!(f, "ROOT"),
        }
    }
}
