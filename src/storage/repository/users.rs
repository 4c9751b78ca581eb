// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! User repository.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/users/{user_id}.json      # User record
//! /data/users/next_id             # Id counter
//! /data/emails/{sha256}.json      # Email uniqueness index -> user_id
//! /data/providers/{prov}-{id}.json# Provider uniqueness index -> user_id
//! ```
//!
//! The index files are created with exclusive-create semantics; losing a
//! claim means the identity already belongs to someone (see `DataStore::claim_json`).
//! The password hash never leaves this module through `UserSummary`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{DataStore, StorageError, StorageResult};
use crate::auth::Role;

/// A stored user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredUser {
    /// Numeric user id, allocated from the counter file
    pub user_id: u64,
    /// Login identifier, globally unique
    pub email: String,
    /// Argon2id hash in PHC string format; absent for social-only accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub role: Role,
    pub email_verified: bool,
    /// Account status flag (false = deactivated)
    pub active: bool,
    /// OAuth provider name (e.g. "GOOGLE") when linked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Provider-assigned subject id, unique together with `provider`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    /// Whether this account has a usable local password.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// User representation returned to API clients (never includes the hash).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: u64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub user_role: Role,
    pub email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for UserSummary {
    fn from(user: StoredUser) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            user_role: user.role,
            email_verified: user.email_verified,
            provider: user.provider,
            profile_image_url: user.profile_image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Index record pointing an email / provider claim at its user.
#[derive(Debug, Serialize, Deserialize)]
struct UserRef {
    user_id: u64,
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    storage: &'a DataStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository.
    pub fn new(storage: &'a DataStore) -> Self {
        Self { storage }
    }

    /// Check if a user exists.
    pub fn exists(&self, user_id: u64) -> bool {
        self.storage.exists(self.storage.paths().user(user_id))
    }

    /// Get a user by id.
    pub fn get(&self, user_id: u64) -> StorageResult<StoredUser> {
        let path = self.storage.paths().user(user_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.read_json(path)
    }

    /// Get a user by email (the login identifier).
    pub fn get_by_email(&self, email: &str) -> StorageResult<StoredUser> {
        let index = self.storage.paths().email_index(email);
        if !self.storage.exists(&index) {
            return Err(StorageError::NotFound(format!("User with email {email}")));
        }
        let r: UserRef = self.storage.read_json(index)?;
        self.get(r.user_id)
    }

    /// Get a user by provider identity.
    pub fn get_by_provider(&self, provider: &str, provider_id: &str) -> StorageResult<StoredUser> {
        let index = self.storage.paths().provider_index(provider, provider_id);
        if !self.storage.exists(&index) {
            return Err(StorageError::NotFound(format!(
                "User with provider identity {provider}/{provider_id}"
            )));
        }
        let r: UserRef = self.storage.read_json(index)?;
        self.get(r.user_id)
    }

    /// Check whether an email is already taken.
    pub fn email_exists(&self, email: &str) -> bool {
        self.storage.exists(self.storage.paths().email_index(email))
    }

    /// Allocate the next numeric user id from the counter file.
    pub fn allocate_id(&self) -> StorageResult<u64> {
        let path = self.storage.paths().user_id_counter();
        let next = match self.storage.read_raw(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).trim().parse::<u64>().unwrap_or(1),
            Err(StorageError::NotFound(_)) => 1,
            Err(e) => return Err(e),
        };
        self.storage.write_raw(&path, (next + 1).to_string().as_bytes())?;
        Ok(next)
    }

    /// Create a new user.
    ///
    /// Claims the email index (and the provider index when the record carries
    /// a linkage) before writing the record. A lost claim surfaces as
    /// `AlreadyExists` with nothing written; callers treat that as "the
    /// identity already has a record - look it up again".
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        let email_index = self.storage.paths().email_index(&user.email);
        self.storage
            .claim_json(&email_index, &UserRef { user_id: user.user_id })
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => {
                    StorageError::AlreadyExists(format!("User with email {}", user.email))
                }
                other => other,
            })?;

        if let (Some(provider), Some(provider_id)) = (&user.provider, &user.provider_id) {
            let provider_index = self.storage.paths().provider_index(provider, provider_id);
            if let Err(e) = self
                .storage
                .claim_json(&provider_index, &UserRef { user_id: user.user_id })
            {
                // Roll the email claim back so the address is not orphaned.
                let _ = self.storage.delete(&email_index);
                return Err(match e {
                    StorageError::AlreadyExists(_) => StorageError::AlreadyExists(format!(
                        "User with provider identity {provider}/{provider_id}"
                    )),
                    other => other,
                });
            }
        }

        self.storage.write_json(self.storage.paths().user(user.user_id), user)
    }

    /// Update an existing user record.
    ///
    /// The email is immutable, so no index maintenance is needed here.
    pub fn update(&self, user: &StoredUser) -> StorageResult<()> {
        if !self.exists(user.user_id) {
            return Err(StorageError::NotFound(format!("User {}", user.user_id)));
        }
        self.storage.write_json(self.storage.paths().user(user.user_id), user)
    }

    /// Claim a provider identity for an existing user.
    ///
    /// Returns `AlreadyExists` if the identity is claimed by anyone (including
    /// a concurrent request that won the race); the caller re-runs its lookup.
    pub fn claim_provider(
        &self,
        provider: &str,
        provider_id: &str,
        user_id: u64,
    ) -> StorageResult<()> {
        let index = self.storage.paths().provider_index(provider, provider_id);
        self.storage
            .claim_json(&index, &UserRef { user_id })
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => StorageError::AlreadyExists(format!(
                    "User with provider identity {provider}/{provider_id}"
                )),
                other => other,
            })
    }

    /// List all users.
    pub fn list_all(&self) -> StorageResult<Vec<StoredUser>> {
        let stems = self
            .storage
            .list_files(self.storage.paths().users_dir(), "json")?;

        let mut users = Vec::new();
        for stem in stems {
            if let Ok(user_id) = stem.parse::<u64>() {
                if let Ok(user) = self.get(user_id) {
                    users.push(user);
                }
            }
        }
        users.sort_by_key(|u| u.user_id);
        Ok(users)
    }

    /// Count all users.
    pub fn count(&self) -> StorageResult<usize> {
        Ok(self.list_all()?.len())
    }

    /// Delete every user record and all uniqueness indexes.
    ///
    /// Destructive operator escape hatch; also resets the id counter.
    pub fn delete_all(&self) -> StorageResult<()> {
        self.storage.clear_dir(self.storage.paths().users_dir())?;
        self.storage.clear_dir(self.storage.paths().emails_dir())?;
        self.storage.clear_dir(self.storage.paths().providers_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, DataStore) {
        let temp = TempDir::new().unwrap();
        let paths = StoragePaths::new(temp.path());
        let mut store = DataStore::new(paths);
        store.initialize().unwrap();
        (temp, store)
    }

    fn test_user(user_id: u64, email: &str) -> StoredUser {
        StoredUser {
            user_id,
            email: email.to_string(),
            password_hash: Some("$argon2id$fake".to_string()),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
            role: Role::Public,
            email_verified: false,
            active: true,
            provider: None,
            provider_id: None,
            profile_image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_get_user() {
        let (_temp, store) = test_store();
        let repo = UserRepository::new(&store);

        let user = test_user(1, "one@example.com");
        repo.create(&user).unwrap();

        let loaded = repo.get(1).unwrap();
        assert_eq!(loaded, user);
    }

    #[test]
    fn get_by_email_uses_index() {
        let (_temp, store) = test_store();
        let repo = UserRepository::new(&store);

        repo.create(&test_user(1, "lookup@example.com")).unwrap();

        let loaded = repo.get_by_email("lookup@example.com").unwrap();
        assert_eq!(loaded.user_id, 1);

        // Lookup normalizes case
        let loaded = repo.get_by_email("LOOKUP@example.com").unwrap();
        assert_eq!(loaded.user_id, 1);
    }

    #[test]
    fn duplicate_email_rejected() {
        let (_temp, store) = test_store();
        let repo = UserRepository::new(&store);

        repo.create(&test_user(1, "dup@example.com")).unwrap();
        let result = repo.create(&test_user(2, "dup@example.com"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

        // Loser wrote nothing
        assert!(!repo.exists(2));
    }

    #[test]
    fn provider_identity_is_unique() {
        let (_temp, store) = test_store();
        let repo = UserRepository::new(&store);

        let mut user = test_user(1, "social@example.com");
        user.provider = Some("GOOGLE".to_string());
        user.provider_id = Some("g-123".to_string());
        repo.create(&user).unwrap();

        let loaded = repo.get_by_provider("GOOGLE", "g-123").unwrap();
        assert_eq!(loaded.user_id, 1);

        // A second record for the same provider identity loses the claim,
        // and its email claim is rolled back.
        let mut dup = test_user(2, "other@example.com");
        dup.provider = Some("GOOGLE".to_string());
        dup.provider_id = Some("g-123".to_string());
        let result = repo.create(&dup);
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert!(!repo.email_exists("other@example.com"));
    }

    #[test]
    fn claim_provider_for_existing_user() {
        let (_temp, store) = test_store();
        let repo = UserRepository::new(&store);

        repo.create(&test_user(1, "local@example.com")).unwrap();
        repo.claim_provider("GOOGLE", "g-9", 1).unwrap();

        let result = repo.claim_provider("GOOGLE", "g-9", 2);
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn allocate_id_is_sequential() {
        let (_temp, store) = test_store();
        let repo = UserRepository::new(&store);

        assert_eq!(repo.allocate_id().unwrap(), 1);
        assert_eq!(repo.allocate_id().unwrap(), 2);
        assert_eq!(repo.allocate_id().unwrap(), 3);
    }

    #[test]
    fn list_all_sorted_by_id() {
        let (_temp, store) = test_store();
        let repo = UserRepository::new(&store);

        repo.create(&test_user(2, "b@example.com")).unwrap();
        repo.create(&test_user(1, "a@example.com")).unwrap();

        let users = repo.list_all().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, 1);
        assert_eq!(users[1].user_id, 2);
    }

    #[test]
    fn delete_all_clears_records_and_indexes() {
        let (_temp, store) = test_store();
        let repo = UserRepository::new(&store);

        let mut user = test_user(1, "gone@example.com");
        user.provider = Some("GOOGLE".to_string());
        user.provider_id = Some("g-1".to_string());
        repo.create(&user).unwrap();

        repo.delete_all().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
        assert!(!repo.email_exists("gone@example.com"));
        assert!(repo.get_by_provider("GOOGLE", "g-1").is_err());
        // Counter restarts with the records
        assert_eq!(repo.allocate_id().unwrap(), 1);
    }

    #[test]
    fn summary_never_contains_password_hash() {
        let user = test_user(1, "safe@example.com");
        let summary: UserSummary = user.into();
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        assert!(json.contains("\"userId\":1"));
        assert!(json.contains("\"userRole\":\"PUBLIC\""));
    }
}
