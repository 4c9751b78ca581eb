// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! OAuth account reconciliation.
//!
//! Maps a confirmed external identity onto a local user record. Lookup
//! order, first match wins:
//!
//! 1. record already linked to (provider, provider id) - sync the
//!    email-verified flag, touch `updated_at`, nothing else (provider data
//!    must not silently overwrite local edits)
//! 2. record with the same email but no linkage - attach the provider
//!    identity and mark the email verified; the local password hash stays
//! 3. no record - create one with the default role and no usable password
//!
//! The provider and email uniqueness claims are the only guard against
//! concurrent first logins. Losing a claim means another request created the
//! record between our lookup and our write, so the lookup pass is re-run.

use chrono::Utc;

use crate::auth::Role;
use crate::storage::{DataStore, StorageError, StorageResult, StoredUser, UserRepository};

/// Provider name recorded for Google identities.
pub const GOOGLE_PROVIDER: &str = "GOOGLE";

/// The external identity as confirmed by the provider.
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub provider: String,
    pub provider_id: String,
    pub email: String,
    pub email_verified: Option<bool>,
    pub display_name: Option<String>,
    pub picture: Option<String>,
}

/// What reconciliation did with the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Known linked account, freshened.
    Existing,
    /// Local account gained the provider linkage.
    Linked,
    /// Brand-new social account.
    Created,
}

/// Reconcile an external identity to exactly one local user record.
///
/// Idempotent for unchanged input: repeated calls return the same record.
pub fn reconcile(
    storage: &DataStore,
    identity: &ProviderIdentity,
) -> StorageResult<(StoredUser, ReconcileOutcome)> {
    let repo = UserRepository::new(storage);

    // Two passes: the second only runs after a lost uniqueness claim, at
    // which point the lookup is guaranteed to find the winner's record.
    for _ in 0..2 {
        // 1. Already linked to this provider identity
        match repo.get_by_provider(&identity.provider, &identity.provider_id) {
            Ok(mut user) => {
                if let Some(verified) = identity.email_verified {
                    user.email_verified = verified;
                }
                user.updated_at = Utc::now();
                repo.update(&user)?;
                return Ok((user, ReconcileOutcome::Existing));
            }
            Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        // 2. Local account with the same email: attach the linkage
        match repo.get_by_email(&identity.email) {
            Ok(mut user) => {
                match repo.claim_provider(&identity.provider, &identity.provider_id, user.user_id) {
                    Ok(()) => {
                        user.provider = Some(identity.provider.clone());
                        user.provider_id = Some(identity.provider_id.clone());
                        user.email_verified = true;
                        user.updated_at = Utc::now();
                        repo.update(&user)?;
                        return Ok((user, ReconcileOutcome::Linked));
                    }
                    Err(StorageError::AlreadyExists(_)) => continue,
                    Err(e) => return Err(e),
                }
            }
            Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        // 3. First sign-in: create a social-only account
        let (first_name, last_name) = split_display_name(identity.display_name.as_deref());
        let now = Utc::now();
        let user = StoredUser {
            user_id: repo.allocate_id()?,
            email: identity.email.clone(),
            password_hash: None,
            first_name,
            last_name,
            role: Role::default(),
            email_verified: true,
            active: true,
            provider: Some(identity.provider.clone()),
            provider_id: Some(identity.provider_id.clone()),
            profile_image_url: identity.picture.clone(),
            created_at: now,
            updated_at: now,
        };
        match repo.create(&user) {
            Ok(()) => return Ok((user, ReconcileOutcome::Created)),
            Err(StorageError::AlreadyExists(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(StorageError::AlreadyExists(format!(
        "provider identity {}/{} kept losing creation races",
        identity.provider, identity.provider_id
    )))
}

/// Split a provider display name: first token becomes the first name, the
/// remainder the last name.
fn split_display_name(name: Option<&str>) -> (Option<String>, Option<String>) {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => match name.split_once(' ') {
            Some((first, rest)) => (Some(first.to_string()), Some(rest.to_string())),
            None => (Some(name.to_string()), None),
        },
        _ => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, DataStore) {
        let temp = TempDir::new().unwrap();
        let paths = StoragePaths::new(temp.path());
        let mut store = DataStore::new(paths);
        store.initialize().unwrap();
        (temp, store)
    }

    fn google_identity(email: &str, provider_id: &str) -> ProviderIdentity {
        ProviderIdentity {
            provider: GOOGLE_PROVIDER.to_string(),
            provider_id: provider_id.to_string(),
            email: email.to_string(),
            email_verified: Some(true),
            display_name: Some("Ada Lovelace Byron".to_string()),
            picture: Some("https://lh3.example/photo.jpg".to_string()),
        }
    }

    #[test]
    fn first_sign_in_creates_social_account() {
        let (_temp, store) = test_store();
        let (user, outcome) = reconcile(&store, &google_identity("ada@example.com", "g-1")).unwrap();

        assert_eq!(outcome, ReconcileOutcome::Created);
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::Public);
        assert!(user.email_verified);
        assert!(user.password_hash.is_none());
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.last_name.as_deref(), Some("Lovelace Byron"));
        assert_eq!(user.provider.as_deref(), Some(GOOGLE_PROVIDER));
        assert_eq!(user.provider_id.as_deref(), Some("g-1"));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let (_temp, store) = test_store();
        let identity = google_identity("repeat@example.com", "g-2");

        let (first, _) = reconcile(&store, &identity).unwrap();
        let (second, outcome) = reconcile(&store, &identity).unwrap();

        assert_eq!(outcome, ReconcileOutcome::Existing);
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(UserRepository::new(&store).count().unwrap(), 1);
    }

    #[test]
    fn existing_email_account_gets_linked_not_duplicated() {
        let (_temp, store) = test_store();
        let repo = UserRepository::new(&store);

        let hash = hash_password("local-password").unwrap();
        let now = Utc::now();
        let local = StoredUser {
            user_id: repo.allocate_id().unwrap(),
            email: "local@example.com".to_string(),
            password_hash: Some(hash.clone()),
            first_name: Some("Local".to_string()),
            last_name: Some("User".to_string()),
            role: Role::Public,
            email_verified: false,
            active: true,
            provider: None,
            provider_id: None,
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        };
        repo.create(&local).unwrap();

        let (linked, outcome) = reconcile(&store, &google_identity("local@example.com", "g-3")).unwrap();

        assert_eq!(outcome, ReconcileOutcome::Linked);
        assert_eq!(linked.user_id, local.user_id);
        assert_eq!(linked.password_hash.as_deref(), Some(hash.as_str()));
        assert_eq!(linked.provider.as_deref(), Some(GOOGLE_PROVIDER));
        assert_eq!(linked.provider_id.as_deref(), Some("g-3"));
        assert!(linked.email_verified);
        // Local name edits survive the link
        assert_eq!(linked.first_name.as_deref(), Some("Local"));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn repeat_login_syncs_email_verified_only() {
        let (_temp, store) = test_store();
        let mut identity = google_identity("sync@example.com", "g-4");
        reconcile(&store, &identity).unwrap();

        // Locally rename the user, then sign in again with a changed flag
        let repo = UserRepository::new(&store);
        let mut user = repo.get_by_email("sync@example.com").unwrap();
        user.first_name = Some("Renamed".to_string());
        repo.update(&user).unwrap();

        identity.email_verified = Some(false);
        identity.display_name = Some("Provider Name".to_string());
        let (after, outcome) = reconcile(&store, &identity).unwrap();

        assert_eq!(outcome, ReconcileOutcome::Existing);
        assert!(!after.email_verified);
        // Provider display name never overwrites local edits
        assert_eq!(after.first_name.as_deref(), Some("Renamed"));
    }

    #[test]
    fn role_is_never_auto_escalated() {
        let (_temp, store) = test_store();
        let identity = google_identity("role@example.com", "g-5");
        reconcile(&store, &identity).unwrap();

        let repo = UserRepository::new(&store);
        let mut user = repo.get_by_email("role@example.com").unwrap();
        user.role = Role::Admin;
        repo.update(&user).unwrap();

        let (after, _) = reconcile(&store, &identity).unwrap();
        assert_eq!(after.role, Role::Admin);
    }

    #[test]
    fn display_name_splitting() {
        assert_eq!(
            split_display_name(Some("Ada Lovelace")),
            (Some("Ada".to_string()), Some("Lovelace".to_string()))
        );
        assert_eq!(
            split_display_name(Some("Prince")),
            (Some("Prince".to_string()), None)
        );
        assert_eq!(split_display_name(Some("  ")), (None, None));
        assert_eq!(split_display_name(None), (None, None));
    }
}
