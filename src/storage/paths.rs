// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Path constants and utilities for the data-directory layout.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Default base directory for all persistent data.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities for the service data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== User Paths ==========

    /// Directory containing all user records.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    /// Path to a specific user record.
    pub fn user(&self, user_id: u64) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    /// Path to the user id counter file.
    pub fn user_id_counter(&self) -> PathBuf {
        self.users_dir().join("next_id")
    }

    // ========== Unique Index Paths ==========
    //
    // Index records are created with exclusive-create semantics; their
    // existence IS the uniqueness constraint.

    /// Directory containing the email uniqueness index.
    pub fn emails_dir(&self) -> PathBuf {
        self.root.join("emails")
    }

    /// Path to the index record claiming an email address.
    ///
    /// Email addresses are not filesystem-safe, so index files are keyed by
    /// the SHA-256 of the normalized (trimmed, lowercased) address.
    pub fn email_index(&self, email: &str) -> PathBuf {
        self.emails_dir().join(format!("{}.json", email_key(email)))
    }

    /// Directory containing the (provider, provider id) uniqueness index.
    pub fn providers_dir(&self) -> PathBuf {
        self.root.join("providers")
    }

    /// Path to the index record claiming a provider identity.
    pub fn provider_index(&self, provider: &str, provider_id: &str) -> PathBuf {
        self.providers_dir()
            .join(format!("{}-{}.json", sanitize(provider), sanitize(provider_id)))
    }

    // ========== Upload Paths ==========

    /// Directory containing uploaded images, served publicly under /uploads.
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    /// Path to a specific uploaded file.
    pub fn upload(&self, file_name: &str) -> PathBuf {
        self.uploads_dir().join(file_name)
    }

    // ========== Visitor Paths ==========

    /// Directory containing visitor records.
    pub fn visits_dir(&self) -> PathBuf {
        self.root.join("visits")
    }

    /// Directory for a specific date's visitor records (YYYY-MM-DD).
    pub fn visits_date_dir(&self, date: &str) -> PathBuf {
        self.visits_dir().join(date)
    }

    /// Path to a single (date, ip) visitor record.
    pub fn visit(&self, date: &str, ip: &str) -> PathBuf {
        self.visits_date_dir(date).join(format!("{}.json", sanitize(ip)))
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}

/// Filesystem key for an email address: SHA-256 hex of the normalized form.
pub fn email_key(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Replace filesystem-unsafe characters (IPv6 colons, path separators).
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
