// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Audit logging for security-sensitive operations.
//!
//! Registration, login, password and profile changes, OAuth reconciliation
//! and administrative actions are appended to daily JSONL files under the
//! data root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DataStore, StorageError, StorageResult};

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Account events
    UserRegistered,
    LoginSuccess,
    LoginFailure,
    PasswordChanged,
    ProfileUpdated,

    // OAuth events
    OauthLogin,
    OauthUserCreated,
    OauthAccountLinked,

    // Collaborator events
    ImageUploaded,

    // Admin events
    AdminAccess,
    DataCleared,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// Login identifier of the user who triggered the event (if known).
    pub user: Option<String>,
    /// Resource affected (upload name, provider identity, ...).
    pub resource: Option<String>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error indicator if the operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user: None,
            resource: None,
            success: true,
            error: None,
        }
    }

    /// Set the acting user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the affected resource.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Mark as failed with an error indicator.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    storage: &'a DataStore,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(storage: &'a DataStore) -> Self {
        Self { storage }
    }

    /// Log an audit event.
    ///
    /// Events are appended to a daily log file in JSONL format.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let path = self.storage.paths().audit_events_file(&date);

        let mut content = match self.storage.read_raw(&path) {
            Ok(existing) => existing,
            Err(StorageError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let line = serde_json::to_string(event)?;
        content.extend_from_slice(line.as_bytes());
        content.push(b'\n');

        self.storage.write_raw(&path, &content)
    }

    /// Read all events for a date (YYYY-MM-DD).
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let path = self.storage.paths().audit_events_file(date);
        let content = match self.storage.read_raw(&path) {
            Ok(c) => c,
            Err(StorageError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let text = String::from_utf8_lossy(&content);
        let mut events = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(event) = serde_json::from_str::<AuditEvent>(line) {
                events.push(event);
            }
        }
        Ok(events)
    }
}

/// Helper macro for logging audit events from handlers.
#[macro_export]
macro_rules! audit_log {
    ($storage:expr, $event_type:expr, $user:expr) => {{
        let repo = $crate::storage::AuditRepository::new($storage);
        let event = $crate::storage::AuditEvent::new($event_type).with_user($user);
        let _ = repo.log(&event);
    }};
    ($storage:expr, $event_type:expr, $user:expr, $resource:expr) => {{
        let repo = $crate::storage::AuditRepository::new($storage);
        let event = $crate::storage::AuditEvent::new($event_type)
            .with_user($user)
            .with_resource($resource);
        let _ = repo.log(&event);
    }};
}
