// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! # Storage Module
//!
//! Persistent state lives as JSON files under a single data directory
//! (default `/data`, configurable via `DATA_DIR`).
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   users/
//!     {user_id}.json     # User records
//!     next_id            # Id counter
//!   emails/
//!     {sha256}.json      # Email uniqueness index
//!   providers/
//!     {prov}-{id}.json   # Provider-identity uniqueness index
//!   uploads/
//!     {uuid}.{ext}       # Uploaded images (served at /uploads)
//!   visits/
//!     {date}/{ip}.json   # Per-day per-IP visitor records
//!   audit/
//!     {date}/events.jsonl  # Daily audit logs
//! ```
//!
//! Record writes are atomic (temp file + rename). Uniqueness indexes are
//! claimed with exclusive-create opens, which is the only cross-request
//! consistency guard the service relies on.

pub mod audit;
pub mod paths;
pub mod repository;
pub mod store;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use paths::StoragePaths;
pub use repository::{
    StoredUser, UserRepository, UserSummary, VisitorCounts, VisitorRepository,
};
pub use store::{DataStore, StorageError, StorageResult};
