// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Visitor repository.
//!
//! One record per (date, ip) pair under `/data/visits/{date}/`. A repeat
//! visit from the same address on the same day is not counted again; the
//! exclusive-create claim on the record file is the deduplication.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::super::{DataStore, StorageError, StorageResult};

/// A single unique visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
    pub ip: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    pub first_seen: DateTime<Utc>,
}

/// Aggregate visitor counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorCounts {
    /// Unique visitors today.
    pub today: usize,
    /// Distinct addresses across all recorded days.
    pub total: usize,
}

/// Repository for visitor tracking.
pub struct VisitorRepository<'a> {
    storage: &'a DataStore,
}

impl<'a> VisitorRepository<'a> {
    /// Create a new VisitorRepository.
    pub fn new(storage: &'a DataStore) -> Self {
        Self { storage }
    }

    /// Record a visit. Returns `true` if this is the first visit from the
    /// address today, `false` if it was already counted.
    pub fn record(
        &self,
        ip: &str,
        date: NaiveDate,
        user_agent: Option<&str>,
        referer: Option<&str>,
    ) -> StorageResult<bool> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let path = self.storage.paths().visit(&date_str, ip);

        let record = VisitRecord {
            ip: ip.to_string(),
            date,
            user_agent: user_agent.map(str::to_string),
            referer: referer.map(str::to_string),
            first_seen: Utc::now(),
        };

        match self.storage.claim_json(&path, &record) {
            Ok(()) => Ok(true),
            Err(StorageError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Unique visitors for the given day.
    pub fn unique_on(&self, date: NaiveDate) -> StorageResult<usize> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let dir = self.storage.paths().visits_date_dir(&date_str);
        Ok(self.storage.list_files(dir, "json")?.len())
    }

    /// Distinct addresses across every recorded day.
    pub fn total_unique(&self) -> StorageResult<usize> {
        let mut addresses = HashSet::new();
        for day in self.storage.list_dirs(self.storage.paths().visits_dir())? {
            let dir = self.storage.paths().visits_date_dir(&day);
            for stem in self.storage.list_files(dir, "json")? {
                addresses.insert(stem);
            }
        }
        Ok(addresses.len())
    }

    /// Aggregate counts for the stats endpoint.
    pub fn counts(&self, today: NaiveDate) -> StorageResult<VisitorCounts> {
        Ok(VisitorCounts {
            today: self.unique_on(today)?,
            total: self.total_unique()?,
        })
    }
}
