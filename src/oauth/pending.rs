// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Pending-login state store.
//!
//! The browser is sent to Google with an opaque `state` token; the callback
//! must present the same token, exactly once. This replaces the server-side
//! HTTP session the redirect flow would otherwise need - the flow is a small
//! state machine whose only output is the issued JWT.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// How long a started login may wait at the consent screen.
const PENDING_MAX_AGE: Duration = Duration::from_secs(600);

/// One-shot state tokens for in-flight OAuth logins.
#[derive(Debug)]
pub struct PendingLogins {
    inner: Mutex<HashMap<String, Instant>>,
    max_age: Duration,
}

impl Default for PendingLogins {
    fn default() -> Self {
        Self::new(PENDING_MAX_AGE)
    }
}

impl PendingLogins {
    /// Create a store with a custom expiry (tests).
    pub fn new(max_age: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            max_age,
        }
    }

    /// Start a login: mint and remember a fresh state token.
    ///
    /// Expired entries from abandoned flows are swept on the way.
    pub async fn begin(&self) -> String {
        let state = uuid::Uuid::new_v4().to_string();
        let mut map = self.inner.lock().await;
        map.retain(|_, created| created.elapsed() < self.max_age);
        map.insert(state.clone(), Instant::now());
        state
    }

    /// Validate and consume a state token. Each token works exactly once.
    pub async fn consume(&self, state: &str) -> bool {
        let mut map = self.inner.lock().await;
        match map.remove(state) {
            Some(created) => created.elapsed() < self.max_age,
            None => false,
        }
    }

    /// Number of in-flight logins.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
