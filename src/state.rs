// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Shared application state.

use std::sync::Arc;

use crate::auth::{AccessPolicy, TokenService};
use crate::oauth::{GoogleOAuth, PendingLogins};
use crate::services::{EmailSender, LogMailer};
use crate::storage::DataStore;

/// State threaded through every handler.
///
/// Cheap to clone; everything shared sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    storage: DataStore,
    tokens: Arc<TokenService>,
    policy: Arc<AccessPolicy>,
    pending: Arc<PendingLogins>,
    mailer: Arc<dyn EmailSender>,
    google: Option<Arc<GoogleOAuth>>,
    frontend_url: Arc<str>,
}

impl AppState {
    /// Create application state over an initialized store.
    pub fn new(storage: DataStore, tokens: TokenService) -> Self {
        Self {
            storage,
            tokens: Arc::new(tokens),
            policy: Arc::new(AccessPolicy::standard()),
            pending: Arc::new(PendingLogins::default()),
            mailer: Arc::new(LogMailer),
            google: None,
            frontend_url: crate::config::DEFAULT_FRONTEND_URL.into(),
        }
    }

    /// Enable Google sign-in.
    pub fn with_google(mut self, google: GoogleOAuth) -> Self {
        self.google = Some(Arc::new(google));
        self
    }

    /// Override the front-end base URL for OAuth redirects.
    pub fn with_frontend_url(mut self, url: impl AsRef<str>) -> Self {
        self.frontend_url = url.as_ref().into();
        self
    }

    /// Swap the email collaborator.
    pub fn with_mailer(mut self, mailer: Arc<dyn EmailSender>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn storage(&self) -> &DataStore {
        &self.storage
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn pending(&self) -> &PendingLogins {
        &self.pending
    }

    pub fn mailer(&self) -> &dyn EmailSender {
        self.mailer.as_ref()
    }

    pub fn google(&self) -> Option<&GoogleOAuth> {
        self.google.as_deref()
    }

    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }
}
