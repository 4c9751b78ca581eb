// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! # OAuth Module
//!
//! Google sign-in for the TheHFPV API.
//!
//! ## Flow
//!
//! 1. `GET /oauth2/authorization/google` mints a one-shot state token and
//!    redirects the browser to Google's consent screen
//! 2. Google redirects back to `GET /login/oauth2/code/google` with the code
//!    and our state token
//! 3. The callback consumes the state, exchanges the code, fetches userinfo,
//!    reconciles the identity to a local user record and issues a JWT
//! 4. The browser is redirected to the front-end with
//!    `?oauth_success=true&token=<jwt>`
//!
//! There is no server-side session: the pending-login store carries the only
//! cross-request state, and the issued token is the single source of truth.

pub mod google;
pub mod pending;
pub mod reconcile;

pub use google::{GoogleOAuth, GoogleUserInfo, OAuthError};
pub use pending::PendingLogins;
pub use reconcile::{reconcile, ProviderIdentity, ReconcileOutcome, GOOGLE_PROVIDER};
