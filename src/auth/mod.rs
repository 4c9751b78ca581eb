// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! # Authentication Module
//!
//! JWT bearer authentication for the TheHFPV API.
//!
//! ## Auth Flow
//!
//! 1. Client obtains a token from `POST /auth/login` (or the Google OAuth
//!    callback)
//! 2. Client sends `Authorization: Bearer <token>`
//! 3. The gate middleware verifies the HS256 signature and expiry, loads the
//!    user behind the `sub` (email) claim and attaches a [`CurrentUser`] to
//!    the request
//! 4. The access policy decides whether the route needs that identity
//!
//! ## Security
//!
//! - The signing secret is injected from configuration at startup
//! - Clock skew tolerance is 60 seconds
//! - Token failures degrade to anonymous; the policy produces the rejection

pub mod error;
pub mod extractor;
pub mod gate;
pub mod identity;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;

pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, OptionalAuth};
pub use identity::CurrentUser;
pub use policy::{Access, AccessPolicy};
pub use roles::Role;
pub use token::{TokenService, DEFAULT_TOKEN_TTL};
