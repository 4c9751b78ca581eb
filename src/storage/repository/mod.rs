// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Repositories over the data store.

pub mod users;
pub mod visitors;

pub use users::{StoredUser, UserRepository, UserSummary};
pub use visitors::{VisitorCounts, VisitorRepository};
