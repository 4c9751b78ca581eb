// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Collaborator services consumed by the auth pipeline.

pub mod email;

pub use email::{EmailSender, LogMailer};
