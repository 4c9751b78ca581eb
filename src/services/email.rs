// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Email delivery collaborator.
//!
//! The auth pipeline only needs fire-and-forget sends with a success flag;
//! delivery itself is someone else's problem. The default implementation
//! writes the message to the structured log, which is what development and
//! tests want.

/// Outbound email, as consumed by the auth pipeline.
pub trait EmailSender: Send + Sync {
    /// Send a plain message. Returns whether the send was accepted.
    fn send(&self, to: &str, subject: &str, body: &str) -> bool;

    /// Send the address-verification message for a fresh registration.
    fn send_verification(&self, to: &str, token: &str) -> bool {
        self.send(
            to,
            "Verify your TheHFPV account",
            &format!("Confirm your email address with this token: {token}"),
        )
    }

    /// Send a password-reset message.
    fn send_password_reset(&self, to: &str, token: &str) -> bool {
        self.send(
            to,
            "Reset your TheHFPV password",
            &format!("Use this token to reset your password: {token}"),
        )
    }

    /// Send the post-verification welcome message.
    fn send_welcome(&self, to: &str, first_name: &str) -> bool {
        self.send(
            to,
            "Welcome to TheHFPV",
            &format!("Hi {first_name}, your account is ready."),
        )
    }
}

/// Logs messages instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl EmailSender for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> bool {
        tracing::info!(to, subject, body, "email send (log only)");
        true
    }
}
