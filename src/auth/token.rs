// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Token issuance and validation.
//!
//! Tokens are HS256-signed JWTs carrying `{sub: email, iat, exp}`. The
//! signing secret is injected from configuration at startup; there is no
//! per-user revocation list, expiry is the only invalidation mechanism.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Default token lifetime (30 minutes).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// JWT claims carried by issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's login identifier (email)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Issues and validates bearer tokens against a fixed process-wide secret.
///
/// Pure functions over secret + clock; no side effects, no shared mutable
/// state.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service from the configured secret and lifetime.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Token lifetime in seconds (exposed for API responses).
    pub fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs()
    }

    /// Issue a token for the given login identifier.
    pub fn issue(&self, email: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: email.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "failed to sign token");
            AuthError::InternalError
        })
    }

    /// Parse and verify a token, returning the subject (email).
    ///
    /// Fails if the signature is invalid, the structure is malformed, or the
    /// token has already expired.
    pub fn extract_subject(&self, token: &str) -> Result<String, AuthError> {
        Ok(self.decode_claims(token)?.sub)
    }

    /// True iff the token's subject equals the given login identifier and the
    /// token has not expired.
    pub fn is_valid(&self, token: &str, email: &str) -> bool {
        self.decode_claims(token)
            .map(|claims| claims.sub == email)
            .unwrap_or(false)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret-at-least-32-bytes-long!", DEFAULT_TOKEN_TTL)
    }

    #[test]
    fn issue_then_extract_subject_round_trips() {
        let tokens = service();
        let token = tokens.issue("user@example.com").unwrap();
        assert!(!token.is_empty());
        assert_eq!(tokens.extract_subject(&token).unwrap(), "user@example.com");
    }

    #[test]
    fn is_valid_for_matching_user_only() {
        let tokens = service();
        let token = tokens.issue("user@example.com").unwrap();
        assert!(tokens.is_valid(&token, "user@example.com"));
        assert!(!tokens.is_valid(&token, "other@example.com"));
    }

    #[test]
    fn expired_token_fails_despite_valid_signature() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user@example.com".to_string(),
            iat: now - 7200,
            exp: now - 3600, // well past the leeway
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret-at-least-32-bytes-long!"),
        )
        .unwrap();

        assert_eq!(tokens.extract_subject(&token), Err(AuthError::TokenExpired));
        assert!(!tokens.is_valid(&token, "user@example.com"));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let tokens = service();
        let other = TokenService::new("a-completely-different-secret-value", DEFAULT_TOKEN_TTL);
        let token = other.issue("user@example.com").unwrap();

        assert_eq!(
            tokens.extract_subject(&token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service();
        assert_eq!(
            tokens.extract_subject("not-a-jwt"),
            Err(AuthError::MalformedToken)
        );
        assert_eq!(tokens.extract_subject(""), Err(AuthError::MalformedToken));
    }
}
