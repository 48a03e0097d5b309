// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance and verification (HS256).

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use uuid::Uuid;

use super::claims::TokenClaims;
use super::AuthError;
use crate::models::AccountId;

/// Default token lifetime (3 hours).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Issues and verifies signed session tokens.
///
/// Construct once at startup and share behind an `Arc`; verification holds
/// no mutable state.
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenManager {
    /// Create a manager signing with `secret` and issuing tokens valid for `ttl`.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InternalError("token signing secret is empty".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Issuer and verifier share one clock; a token is dead at `exp`.
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    /// Lifetime of newly issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `account_id`, expiring `ttl` from now.
    pub fn issue_token(&self, account_id: AccountId) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        self.issue_with_expiry(account_id, now, now.saturating_add(ttl))
    }

    pub(crate) fn issue_with_expiry(
        &self,
        account_id: AccountId,
        issued_at: i64,
        expires_at: i64,
    ) -> Result<String, AuthError> {
        let claims = TokenClaims {
            sub: account_id.to_string(),
            iat: issued_at,
            exp: expires_at,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("failed to sign token: {e}")))
    }

    /// Verify signature and expiry, returning the token's claims.
    ///
    /// An expired token fails with [`AuthError::TokenExpired`]; a token that
    /// was tampered with or signed by another key fails with
    /// [`AuthError::InvalidSignature`].
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })
    }

    /// Verify `token` and return its subject account id.
    pub fn extract_subject(&self, token: &str) -> Result<AccountId, AuthError> {
        self.verify(token)?.account_id()
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("ttl", &self.ttl)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn manager() -> TokenManager {
        TokenManager::new(b"test-secret-key", DEFAULT_TOKEN_TTL).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_subject() {
        let tokens = manager();
        let token = tokens.issue_token(7).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL.as_secs() as i64);
        assert_eq!(tokens.extract_subject(&token).unwrap(), 7);
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let tokens = manager();
        let first = tokens.issue_token(7).unwrap();
        let second = tokens.issue_token(7).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let tokens = manager();
        let now = Utc::now().timestamp();
        let token = tokens.issue_with_expiry(7, now - 7200, now - 3600).unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn token_is_rejected_seconds_after_expiry() {
        let tokens = manager();
        let now = Utc::now().timestamp();
        let token = tokens.issue_with_expiry(7, now - 3600, now - 5).unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenExpired)));
        assert!(matches!(tokens.extract_subject(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = TokenManager::new(b"another-secret", DEFAULT_TOKEN_TTL).unwrap();
        let token = other.issue_token(7).unwrap();

        assert!(matches!(manager().verify(&token), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn rewritten_subject_breaks_signature() {
        let tokens = manager();
        let token = tokens.issue_token(7).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        claims["sub"] = serde_json::Value::String("8".to_string());
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(tokens.verify(&forged), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(manager().verify("not-a-jwt"), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(TokenManager::new(b"", DEFAULT_TOKEN_TTL).is_err());
    }

    #[test]
    fn token_transitions_from_valid_to_expired() {
        let tokens = TokenManager::new(b"test-secret-key", Duration::from_secs(1)).unwrap();
        let token = tokens.issue_token(7).unwrap();
        assert!(tokens.verify(&token).is_ok());

        std::thread::sleep(Duration::from_millis(2100));
        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenExpired)));
    }
}
