// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the verified call context.

use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::models::AccountId;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the account id, as a decimal string
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Token ID, unique per issued token
    pub jti: String,
}

impl TokenClaims {
    /// Parse the subject back into an account id.
    pub fn account_id(&self) -> Result<AccountId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::MalformedToken)
    }
}

/// Identity of a verified caller.
///
/// Only the authorization gate constructs this value, after a token has
/// passed signature and expiry checks. Handlers receive it through the
/// [`Caller`](super::Caller) extractor and scope every store call by
/// [`CallContext::account_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    account_id: AccountId,
    expires_at: i64,
}

impl CallContext {
    pub(super) fn from_claims(claims: &TokenClaims) -> Result<Self, AuthError> {
        Ok(Self {
            account_id: claims.account_id()?,
            expires_at: claims.exp,
        })
    }

    /// The account that owns this call.
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Token expiration (Unix timestamp).
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    #[cfg(test)]
    pub(crate) fn for_account(account_id: AccountId) -> Self {
        Self {
            account_id,
            expires_at: i64::MAX,
        }
    }
}
