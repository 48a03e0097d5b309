// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the verified caller.
//!
//! Use the `Caller` extractor in handlers behind the authorization gate:
//!
//! ```rust,ignore
//! async fn my_handler(Caller(caller): Caller) -> impl IntoResponse {
//!     // caller.account_id() scopes every store call
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, CallContext};

/// Extractor for the call context established by the authorization gate.
///
/// Never parses the `Authorization` header itself: a handler mounted
/// outside the gate cannot obtain a context and rejects with `401`.
pub struct Caller(pub CallContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallContext>()
            .cloned()
            .map(Caller)
            .ok_or(AuthError::Unauthenticated)
    }
}
