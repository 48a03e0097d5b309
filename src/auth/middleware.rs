// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate for Axum.
//!
//! Runs before every routed handler. Operations on the public allow-list
//! pass through untouched; every other request must carry
//! `Authorization: Bearer <token>` with a token the [`TokenManager`]
//! accepts. On success the verified [`CallContext`] is inserted into the
//! request extensions, where the [`Caller`](super::Caller) extractor picks
//! it up. On failure the handler is never invoked.
//!
//! ```rust,ignore
//! let gate = AuthGate::new(tokens, &["/v1/auth/register", "/v1/auth/login"]);
//! let app = Router::new()
//!     .route("/v1/data", get(list))
//!     .layer(axum::middleware::from_fn_with_state(gate, authorize));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{AuthError, CallContext, TokenManager};

/// Token verification plus the set of operations that skip it.
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenManager>,
    public_operations: &'static [&'static str],
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenManager>, public_operations: &'static [&'static str]) -> Self {
        Self {
            tokens,
            public_operations,
        }
    }

    /// Whether `path` names an operation callable without a token.
    ///
    /// Matching is exact; anything not listed requires authentication.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_operations.contains(&path)
    }

    /// Verify the bearer token in `headers` and build the call context.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<CallContext, AuthError> {
        let token = bearer_token(headers)?;
        let claims = self.tokens.verify(token)?;
        CallContext::from_claims(&claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = auth_header
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Authorization middleware function.
pub async fn authorize(State(gate): State<AuthGate>, mut request: Request, next: Next) -> Response {
    if gate.is_public(request.uri().path()) {
        return next.run(request).await;
    }

    match gate.authenticate(request.headers()) {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => {
            debug!(
                path = %request.uri().path(),
                error_code = e.error_code(),
                "Rejected unauthenticated request"
            );
            e.into_response()
        }
    }
}
