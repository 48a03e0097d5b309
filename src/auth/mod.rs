// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session tokens and the authorization gate for the Pass Keeper API.
//!
//! ## Auth Flow
//!
//! 1. Client registers or logs in with username and password
//! 2. Server verifies the Argon2 hash and issues an HS256 token whose
//!    subject is the account id
//! 3. Client sends `Authorization: Bearer <token>` on every data call
//! 4. The gate verifies signature and expiry and attaches a
//!    [`CallContext`] to the request
//!
//! ## Security
//!
//! - All data endpoints require authentication (fail-closed allow-list)
//! - Expired tokens are reported with a distinct error code
//! - Tokens are rejected from their `exp` second on, with no grace period

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod token;

pub use claims::{CallContext, TokenClaims};
pub use error::AuthError;
pub use extractor::Caller;
pub use middleware::{authorize, AuthGate};
pub use token::TokenManager;
