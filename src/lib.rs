// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pass Keeper - Personal Secret Synchronisation Service
//!
//! Stores login pairs, free text, binary files and payment cards per account,
//! sealed with a server-held AES-256-GCM key, and mirrors them into a local
//! client cache on demand.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token issuance, verification and the authorization gate
//! - `cipher` - Envelope encryption of record contents
//! - `client` - HTTP client, local mirror and sync service
//! - `storage` - Owner-scoped record store (redb) with connection retry

pub mod api;
pub mod auth;
pub mod cipher;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;
