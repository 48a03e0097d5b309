// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Client Module
//!
//! Library side of the Pass Keeper client: a typed HTTP client, the local
//! mirror of the caller's records, and the sync service tying them together.

pub mod api;
pub mod error;
pub mod mirror;
pub mod sync;

pub use api::{ApiClient, ClientConfig};
pub use error::ClientError;
pub use mirror::{LocalMirror, MirrorEntry, MirrorSnapshot, TokenCache};
pub use sync::SyncService;
