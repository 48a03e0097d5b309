// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage for accounts and encrypted records, using an embedded
//! redb database.
//!
//! ## Security Model
//!
//! - Record payloads and annotations are sealed by the envelope cipher before
//!   they reach this layer; the store only ever sees ciphertext
//! - Every record operation takes the owner's account id and is scoped by it
//! - A record owned by another account is indistinguishable from a missing one
//!
//! ## Connectivity
//!
//! Opening the database and the liveness ping run under a bounded
//! [`RetryPolicy`]. A [`HealthMonitor`] re-pings periodically in the
//! background.

pub mod database;
pub mod monitor;
pub mod ownership;
pub mod repository;
pub mod retry;

pub use database::{StorageError, StorageResult, VaultDatabase};
pub use monitor::HealthMonitor;
pub use ownership::{OwnedResource, OwnershipCheck};
pub use repository::{AccountRepository, RecordRepository, StoredAccount, StoredRecord};
pub use retry::RetryPolicy;
