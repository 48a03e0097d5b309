// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the record database.
//!
//! Each repository borrows the shared [`VaultDatabase`](super::VaultDatabase)
//! and exposes CRUD operations for one entity type.

pub mod accounts;
pub mod records;

pub use accounts::{AccountRepository, StoredAccount};
pub use records::{RecordRepository, StoredRecord};
