// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for all record operations.
//!
//! A record that exists but belongs to someone else is reported exactly like
//! a record that does not exist, so callers cannot probe for foreign ids.

use super::{StorageError, StorageResult};
use crate::models::{AccountId, RecordId};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's account ID.
    fn owner_id(&self) -> AccountId;
}

/// Extension trait for ownership verification of a lookup result.
pub trait OwnershipCheck<T> {
    /// Return the resource if `owner` owns it, `NotFound` otherwise.
    fn verify_owner(self, owner: AccountId, id: RecordId) -> StorageResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn verify_owner(self, owner: AccountId, id: RecordId) -> StorageResult<T> {
        match self {
            Some(resource) if resource.owner_id() == owner => Ok(resource),
            _ => Err(StorageError::NotFound(format!("Record {id}"))),
        }
    }
}
