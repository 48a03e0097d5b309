// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Record repository.
//!
//! Records hold ciphertext only: the payload and the annotation arrive
//! already sealed by the envelope cipher. Every operation is scoped by the
//! owner's account id, which is part of the primary key.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{next_sequence, RECORDS, RECORD_SEQUENCE};
use super::super::{OwnedResource, OwnershipCheck, StorageError, StorageResult, VaultDatabase};
use crate::models::{AccountId, RecordId, RecordKind};

/// Record as persisted in the `pass_keeper_data` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredRecord {
    /// Store-assigned identifier
    pub id: RecordId,
    /// Owning account
    pub owner_id: AccountId,
    /// Kind tag, stored in the clear
    pub kind: RecordKind,
    /// Encrypted payload blob
    pub payload: String,
    /// Encrypted annotation blob
    pub annotation: String,
    /// Creation time, refreshed on every update
    pub uploaded_at: DateTime<Utc>,
}

impl OwnedResource for StoredRecord {
    fn owner_id(&self) -> AccountId {
        self.owner_id
    }
}

/// Repository for owner-scoped record operations.
pub struct RecordRepository<'a> {
    db: &'a VaultDatabase,
}

impl<'a> RecordRepository<'a> {
    /// Create a new RecordRepository.
    pub fn new(db: &'a VaultDatabase) -> Self {
        Self { db }
    }

    /// Insert a new record owned by `owner` and return it with its id.
    pub fn create(
        &self,
        owner: AccountId,
        kind: RecordKind,
        payload: String,
        annotation: String,
    ) -> StorageResult<StoredRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let id = next_sequence(&write_txn, RECORD_SEQUENCE)?;
            let record = StoredRecord {
                id,
                owner_id: owner,
                kind,
                payload,
                annotation,
                uploaded_at: Utc::now(),
            };
            let json = serde_json::to_vec(&record)?;

            let mut table = write_txn.open_table(RECORDS)?;
            table.insert((owner, id), json.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// All records owned by `owner`, in id order.
    pub fn list(&self, owner: AccountId) -> StorageResult<Vec<StoredRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS)?;

        let start: (u64, u64) = (owner, 0);
        let end: (u64, u64) = (owner, u64::MAX);

        let mut records = Vec::new();
        for entry in table.range(start..=end)? {
            let (key, value) = entry?;
            let (_, id) = key.value();
            let record: StoredRecord = serde_json::from_slice(value.value())?;
            records.push(Some(record).verify_owner(owner, id)?);
        }
        Ok(records)
    }

    /// Get one record; `NotFound` if it is missing or owned by someone else.
    pub fn get(&self, owner: AccountId, id: RecordId) -> StorageResult<StoredRecord> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS)?;
        let record = match table.get((owner, id))? {
            Some(value) => Some(serde_json::from_slice::<StoredRecord>(value.value())?),
            None => None,
        };
        record.verify_owner(owner, id)
    }

    /// Replace the payload and annotation of an existing record and refresh
    /// its `uploaded_at`. The kind of a record never changes.
    pub fn update(
        &self,
        owner: AccountId,
        id: RecordId,
        kind: RecordKind,
        payload: String,
        annotation: String,
    ) -> StorageResult<StoredRecord> {
        let existing = self.get(owner, id)?;
        if existing.kind != kind {
            return Err(StorageError::KindMismatch {
                stored: existing.kind,
                supplied: kind,
            });
        }

        let updated = StoredRecord {
            payload,
            annotation,
            uploaded_at: Utc::now(),
            ..existing
        };
        let json = serde_json::to_vec(&updated)?;

        let write_txn = self.db.begin_write()?;
        let present = {
            let mut table = write_txn.open_table(RECORDS)?;
            let present = table.get((owner, id))?.is_some();
            if present {
                table.insert((owner, id), json.as_slice())?;
            }
            present
        };

        if !present {
            write_txn.abort()?;
            return Err(StorageError::NoRowsAffected(format!("update of record {id}")));
        }
        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a record owned by `owner`.
    pub fn delete(&self, owner: AccountId, id: RecordId) -> StorageResult<()> {
        self.get(owner, id)?;

        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(RECORDS)?;
            let removed = table.remove((owner, id))?.is_some();
            removed
        };

        if !removed {
            write_txn.abort()?;
            return Err(StorageError::NoRowsAffected(format!("delete of record {id}")));
        }
        write_txn.commit()?;
        Ok(())
    }
}
