// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded record database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `accounts`: account_id → serialized StoredAccount
//! - `account_usernames`: username → account_id (uniqueness index)
//! - `pass_keeper_data`: (owner_id, record_id) → serialized StoredRecord
//! - `sequences`: name → last issued id
//!
//! Records are keyed by owner first, so listing a caller's records is a
//! single range scan that can never reach another owner's rows.

use std::fs;
use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

use super::retry::RetryPolicy;
use crate::models::RecordKind;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary account table: account_id → serialized StoredAccount (JSON bytes).
pub(crate) const ACCOUNTS: TableDefinition<u64, &[u8]> = TableDefinition::new("accounts");

/// Index: username → account_id.
pub(crate) const ACCOUNT_USERNAMES: TableDefinition<&str, u64> =
    TableDefinition::new("account_usernames");

/// Record table: (owner_id, record_id) → serialized StoredRecord (JSON bytes).
pub(crate) const RECORDS: TableDefinition<(u64, u64), &[u8]> =
    TableDefinition::new("pass_keeper_data");

/// Id sequences: name → last issued value.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub(crate) const ACCOUNT_SEQUENCE: &str = "accounts";
pub(crate) const RECORD_SEQUENCE: &str = "records";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("record is {stored}, update supplied {supplied}")]
    KindMismatch {
        stored: RecordKind,
        supplied: RecordKind,
    },

    #[error("no rows affected: {0}")]
    NoRowsAffected(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// VaultDatabase
// =============================================================================

/// Embedded ACID record database.
pub struct VaultDatabase {
    db: Database,
    retry: RetryPolicy,
}

impl VaultDatabase {
    /// Open (or create) the database at `path`, retrying per `retry`.
    ///
    /// Both the open and the initial ping go through the retry policy; the
    /// error of the last attempt is returned if the store stays unreachable.
    pub async fn connect(path: &Path, retry: RetryPolicy) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let db = retry.run("open database", || Database::create(path)).await?;
        let database = Self { db, retry };
        database.initialize_tables()?;
        database.ping().await?;

        tracing::info!(path = %path.display(), "Record database ready");
        Ok(database)
    }

    /// Open (or create) the database at `path` with a single attempt.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let database = Self {
            db: Database::create(path)?,
            retry: RetryPolicy::no_retry(),
        };
        database.initialize_tables()?;
        Ok(database)
    }

    /// Pre-create all tables so later read transactions don't fail.
    fn initialize_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS)?;
            let _ = write_txn.open_table(ACCOUNT_USERNAMES)?;
            let _ = write_txn.open_table(RECORDS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Verify the store answers, retrying per the configured policy.
    pub async fn ping(&self) -> StorageResult<()> {
        self.retry.run("ping", || self.check()).await
    }

    /// Single liveness probe: open a read transaction and touch a table.
    pub fn check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCES)?;
        let _ = table.get(RECORD_SEQUENCE)?;
        Ok(())
    }

    pub(crate) fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    pub(crate) fn begin_read(&self) -> StorageResult<redb::ReadTransaction> {
        Ok(self.db.begin_read()?)
    }
}

/// Issue the next value of sequence `name` inside `write_txn`.
///
/// Write transactions are serialized by redb, so concurrent callers always
/// observe distinct values.
pub(crate) fn next_sequence(write_txn: &WriteTransaction, name: &str) -> StorageResult<u64> {
    let mut table = write_txn.open_table(SEQUENCES)?;
    let current = table.get(name)?.map(|value| value.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(name, next)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn connect_creates_database_and_pings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("vault.redb");

        let db = VaultDatabase::connect(&path, RetryPolicy::default()).await.unwrap();
        assert!(path.exists());
        db.ping().await.unwrap();
        db.check().unwrap();
    }

    #[tokio::test]
    async fn connect_gives_up_after_retries() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened as a database file.
        let path = dir.path().to_path_buf();
        let policy = RetryPolicy::new(2, Duration::from_millis(1), 1.5);

        assert!(VaultDatabase::connect(&path, policy).await.is_err());
    }

    #[test]
    fn sequences_are_monotonic_and_independent() {
        let dir = TempDir::new().unwrap();
        let db = VaultDatabase::open(&dir.path().join("vault.redb")).unwrap();

        let write_txn = db.begin_write().unwrap();
        assert_eq!(next_sequence(&write_txn, RECORD_SEQUENCE).unwrap(), 1);
        assert_eq!(next_sequence(&write_txn, RECORD_SEQUENCE).unwrap(), 2);
        assert_eq!(next_sequence(&write_txn, ACCOUNT_SEQUENCE).unwrap(), 1);
        write_txn.commit().unwrap();

        let write_txn = db.begin_write().unwrap();
        assert_eq!(next_sequence(&write_txn, RECORD_SEQUENCE).unwrap(), 3);
        write_txn.abort().unwrap();
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.redb");
        {
            let db = VaultDatabase::open(&path).unwrap();
            let write_txn = db.begin_write().unwrap();
            next_sequence(&write_txn, RECORD_SEQUENCE).unwrap();
            write_txn.commit().unwrap();
        }

        let db = VaultDatabase::open(&path).unwrap();
        let write_txn = db.begin_write().unwrap();
        assert_eq!(next_sequence(&write_txn, RECORD_SEQUENCE).unwrap(), 2);
    }
}
