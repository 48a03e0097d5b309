// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account repository.
//!
//! Usernames are unique; the uniqueness check and the insert run inside the
//! same write transaction.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{next_sequence, ACCOUNTS, ACCOUNT_SEQUENCE, ACCOUNT_USERNAMES};
use super::super::{StorageError, StorageResult, VaultDatabase};
use crate::models::AccountId;

/// Account as persisted in the `accounts` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAccount {
    pub id: AccountId,
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Repository for account operations.
pub struct AccountRepository<'a> {
    db: &'a VaultDatabase,
}

impl<'a> AccountRepository<'a> {
    /// Create a new AccountRepository.
    pub fn new(db: &'a VaultDatabase) -> Self {
        Self { db }
    }

    /// Create an account; `AlreadyExists` if the username is taken.
    pub fn create(
        &self,
        username: &str,
        password_hash: String,
        email: Option<String>,
    ) -> StorageResult<StoredAccount> {
        let write_txn = self.db.begin_write()?;
        let account = {
            let mut usernames = write_txn.open_table(ACCOUNT_USERNAMES)?;
            let taken = usernames.get(username)?.is_some();
            if taken {
                None
            } else {
                let id = next_sequence(&write_txn, ACCOUNT_SEQUENCE)?;
                let account = StoredAccount {
                    id,
                    username: username.to_string(),
                    password_hash,
                    email,
                    created_at: Utc::now(),
                };
                let json = serde_json::to_vec(&account)?;

                let mut accounts = write_txn.open_table(ACCOUNTS)?;
                accounts.insert(id, json.as_slice())?;
                usernames.insert(username, id)?;
                Some(account)
            }
        };

        match account {
            Some(account) => {
                write_txn.commit()?;
                Ok(account)
            }
            None => {
                write_txn.abort()?;
                Err(StorageError::AlreadyExists(format!("Account {username}")))
            }
        }
    }

    /// Look up an account by username.
    pub fn find_by_username(&self, username: &str) -> StorageResult<Option<StoredAccount>> {
        let read_txn = self.db.begin_read()?;
        let usernames = read_txn.open_table(ACCOUNT_USERNAMES)?;
        let id = match usernames.get(username)? {
            Some(value) => value.value(),
            None => return Ok(None),
        };

        let accounts = read_txn.open_table(ACCOUNTS)?;
        match accounts.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Err(StorageError::NotFound(format!("Account {id}"))),
        }
    }

    /// Get an account by id.
    pub fn get(&self, id: AccountId) -> StorageResult<StoredAccount> {
        let read_txn = self.db.begin_read()?;
        let accounts = read_txn.open_table(ACCOUNTS)?;
        let account = match accounts.get(id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::NotFound(format!("Account {id}"))),
        };
        Ok(account)
    }
}
