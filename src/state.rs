// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenManager;
use crate::cipher::EnvelopeCipher;
use crate::storage::{AccountRepository, RecordRepository, VaultDatabase};

/// Shared server state. Every component is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<VaultDatabase>,
    pub tokens: Arc<TokenManager>,
    pub cipher: Arc<EnvelopeCipher>,
}

impl AppState {
    pub fn new(database: VaultDatabase, tokens: TokenManager, cipher: EnvelopeCipher) -> Self {
        Self {
            database: Arc::new(database),
            tokens: Arc::new(tokens),
            cipher: Arc::new(cipher),
        }
    }

    pub fn records(&self) -> RecordRepository<'_> {
        RecordRepository::new(&self.database)
    }

    pub fn accounts(&self) -> AccountRepository<'_> {
        AccountRepository::new(&self.database)
    }
}
