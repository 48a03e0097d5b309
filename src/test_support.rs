// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for in-crate tests.

use std::path::Path;

use crate::auth::token::DEFAULT_TOKEN_TTL;
use crate::auth::TokenManager;
use crate::cipher::{EnvelopeCipher, KEY_LEN};
use crate::state::AppState;
use crate::storage::VaultDatabase;

pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret";
pub const TEST_CRYPTO_KEY: [u8; KEY_LEN] = [42u8; KEY_LEN];

/// Server state backed by a fresh database under `dir`.
pub fn test_state(dir: &Path) -> AppState {
    let database = VaultDatabase::open(&dir.join("vault.redb")).unwrap();
    let tokens = TokenManager::new(TEST_JWT_SECRET, DEFAULT_TOKEN_TTL).unwrap();
    let cipher = EnvelopeCipher::new(&TEST_CRYPTO_KEY).unwrap();
    AppState::new(database, tokens, cipher)
}
