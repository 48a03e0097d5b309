// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Local Mirror
//!
//! Client-side cache of the caller's records, bucketed per kind, plus the
//! current session token. One reader/writer lock guards all of it, so a
//! rebuild is observed either entirely or not at all.
//!
//! The mirror is never authoritative: [`LocalMirror::replace_all`] discards
//! every bucket and refills it from a fresh server listing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::ClientError;
use crate::models::{
    BinaryData, CardData, DataRecord, PairData, RecordId, RecordKind, SecretPayload, TextData,
};

/// One mirrored record of a given payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorEntry<T> {
    pub id: RecordId,
    #[serde(flatten)]
    pub data: T,
    pub annotation: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Point-in-time copy of every bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MirrorSnapshot {
    pub pairs: Vec<MirrorEntry<PairData>>,
    pub texts: Vec<MirrorEntry<TextData>>,
    pub binaries: Vec<MirrorEntry<BinaryData>>,
    pub cards: Vec<MirrorEntry<CardData>>,
}

impl MirrorSnapshot {
    /// Total number of mirrored records.
    pub fn len(&self) -> usize {
        self.pairs.len() + self.texts.len() + self.binaries.len() + self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, record: DataRecord) {
        let DataRecord {
            id,
            secret,
            annotation,
            uploaded_at,
        } = record;
        match secret {
            SecretPayload::Pair(data) => self.pairs.push(MirrorEntry {
                id,
                data,
                annotation,
                uploaded_at,
            }),
            SecretPayload::Text(data) => self.texts.push(MirrorEntry {
                id,
                data,
                annotation,
                uploaded_at,
            }),
            SecretPayload::Binary(data) => self.binaries.push(MirrorEntry {
                id,
                data,
                annotation,
                uploaded_at,
            }),
            SecretPayload::Card(data) => self.cards.push(MirrorEntry {
                id,
                data,
                annotation,
                uploaded_at,
            }),
        }
    }
}

#[derive(Debug, Default)]
struct MirrorState {
    token: Option<String>,
    records: MirrorSnapshot,
}

/// Lock-guarded local cache.
#[derive(Debug, Default)]
pub struct LocalMirror {
    state: RwLock<MirrorState>,
}

impl LocalMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn set_token(&self, token: String) {
        self.state.write().await.token = Some(token);
    }

    pub async fn clear_token(&self) {
        self.state.write().await.token = None;
    }

    /// Discard every bucket and redistribute `records` by kind.
    pub async fn replace_all(&self, records: Vec<DataRecord>) {
        let mut rebuilt = MirrorSnapshot::default();
        for record in records {
            rebuilt.push(record);
        }
        self.state.write().await.records = rebuilt;
    }

    pub async fn snapshot(&self) -> MirrorSnapshot {
        self.state.read().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Write one bucket as indented JSON to `path`.
    pub async fn export(&self, kind: RecordKind, path: &Path) -> Result<(), ClientError> {
        let json = {
            let state = self.state.read().await;
            let records = &state.records;
            match kind {
                RecordKind::Pair => serde_json::to_vec_pretty(&records.pairs)?,
                RecordKind::Text => serde_json::to_vec_pretty(&records.texts)?,
                RecordKind::Binary => serde_json::to_vec_pretty(&records.binaries)?,
                RecordKind::Card => serde_json::to_vec_pretty(&records.cards)?,
            }
        };
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

/// Session token persisted between client runs.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct CachedToken {
    token: String,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the cached token, if any.
    pub async fn load(&self) -> Result<Option<String>, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let cached: CachedToken = serde_json::from_slice(&bytes)?;
                Ok(Some(cached.token).filter(|token| !token.is_empty()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the token, readable by the owner only on unix.
    pub async fn save(&self, token: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec(&CachedToken {
            token: token.to_string(),
        })?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).await?;

        // `mode` only applies on creation; tighten a pre-existing file too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        file.write_all(&json).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: RecordId, secret: SecretPayload) -> DataRecord {
        DataRecord {
            id,
            secret,
            annotation: format!("note {id}"),
            uploaded_at: Utc::now(),
        }
    }

    fn pair(key: &str) -> SecretPayload {
        SecretPayload::Pair(PairData {
            key: key.to_string(),
            pwd: "pw".to_string(),
        })
    }

    fn text(body: &str) -> SecretPayload {
        SecretPayload::Text(TextData {
            text: body.to_string(),
        })
    }

    #[tokio::test]
    async fn replace_all_buckets_by_kind() {
        let mirror = LocalMirror::new();
        mirror
            .replace_all(vec![record(1, pair("a")), record(2, text("b")), record(3, pair("c"))])
            .await;

        let snapshot = mirror.snapshot().await;
        assert_eq!(snapshot.pairs.len(), 2);
        assert_eq!(snapshot.texts.len(), 1);
        assert!(snapshot.binaries.is_empty());
        assert!(snapshot.cards.is_empty());
        assert_eq!(snapshot.pairs[1].data.key, "c");
    }

    #[tokio::test]
    async fn replace_all_discards_previous_contents() {
        let mirror = LocalMirror::new();
        mirror.replace_all(vec![record(1, pair("a")), record(2, pair("b"))]).await;
        mirror.replace_all(vec![record(3, text("c"))]).await;

        let snapshot = mirror.snapshot().await;
        assert!(snapshot.pairs.is_empty());
        assert_eq!(snapshot.texts[0].id, 3);
        assert_eq!(mirror.len().await, 1);
    }

    #[tokio::test]
    async fn token_is_held_alongside_records() {
        let mirror = LocalMirror::new();
        assert!(mirror.token().await.is_none());

        mirror.set_token("t1".to_string()).await;
        mirror.replace_all(Vec::new()).await;
        assert_eq!(mirror.token().await.as_deref(), Some("t1"));

        mirror.clear_token().await;
        assert!(mirror.token().await.is_none());
    }

    #[tokio::test]
    async fn export_writes_flat_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pairs.json");
        let mirror = LocalMirror::new();
        mirror.replace_all(vec![record(7, pair("github"))]).await;

        mirror.export(RecordKind::Pair, &path).await.unwrap();

        let exported: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(exported[0]["id"], 7);
        assert_eq!(exported[0]["key"], "github");
        assert_eq!(exported[0]["annotation"], "note 7");
    }

    #[tokio::test]
    async fn token_cache_round_trips() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("session").join("token.json"));

        assert!(cache.load().await.unwrap().is_none());
        cache.save("abc").await.unwrap();
        assert_eq!(cache.load().await.unwrap().as_deref(), Some("abc"));
        cache.clear().await.unwrap();
        assert!(cache.load().await.unwrap().is_none());
        cache.clear().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn token_cache_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, b"{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let cache = TokenCache::new(&path);
        cache.save("secret-token").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(cache.load().await.unwrap().as_deref(), Some("secret-token"));

        cache.clear().await.unwrap();
        cache.save("fresh").await.unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
