// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Sync Service
//!
//! Client orchestration over [`ApiClient`] and [`LocalMirror`]:
//!
//! - `register` / `login` obtain a token and keep it in the mirror (and the
//!   optional on-disk [`TokenCache`])
//! - `push` / `update` / `remove` forward single-record writes; the mirror is
//!   only refreshed by an explicit `pull`
//! - `pull` lists every record and rebuilds the mirror from scratch
//! - `download_binary` writes one stored file back to disk
//!
//! Every data call fails locally with `Unauthenticated` before any network
//! traffic if no token is held.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use super::{ApiClient, ClientError, LocalMirror, TokenCache};
use crate::models::{
    DataRecord, DataRequest, LoginRequest, RecordId, RegisterRequest, SecretPayload,
};

pub struct SyncService {
    api: ApiClient,
    mirror: Arc<LocalMirror>,
    token_cache: Option<TokenCache>,
}

impl SyncService {
    pub fn new(api: ApiClient, mirror: Arc<LocalMirror>) -> Self {
        Self {
            api,
            mirror,
            token_cache: None,
        }
    }

    /// Persist tokens to `cache` after every register/login.
    pub fn with_token_cache(mut self, cache: TokenCache) -> Self {
        self.token_cache = Some(cache);
        self
    }

    pub fn mirror(&self) -> &Arc<LocalMirror> {
        &self.mirror
    }

    /// Load a previously cached token into the mirror.
    ///
    /// Returns whether a token was found. The token is not checked against
    /// the server; an expired one surfaces on the next data call.
    pub async fn restore_session(&self) -> Result<bool, ClientError> {
        let Some(cache) = &self.token_cache else {
            return Ok(false);
        };
        match cache.load().await? {
            Some(token) => {
                self.mirror.set_token(token).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
    ) -> Result<(), ClientError> {
        let token = self
            .api
            .register(&RegisterRequest {
                username: username.to_string(),
                password: password.to_string(),
                email,
            })
            .await?;
        self.store_token(token).await?;
        info!(username, "Registered");
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let token = self
            .api
            .login(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.store_token(token).await?;
        info!(username, "Logged in");
        Ok(())
    }

    /// Drop the session token locally and from the cache.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.mirror.clear_token().await;
        if let Some(cache) = &self.token_cache {
            cache.clear().await?;
        }
        Ok(())
    }

    /// Store a new record on the server.
    pub async fn push(
        &self,
        secret: SecretPayload,
        annotation: impl Into<String>,
    ) -> Result<DataRecord, ClientError> {
        let token = self.bearer().await?;
        let record = self
            .api
            .create_data(
                &token,
                &DataRequest {
                    secret,
                    annotation: annotation.into(),
                },
            )
            .await?;
        debug!(record_id = record.id, kind = %record.secret.kind(), "Pushed record");
        Ok(record)
    }

    /// Replace an existing record on the server.
    pub async fn update(
        &self,
        id: RecordId,
        secret: SecretPayload,
        annotation: impl Into<String>,
    ) -> Result<(), ClientError> {
        let token = self.bearer().await?;
        self.api
            .update_data(
                &token,
                id,
                &DataRequest {
                    secret,
                    annotation: annotation.into(),
                },
            )
            .await?;
        debug!(record_id = id, "Updated record");
        Ok(())
    }

    /// Rebuild the mirror from the server's current listing.
    ///
    /// The listing is fetched and decoded in full before the mirror is
    /// touched; any failure leaves the previous contents in place.
    pub async fn pull(&self) -> Result<usize, ClientError> {
        let token = self.bearer().await?;
        let records = self.api.list_data(&token).await?;
        let count = records.len();
        self.mirror.replace_all(records).await;
        info!(count, "Mirror rebuilt from server");
        Ok(count)
    }

    /// Delete a record on the server. The mirror is left as is until the
    /// next `pull`.
    pub async fn remove(&self, id: RecordId) -> Result<(), ClientError> {
        let token = self.bearer().await?;
        self.api.delete_data(&token, id).await?;
        debug!(record_id = id, "Removed record");
        Ok(())
    }

    /// Fetch a single record straight from the server.
    pub async fn get(&self, id: RecordId) -> Result<DataRecord, ClientError> {
        let token = self.bearer().await?;
        self.api.get_data(&token, id).await
    }

    /// Fetch one BINARY record and write its raw bytes to
    /// `dir/<file_name>`, returning the written path.
    ///
    /// The stored file name must be a single path component.
    pub async fn download_binary(
        &self,
        id: RecordId,
        dir: &Path,
    ) -> Result<PathBuf, ClientError> {
        let record = self.get(id).await?;
        let kind = record.secret.kind();
        let SecretPayload::Binary(data) = record.secret else {
            return Err(ClientError::InvalidArgument(format!(
                "record {id} is {kind}, not BINARY"
            )));
        };

        let file_name = plain_file_name(&data.file_name).ok_or_else(|| {
            ClientError::InvalidArgument(format!(
                "record {id} has unusable file name {:?}",
                data.file_name
            ))
        })?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &data.binary).await?;
        info!(
            record_id = id,
            path = %path.display(),
            bytes = data.binary.len(),
            "Downloaded file"
        );
        Ok(path)
    }

    async fn bearer(&self) -> Result<String, ClientError> {
        self.mirror.token().await.ok_or_else(ClientError::no_session)
    }

    async fn store_token(&self, token: String) -> Result<(), ClientError> {
        if let Some(cache) = &self.token_cache {
            cache.save(&token).await?;
        }
        self.mirror.set_token(token).await;
        Ok(())
    }
}

/// `name` if it is one normal path component (no separators, not `.`/`..`).
fn plain_file_name(name: &str) -> Option<&str> {
    if name.contains(['/', '\\']) {
        return None;
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::client::ClientConfig;
    use crate::models::{BinaryData, CardData, PairData, TextData};
    use crate::test_support::test_state;
    use tempfile::TempDir;

    /// Serve the full router on an ephemeral port.
    async fn spawn_server(dir: &TempDir) -> String {
        let app = router(test_state(dir.path()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn service(base_url: &str) -> SyncService {
        let api = ApiClient::new(&ClientConfig::new(base_url)).unwrap();
        SyncService::new(api, Arc::new(LocalMirror::new()))
    }

    fn pair(key: &str, pwd: &str) -> SecretPayload {
        SecretPayload::Pair(PairData {
            key: key.to_string(),
            pwd: pwd.to_string(),
        })
    }

    #[tokio::test]
    async fn data_calls_without_session_fail_locally() {
        // Nothing listens here; a network attempt would be a transport error.
        let sync = service("http://127.0.0.1:9");

        let err = sync.pull().await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated { .. }));
        let err = sync.push(pair("a", "b"), "").await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated { .. }));
        let err = sync.remove(1).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn push_then_pull_populates_mirror() {
        let dir = TempDir::new().unwrap();
        let base_url = spawn_server(&dir).await;
        let sync = service(&base_url);

        sync.register("alice", "pw", None).await.unwrap();
        sync.push(pair("github", "p@ss"), "work").await.unwrap();
        sync.push(
            SecretPayload::Text(TextData {
                text: "remember the milk".to_string(),
            }),
            "",
        )
        .await
        .unwrap();
        sync.push(
            SecretPayload::Binary(BinaryData {
                file_name: "key.bin".to_string(),
                binary: vec![0, 159, 146, 150],
            }),
            "",
        )
        .await
        .unwrap();
        sync.push(
            SecretPayload::Card(CardData {
                card_num: "4111111111111111".to_string(),
                card_cvv: "123".to_string(),
                card_owner: "ALICE".to_string(),
                card_exp: "12/29".to_string(),
            }),
            "",
        )
        .await
        .unwrap();

        assert_eq!(sync.pull().await.unwrap(), 4);
        let snapshot = sync.mirror().snapshot().await;
        assert_eq!(snapshot.pairs[0].data.pwd, "p@ss");
        assert_eq!(snapshot.pairs[0].annotation, "work");
        assert_eq!(snapshot.texts.len(), 1);
        assert_eq!(snapshot.binaries[0].data.binary, vec![0, 159, 146, 150]);
        assert_eq!(snapshot.cards.len(), 1);
    }

    #[tokio::test]
    async fn remove_is_reflected_only_after_pull() {
        let dir = TempDir::new().unwrap();
        let base_url = spawn_server(&dir).await;
        let sync = service(&base_url);

        sync.register("alice", "pw", None).await.unwrap();
        let record = sync.push(pair("a", "1"), "").await.unwrap();
        sync.pull().await.unwrap();

        sync.remove(record.id).await.unwrap();
        assert_eq!(sync.mirror().len().await, 1);

        sync.pull().await.unwrap();
        assert!(sync.mirror().is_empty().await);
        assert!(matches!(sync.get(record.id).await, Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_round_trips_through_server() {
        let dir = TempDir::new().unwrap();
        let base_url = spawn_server(&dir).await;
        let sync = service(&base_url);

        sync.register("alice", "pw", None).await.unwrap();
        let record = sync.push(pair("github", "old"), "").await.unwrap();
        sync.update(record.id, pair("github", "new"), "rotated").await.unwrap();

        let fetched = sync.get(record.id).await.unwrap();
        assert_eq!(fetched.secret, pair("github", "new"));
        assert_eq!(fetched.annotation, "rotated");

        let err = sync
            .update(
                record.id,
                SecretPayload::Text(TextData {
                    text: "x".to_string(),
                }),
                "",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn accounts_do_not_see_each_other() {
        let dir = TempDir::new().unwrap();
        let base_url = spawn_server(&dir).await;
        let alice = service(&base_url);
        let bob = service(&base_url);

        alice.register("alice", "pw", None).await.unwrap();
        bob.register("bob", "pw", None).await.unwrap();
        let record = alice.push(pair("a", "1"), "").await.unwrap();

        assert_eq!(bob.pull().await.unwrap(), 0);
        assert!(matches!(bob.get(record.id).await, Err(ClientError::NotFound(_))));
        assert!(matches!(bob.remove(record.id).await, Err(ClientError::NotFound(_))));
        assert_eq!(alice.pull().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn login_errors_are_classified() {
        let dir = TempDir::new().unwrap();
        let base_url = spawn_server(&dir).await;
        let sync = service(&base_url);

        sync.register("alice", "pw", None).await.unwrap();
        assert!(matches!(
            sync.register("alice", "pw", None).await,
            Err(ClientError::AlreadyExists(_))
        ));
        assert!(matches!(
            sync.login("alice", "wrong").await,
            Err(ClientError::Unauthenticated { .. })
        ));
        sync.login("alice", "pw").await.unwrap();
    }

    #[tokio::test]
    async fn session_survives_restart_through_cache() {
        let dir = TempDir::new().unwrap();
        let base_url = spawn_server(&dir).await;
        let cache_path = dir.path().join("client").join("token.json");

        let first = service(&base_url).with_token_cache(TokenCache::new(&cache_path));
        first.register("alice", "pw", None).await.unwrap();
        first.push(pair("a", "1"), "").await.unwrap();

        let second = service(&base_url).with_token_cache(TokenCache::new(&cache_path));
        assert!(second.restore_session().await.unwrap());
        assert_eq!(second.pull().await.unwrap(), 1);

        second.logout().await.unwrap();
        assert!(!second.restore_session().await.unwrap());
    }

    #[tokio::test]
    async fn download_binary_writes_raw_bytes() {
        let dir = TempDir::new().unwrap();
        let base_url = spawn_server(&dir).await;
        let sync = service(&base_url);
        let out_dir = dir.path().join("downloads");

        sync.register("alice", "pw", None).await.unwrap();
        let bytes = vec![0u8, 159, 146, 150, 255];
        let record = sync
            .push(
                SecretPayload::Binary(BinaryData {
                    file_name: "key.bin".to_string(),
                    binary: bytes.clone(),
                }),
                "",
            )
            .await
            .unwrap();

        let path = sync.download_binary(record.id, &out_dir).await.unwrap();
        assert_eq!(path, out_dir.join("key.bin"));
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[tokio::test]
    async fn download_binary_rejects_other_kinds_and_unsafe_names() {
        let dir = TempDir::new().unwrap();
        let base_url = spawn_server(&dir).await;
        let sync = service(&base_url);
        let out_dir = dir.path().join("downloads");

        sync.register("alice", "pw", None).await.unwrap();
        let text = sync
            .push(
                SecretPayload::Text(TextData {
                    text: "not a file".to_string(),
                }),
                "",
            )
            .await
            .unwrap();
        assert!(matches!(
            sync.download_binary(text.id, &out_dir).await,
            Err(ClientError::InvalidArgument(_))
        ));

        for name in ["../escape.bin", "nested/file.bin", "..\\escape.bin", ".."] {
            let record = sync
                .push(
                    SecretPayload::Binary(BinaryData {
                        file_name: name.to_string(),
                        binary: vec![1, 2, 3],
                    }),
                    "",
                )
                .await
                .unwrap();
            assert!(matches!(
                sync.download_binary(record.id, &out_dir).await,
                Err(ClientError::InvalidArgument(_))
            ));
        }
        assert!(!dir.path().join("escape.bin").exists());
        assert!(!out_dir.exists());
    }

    #[test]
    fn plain_file_name_accepts_single_component_only() {
        assert_eq!(plain_file_name("report.pdf"), Some("report.pdf"));
        assert_eq!(plain_file_name(".hidden"), Some(".hidden"));
        assert_eq!(plain_file_name("."), None);
        assert_eq!(plain_file_name("/etc/passwd"), None);
        assert_eq!(plain_file_name("a\\b"), None);
    }
}
