// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed HTTP client for the Pass Keeper API.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Certificate, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::ClientError;
use crate::api::{LOGIN_PATH, REGISTER_PATH};
use crate::models::{
    DataListResponse, DataRecord, DataRequest, LoginRequest, RecordId, RegisterRequest,
    TokenResponse,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, e.g. `https://vault.example.com:8080`
    pub base_url: String,
    /// Extra PEM root certificate to trust (self-signed deployments).
    pub root_certificate: Option<PathBuf>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            root_certificate: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_root_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_certificate = Some(path.into());
        self
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_code: String,
}

/// Remote calls, one method per server operation.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let parsed = Url::parse(&config.base_url)?;

        let mut builder = Client::builder().timeout(config.timeout);
        if let Some(path) = &config.root_certificate {
            let pem = std::fs::read(path)?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<String, ClientError> {
        let response: TokenResponse =
            read_json(self.http.post(self.url(REGISTER_PATH)).json(request)).await?;
        Ok(response.token)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<String, ClientError> {
        let response: TokenResponse =
            read_json(self.http.post(self.url(LOGIN_PATH)).json(request)).await?;
        Ok(response.token)
    }

    pub async fn create_data(
        &self,
        token: &str,
        request: &DataRequest,
    ) -> Result<DataRecord, ClientError> {
        read_json(
            self.http
                .post(self.url("/v1/data"))
                .bearer_auth(token)
                .json(request),
        )
        .await
    }

    pub async fn list_data(&self, token: &str) -> Result<Vec<DataRecord>, ClientError> {
        let response: DataListResponse =
            read_json(self.http.get(self.url("/v1/data")).bearer_auth(token)).await?;
        Ok(response.records)
    }

    pub async fn get_data(&self, token: &str, id: RecordId) -> Result<DataRecord, ClientError> {
        read_json(
            self.http
                .get(self.url(&format!("/v1/data/{id}")))
                .bearer_auth(token),
        )
        .await
    }

    pub async fn update_data(
        &self,
        token: &str,
        id: RecordId,
        request: &DataRequest,
    ) -> Result<(), ClientError> {
        expect_success(
            self.http
                .put(self.url(&format!("/v1/data/{id}")))
                .bearer_auth(token)
                .json(request),
        )
        .await
        .map(drop)
    }

    pub async fn delete_data(&self, token: &str, id: RecordId) -> Result<(), ClientError> {
        expect_success(
            self.http
                .delete(self.url(&format!("/v1/data/{id}")))
                .bearer_auth(token),
        )
        .await
        .map(drop)
    }
}

async fn read_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = expect_success(request).await?;
    Ok(response.json().await?)
}

async fn expect_success(request: RequestBuilder) -> Result<Response, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) => (parsed.error_code, parsed.error),
        Err(_) => (String::new(), body),
    };
    Err(ClientError::from_response(status, code, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new(&ClientConfig::new("http://127.0.0.1:8080/")).unwrap();
        assert_eq!(client.url("/v1/data"), "http://127.0.0.1:8080/v1/data");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new(&ClientConfig::new("not a url")),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn missing_root_certificate_is_io_error() {
        let config = ClientConfig::new("https://vault.example.com")
            .with_root_certificate("/nonexistent/ca.pem");
        assert!(matches!(ApiClient::new(&config), Err(ClientError::Io(_))));
    }
}
