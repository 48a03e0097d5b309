// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API error type and the mapping from internal failures to the caller-visible
//! categories `Unauthenticated`, `AlreadyExists`, `NotFound`,
//! `InvalidArgument`, and `Internal`.
//!
//! Internal causes are logged server-side and never echoed to the caller.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::cipher::CipherError;
use crate::storage::StorageError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "already_exists", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_argument", message)
    }

    /// Log `cause` and return a generic internal error.
    pub fn internal(context: &str, cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "{context}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Internal server error",
        )
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(msg) => ApiError::internal("Authentication failure", msg),
            other => ApiError::new(other.status_code(), other.error_code(), other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => ApiError::not_found("Record not found"),
            StorageError::AlreadyExists(_) => ApiError::already_exists("Login is already taken"),
            StorageError::KindMismatch { stored, supplied } => ApiError::bad_request(format!(
                "Record kind cannot change (stored {stored}, supplied {supplied})"
            )),
            other => ApiError::internal("Storage failure", other),
        }
    }
}

impl From<CipherError> for ApiError {
    fn from(err: CipherError) -> Self {
        ApiError::internal("Envelope cipher failure", err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_code() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.code, "invalid_argument");

        let dup = ApiError::already_exists("dup");
        assert_eq!(dup.status, StatusCode::CONFLICT);
    }

    #[test]
    fn storage_errors_map_to_categories() {
        let nf: ApiError = StorageError::NotFound("Record 9".into()).into();
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert!(!nf.message.contains('9'));

        let mismatch: ApiError = StorageError::KindMismatch {
            stored: RecordKind::Pair,
            supplied: RecordKind::Card,
        }
        .into();
        assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);

        let lost: ApiError = StorageError::NoRowsAffected("update of record 9".into()).into();
        assert_eq!(lost.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(lost.message, "Internal server error");
    }

    #[test]
    fn expired_token_keeps_its_code() {
        let err: ApiError = AuthError::TokenExpired.into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "token_expired");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data","error_code":"invalid_argument"}"#);
    }
}
