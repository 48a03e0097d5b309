// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-side errors.

use reqwest::StatusCode;

/// Failure of a client operation, classified like the server's error
/// categories plus local transport and I/O failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not authenticated ({code}): {message}")]
    Unauthenticated { code: String, message: String },

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("local storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Error for a protected call attempted before register/login.
    pub fn no_session() -> Self {
        ClientError::Unauthenticated {
            code: "missing_token".to_string(),
            message: "log in or register first".to_string(),
        }
    }

    /// Map a non-success response to an error category.
    pub(crate) fn from_response(status: StatusCode, code: String, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthenticated { code, message },
            StatusCode::CONFLICT => ClientError::AlreadyExists(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::InvalidArgument(message)
            }
            other => ClientError::Server {
                status: other.as_u16(),
                message,
            },
        }
    }

    /// Whether the server rejected the session token as expired.
    pub fn is_token_expired(&self) -> bool {
        matches!(self, ClientError::Unauthenticated { code, .. } if code == "token_expired")
    }
}
