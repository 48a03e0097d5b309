// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Record CRUD handlers.
//!
//! Payload and annotation are sealed independently with the envelope cipher
//! before they reach the store and opened again on the way out. Every call is
//! scoped to the caller's account id from the verified call context.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    auth::Caller,
    cipher::EnvelopeCipher,
    error::{ApiError, ErrorBody},
    models::{DataListResponse, DataRecord, DataRequest, RecordId, SecretPayload},
    state::AppState,
    storage::StoredRecord,
};

/// Ciphertext pair ready for the store.
struct Sealed {
    payload: String,
    annotation: String,
}

/// Validate and encrypt a create/update request.
fn seal(cipher: &EnvelopeCipher, request: &DataRequest) -> Result<Sealed, ApiError> {
    request.secret.validate().map_err(ApiError::bad_request)?;

    let plaintext = request
        .secret
        .to_bytes()
        .map_err(|e| ApiError::internal("Failed to serialize payload", e))?;
    Ok(Sealed {
        payload: cipher.encrypt(&plaintext)?,
        annotation: cipher.encrypt_str(&request.annotation)?,
    })
}

/// Decrypt a stored record. Any failure is an internal error.
fn open(cipher: &EnvelopeCipher, stored: StoredRecord) -> Result<DataRecord, ApiError> {
    let plaintext = cipher.decrypt(&stored.payload)?;
    let secret = SecretPayload::from_bytes(stored.kind, &plaintext).map_err(|e| {
        ApiError::internal(
            &format!("Record {} payload does not match kind {}", stored.id, stored.kind),
            e,
        )
    })?;
    let annotation = cipher.decrypt_string(&stored.annotation)?;

    Ok(DataRecord {
        id: stored.id,
        secret,
        annotation,
        uploaded_at: stored.uploaded_at,
    })
}

#[utoipa::path(
    post,
    path = "/v1/data",
    request_body = DataRequest,
    tag = "Data",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Record stored", body = DataRecord),
        (status = 400, description = "Malformed payload", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn create_data(
    Caller(caller): Caller,
    State(state): State<AppState>,
    payload: Result<Json<DataRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataRecord>), ApiError> {
    let Json(request) = payload?;
    let sealed = seal(&state.cipher, &request)?;

    let stored = state.records().create(
        caller.account_id(),
        request.secret.kind(),
        sealed.payload,
        sealed.annotation,
    )?;

    info!(
        account_id = caller.account_id(),
        record_id = stored.id,
        kind = %stored.kind,
        "Record created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataRecord {
            id: stored.id,
            secret: request.secret,
            annotation: request.annotation,
            uploaded_at: stored.uploaded_at,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/data",
    tag = "Data",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All records owned by the caller", body = DataListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn list_data(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> Result<Json<DataListResponse>, ApiError> {
    let records = state
        .records()
        .list(caller.account_id())?
        .into_iter()
        .map(|stored| open(&state.cipher, stored))
        .collect::<Result<Vec<_>, _>>()?;

    let total = records.len();
    Ok(Json(DataListResponse { records, total }))
}

#[utoipa::path(
    get,
    path = "/v1/data/{id}",
    params(
        ("id" = u64, Path, description = "Identifier of the record")
    ),
    tag = "Data",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The record", body = DataRecord),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No such record for this caller", body = ErrorBody)
    )
)]
pub async fn get_data(
    Caller(caller): Caller,
    State(state): State<AppState>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<DataRecord>, ApiError> {
    let Path(id) = id?;
    let stored = state.records().get(caller.account_id(), id)?;
    Ok(Json(open(&state.cipher, stored)?))
}

#[utoipa::path(
    put,
    path = "/v1/data/{id}",
    params(
        ("id" = u64, Path, description = "Identifier of the record to replace")
    ),
    request_body = DataRequest,
    tag = "Data",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Record updated"),
        (status = 400, description = "Malformed payload or kind change", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No such record for this caller", body = ErrorBody)
    )
)]
pub async fn update_data(
    Caller(caller): Caller,
    State(state): State<AppState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<DataRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let sealed = seal(&state.cipher, &request)?;

    state.records().update(
        caller.account_id(),
        id,
        request.secret.kind(),
        sealed.payload,
        sealed.annotation,
    )?;

    info!(account_id = caller.account_id(), record_id = id, "Record updated");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/data/{id}",
    params(
        ("id" = u64, Path, description = "Identifier of the record to delete")
    ),
    tag = "Data",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No such record for this caller", body = ErrorBody)
    )
)]
pub async fn delete_data(
    Caller(caller): Caller,
    State(state): State<AppState>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.records().delete(caller.account_id(), id)?;

    info!(account_id = caller.account_id(), record_id = id, "Record deleted");
    Ok(StatusCode::NO_CONTENT)
}
