// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{authorize, AuthGate},
    error::ErrorBody,
    models::{
        BinaryData, CardData, DataListResponse, DataRecord, DataRequest, LoginRequest, PairData,
        RecordKind, RegisterRequest, SecretPayload, TextData, TokenResponse,
    },
    state::AppState,
};

pub mod auth;
pub mod data;
pub mod health;

pub const REGISTER_PATH: &str = "/v1/auth/register";
pub const LOGIN_PATH: &str = "/v1/auth/login";

/// Operations callable without a session token.
pub const PUBLIC_OPERATIONS: &[&str] = &[REGISTER_PATH, LOGIN_PATH];

pub fn router(state: AppState) -> Router {
    let gate = AuthGate::new(state.tokens.clone(), PUBLIC_OPERATIONS);

    let v1_routes = Router::new()
        .route(REGISTER_PATH, post(auth::register_user))
        .route(LOGIN_PATH, post(auth::login_user))
        .route("/v1/data", get(data::list_data).post(data::create_data))
        .route(
            "/v1/data/{id}",
            get(data::get_data)
                .put(data::update_data)
                .delete(data::delete_data),
        )
        .layer(from_fn_with_state(gate, authorize))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_user,
        auth::login_user,
        data::create_data,
        data::list_data,
        data::get_data,
        data::update_data,
        data::delete_data,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            RecordKind,
            SecretPayload,
            PairData,
            TextData,
            BinaryData,
            CardData,
            DataRecord,
            DataRequest,
            DataListResponse,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            ErrorBody
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Auth", description = "Account registration and login"),
        (name = "Data", description = "Encrypted record storage"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
