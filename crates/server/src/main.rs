use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use server_api::ApiContext;
use shared::{
    domain::{seed_catalog, BikeModel},
    error::{ApiError, ErrorCode},
    protocol::{
        bikes_route, register_route, verify_serial_number_route, RegistrationOutcome,
        API_BASE_PATH, INTERNAL_SERVER_ERROR, SERIAL_NUMBER_NOT_FOUND, SERIAL_NUMBER_REQUIRED,
    },
    registration::RegistrationPayload,
};
use storage::Storage;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, normalize_database_url};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    if settings.seed_catalog {
        let inserted = storage.seed_catalog(&seed_catalog()).await?;
        info!(inserted, "bike catalog seeded");
    }

    let state = AppState {
        api: ApiContext {
            storage: storage.clone(),
        },
        verify_delay: settings.verify_delay(),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, verify_delay_ms = settings.verify_delay_ms, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    storage.close().await;
    info!("database closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(verify_serial_number_route(), post(verify_serial_number))
        .route(bikes_route(), post(verify_serial_number))
        .route(register_route(), post(register_bike));

    Router::new()
        .route("/healthz", get(healthz))
        .nest(API_BASE_PATH, api)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            warn!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// How a lookup body's `serialNumber` reads. Absent, `null`, `false`, `0`
/// and blank strings count as missing; other non-string values can never
/// match a catalog entry.
#[derive(Debug, PartialEq, Eq)]
enum SerialNumberField<'a> {
    Missing,
    Text(&'a str),
    Unmatchable,
}

fn serial_number_field(body: &Value) -> SerialNumberField<'_> {
    match body.get("serialNumber") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => SerialNumberField::Missing,
        Some(Value::String(serial)) if serial.trim().is_empty() => SerialNumberField::Missing,
        Some(Value::String(serial)) => SerialNumberField::Text(serial.trim()),
        Some(Value::Number(number)) if number.as_f64() == Some(0.0) => SerialNumberField::Missing,
        Some(_) => SerialNumberField::Unmatchable,
    }
}

async fn verify_serial_number(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BikeModel>, (StatusCode, Json<ApiError>)> {
    let Json(body) = body.map_err(|rejection| {
        error!(error = %rejection, "unreadable serial number lookup body");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, INTERNAL_SERVER_ERROR)),
        )
    })?;

    let serial_number = match serial_number_field(&body) {
        SerialNumberField::Missing => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ApiError::new(ErrorCode::Validation, SERIAL_NUMBER_REQUIRED)),
            ))
        }
        SerialNumberField::Text(serial) => Some(serial),
        SerialNumberField::Unmatchable => None,
    };

    if !state.verify_delay.is_zero() {
        tokio::time::sleep(state.verify_delay).await;
    }

    let result = match serial_number {
        Some(serial) => server_api::verify_serial_number(&state.api, Some(serial)).await,
        None => {
            warn!(value = %body["serialNumber"], "serial number lookup with a non-string value");
            Err(ApiError::new(ErrorCode::NotFound, SERIAL_NUMBER_NOT_FOUND))
        }
    };
    result.map(Json).map_err(|err| {
        let status = match err.code {
            ErrorCode::Validation => StatusCode::BAD_REQUEST,
            code => status_for(code),
        };
        (status, Json(err))
    })
}

async fn register_bike(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegistrationPayload>, JsonRejection>,
) -> Result<Json<RegistrationOutcome>, (StatusCode, Json<RegistrationOutcome>)> {
    let Json(payload) = body.map_err(|rejection| {
        warn!(error = %rejection, "rejected registration body");
        (
            StatusCode::BAD_REQUEST,
            Json(RegistrationOutcome::failed(rejection.body_text())),
        )
    })?;

    server_api::register_bike(&state.api, &payload)
        .await
        .map(Json)
        .map_err(|err| {
            (
                status_for(err.code),
                Json(RegistrationOutcome::failed(err.message)),
            )
        })
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
