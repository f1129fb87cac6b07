//! Contact Book HTTP server.
//!
//! Exposes the contact repository as a JSON REST API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST`   | `/api/contacts` | Create a contact (201) |
//! | `GET`    | `/api/contacts` | Search with `firstName`, `lastName`, `phone`, `address` prefixes, `page`, `limit` |
//! | `GET`    | `/api/contacts/all` | Unfiltered listing (`page`, `limit`), served from the listing cache |
//! | `GET`    | `/api/contacts/by-phone` | Exact lookup by `phone` |
//! | `GET`    | `/api/contacts/{id}` | Lookup by id |
//! | `PUT`    | `/api/contacts/{id}` | Full or partial update |
//! | `DELETE` | `/api/contacts/{id}` | Delete |
//! | `GET`    | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Contact not found" } }
//! ```
//!
//! Error codes: `bad_request` (400), `validation_error` (400), `conflict` (400),
//! `not_found` (404), `internal` (500). Validation errors also carry a
//! `fields` array of `{ field, message }`. Store failures are logged in full
//! but only reported to the client as `Internal server error`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use contact_book_core::error::ContactError;
use contact_book_core::models::{Contact, ContactFilter, ContactPage, ContactPatch, NewContact};
use contact_book_core::query::Pagination;
use contact_book_core::repository::ContactRepository;
use contact_book_core::validate::FieldError;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    repo: Arc<ContactRepository>,
}

/// Build the repository the server runs on, honouring `[cache]`.
pub fn build_repository(config: &Config, store: SqliteStore) -> ContactRepository {
    let store = Arc::new(store);
    if config.cache.enabled {
        ContactRepository::with_cache(store, Duration::from_secs(config.cache.ttl_secs))
    } else {
        ContactRepository::new(store)
    }
}

/// Build the full router with CORS and request tracing.
pub fn router(repo: Arc<ContactRepository>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let contacts = Router::new()
        .route("/", get(handle_search).post(handle_create))
        .route("/all", get(handle_list_all))
        .route("/by-phone", get(handle_get_by_phone))
        .route(
            "/{id}",
            get(handle_get_by_id)
                .put(handle_update)
                .delete(handle_delete),
        );

    Router::new()
        .nest("/api/contacts", contacts)
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { repo })
}

/// Starts the HTTP server.
///
/// Connects to the configured database, ensures the schema exists, and
/// serves until SIGINT/SIGTERM. In-flight requests are drained and the
/// connection pool is closed before returning.
///
/// # Returns
///
/// Returns `Ok(())` after a clean shutdown, or an error if the database
/// cannot be reached or the address cannot be bound.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::run_migrations(&pool).await?;

    let repo = Arc::new(build_repository(config, SqliteStore::new(pool.clone())));
    let app = router(repo);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "contact book listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received, draining requests");
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    fields: Vec<FieldError>,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
                fields: self.fields,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError::new(StatusCode::BAD_REQUEST, "bad_request", message)
}

impl From<ContactError> for AppError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::Validation { message, fields } => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "validation_error",
                message,
                fields,
            },
            ContactError::Conflict => {
                AppError::new(StatusCode::BAD_REQUEST, "conflict", err.to_string())
            }
            ContactError::NotFound => {
                AppError::new(StatusCode::NOT_FOUND, "not_found", err.to_string())
            }
            ContactError::Store(source) => {
                error!(error = %source, "request failed on store error");
                AppError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error",
                )
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /api/contacts ============

/// Query string for `GET /api/contacts` and `GET /api/contacts/all`.
///
/// Everything is read as text so that bad `page`/`limit` values fall back to
/// defaults instead of being rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
}

impl ListParams {
    fn pagination(&self) -> Pagination {
        Pagination::from_raw(self.page.as_deref(), self.limit.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct PhoneParams {
    phone: Option<String>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// Handler for `POST /api/contacts`.
async fn handle_create(
    State(state): State<AppState>,
    body: Result<Json<NewContact>, JsonRejection>,
) -> Result<(StatusCode, Json<Contact>), AppError> {
    let Json(input) = body?;
    let contact = state.repo.create(input).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// Handler for `GET /api/contacts`.
async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ContactPage>, AppError> {
    let Query(params) = params?;
    let pagination = params.pagination();
    let filter = ContactFilter::new(
        params.first_name,
        params.last_name,
        params.phone,
        params.address,
    );
    Ok(Json(state.repo.search(&filter, pagination).await?))
}

/// Handler for `GET /api/contacts/all`.
async fn handle_list_all(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ContactPage>, AppError> {
    let Query(params) = params?;
    Ok(Json(state.repo.list_all(params.pagination()).await?))
}

/// Handler for `GET /api/contacts/by-phone`.
async fn handle_get_by_phone(
    State(state): State<AppState>,
    params: Result<Query<PhoneParams>, QueryRejection>,
) -> Result<Json<Contact>, AppError> {
    let Query(params) = params?;
    let phone = params
        .phone
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            AppError::from(ContactError::validation(
                "phone query parameter is required",
                vec![FieldError {
                    field: "phone".to_string(),
                    message: "phone is required".to_string(),
                }],
            ))
        })?;
    Ok(Json(state.repo.get_by_phone(&phone).await?))
}

/// Handler for `GET /api/contacts/{id}`.
async fn handle_get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>, AppError> {
    Ok(Json(state.repo.get_by_id(&id).await?))
}

/// Handler for `PUT /api/contacts/{id}`.
async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ContactPatch>, JsonRejection>,
) -> Result<Json<Contact>, AppError> {
    let Json(patch) = body?;
    Ok(Json(state.repo.update(&id, patch).await?))
}

/// Handler for `DELETE /api/contacts/{id}`.
async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = state.repo.delete(&id).await?;
    Ok(Json(MessageResponse { message }))
}
