// Route exports
pub mod references;
pub mod users;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use uuid::Uuid;
use crate::core::{LunchEngine, LunchError};
use crate::models::{ErrorResponse, HealthResponse};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: LunchEngine,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(users::configure)
            .configure(references::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match state.engine.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Storage health check failed: {}", e);
            false
        }
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// HTTP status for an engine error
pub fn status_for(err: &LunchError) -> StatusCode {
    match err {
        LunchError::NotFound(_) => StatusCode::NOT_FOUND,
        LunchError::DuplicateConflict(_) => StatusCode::CONFLICT,
        LunchError::ScheduleParse(_) | LunchError::Validation(_) => StatusCode::BAD_REQUEST,
        LunchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        LunchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// Render an engine error as a JSON error body
pub fn error_response(err: &LunchError) -> HttpResponse {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    }

    HttpResponse::build(status).json(ErrorResponse {
        error: err.kind().to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}

pub(crate) fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|e| bad_request("invalid_id", format!("'{}' is not a valid id: {}", raw, e)))
}

/// JSON error response for malformed payloads
#[derive(Debug, serde::Serialize)]
pub struct PayloadError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for PayloadError {}

impl error::ResponseError for PayloadError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    PayloadError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    PayloadError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}
