use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{ReferenceKind, ResolveReferenceRequest};
use crate::routes::{bad_request, error_response, AppState};

/// Configure reference entity routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/references/{kind}")
            .route(web::get().to(list_references))
            .route(web::post().to(resolve_reference)),
    );
}

fn parse_kind(raw: &str) -> Result<ReferenceKind, HttpResponse> {
    raw.parse::<ReferenceKind>()
        .map_err(|e| bad_request("invalid_kind", e))
}

/// List all areas, hobbies or languages
///
/// GET /api/v1/references/{kind}
async fn list_references(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let kind = match parse_kind(&path) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };

    match state.engine.list_references(kind).await {
        Ok(references) => HttpResponse::Ok().json(references),
        Err(e) => error_response(&e),
    }
}

/// Get or create a reference entity by name
///
/// POST /api/v1/references/{kind}
///
/// Request body:
/// ```json
/// { "name": "Berlin" }
/// ```
async fn resolve_reference(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<ResolveReferenceRequest>,
) -> impl Responder {
    let kind = match parse_kind(&path) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    if let Err(errors) = req.validate() {
        return bad_request("validation_error", errors.to_string());
    }

    match state.engine.resolve_reference(kind, &req.name).await {
        Ok(reference) => HttpResponse::Ok().json(reference),
        Err(e) => error_response(&e),
    }
}
