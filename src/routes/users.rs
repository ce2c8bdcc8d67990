use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{
    CreateUserRequest, NewUser, ProfileUpdate, ProfileUpdateResponse, RandomProfilesResponse,
    RandomUsersQuery, RandomUsersResponse, SocialRelation, SocialTargetsRequest, StepErrorResponse,
    SuggestionsResponse,
};
use crate::routes::{bad_request, error_response, parse_id, AppState};

/// Configure all user-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/users", web::post().to(create_user))
        .route("/users/random", web::get().to(random_users))
        .route("/users/random/profiles", web::get().to(random_profiles))
        .route("/users/card/{username}", web::get().to(user_card))
        .route("/users/{id}", web::get().to(get_user))
        .route("/users/{id}/information", web::post().to(update_information))
        .route("/users/{id}/suggestions", web::get().to(suggestions))
        .service(
            web::resource("/users/{id}/{relation}")
                .route(web::post().to(append_relation))
                .route(web::delete().to(remove_relation)),
        );
}

/// Create user endpoint
///
/// POST /api/v1/users
///
/// Request body:
/// ```json
/// { "username": "alice", "firstName": "Alice", "lastName": "Doe" }
/// ```
async fn create_user(state: web::Data<AppState>, req: web::Json<CreateUserRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("validation_error", errors.to_string());
    }

    let req = req.into_inner();
    let new_user = NewUser {
        username: req.username.trim().to_string(),
        first_name: req.first_name,
        last_name: req.last_name,
    };

    match state.engine.create_user(new_user).await {
        Ok(user) => HttpResponse::Created().json(user),
        Err(e) => error_response(&e),
    }
}

async fn get_user(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = match parse_id(&path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.engine.get_user(user_id).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(e) => error_response(&e),
    }
}

/// User card endpoint
///
/// GET /api/v1/users/card/{username}
async fn user_card(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.engine.user_card(&path).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e),
    }
}

/// Profile information endpoint
///
/// POST /api/v1/users/{id}/information
///
/// Every field is optional. The response carries the user after the update
/// plus one entry per step that failed; step failures do not change the
/// status code.
async fn update_information(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<ProfileUpdate>,
) -> impl Responder {
    let user_id = match parse_id(&path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    if let Err(errors) = req.validate() {
        return bad_request("validation_error", errors.to_string());
    }

    match state.engine.apply_profile_update(user_id, &req).await {
        Ok(outcome) => {
            let errors = outcome
                .errors
                .iter()
                .map(|e| StepErrorResponse {
                    step: e.step.to_string(),
                    error: e.error.kind().to_string(),
                    message: e.error.to_string(),
                })
                .collect();

            HttpResponse::Ok().json(ProfileUpdateResponse {
                user: outcome.user,
                errors,
            })
        }
        Err(e) => error_response(&e),
    }
}

/// Suggestions endpoint
///
/// GET /api/v1/users/{id}/suggestions
async fn suggestions(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = match parse_id(&path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.engine.suggest_buddies(user_id).await {
        Ok(result) => HttpResponse::Ok().json(SuggestionsResponse {
            user_id,
            suggestions: result.suggestion_ids(),
            total_candidates: result.total_candidates,
        }),
        Err(e) => error_response(&e),
    }
}

async fn random_users(state: web::Data<AppState>, query: web::Query<RandomUsersQuery>) -> impl Responder {
    match state.engine.random_users(query.count).await {
        Ok(users) => HttpResponse::Ok().json(RandomUsersResponse { users }),
        Err(e) => error_response(&e),
    }
}

async fn random_profiles(state: web::Data<AppState>, query: web::Query<RandomUsersQuery>) -> impl Responder {
    match state.engine.random_users_with_profiles(query.count).await {
        Ok(users) => HttpResponse::Ok().json(RandomProfilesResponse { users }),
        Err(e) => error_response(&e),
    }
}

/// Append to a social relation
///
/// POST /api/v1/users/{id}/{relation}
///
/// Request body:
/// ```json
/// { "targets": ["<user id>", "..."] }
/// ```
async fn append_relation(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: web::Json<SocialTargetsRequest>,
) -> impl Responder {
    let (user_id, relation) = match relation_path(&path) {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };
    if let Err(errors) = req.validate() {
        return bad_request("validation_error", errors.to_string());
    }

    match state.engine.append_social(relation, user_id, &req.targets).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

/// Remove from a social relation
///
/// DELETE /api/v1/users/{id}/{relation}
async fn remove_relation(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: web::Json<SocialTargetsRequest>,
) -> impl Responder {
    let (user_id, relation) = match relation_path(&path) {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };
    if let Err(errors) = req.validate() {
        return bad_request("validation_error", errors.to_string());
    }

    match state.engine.remove_social(relation, user_id, &req.targets).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

fn relation_path(path: &(String, String)) -> Result<(uuid::Uuid, SocialRelation), HttpResponse> {
    let user_id = parse_id(&path.0)?;
    let relation = path
        .1
        .parse::<SocialRelation>()
        .map_err(|e| bad_request("invalid_relation", e))?;
    Ok((user_id, relation))
}
