use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::info;

use super::{BearerHeader, JsonBody, TokenQuery, authorize, read_images, write_reply};
use crate::{
    AppState,
    error::ApiError,
    models::{User, UserPayload},
    validation::prepare_user,
};

#[utoipa::path(
    get,
    path = "/users",
    params(("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")),
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    Ok(Json(state.client.list_users().await?))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<User>, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    Ok(Json(state.client.get_user(id).await?))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid user form"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    body: JsonBody<UserPayload>,
) -> Result<Response, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(payload) = body?;
    let payload = prepare_user(payload)?;

    let user = state.client.create_user(&payload).await?;
    info!(user_id = user.as_ref().map(|u| u.id), "user created");
    Ok(write_reply(StatusCode::CREATED, user))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid user form"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
    body: JsonBody<UserPayload>,
) -> Result<Response, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(payload) = body?;
    let payload = prepare_user(payload)?;

    let user = state.client.update_user(id, &payload).await?;
    info!(user_id = id, "user updated");
    Ok(write_reply(StatusCode::OK, user))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    state.client.delete_user(id).await?;
    info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/users/{id}/photo",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Backend response for the stored photo"),
        (status = 400, description = "Not a single JPEG/PNG image"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "users"
)]
pub async fn upload_user_photo(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Some(photo) = read_images(multipart, 1).await?.pop() else {
        return Err(ApiError::BadRequest("A photo is required".into()));
    };

    let stored = state.client.upload_user_photo(id, photo).await?;
    info!(user_id = id, "user photo uploaded");
    Ok(write_reply(StatusCode::OK, stored))
}
