use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use super::{
    BearerHeader, JsonBody, StatusQuery, TokenQuery, authorize, read_images, write_reply,
};
use crate::{
    AppState,
    error::ApiError,
    filter::filter_photos,
    models::{GalleryPhoto, PhotoStatus, StatusUpdate},
    validation::MAX_GALLERY_UPLOAD,
};

fn parse_photo_status(raw: &str) -> Result<PhotoStatus, ApiError> {
    PhotoStatus::parse(raw).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Unknown photo status '{raw}', expected private or approved"
        ))
    })
}

#[utoipa::path(
    get,
    path = "/events/{id}/gallery",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("status" = Option<String>, Query, description = "private or approved"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Gallery photos", body = [GalleryPhoto]),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "gallery"
)]
pub async fn list_gallery(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(event_id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<GalleryPhoto>>, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_photo_status)
        .transpose()?;

    let photos = state.client.list_gallery(event_id).await?;
    Ok(Json(filter_photos(photos, status)))
}

#[utoipa::path(
    post,
    path = "/events/{id}/gallery",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 201, description = "Photos uploaded"),
        (status = 400, description = "More than 3 files or not JPEG/PNG"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "gallery"
)]
pub async fn upload_gallery(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(event_id): Path<i64>,
    Query(query): Query<TokenQuery>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let photos = read_images(multipart, MAX_GALLERY_UPLOAD).await?;
    let count = photos.len();

    let stored = state
        .client
        .upload_gallery_photos(event_id, photos)
        .await?;
    info!(event_id, count, "gallery photos uploaded");
    Ok(write_reply(StatusCode::CREATED, stored))
}

#[utoipa::path(
    put,
    path = "/events/{id}/gallery/{photo_id}/status",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("photo_id" = i64, Path, description = "Photo id")
    ),
    request_body = StatusUpdate,
    responses(
        (status = 204, description = "Visibility changed"),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "gallery"
)]
pub async fn update_photo_status(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((event_id, photo_id)): Path<(i64, i64)>,
    Query(query): Query<TokenQuery>,
    body: JsonBody<StatusUpdate>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(update) = body?;
    let status = parse_photo_status(&update.status)?;

    state
        .client
        .update_photo_status(event_id, photo_id, status.as_str())
        .await?;
    info!(event_id, photo_id, status = status.as_str(), "photo status changed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/events/{id}/gallery/{photo_id}",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("photo_id" = i64, Path, description = "Photo id")
    ),
    responses(
        (status = 204, description = "Photo deleted"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Photo not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "gallery"
)]
pub async fn delete_photo(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((event_id, photo_id)): Path<(i64, i64)>,
    Query(query): Query<TokenQuery>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    state.client.delete_photo(event_id, photo_id).await?;
    info!(event_id, photo_id, "photo deleted");
    Ok(StatusCode::NO_CONTENT)
}
