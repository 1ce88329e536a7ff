pub mod events;
pub mod gallery;
pub mod notifications;
pub mod registrations;
pub mod users;

use axum::{
    Json,
    extract::{Multipart, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth::verify_token,
    error::ApiError,
    validation::{ImageFile, RawUpload, validate_images},
};

pub type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

/// A JSON body whose rejection is turned into a 400 after authorization.
pub type JsonBody<T> = Result<Json<T>, JsonRejection>;

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
    pub token: Option<String>,
}

pub(crate) fn authorize(
    state: &AppState,
    auth: BearerHeader,
    query_token: Option<&str>,
) -> Result<(), ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, query_token)
}

/// File fields of a multipart form, checked as JPEG/PNG images.
pub(crate) async fn read_images(
    mut multipart: Multipart,
    max: usize,
) -> Result<Vec<ImageFile>, ApiError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        // plain text fields
        if field.file_name().is_none() {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        uploads.push(RawUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    validate_images(uploads, max)
}

/// Relays the backend's answer to a write. A bodiless success stays
/// bodiless: `status` when it already means that, otherwise 204.
pub(crate) fn write_reply<T: Serialize>(status: StatusCode, body: Option<T>) -> Response {
    match body {
        Some(body) => (status, Json(body)).into_response(),
        None if status == StatusCode::OK => StatusCode::NO_CONTENT.into_response(),
        None => status.into_response(),
    }
}

#[utoipa::path(get, path = "/", tag = "admin")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Community Admin API",
        "endpoints": {
            "/events": "Events with schedule descriptions, filterable by status",
            "/events.ical": "Download events as iCal file",
            "/events/{id}/gallery": "Event photo gallery",
            "/registrations": "Event registrations",
            "/notifications": "Home notifications",
            "/users": "Users"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "admin")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "admin")]
pub async fn healthz_ready() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}
