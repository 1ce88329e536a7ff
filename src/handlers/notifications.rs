use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::info;

use super::{BearerHeader, JsonBody, TokenQuery, authorize, write_reply};
use crate::{
    AppState,
    error::ApiError,
    models::{HomeNotification, NotificationPayload},
    validation::validate_notification,
};

#[utoipa::path(
    get,
    path = "/notifications",
    params(("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")),
    responses(
        (status = 200, description = "Home notifications", body = [HomeNotification]),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<HomeNotification>>, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    Ok(Json(state.client.list_notifications().await?))
}

#[utoipa::path(
    post,
    path = "/notifications",
    request_body = NotificationPayload,
    responses(
        (status = 201, description = "Notification created", body = HomeNotification),
        (status = 400, description = "Title or message missing"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "notifications"
)]
pub async fn create_notification(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    body: JsonBody<NotificationPayload>,
) -> Result<Response, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(payload) = body?;
    validate_notification(&payload)?;

    let notification = state.client.create_notification(&payload).await?;
    info!(
        notification_id = notification.as_ref().map(|n| n.id),
        "notification created"
    );
    Ok(write_reply(StatusCode::CREATED, notification))
}

#[utoipa::path(
    put,
    path = "/notifications/{id}",
    params(("id" = i64, Path, description = "Notification id")),
    request_body = NotificationPayload,
    responses(
        (status = 200, description = "Notification updated", body = HomeNotification),
        (status = 400, description = "Title or message missing"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "notifications"
)]
pub async fn update_notification(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
    body: JsonBody<NotificationPayload>,
) -> Result<Response, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(payload) = body?;
    validate_notification(&payload)?;

    let notification = state.client.update_notification(id, &payload).await?;
    info!(notification_id = id, "notification updated");
    Ok(write_reply(StatusCode::OK, notification))
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    state.client.delete_notification(id).await?;
    info!(notification_id = id, "notification deleted");
    Ok(StatusCode::NO_CONTENT)
}
