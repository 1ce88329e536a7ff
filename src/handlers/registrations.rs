use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

use super::{BearerHeader, JsonBody, TokenQuery, authorize};
use crate::{
    AppState,
    error::ApiError,
    models::{Registration, RegistrationStatus, StatusUpdate, VoteSummary},
    votes::summarize_votes,
};

#[derive(Debug, Default, Deserialize)]
pub struct RegistrationQuery {
    pub event_id: Option<i64>,
    pub token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/registrations",
    params(
        ("event_id" = Option<i64>, Query, description = "Only registrations of this event"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Registrations", body = [Registration]),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "registrations"
)]
pub async fn list_registrations(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<RegistrationQuery>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let registrations = match query.event_id {
        Some(event_id) => state.client.list_event_registrations(event_id).await?,
        None => state.client.list_registrations().await?,
    };
    Ok(Json(registrations))
}

#[utoipa::path(
    get,
    path = "/events/{id}/votes",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Vote and review summary", body = VoteSummary),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "registrations"
)]
pub async fn event_votes(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(event_id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<VoteSummary>, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let registrations = state.client.list_event_registrations(event_id).await?;
    Ok(Json(summarize_votes(event_id, &registrations)))
}

#[utoipa::path(
    put,
    path = "/registrations/{id}/status",
    params(("id" = i64, Path, description = "Registration id")),
    request_body = StatusUpdate,
    responses(
        (status = 204, description = "Status changed"),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "registrations"
)]
pub async fn update_registration_status(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
    body: JsonBody<StatusUpdate>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(update) = body?;
    let status = RegistrationStatus::parse(&update.status).ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown registration status '{}'", update.status))
    })?;

    state
        .client
        .update_registration_status(id, status.as_str())
        .await?;
    info!(registration_id = id, status = status.as_str(), "registration status changed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/registrations/{id}",
    params(("id" = i64, Path, description = "Registration id")),
    responses(
        (status = 204, description = "Registration deleted"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Registration not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "registrations"
)]
pub async fn delete_registration(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    state.client.delete_registration(id).await?;
    info!(registration_id = id, "registration deleted");
    Ok(StatusCode::NO_CONTENT)
}
