use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;

use super::{
    BearerHeader, JsonBody, StatusQuery, TokenQuery, authorize, read_images, write_reply,
};
use crate::{
    AppState,
    error::ApiError,
    filter::{EventFilter, filter_events},
    ical::has_schedulable,
    models::{EventOverview, EventPayload, EventStatus, EventView, PhotoStatus, StatusUpdate},
    validation::prepare_event,
    votes::summarize_votes,
};

fn parse_filter(raw: Option<&str>) -> Result<EventFilter, ApiError> {
    raw.unwrap_or_default()
        .parse()
        .map_err(ApiError::BadRequest)
}

#[utoipa::path(
    get,
    path = "/events",
    params(
        ("status" = Option<String>, Query, description = "all, approved or pending-approval"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Events with schedule descriptions", body = [EventView]),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Invalid authentication token"),
        (status = 502, description = "Backend request failed")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let filter = parse_filter(query.status.as_deref())?;

    let events = state.client.list_events().await?;
    let views = filter_events(events, filter)
        .into_iter()
        .map(|event| state.view(event))
        .collect();
    Ok(Json(views))
}

#[utoipa::path(
    get,
    path = "/events.ical",
    params(
        ("status" = Option<String>, Query, description = "all, approved or pending-approval"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "iCal file", content_type = "text/calendar"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "No events found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "events"
)]
pub async fn events_ical(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let filter = parse_filter(query.status.as_deref())?;

    let events = filter_events(state.client.list_events().await?, filter);
    if !has_schedulable(&events, state.settings.timezone) {
        return Err(ApiError::NotFound("No events found".into()));
    }

    let body = state.exporter.generate(&events);
    Ok((
        StatusCode::OK,
        [
            ("content-type", "text/calendar"),
            (
                "content-disposition",
                "attachment; filename=community_events.ics",
            ),
        ],
        body,
    ))
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Event", body = EventView),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<EventView>, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let event = state.client.get_event(id).await?;
    Ok(Json(state.view(event)))
}

#[utoipa::path(
    post,
    path = "/events",
    request_body = EventPayload,
    responses(
        (status = 201, description = "Event created", body = EventView),
        (status = 400, description = "Invalid event form"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    body: JsonBody<EventPayload>,
) -> Result<Response, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(payload) = body?;
    let event = prepare_event(payload)?;

    let created = state.client.create_event(&event).await?;
    info!(
        event_id = created.as_ref().map(|e| e.id),
        name = %event.name,
        "event created"
    );
    Ok(write_reply(StatusCode::CREATED, created.map(|e| state.view(e))))
}

#[utoipa::path(
    put,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    request_body = EventPayload,
    responses(
        (status = 200, description = "Event updated", body = EventView),
        (status = 400, description = "Invalid event form"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
    body: JsonBody<EventPayload>,
) -> Result<Response, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(payload) = body?;
    let event = prepare_event(payload)?;

    let updated = state.client.update_event(id, &event).await?;
    info!(event_id = id, "event updated");
    Ok(write_reply(StatusCode::OK, updated.map(|e| state.view(e))))
}

#[utoipa::path(
    put,
    path = "/events/{id}/status",
    params(("id" = i64, Path, description = "Event id")),
    request_body = StatusUpdate,
    responses(
        (status = 204, description = "Status changed"),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "events"
)]
pub async fn update_event_status(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
    body: JsonBody<StatusUpdate>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(update) = body?;
    let status = EventStatus::parse(&update.status).ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown event status '{}'", update.status))
    })?;

    state
        .client
        .update_event_status(id, status.as_str())
        .await?;
    info!(event_id = id, status = status.as_str(), "event status changed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "events"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    state.client.delete_event(id).await?;
    info!(event_id = id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/events/{id}/image",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Backend response for the stored image"),
        (status = 400, description = "Not a single JPEG/PNG image"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "events"
)]
pub async fn upload_event_image(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Some(image) = read_images(multipart, 1).await?.pop() else {
        return Err(ApiError::BadRequest("An image is required".into()));
    };

    let stored = state.client.upload_event_image(id, image).await?;
    info!(event_id = id, "event image uploaded");
    Ok(write_reply(StatusCode::OK, stored))
}

#[utoipa::path(
    get,
    path = "/events/{id}/overview",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Event with gallery and registration summary", body = EventOverview),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "events"
)]
pub async fn event_overview(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(id): Path<i64>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<EventOverview>, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;

    let (event, photos, registrations) = futures::try_join!(
        state.client.get_event(id),
        state.client.list_gallery(id),
        state.client.list_event_registrations(id),
    )?;

    let photos_pending = photos
        .iter()
        .filter(|p| p.status == PhotoStatus::Private)
        .count();
    Ok(Json(EventOverview {
        event: state.view(event),
        photos_total: photos.len(),
        photos_pending,
        registrations: registrations.len(),
        votes: summarize_votes(id, &registrations),
    }))
}
