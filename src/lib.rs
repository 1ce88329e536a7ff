pub mod auth;
pub mod client;
pub mod datetime;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod ical;
pub mod models;
pub mod openapi;
pub mod recurrence;
pub mod settings;
pub mod validation;
pub mod votes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    routing::{get, post, put},
};
use handlers::{events, gallery, healthz_live, healthz_ready, notifications, registrations, root, users};
use tower_http::LatencyUnit;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::client::{ClientError, CommunityClient};
use crate::ical::ICalExporter;
use crate::models::{Event, EventView};
use crate::openapi::ApiDoc;
use crate::recurrence::describe_event;
use crate::settings::Settings;

/// Room for a full gallery upload of three photos.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub client: Arc<CommunityClient>,
    pub exporter: Arc<ICalExporter>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, ClientError> {
        let client = CommunityClient::from_settings(&settings)?;
        let exporter = ICalExporter::new(settings.calendar_name.clone(), settings.timezone);
        Ok(Self {
            settings,
            client: Arc::new(client),
            exporter: Arc::new(exporter),
        })
    }

    pub(crate) fn view(&self, event: Event) -> EventView {
        EventView {
            schedule: describe_event(&event, self.settings.timezone),
            event,
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let state = AppState::new(settings)?;
    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!(
        backend = %state.settings.api_base_url,
        "Starting Community Admin API on {addr}"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events.ical", get(events::events_ical))
        .route(
            "/events/{id}",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/{id}/status", put(events::update_event_status))
        .route("/events/{id}/image", post(events::upload_event_image))
        .route("/events/{id}/overview", get(events::event_overview))
        .route("/events/{id}/votes", get(registrations::event_votes))
        .route(
            "/events/{id}/gallery",
            get(gallery::list_gallery).post(gallery::upload_gallery),
        )
        .route(
            "/events/{id}/gallery/{photo_id}",
            axum::routing::delete(gallery::delete_photo),
        )
        .route(
            "/events/{id}/gallery/{photo_id}/status",
            put(gallery::update_photo_status),
        )
        .route("/registrations", get(registrations::list_registrations))
        .route(
            "/registrations/{id}",
            axum::routing::delete(registrations::delete_registration),
        )
        .route(
            "/registrations/{id}/status",
            put(registrations::update_registration_status),
        )
        .route(
            "/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route(
            "/notifications/{id}",
            put(notifications::update_notification).delete(notifications::delete_notification),
        )
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/photo", post(users::upload_user_photo))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
}
