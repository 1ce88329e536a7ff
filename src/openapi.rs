use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::{
    Event, EventOverview, EventPayload, EventView, GalleryPhoto, HomeNotification,
    NotificationPayload, RecurringPattern, Registration, StatusUpdate, User, UserPayload,
    VoteSummary,
};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let Some(components) = openapi.components.as_mut() else {
            return;
        };
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::events::list_events,
        crate::handlers::events::events_ical,
        crate::handlers::events::get_event,
        crate::handlers::events::create_event,
        crate::handlers::events::update_event,
        crate::handlers::events::update_event_status,
        crate::handlers::events::delete_event,
        crate::handlers::events::upload_event_image,
        crate::handlers::events::event_overview,
        crate::handlers::gallery::list_gallery,
        crate::handlers::gallery::upload_gallery,
        crate::handlers::gallery::update_photo_status,
        crate::handlers::gallery::delete_photo,
        crate::handlers::registrations::list_registrations,
        crate::handlers::registrations::event_votes,
        crate::handlers::registrations::update_registration_status,
        crate::handlers::registrations::delete_registration,
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::create_notification,
        crate::handlers::notifications::update_notification,
        crate::handlers::notifications::delete_notification,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::upload_user_photo
    ),
    components(schemas(
        Event,
        EventView,
        EventPayload,
        EventOverview,
        RecurringPattern,
        StatusUpdate,
        GalleryPhoto,
        Registration,
        VoteSummary,
        HomeNotification,
        NotificationPayload,
        User,
        UserPayload
    )),
    tags(
        (name = "admin", description = "Service information"),
        (name = "events", description = "Event management and approval"),
        (name = "gallery", description = "Event photo moderation"),
        (name = "registrations", description = "Registrations, votes and reviews"),
        (name = "notifications", description = "Home notifications"),
        (name = "users", description = "User management")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;
