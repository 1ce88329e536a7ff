use std::sync::Arc;
use std::time::Duration;

use http::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::models::{
    Event, EventBody, GalleryPhoto, HomeNotification, NotificationPayload, Registration, User,
    UserPayload,
};
use crate::settings::Settings;
use crate::validation::ImageFile;

const HOME_ID_HEADER: HeaderName = HeaderName::from_static("x-home-id");
const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{action} failed: {status}{}", detail_suffix(.detail))]
    Status {
        action: &'static str,
        status: u16,
        detail: Option<String>,
    },
    #[error("{action} returned an unexpected response: {source}")]
    Decode {
        action: &'static str,
        source: serde_json::Error,
    },
    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid credential header: {0}")]
    Header(#[from] InvalidHeaderValue),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// Best-effort `detail` from an error body: a string, or a list of
/// validation entries carrying `msg`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.trim().to_string()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str).or(item.as_str()))
                .collect();
            (!messages.is_empty()).then(|| messages.join(", "))
        }
        _ => None,
    }
}

/// Credentials presented to the backend.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_token: Option<String>,
    pub home_id: Option<String>,
    pub user_id: Option<String>,
}

impl Credentials {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_token: settings.api_token.clone(),
            home_id: settings.home_id.clone(),
            user_id: settings.user_id.clone(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.api_token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(home_id) = self.home_id.as_deref().filter(|v| !v.is_empty()) {
            headers.insert(HOME_ID_HEADER, HeaderValue::from_str(home_id)?);
        }
        if let Some(user_id) = self.user_id.as_deref().filter(|v| !v.is_empty()) {
            headers.insert(USER_ID_HEADER, HeaderValue::from_str(user_id)?);
        }
        Ok(headers)
    }
}

/// Lists come back either bare or wrapped in an object.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Plain(Vec<T>),
    Wrapped {
        #[serde(alias = "items", alias = "results")]
        data: Vec<T>,
    },
}

impl<T> From<Listing<T>> for Vec<T> {
    fn from(value: Listing<T>) -> Self {
        match value {
            Listing::Plain(items) | Listing::Wrapped { data: items } => items,
        }
    }
}

#[derive(Clone)]
pub struct CommunityClient {
    client: reqwest::Client,
    base_url: Arc<Url>,
}

impl CommunityClient {
    pub fn new(
        mut base_url: Url,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .default_headers(credentials.headers()?)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: Arc::new(base_url),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        Self::new(
            settings.api_base_url.clone(),
            &Credentials::from_settings(settings),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        Ok(self.client.request(method, url))
    }

    async fn execute(
        &self,
        action: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ClientError> {
        let response = request.send().await.map_err(|err| {
            warn!(action, error = %err, "backend request failed");
            ClientError::Transport(err)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(action, status = status.as_u16(), "backend request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body);
        warn!(action, status = status.as_u16(), detail = ?detail, "backend rejected request");
        Err(ClientError::Status {
            action,
            status: status.as_u16(),
            detail,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        action: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.execute(action, request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode { action, source })
    }

    /// Like `fetch`, for writes: the backend may commit and answer with an
    /// empty body, which comes back as `None`.
    async fn fetch_optional<T: DeserializeOwned>(
        &self,
        action: &'static str,
        request: RequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        let response = self.execute(action, request).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!(action, "backend returned no body");
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| ClientError::Decode { action, source })
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        action: &'static str,
        path: &str,
    ) -> Result<Vec<T>, ClientError> {
        let listing: Listing<T> = self.fetch(action, self.request(Method::GET, path)?).await?;
        Ok(listing.into())
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        action: &'static str,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ClientError> {
        self.fetch_optional(action, self.request(method, path)?.json(body))
            .await
    }

    async fn send_without_reply<B: Serialize + ?Sized>(
        &self,
        action: &'static str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ClientError> {
        let mut request = self.request(method, path)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(action, request).await.map(|_| ())
    }

    async fn delete(&self, action: &'static str, path: &str) -> Result<(), ClientError> {
        self.send_without_reply::<Value>(action, Method::DELETE, path, None)
            .await
    }

    async fn upload<T: DeserializeOwned>(
        &self,
        action: &'static str,
        path: &str,
        field: &'static str,
        files: Vec<ImageFile>,
    ) -> Result<Option<T>, ClientError> {
        let form = files.into_iter().try_fold(Form::new(), |form, file| {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(file.kind.mime())?;
            Ok::<_, ClientError>(form.part(field, part))
        })?;
        self.fetch_optional(action, self.request(Method::POST, path)?.multipart(form))
            .await
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, ClientError> {
        self.fetch_list("Loading events", "api/events").await
    }

    pub async fn get_event(&self, id: i64) -> Result<Event, ClientError> {
        self.fetch(
            "Loading event",
            self.request(Method::GET, &format!("api/events/{id}"))?,
        )
        .await
    }

    pub async fn create_event(&self, body: &EventBody) -> Result<Option<Event>, ClientError> {
        self.send_json("Creating event", Method::POST, "api/events", body)
            .await
    }

    pub async fn update_event(
        &self,
        id: i64,
        body: &EventBody,
    ) -> Result<Option<Event>, ClientError> {
        self.send_json(
            "Updating event",
            Method::PUT,
            &format!("api/events/{id}"),
            body,
        )
        .await
    }

    pub async fn update_event_status(&self, id: i64, status: &str) -> Result<(), ClientError> {
        self.send_without_reply(
            "Updating event status",
            Method::PUT,
            &format!("api/events/{id}/status"),
            Some(&json!({ "status": status })),
        )
        .await
    }

    pub async fn delete_event(&self, id: i64) -> Result<(), ClientError> {
        self.delete("Deleting event", &format!("api/events/{id}"))
            .await
    }

    pub async fn upload_event_image(
        &self,
        id: i64,
        image: ImageFile,
    ) -> Result<Option<Value>, ClientError> {
        self.upload(
            "Uploading event image",
            &format!("api/events/{id}/image"),
            "image",
            vec![image],
        )
        .await
    }

    pub async fn list_gallery(&self, event_id: i64) -> Result<Vec<GalleryPhoto>, ClientError> {
        self.fetch_list("Loading gallery", &format!("api/events/{event_id}/gallery"))
            .await
    }

    pub async fn upload_gallery_photos(
        &self,
        event_id: i64,
        photos: Vec<ImageFile>,
    ) -> Result<Option<Value>, ClientError> {
        self.upload(
            "Uploading photos",
            &format!("api/events/{event_id}/gallery"),
            "photos",
            photos,
        )
        .await
    }

    pub async fn update_photo_status(
        &self,
        event_id: i64,
        photo_id: i64,
        status: &str,
    ) -> Result<(), ClientError> {
        self.send_without_reply(
            "Updating photo status",
            Method::PUT,
            &format!("api/events/{event_id}/gallery/{photo_id}"),
            Some(&json!({ "status": status })),
        )
        .await
    }

    pub async fn delete_photo(&self, event_id: i64, photo_id: i64) -> Result<(), ClientError> {
        self.delete(
            "Deleting photo",
            &format!("api/events/{event_id}/gallery/{photo_id}"),
        )
        .await
    }

    pub async fn list_registrations(&self) -> Result<Vec<Registration>, ClientError> {
        self.fetch_list("Loading registrations", "api/registrations")
            .await
    }

    pub async fn list_event_registrations(
        &self,
        event_id: i64,
    ) -> Result<Vec<Registration>, ClientError> {
        self.fetch_list(
            "Loading registrations",
            &format!("api/registrations/event/{event_id}"),
        )
        .await
    }

    pub async fn update_registration_status(&self, id: i64, status: &str) -> Result<(), ClientError> {
        self.send_without_reply(
            "Updating registration",
            Method::PUT,
            &format!("api/registrations/{id}"),
            Some(&json!({ "status": status })),
        )
        .await
    }

    pub async fn delete_registration(&self, id: i64) -> Result<(), ClientError> {
        self.delete("Deleting registration", &format!("api/registrations/{id}"))
            .await
    }

    pub async fn list_notifications(&self) -> Result<Vec<HomeNotification>, ClientError> {
        self.fetch_list("Loading notifications", "api/home-notifications")
            .await
    }

    pub async fn create_notification(
        &self,
        payload: &NotificationPayload,
    ) -> Result<Option<HomeNotification>, ClientError> {
        self.send_json(
            "Creating notification",
            Method::POST,
            "api/home-notifications",
            payload,
        )
        .await
    }

    pub async fn update_notification(
        &self,
        id: i64,
        payload: &NotificationPayload,
    ) -> Result<Option<HomeNotification>, ClientError> {
        self.send_json(
            "Updating notification",
            Method::PUT,
            &format!("api/home-notifications/{id}"),
            payload,
        )
        .await
    }

    pub async fn delete_notification(&self, id: i64) -> Result<(), ClientError> {
        self.delete(
            "Deleting notification",
            &format!("api/home-notifications/{id}"),
        )
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.fetch_list("Loading users", "api/users").await
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ClientError> {
        self.fetch(
            "Loading user",
            self.request(Method::GET, &format!("api/users/{id}"))?,
        )
        .await
    }

    pub async fn create_user(&self, payload: &UserPayload) -> Result<Option<User>, ClientError> {
        self.send_json("Creating user", Method::POST, "api/users", payload)
            .await
    }

    pub async fn update_user(
        &self,
        id: i64,
        payload: &UserPayload,
    ) -> Result<Option<User>, ClientError> {
        self.send_json(
            "Updating user",
            Method::PUT,
            &format!("api/users/{id}"),
            payload,
        )
        .await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ClientError> {
        self.delete("Deleting user", &format!("api/users/{id}"))
            .await
    }

    pub async fn upload_user_photo(
        &self,
        id: i64,
        photo: ImageFile,
    ) -> Result<Option<Value>, ClientError> {
        self.upload(
            "Uploading user photo",
            &format!("api/users/{id}/photo"),
            "photo",
            vec![photo],
        )
        .await
    }
}
