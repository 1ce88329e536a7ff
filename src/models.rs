use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Treats an explicit `null` like a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    #[default]
    Event,
    Class,
    Workshop,
    Meeting,
    Activity,
    Other,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Event => "event",
            EventType::Class => "class",
            EventType::Workshop => "workshop",
            EventType::Meeting => "meeting",
            EventType::Activity => "activity",
            EventType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "event" => Some(EventType::Event),
            "class" => Some(EventType::Class),
            "workshop" => Some(EventType::Workshop),
            "meeting" => Some(EventType::Meeting),
            "activity" => Some(EventType::Activity),
            "other" => Some(EventType::Other),
            _ => None,
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        EventType::parse(&value).unwrap_or(EventType::Other)
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    #[default]
    PendingApproval,
    Approved,
    Rejected,
    Cancelled,
    Done,
    Other,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::PendingApproval => "pending-approval",
            EventStatus::Approved => "approved",
            EventStatus::Rejected => "rejected",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Done => "done",
            EventStatus::Other => "other",
        }
    }

    /// Known statuses only; `other` is never a valid target.
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "pending-approval" | "pending" => Some(EventStatus::PendingApproval),
            "approved" => Some(EventStatus::Approved),
            "rejected" => Some(EventStatus::Rejected),
            "cancelled" | "canceled" => Some(EventStatus::Cancelled),
            "done" => Some(EventStatus::Done),
            _ => None,
        }
    }
}

impl From<String> for EventStatus {
    fn from(value: String) -> Self {
        EventStatus::parse(&value).unwrap_or(EventStatus::Other)
    }
}

impl From<EventStatus> for String {
    fn from(value: EventStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recurring {
    #[default]
    None,
    Weekly,
    BiWeekly,
    Monthly,
}

impl Recurring {
    pub fn as_str(self) -> &'static str {
        match self {
            Recurring::None => "none",
            Recurring::Weekly => "weekly",
            Recurring::BiWeekly => "bi-weekly",
            Recurring::Monthly => "monthly",
        }
    }

    pub fn is_recurring(self) -> bool {
        self != Recurring::None
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "none" | "once" => Some(Recurring::None),
            "weekly" => Some(Recurring::Weekly),
            "bi-weekly" | "biweekly" | "fortnightly" => Some(Recurring::BiWeekly),
            "monthly" => Some(Recurring::Monthly),
            _ => None,
        }
    }
}

impl From<String> for Recurring {
    // Unrecognised values render like one-off events.
    fn from(value: String) -> Self {
        Recurring::parse(&value).unwrap_or(Recurring::None)
    }
}

impl From<Recurring> for String {
    fn from(value: Recurring) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Event {
    #[serde(default, deserialize_with = "null_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    #[schema(value_type = String, example = "class")]
    pub event_type: EventType,
    #[serde(default, deserialize_with = "null_default")]
    #[schema(value_type = String, example = "approved")]
    pub status: EventStatus,
    #[serde(default, deserialize_with = "null_default")]
    #[schema(value_type = String, example = "weekly")]
    pub recurring: Recurring,
    #[serde(default)]
    #[schema(example = "2025-01-06T14:00:00")]
    pub date_time: Option<String>,
    #[serde(default)]
    pub recurring_end_date: Option<String>,
    /// Stored by the backend either as an object or as a JSON string.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub recurring_pattern: Option<Value>,
    #[serde(default)]
    pub next_date_time: Option<String>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default, deserialize_with = "null_default")]
    pub current_participants: u32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub instructor_name: Option<String>,
    #[serde(default)]
    pub instructor_description: Option<String>,
    #[serde(default)]
    pub instructor_phone: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// An event as the admin console shows it.
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    #[schema(example = "Every Monday at 14:00, Start: 6/1/2025 – Until: 1/6/2025, Next: 13/1/2025")]
    pub schedule: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "14:00")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
}

/// Create/update form for events as submitted by the console. Choice fields
/// stay raw until `validation::prepare_event` has checked them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EventPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "class")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "pending-approval")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "weekly")]
    pub recurring: Option<String>,
    #[serde(default)]
    pub date_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<RecurringPattern>)]
    pub recurring_pattern: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_phone: Option<String>,
}

/// A validated event form in the shape the backend stores.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventBody {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    pub recurring: Recurring,
    pub date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_pattern: Option<RecurringPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Attended,
    Other,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Attended => "attended",
            RegistrationStatus::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "pending" => Some(RegistrationStatus::Pending),
            "confirmed" | "registered" => Some(RegistrationStatus::Confirmed),
            "cancelled" | "canceled" => Some(RegistrationStatus::Cancelled),
            "attended" => Some(RegistrationStatus::Attended),
            _ => None,
        }
    }
}

impl From<String> for RegistrationStatus {
    fn from(value: String) -> Self {
        RegistrationStatus::parse(&value).unwrap_or(RegistrationStatus::Other)
    }
}

impl From<RegistrationStatus> for String {
    fn from(value: RegistrationStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Registration {
    #[serde(default, deserialize_with = "null_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub user_id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub event_id: i64,
    #[serde(default, deserialize_with = "null_default")]
    #[schema(value_type = String, example = "confirmed")]
    pub status: RegistrationStatus,
    #[serde(default)]
    pub vote: Option<i32>,
    #[serde(default, deserialize_with = "null_default")]
    pub reviews: Vec<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub registered_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PhotoStatus {
    #[default]
    Private,
    Approved,
}

impl PhotoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PhotoStatus::Private => "private",
            PhotoStatus::Approved => "approved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "private" | "pending" => Some(PhotoStatus::Private),
            "approved" | "public" => Some(PhotoStatus::Approved),
            _ => None,
        }
    }
}

impl From<String> for PhotoStatus {
    // Anything not explicitly approved stays hidden.
    fn from(value: String) -> Self {
        PhotoStatus::parse(&value).unwrap_or(PhotoStatus::Private)
    }
}

impl From<PhotoStatus> for String {
    fn from(value: PhotoStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct GalleryPhoto {
    #[serde(default, deserialize_with = "null_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub event_id: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    #[schema(value_type = String, example = "private")]
    pub status: PhotoStatus,
    #[serde(default)]
    pub uploaded_by: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct HomeNotification {
    #[serde(default, deserialize_with = "null_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub message: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NotificationPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Admin,
    #[default]
    Resident,
    Instructor,
    Other,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Resident => "resident",
            UserRole::Instructor => "instructor",
            UserRole::Other => "other",
        }
    }

    /// Assignable roles only.
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "admin" => Some(UserRole::Admin),
            "resident" | "user" => Some(UserRole::Resident),
            "instructor" => Some(UserRole::Instructor),
            _ => None,
        }
    }
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        UserRole::parse(&value).unwrap_or(UserRole::Other)
    }
}

impl From<UserRole> for String {
    fn from(value: UserRole) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct User {
    #[serde(default, deserialize_with = "null_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    #[schema(value_type = String, example = "resident")]
    pub role: UserRole,
    #[serde(default)]
    pub apartment_number: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UserPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "resident")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct VoteSummary {
    pub event_id: i64,
    pub votes: usize,
    pub average: Option<f64>,
    /// Counts for votes 1 through 5.
    pub histogram: Vec<usize>,
    pub reviews: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct EventOverview {
    pub event: EventView,
    pub photos_total: usize,
    pub photos_pending: usize,
    pub registrations: usize,
    pub votes: VoteSummary,
}
