use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use serde_json::{Map, Value};

use crate::datetime::{parse_api_date, parse_api_datetime};
use crate::error::ApiError;
use crate::models::{
    EventBody, EventPayload, EventStatus, EventType, NotificationPayload, Recurring,
    RecurringPattern, UserPayload, UserRole,
};
use crate::recurrence::{int_field, lookup, pattern_object};

pub const MAX_GALLERY_UPLOAD: usize = 3;

static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("regex compiles"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("regex compiles"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+\-() ]{3,20}$").expect("regex compiles"));

fn collect(errors: Vec<String>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::BadRequest(errors.join("; ")))
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Reads an optional choice field. Blank means absent; anything the parser
/// does not know is reported.
fn choice<T>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    label: &str,
    errors: &mut Vec<String>,
) -> Option<T> {
    let raw = raw.filter(|v| !is_blank(v))?;
    let parsed = parse(raw);
    if parsed.is_none() {
        errors.push(format!("Unknown {label} '{}'", raw.trim()));
    }
    parsed
}

fn pattern_number(map: &Map<String, Value>, key: &str, errors: &mut Vec<String>) -> Option<i64> {
    match int_field(map, &[key]) {
        Some(value) => value,
        None => {
            errors.push(format!("Pattern {key} must be a whole number"));
            None
        }
    }
}

fn check_pattern(
    value: &Value,
    recurring: Recurring,
    errors: &mut Vec<String>,
) -> Option<RecurringPattern> {
    let Some(map) = pattern_object(value) else {
        errors.push("Recurring pattern must be a JSON object".to_string());
        return None;
    };

    let day_of_week = pattern_number(&map, "dayOfWeek", errors);
    let day_of_month = pattern_number(&map, "dayOfMonth", errors);
    let interval = pattern_number(&map, "interval", errors);
    let time = match lookup(&map, &["time"]) {
        None => None,
        Some(Value::String(raw)) if CLOCK_RE.is_match(raw.trim()) => Some(raw.trim().to_string()),
        Some(_) => {
            errors.push("Pattern time must be in HH:MM format".to_string());
            None
        }
    };

    if let Some(n) = interval
        && n < 1
    {
        errors.push("Pattern interval must be at least 1".to_string());
    }
    match recurring {
        Recurring::Weekly | Recurring::BiWeekly => match day_of_week {
            None => errors.push("Pattern dayOfWeek is required for weekly events".to_string()),
            Some(day) if !(0..=6).contains(&day) => {
                errors.push("Pattern dayOfWeek must be between 0 and 6".to_string())
            }
            Some(_) => {}
        },
        Recurring::Monthly => match day_of_month {
            None => errors.push("Pattern dayOfMonth is required for monthly events".to_string()),
            Some(day) if !(1..=31).contains(&day) => {
                errors.push("Pattern dayOfMonth must be between 1 and 31".to_string())
            }
            Some(_) => {}
        },
        Recurring::None => {}
    }

    Some(RecurringPattern {
        day_of_week: day_of_week.and_then(|d| u8::try_from(d).ok()).filter(|d| *d <= 6),
        day_of_month: day_of_month
            .and_then(|d| u8::try_from(d).ok())
            .filter(|d| (1..=31).contains(d)),
        time,
        interval: interval.and_then(|n| u32::try_from(n).ok()).filter(|n| *n >= 1),
    })
}

/// Checks an event form and builds the body to send upstream. Recurrence
/// fields are dropped from one-off events.
pub fn prepare_event(payload: EventPayload) -> Result<EventBody, ApiError> {
    let mut errors = Vec::new();

    if is_blank(&payload.name) {
        errors.push("Name is required".to_string());
    }

    let event_type = choice(
        payload.event_type.as_deref(),
        EventType::parse,
        "event type",
        &mut errors,
    )
    .unwrap_or_default();
    let status = choice(
        payload.status.as_deref(),
        EventStatus::parse,
        "event status",
        &mut errors,
    );
    let recurring = choice(
        payload.recurring.as_deref(),
        Recurring::parse,
        "recurrence",
        &mut errors,
    )
    .unwrap_or_default();

    let start = if is_blank(&payload.date_time) {
        errors.push("Date and time is required".to_string());
        None
    } else {
        let parsed = parse_api_datetime(&payload.date_time, Tz::UTC);
        if parsed.is_none() {
            errors.push("Date and time must be an ISO 8601 timestamp".to_string());
        }
        parsed
    };

    if let Some(max) = payload.max_participants
        && max < 1
    {
        errors.push("Max participants must be at least 1".to_string());
    }

    let mut recurring_end_date = None;
    let mut recurring_pattern = None;
    if recurring.is_recurring() {
        match payload.recurring_end_date.as_deref().filter(|v| !is_blank(v)) {
            None => errors.push("Recurring end date is required for recurring events".to_string()),
            Some(raw) => match parse_api_date(raw) {
                None => errors.push("Recurring end date must be an ISO 8601 date".to_string()),
                Some(end) => {
                    if let Some(start) = start
                        && end < start.date()
                    {
                        errors.push(
                            "Recurring end date must not be before the start date".to_string(),
                        );
                    }
                    recurring_end_date = Some(raw.trim().to_string());
                }
            },
        }

        match payload.recurring_pattern.as_ref().filter(|v| !v.is_null()) {
            None => errors.push("Recurring pattern is required for recurring events".to_string()),
            Some(value) => recurring_pattern = check_pattern(value, recurring, &mut errors),
        }
    }

    collect(errors)?;
    Ok(EventBody {
        name: payload.name,
        description: payload.description,
        event_type,
        status,
        recurring,
        date_time: payload.date_time,
        recurring_end_date,
        recurring_pattern,
        max_participants: payload.max_participants,
        location: payload.location,
        instructor_name: payload.instructor_name,
        instructor_description: payload.instructor_description,
        instructor_phone: payload.instructor_phone,
    })
}

pub fn validate_notification(payload: &NotificationPayload) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if is_blank(&payload.title) {
        errors.push("Title is required".to_string());
    }
    if is_blank(&payload.message) {
        errors.push("Message is required".to_string());
    }
    collect(errors)
}

/// Checks a user form; the role is rewritten to its canonical name.
pub fn prepare_user(mut payload: UserPayload) -> Result<UserPayload, ApiError> {
    let mut errors = Vec::new();
    let role = choice(payload.role.as_deref(), UserRole::parse, "role", &mut errors);
    if is_blank(&payload.name) {
        errors.push("Name is required".to_string());
    }
    if is_blank(&payload.email) {
        errors.push("Email is required".to_string());
    } else if !EMAIL_RE.is_match(payload.email.trim()) {
        errors.push("Email is not valid".to_string());
    }
    if let Some(phone) = payload.phone.as_deref().filter(|p| !is_blank(p))
        && !PHONE_RE.is_match(phone.trim())
    {
        errors.push("Phone number is not valid".to_string());
    }
    collect(errors)?;
    payload.role = role.map(|role| role.as_str().to_string());
    Ok(payload)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageKind::Png)
        } else {
            None
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
        }
    }
}

/// A file field read from an inbound multipart form.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// An upload that passed the image checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

/// Accepts between one and `max` JPEG/PNG files. The type is taken from the
/// file contents, never from the client's content-type.
pub fn validate_images(uploads: Vec<RawUpload>, max: usize) -> Result<Vec<ImageFile>, ApiError> {
    if uploads.is_empty() {
        return Err(ApiError::BadRequest("At least one image is required".into()));
    }
    if uploads.len() > max {
        return Err(ApiError::BadRequest(format!(
            "At most {max} image(s) can be uploaded at once"
        )));
    }

    uploads
        .into_iter()
        .enumerate()
        .map(|(index, upload)| {
            let label = upload
                .file_name
                .clone()
                .filter(|n| !is_blank(n))
                .unwrap_or_else(|| format!("file #{}", index + 1));
            if upload.bytes.is_empty() {
                return Err(ApiError::BadRequest(format!("{label} is empty")));
            }
            let kind = ImageKind::detect(&upload.bytes).ok_or_else(|| {
                ApiError::BadRequest(format!("{label} must be a JPEG or PNG image"))
            })?;
            let file_name = upload
                .file_name
                .filter(|n| !is_blank(n))
                .unwrap_or_else(|| format!("upload-{}.{}", index + 1, kind.extension()));
            Ok(ImageFile {
                file_name,
                kind,
                bytes: upload.bytes,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0];

    fn payload(value: serde_json::Value) -> EventPayload {
        serde_json::from_value(value).unwrap()
    }

    fn message(err: ApiError) -> String {
        match err {
            ApiError::BadRequest(msg) => msg,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_valid_one_off_event_drops_recurrence_fields() {
        let prepared = prepare_event(payload(json!({
            "name": "Movie night",
            "date_time": "2025-03-01T19:00:00",
            "recurring_end_date": "2025-06-01",
            "recurring_pattern": {"dayOfWeek": 6}
        })))
        .unwrap();
        assert!(prepared.recurring_end_date.is_none());
        assert!(prepared.recurring_pattern.is_none());
    }

    #[test]
    fn test_required_fields() {
        let msg = message(prepare_event(payload(json!({"max_participants": 0}))).unwrap_err());
        assert!(msg.contains("Name is required"));
        assert!(msg.contains("Date and time is required"));
        assert!(msg.contains("Max participants must be at least 1"));
    }

    #[test]
    fn test_recurring_requires_end_and_pattern() {
        let msg = message(
            prepare_event(payload(json!({
                "name": "Yoga",
                "date_time": "2025-01-06T14:00:00",
                "recurring": "weekly"
            })))
            .unwrap_err(),
        );
        assert!(msg.contains("Recurring end date is required"));
        assert!(msg.contains("Recurring pattern is required"));
    }

    #[test]
    fn test_recurring_pattern_ranges() {
        let msg = message(
            prepare_event(payload(json!({
                "name": "Yoga",
                "date_time": "2025-01-06T14:00:00",
                "recurring": "weekly",
                "recurring_end_date": "2024-12-01",
                "recurring_pattern": {"dayOfWeek": 7, "time": "25:00", "interval": 0}
            })))
            .unwrap_err(),
        );
        assert!(msg.contains("must not be before the start date"));
        assert!(msg.contains("HH:MM"));
        assert!(msg.contains("dayOfWeek must be between 0 and 6"));
        assert!(msg.contains("interval must be at least 1"));
    }

    #[test]
    fn test_monthly_needs_day_of_month() {
        let mut event = payload(json!({
            "name": "Board meeting",
            "date_time": "2025-01-15T09:30:00",
            "recurring": "monthly",
            "recurring_end_date": "2025-12-15",
            "recurring_pattern": {"dayOfWeek": 1}
        }));
        let msg = message(prepare_event(event.clone()).unwrap_err());
        assert!(msg.contains("dayOfMonth is required"));

        event.recurring_pattern = Some(json!({"dayOfMonth": "15", "time": "09:30"}));
        let prepared = prepare_event(event).unwrap();
        assert_eq!(
            prepared.recurring_pattern,
            Some(RecurringPattern {
                day_of_month: Some(15),
                time: Some("09:30".to_string()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_unknown_choices_are_rejected() {
        let msg = message(
            prepare_event(payload(json!({
                "name": "Yoga",
                "type": "yoga-class",
                "status": "approvd",
                "recurring": "weeky",
                "date_time": "2025-01-06T14:00:00",
                "recurring_end_date": "2025-06-01",
                "recurring_pattern": {"dayOfWeek": 1, "time": "14:00"}
            })))
            .unwrap_err(),
        );
        assert_eq!(
            msg,
            "Unknown event type 'yoga-class'; Unknown event status 'approvd'; Unknown recurrence 'weeky'"
        );
    }

    #[test]
    fn test_choices_are_canonicalized() {
        let prepared = prepare_event(payload(json!({
            "name": "Yoga",
            "type": "Class",
            "status": "Pending_Approval",
            "recurring": "BiWeekly",
            "date_time": "2025-01-06T14:00:00",
            "recurring_end_date": "2025-06-01",
            "recurring_pattern": "{\"dayOfWeek\": 1, \"time\": \"14:00\"}"
        })))
        .unwrap();
        assert_eq!(prepared.event_type, EventType::Class);
        assert_eq!(prepared.status, Some(EventStatus::PendingApproval));
        assert_eq!(prepared.recurring, Recurring::BiWeekly);
        assert_eq!(prepared.recurring_end_date.as_deref(), Some("2025-06-01"));
        let value = serde_json::to_value(&prepared).unwrap();
        assert_eq!(value["recurring"], "bi-weekly");
        assert_eq!(value["recurring_pattern"], json!({"dayOfWeek": 1, "time": "14:00"}));
    }

    #[test]
    fn test_out_of_range_pattern_numbers() {
        let msg = message(
            prepare_event(payload(json!({
                "name": "Yoga",
                "date_time": "2025-01-06T14:00:00",
                "recurring": "weekly",
                "recurring_end_date": "2025-06-01",
                "recurring_pattern": {"dayOfWeek": -1, "interval": -2}
            })))
            .unwrap_err(),
        );
        assert_eq!(
            msg,
            "Pattern interval must be at least 1; Pattern dayOfWeek must be between 0 and 6"
        );

        let msg = message(
            prepare_event(payload(json!({
                "name": "Yoga",
                "date_time": "2025-01-06T14:00:00",
                "recurring": "monthly",
                "recurring_end_date": "2025-06-01",
                "recurring_pattern": {"dayOfMonth": 300, "interval": 1.5}
            })))
            .unwrap_err(),
        );
        assert!(msg.contains("Pattern interval must be a whole number"));
        assert!(msg.contains("Pattern dayOfMonth must be between 1 and 31"));
    }

    #[test]
    fn test_pattern_must_be_an_object() {
        let msg = message(
            prepare_event(payload(json!({
                "name": "Yoga",
                "date_time": "2025-01-06T14:00:00",
                "recurring": "weekly",
                "recurring_end_date": "2025-06-01",
                "recurring_pattern": [1]
            })))
            .unwrap_err(),
        );
        assert_eq!(msg, "Recurring pattern must be a JSON object");
    }

    #[test]
    fn test_validate_notification() {
        let ok = NotificationPayload {
            title: "Water outage".into(),
            message: "Tomorrow 8-12".into(),
            image_url: None,
        };
        assert!(validate_notification(&ok).is_ok());
        let blank = NotificationPayload {
            title: " ".into(),
            message: String::new(),
            image_url: None,
        };
        let msg = message(validate_notification(&blank).unwrap_err());
        assert_eq!(msg, "Title is required; Message is required");
    }

    #[test]
    fn test_prepare_user() {
        let mut user = UserPayload {
            name: "Dana".into(),
            email: "dana@example.com".into(),
            phone: Some("+48 600-100-200".into()),
            role: Some("User".into()),
            apartment_number: Some("12B".into()),
        };
        let prepared = prepare_user(user.clone()).unwrap();
        assert_eq!(prepared.role.as_deref(), Some("resident"));

        user.email = "dana.example.com".into();
        user.phone = Some("call me".into());
        user.role = Some("superuser".into());
        let msg = message(prepare_user(user).unwrap_err());
        assert!(msg.contains("Unknown role 'superuser'"));
        assert!(msg.contains("Email is not valid"));
        assert!(msg.contains("Phone number is not valid"));
    }

    #[test]
    fn test_validate_images() {
        let files = validate_images(
            vec![
                RawUpload {
                    file_name: Some("a.png".into()),
                    bytes: PNG.to_vec(),
                },
                RawUpload {
                    file_name: None,
                    bytes: JPEG.to_vec(),
                },
            ],
            MAX_GALLERY_UPLOAD,
        )
        .unwrap();
        assert_eq!(files[0].kind, ImageKind::Png);
        assert_eq!(files[1].kind, ImageKind::Jpeg);
        assert_eq!(files[1].file_name, "upload-2.jpg");
    }

    #[test]
    fn test_validate_images_rejects() {
        let png = || RawUpload {
            file_name: Some("a.png".into()),
            bytes: PNG.to_vec(),
        };
        assert!(validate_images(vec![], 3).is_err());
        assert!(validate_images(vec![png(), png(), png(), png()], 3).is_err());

        let gif = RawUpload {
            file_name: Some("cat.gif".into()),
            bytes: b"GIF89a....".to_vec(),
        };
        let msg = message(validate_images(vec![gif], 3).unwrap_err());
        assert_eq!(msg, "cat.gif must be a JPEG or PNG image");

        let empty = RawUpload {
            file_name: None,
            bytes: Vec::new(),
        };
        assert!(validate_images(vec![empty], 1).is_err());
    }
}
