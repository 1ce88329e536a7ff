use std::str::FromStr;

use crate::models::{Event, EventStatus, GalleryPhoto, PhotoStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    #[default]
    All,
    Approved,
    PendingApproval,
}

impl EventFilter {
    pub fn matches(self, event: &Event) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Approved => event.status == EventStatus::Approved,
            EventFilter::PendingApproval => event.status == EventStatus::PendingApproval,
        }
    }
}

impl FromStr for EventFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "" | "all" => Ok(EventFilter::All),
            "approved" => Ok(EventFilter::Approved),
            "pending-approval" | "pending" => Ok(EventFilter::PendingApproval),
            other => Err(format!(
                "Unknown status filter '{other}', expected all, approved or pending-approval"
            )),
        }
    }
}

/// Keeps matching events in their original order.
pub fn filter_events(events: Vec<Event>, filter: EventFilter) -> Vec<Event> {
    if filter == EventFilter::All {
        return events;
    }
    events.into_iter().filter(|e| filter.matches(e)).collect()
}

pub fn filter_photos(photos: Vec<GalleryPhoto>, status: Option<PhotoStatus>) -> Vec<GalleryPhoto> {
    match status {
        Some(status) => photos.into_iter().filter(|p| p.status == status).collect(),
        None => photos,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(id: i64, status: &str) -> Event {
        serde_json::from_value(json!({"id": id, "name": format!("event {id}"), "status": status}))
            .unwrap()
    }

    fn mixed() -> Vec<Event> {
        vec![
            event(1, "approved"),
            event(2, "pending-approval"),
            event(3, "rejected"),
            event(4, "approved"),
            event(5, "pending-approval"),
        ]
    }

    #[test]
    fn test_filter_approved_keeps_order() {
        let ids: Vec<i64> = filter_events(mixed(), EventFilter::Approved)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_filter_pending() {
        let ids: Vec<i64> = filter_events(mixed(), EventFilter::PendingApproval)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn test_filter_all_unchanged() {
        assert_eq!(filter_events(mixed(), EventFilter::All), mixed());
    }

    #[test]
    fn test_parse_filter_keys() {
        assert_eq!("all".parse::<EventFilter>(), Ok(EventFilter::All));
        assert_eq!("".parse::<EventFilter>(), Ok(EventFilter::All));
        assert_eq!("Approved".parse::<EventFilter>(), Ok(EventFilter::Approved));
        assert_eq!(
            "pending_approval".parse::<EventFilter>(),
            Ok(EventFilter::PendingApproval)
        );
        assert!("rejected".parse::<EventFilter>().is_err());
    }

    #[test]
    fn test_filter_photos() {
        let photos: Vec<GalleryPhoto> = serde_json::from_value(json!([
            {"id": 1, "status": "private"},
            {"id": 2, "status": "approved"}
        ]))
        .unwrap();
        let approved = filter_photos(photos.clone(), Some(PhotoStatus::Approved));
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, 2);
        assert_eq!(filter_photos(photos, None).len(), 2);
    }
}
