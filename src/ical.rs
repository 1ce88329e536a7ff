use chrono::{Duration, NaiveDateTime, Weekday};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, Event as CalendarEvent, EventLike};

use crate::datetime::parse_api_datetime;
use crate::models::{Event, Recurring};
use crate::recurrence::{ScheduleInput, describe_schedule, parse_pattern, weekday_from_index};

#[derive(Clone)]
pub struct ICalExporter {
    calendar_name: String,
    timezone: Tz,
}

impl ICalExporter {
    pub fn new(calendar_name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            calendar_name: calendar_name.into(),
            timezone,
        }
    }

    pub fn generate(&self, events: &[Event]) -> Vec<u8> {
        if events.is_empty() {
            return Vec::new();
        }

        let mut calendar = Calendar::new();
        calendar.name(&self.calendar_name);

        for item in events {
            let input = ScheduleInput::from_event(item, self.timezone);
            let Some(start) = input.next.or(input.base) else {
                continue;
            };

            let mut event = CalendarEvent::new();
            event.summary(&item.name);
            event.starts(start);
            event.ends(start + Duration::hours(1));
            if let Some(location) = &item.location {
                event.location(location);
            }
            event.description(&self.description(item, &describe_schedule(&input)));
            event.uid(&format!("community-event-{}", item.id));
            let until = input.end.and_then(|d| d.and_hms_opt(23, 59, 59));
            if let Some(rule) = recurrence_rule(item, until) {
                event.add_property("RRULE", rule);
            }
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }

    fn description(&self, item: &Event, schedule: &str) -> String {
        let mut lines = vec![schedule.to_string()];
        if let Some(description) = item.description.as_deref().filter(|d| !d.trim().is_empty()) {
            lines.push(description.trim().to_string());
        }
        if let Some(instructor) = &item.instructor_name {
            lines.push(format!("Instructor: {instructor}"));
        }
        match item.max_participants {
            Some(max) => lines.push(format!("Participants: {}/{max}", item.current_participants)),
            None => lines.push(format!("Participants: {}", item.current_participants)),
        }
        lines.join("\n")
    }
}

/// `RRULE` value for recurring events. Interval and anchor day come from the
/// pattern when readable, so a moved `DTSTART` does not move the series.
fn recurrence_rule(item: &Event, until: Option<NaiveDateTime>) -> Option<String> {
    let pattern = item.recurring_pattern.as_ref().and_then(parse_pattern);
    let interval = pattern
        .as_ref()
        .and_then(|p| p.interval)
        .filter(|n| *n > 1);
    let mut rule = match item.recurring {
        Recurring::None => return None,
        Recurring::Weekly => match interval {
            Some(n) => format!("FREQ=WEEKLY;INTERVAL={n}"),
            None => "FREQ=WEEKLY".to_string(),
        },
        Recurring::BiWeekly => "FREQ=WEEKLY;INTERVAL=2".to_string(),
        Recurring::Monthly => match interval {
            Some(n) => format!("FREQ=MONTHLY;INTERVAL={n}"),
            None => "FREQ=MONTHLY".to_string(),
        },
    };
    match item.recurring {
        Recurring::Weekly | Recurring::BiWeekly => {
            if let Some(weekday) = pattern
                .as_ref()
                .and_then(|p| p.day_of_week)
                .and_then(weekday_from_index)
            {
                rule.push_str(&format!(";BYDAY={}", weekday_code(weekday)));
            }
        }
        Recurring::Monthly => {
            if let Some(day) = pattern.as_ref().and_then(|p| p.day_of_month) {
                rule.push_str(&month_day_rule(day));
            }
        }
        Recurring::None => {}
    }
    if let Some(until) = until {
        rule.push_str(&format!(";UNTIL={}", until.format("%Y%m%dT%H%M%S")));
    }
    Some(rule)
}

fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

// Days past 28 fall back to the month's last day, as in the schedule text.
fn month_day_rule(day: u8) -> String {
    let day = day.clamp(1, 31);
    if day <= 28 {
        return format!(";BYMONTHDAY={day}");
    }
    let days: Vec<String> = (28..=day).map(|d| d.to_string()).collect();
    format!(";BYMONTHDAY={};BYSETPOS=-1", days.join(","))
}

/// Events with a start time the exporter can place, used to decide on 404.
pub fn has_schedulable(events: &[Event], tz: Tz) -> bool {
    events.iter().any(|e| {
        [&e.next_date_time, &e.date_time]
            .into_iter()
            .flatten()
            .any(|raw| parse_api_datetime(raw, tz).is_some())
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn exporter() -> ICalExporter {
        ICalExporter::new("Community Events", Tz::UTC)
    }

    fn event(value: serde_json::Value) -> Event {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_generate_single_event() {
        let item = event(json!({
            "id": 4,
            "name": "Garden party",
            "date_time": "2025-06-21T17:00:00",
            "location": "Courtyard",
            "max_participants": 40,
            "current_participants": 12
        }));
        let body = String::from_utf8(exporter().generate(&[item])).unwrap();
        assert!(body.contains("BEGIN:VEVENT"));
        assert!(body.contains("SUMMARY:Garden party"));
        assert!(body.contains("community-event-4"));
        assert!(body.contains("Participants: 12/40"));
        assert!(!body.contains("RRULE"));
    }

    #[test]
    fn test_recurring_event_gets_rule() {
        let item = event(json!({
            "id": 5,
            "name": "Yoga",
            "recurring": "bi-weekly",
            "date_time": "2025-01-06T14:00:00",
            "recurring_end_date": "2025-06-01",
            "recurring_pattern": {"dayOfWeek": 1, "time": "14:00"},
            "next_date_time": "2025-01-20T14:00:00"
        }));
        let body = String::from_utf8(exporter().generate(&[item])).unwrap();
        assert!(body.contains("RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=MO;UNTIL=20250601T235959"));
        assert!(body.contains("Every other Monday at 14:00"));
    }

    #[test]
    fn test_rescheduled_start_keeps_pattern_day() {
        let item = event(json!({
            "id": 6,
            "name": "Yoga",
            "recurring": "weekly",
            "date_time": "2025-01-06T14:00:00",
            "recurring_end_date": "2025-06-01",
            "recurring_pattern": {"dayOfWeek": 1, "time": "14:00"},
            "next_date_time": "2025-01-14T14:00:00"
        }));
        let body = String::from_utf8(exporter().generate(&[item])).unwrap();
        assert!(body.contains("DTSTART:20250114T140000"));
        assert!(body.contains("RRULE:FREQ=WEEKLY;BYDAY=MO;UNTIL=20250601T235959"));
    }

    #[test]
    fn test_monthly_rule_days() {
        assert_eq!(month_day_rule(15), ";BYMONTHDAY=15");
        assert_eq!(month_day_rule(30), ";BYMONTHDAY=28,29,30;BYSETPOS=-1");
    }

    #[test]
    fn test_generate_empty() {
        assert!(exporter().generate(&[]).is_empty());
    }

    #[test]
    fn test_has_schedulable() {
        let dated = event(json!({"id": 1, "date_time": "2025-01-06T14:00:00"}));
        let undated = event(json!({"id": 2, "date_time": "soon"}));
        assert!(has_schedulable(&[undated.clone(), dated], Tz::UTC));
        assert!(!has_schedulable(&[undated], Tz::UTC));
    }
}
