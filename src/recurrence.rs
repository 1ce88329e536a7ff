//! Human-readable schedule descriptions for events.
//!
//! Recurrence expansion is done by the backend; here we only interpret the
//! stored pattern for display and compare it with the server's
//! `next_date_time`. Anything that cannot be interpreted falls back to the
//! plain next date.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use chrono_tz::Tz;
use serde_json::{Map, Value};

use crate::datetime::{
    format_clock, format_date, format_datetime, parse_api_date, parse_api_datetime, parse_clock,
};
use crate::models::{Event, Recurring, RecurringPattern};

pub const NO_UPCOMING_DATE: &str = "No upcoming date";

#[derive(Debug, Clone, Copy)]
pub struct ScheduleInput<'a> {
    pub recurring: Recurring,
    pub base: Option<NaiveDateTime>,
    pub end: Option<NaiveDate>,
    pub pattern: Option<&'a Value>,
    pub next: Option<NaiveDateTime>,
}

impl<'a> ScheduleInput<'a> {
    pub fn from_event(event: &'a Event, tz: Tz) -> Self {
        let parse = |value: &Option<String>| {
            value
                .as_deref()
                .and_then(|raw| parse_api_datetime(raw, tz))
        };
        Self {
            recurring: event.recurring,
            base: parse(&event.date_time),
            // A calendar day, never shifted into `tz`.
            end: event.recurring_end_date.as_deref().and_then(parse_api_date),
            pattern: event.recurring_pattern.as_ref(),
            next: parse(&event.next_date_time),
        }
    }
}

pub fn describe_event(event: &Event, tz: Tz) -> String {
    describe_schedule(&ScheduleInput::from_event(event, tz))
}

pub fn describe_schedule(input: &ScheduleInput<'_>) -> String {
    if input.recurring.is_recurring()
        && let Some(text) = describe_recurring(input)
    {
        return text;
    }
    input
        .next
        .or(input.base)
        .map(format_datetime)
        .unwrap_or_else(|| NO_UPCOMING_DATE.to_string())
}

fn describe_recurring(input: &ScheduleInput<'_>) -> Option<String> {
    let pattern = parse_pattern(input.pattern?)?;
    let time = match pattern.time.as_deref() {
        Some(raw) => parse_clock(raw)?,
        None => input.base?.time(),
    };
    let interval = pattern.interval.filter(|n| *n > 1);
    let clock = format_clock(time);

    let (mut text, anchor) = match input.recurring {
        Recurring::Weekly | Recurring::BiWeekly => {
            let weekday = weekday_from_index(pattern.day_of_week?)?;
            let name = weekday_name(weekday);
            let phrase = match (input.recurring, interval) {
                (Recurring::BiWeekly, _) => format!("Every other {name} at {clock}"),
                (_, Some(n)) => format!("Every {n} weeks on {name} at {clock}"),
                _ => format!("Every {name} at {clock}"),
            };
            (phrase, Anchor::Weekday(weekday))
        }
        Recurring::Monthly => {
            let day = pattern.day_of_month.filter(|d| (1..=31).contains(d))?;
            let phrase = match interval {
                Some(n) => format!("Every {n} months on day {day} at {clock}"),
                None => format!("Monthly on day {day} at {clock}"),
            };
            (phrase, Anchor::MonthDay(day))
        }
        Recurring::None => return None,
    };

    if let Some(base) = input.base {
        text.push_str(&format!(", Start: {}", format_date(base.date())));
    }
    if let Some(end) = input.end {
        let joiner = if input.base.is_some() { " – " } else { ", " };
        text.push_str(&format!("{joiner}Until: {}", format_date(end)));
    }
    if let Some(next) = input.next {
        text.push_str(&format!(", Next: {}", format_date(next.date())));
        if !anchor.matches(next.date()) || !same_clock(next.time(), time) {
            text.push_str(" (rescheduled)");
        }
    }
    Some(text)
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Weekday(Weekday),
    MonthDay(u8),
}

impl Anchor {
    fn matches(self, date: NaiveDate) -> bool {
        match self {
            Anchor::Weekday(weekday) => date.weekday() == weekday,
            Anchor::MonthDay(day) => falls_on_month_day(date, day),
        }
    }
}

/// Reads a stored pattern leniently: the value may be an object or a string
/// holding JSON, and numbers may arrive as numeric strings. `None` when any
/// present field is unusable.
pub fn parse_pattern(value: &Value) -> Option<RecurringPattern> {
    pattern_from_map(&pattern_object(value)?)
}

/// The pattern's fields, whether stored as an object or as JSON text.
pub(crate) fn pattern_object(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw).ok()? {
            Value::Object(map) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

fn pattern_from_map(map: &Map<String, Value>) -> Option<RecurringPattern> {
    let day_of_week = match int_field(map, &["dayOfWeek", "day_of_week"])? {
        None => None,
        Some(day) => Some(u8::try_from(day).ok().filter(|d| *d <= 6)?),
    };
    let day_of_month = match int_field(map, &["dayOfMonth", "day_of_month"])? {
        None => None,
        Some(day) => Some(u8::try_from(day).ok()?),
    };
    let time = match lookup(map, &["time"]) {
        None => None,
        Some(Value::String(raw)) => Some(raw.trim().to_string()),
        Some(_) => return None,
    };
    // Non-positive intervals are treated as "every".
    let interval = int_field(map, &["interval"])?.and_then(|n| u32::try_from(n).ok());

    Some(RecurringPattern {
        day_of_week,
        day_of_month,
        time,
        interval,
    })
}

pub(crate) fn lookup<'m>(map: &'m Map<String, Value>, keys: &[&str]) -> Option<&'m Value> {
    keys.iter()
        .find_map(|key| map.get(*key))
        .filter(|value| !value.is_null())
}

/// Outer `None` means the field is present but not an integer.
pub(crate) fn int_field(map: &Map<String, Value>, keys: &[&str]) -> Option<Option<i64>> {
    match lookup(map, keys) {
        None => Some(None),
        Some(Value::Number(n)) => n.as_i64().map(Some),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok().map(Some),
        Some(_) => None,
    }
}

/// 0 = Sunday through 6 = Saturday.
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// Day 31 in a 30-day month lands on the last day.
fn falls_on_month_day(date: NaiveDate, day: u8) -> bool {
    let day = u32::from(day);
    if date.day() == day {
        return true;
    }
    let is_last_day = date.succ_opt().is_none_or(|next| next.month() != date.month());
    is_last_day && day > date.day()
}

fn same_clock(a: NaiveTime, b: NaiveTime) -> bool {
    a.hour() == b.hour() && a.minute() == b.minute()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        parse_api_datetime(value, Tz::UTC).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_none_formats_next_regardless_of_pattern() {
        let pattern = json!({"dayOfWeek": 3, "time": "08:00"});
        let input = ScheduleInput {
            recurring: Recurring::None,
            base: Some(at("2025-01-01T10:00:00")),
            end: Some(date(2025, 6, 1)),
            pattern: Some(&pattern),
            next: Some(at("2025-02-14T18:30:00")),
        };
        assert_eq!(describe_schedule(&input), "14/2/2025 18:30");
    }

    #[test]
    fn test_weekly_description() {
        let pattern = json!({"dayOfWeek": 1, "time": "14:00"});
        let input = ScheduleInput {
            recurring: Recurring::Weekly,
            base: Some(at("2025-01-06T14:00:00")),
            end: Some(date(2025, 6, 1)),
            pattern: Some(&pattern),
            next: Some(at("2025-01-13T14:00")),
        };
        let text = describe_schedule(&input);
        assert!(text.contains("Monday"));
        assert!(text.contains("14:00"));
        assert!(text.contains("6/1/2025"));
        assert!(text.contains("1/6/2025"));
        assert!(text.contains("13/1/2025"));
        assert_eq!(
            text,
            "Every Monday at 14:00, Start: 6/1/2025 – Until: 1/6/2025, Next: 13/1/2025"
        );
    }

    #[test]
    fn test_monthly_description() {
        let pattern = json!({"dayOfMonth": 15, "time": "09:30"});
        let input = ScheduleInput {
            recurring: Recurring::Monthly,
            base: Some(at("2025-01-15T09:30:00")),
            end: None,
            pattern: Some(&pattern),
            next: Some(at("2025-02-15T09:30:00")),
        };
        let text = describe_schedule(&input);
        assert!(text.contains("15"));
        assert!(text.contains("09:30"));
        assert_eq!(text, "Monthly on day 15 at 09:30, Start: 15/1/2025, Next: 15/2/2025");
    }

    #[test]
    fn test_bi_weekly_and_interval() {
        let pattern = json!({"dayOfWeek": "5", "time": "18:00", "interval": 2});
        let mut input = ScheduleInput {
            recurring: Recurring::BiWeekly,
            base: None,
            end: None,
            pattern: Some(&pattern),
            next: None,
        };
        assert_eq!(describe_schedule(&input), "Every other Friday at 18:00");

        input.recurring = Recurring::Weekly;
        assert_eq!(describe_schedule(&input), "Every 2 weeks on Friday at 18:00");
    }

    #[test]
    fn test_time_defaults_to_base_time() {
        let pattern = json!({"dayOfWeek": 0});
        let input = ScheduleInput {
            recurring: Recurring::Weekly,
            base: Some(at("2025-03-02T11:15:00")),
            end: None,
            pattern: Some(&pattern),
            next: None,
        };
        assert_eq!(describe_schedule(&input), "Every Sunday at 11:15, Start: 2/3/2025");
    }

    #[test]
    fn test_pattern_as_json_string() {
        let pattern = Value::String(r#"{"dayOfWeek": 2, "time": "07:45"}"#.to_string());
        let input = ScheduleInput {
            recurring: Recurring::Weekly,
            base: None,
            end: None,
            pattern: Some(&pattern),
            next: None,
        };
        assert_eq!(describe_schedule(&input), "Every Tuesday at 07:45");
    }

    #[test]
    fn test_malformed_pattern_falls_back() {
        let next = Some(at("2025-01-13T14:00:00"));
        for pattern in [
            Value::String(String::new()),
            Value::String("{not json".to_string()),
            json!([1, 2]),
            json!({"time": "14:00"}),
            json!({"dayOfWeek": 9, "time": "14:00"}),
            json!({"dayOfWeek": "mon", "time": "14:00"}),
            json!({"dayOfWeek": 1, "time": "2pm"}),
        ] {
            let input = ScheduleInput {
                recurring: Recurring::Weekly,
                base: Some(at("2025-01-06T14:00:00")),
                end: None,
                pattern: Some(&pattern),
                next,
            };
            assert_eq!(describe_schedule(&input), "13/1/2025 14:00", "pattern {pattern}");
        }
    }

    #[test]
    fn test_missing_pattern_and_dates() {
        let input = ScheduleInput {
            recurring: Recurring::Monthly,
            base: None,
            end: None,
            pattern: None,
            next: None,
        };
        assert_eq!(describe_schedule(&input), NO_UPCOMING_DATE);
    }

    #[test]
    fn test_rescheduled_next_occurrence() {
        let pattern = json!({"dayOfWeek": 1, "time": "14:00"});
        let moved_day = ScheduleInput {
            recurring: Recurring::Weekly,
            base: None,
            end: None,
            pattern: Some(&pattern),
            next: Some(at("2025-01-14T14:00:00")),
        };
        assert!(describe_schedule(&moved_day).ends_with("Next: 14/1/2025 (rescheduled)"));

        let moved_time = ScheduleInput {
            next: Some(at("2025-01-13T16:00:00")),
            ..moved_day
        };
        assert!(describe_schedule(&moved_time).ends_with("(rescheduled)"));
    }

    #[test]
    fn test_monthly_day_clamped_to_month_end() {
        let pattern = json!({"dayOfMonth": 31, "time": "10:00"});
        let input = ScheduleInput {
            recurring: Recurring::Monthly,
            base: None,
            end: None,
            pattern: Some(&pattern),
            next: Some(at("2025-04-30T10:00:00")),
        };
        assert_eq!(describe_schedule(&input), "Monthly on day 31 at 10:00, Next: 30/4/2025");
    }

    #[test]
    fn test_describe_event_is_idempotent() {
        let event: Event = serde_json::from_value(json!({
            "id": 1,
            "name": "Pilates",
            "recurring": "weekly",
            "date_time": "2025-01-06T14:00:00",
            "recurring_end_date": "2025-06-01",
            "recurring_pattern": "{\"dayOfWeek\":1,\"time\":\"14:00\"}",
            "next_date_time": "2025-01-13T14:00:00"
        }))
        .unwrap();
        let first = describe_event(&event, Tz::UTC);
        let second = describe_event(&event, Tz::UTC);
        assert_eq!(first, second);
        assert!(first.starts_with("Every Monday at 14:00"));
    }

    #[test]
    fn test_end_date_keeps_calendar_day_in_other_zones() {
        let event: Event = serde_json::from_value(json!({
            "id": 2,
            "name": "Yoga",
            "recurring": "weekly",
            "date_time": "2025-01-06T14:00:00",
            "recurring_end_date": "2025-06-01T00:00:00Z",
            "recurring_pattern": {"dayOfWeek": 1, "time": "14:00"},
            "next_date_time": "2025-01-13T14:00:00"
        }))
        .unwrap();
        assert_eq!(
            describe_event(&event, chrono_tz::America::New_York),
            "Every Monday at 14:00, Start: 6/1/2025 – Until: 1/6/2025, Next: 13/1/2025"
        );
    }
}
