//! The normalized event model consumed by every renderer.

use chrono::{DateTime, Duration, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::theme::ColorKey;

/// Title shown for events without a usable summary.
pub const UNTITLED: &str = "(No title)";

/// A timezone-aware instant in the display timezone.
pub type Instant = DateTime<Tz>;

/// A single calendar occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    /// Key into the render call's calendar index.
    pub calendar_id: String,
    pub title: String,
    pub start: Instant,
    /// Exclusive end. For all-day events this is midnight after the last day.
    pub end: Instant,
    /// Explicit per-event color, used when override coloring is enabled.
    pub color_override: Option<ColorKey>,
    pub details: EventDetails,
}

impl Event {
    /// Title to display, falling back to a placeholder when blank.
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() { UNTITLED } else { title }
    }

    /// True when both ends sit exactly on local midnight.
    pub fn is_all_day(&self) -> bool {
        is_midnight(&self.start) && is_midnight(&self.end)
    }

    /// True while `now` lies within the event, both ends inclusive.
    pub fn is_happening(&self, now: &Instant) -> bool {
        self.start <= *now && *now <= self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

fn is_midnight(dt: &Instant) -> bool {
    dt.hour() == 0 && dt.minute() == 0
}

/// Optional secondary attributes. Only filled when details were requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub html_link: Option<String>,
    pub hangout_link: Option<String>,
    #[serde(default)]
    pub conference: Vec<ConferenceEntry>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub organizer: Option<Attendee>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub reminders: Option<Reminders>,
    pub creator_email: Option<String>,
}

/// One way of joining a conference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceEntry {
    pub kind: String,
    pub uri: String,
}

/// Attendee response to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    NeedsAction,
    Declined,
    Tentative,
    Accepted,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Set when this entry is the viewer.
    #[serde(default)]
    pub is_self: bool,
    pub response: Option<ResponseStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub title: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub method: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reminders {
    /// The calendar's default reminders apply.
    Default,
    Overrides(Vec<Reminder>),
}

/// Clock time of `dt`: `09:00` in military mode, `9:00am` otherwise.
pub fn format_clock(dt: &Instant, military: bool) -> String {
    if military {
        dt.format("%H:%M").to_string()
    } else {
        let hour = dt.format("%I:%M").to_string();
        format!(
            "{}{}",
            hour.trim_start_matches('0'),
            dt.format("%p").to_string().to_lowercase()
        )
    }
}

/// Render a duration the way `H:MM:SS` timers read, with a day prefix.
///
/// `1 day, 2:00:00`, `0:15:00`, `-1 day, 23:00:00`.
pub fn format_length(length: Duration) -> String {
    let total = length.num_seconds();
    let days = total.div_euclid(86_400);
    let rest = total.rem_euclid(86_400);
    let clock = format!("{}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);
    match days {
        0 => clock,
        1 | -1 => format!("{} day, {}", days, clock),
        _ => format!("{} days, {}", days, clock),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{at, event};
    use super::*;

    #[test]
    fn test_display_title_placeholder() {
        let e = event("   ", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 0));
        assert_eq!(e.display_title(), UNTITLED);
        let e = event(" Standup ", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 0));
        assert_eq!(e.display_title(), "Standup");
    }

    #[test]
    fn test_all_day_detection() {
        assert!(event("Trip", at(2024, 1, 8, 0, 0), at(2024, 1, 11, 0, 0)).is_all_day());
        assert!(!event("Late", at(2024, 1, 8, 0, 0), at(2024, 1, 8, 1, 0)).is_all_day());
        assert!(!event("Eve", at(2024, 1, 7, 23, 0), at(2024, 1, 8, 0, 0)).is_all_day());
    }

    #[test]
    fn test_happening_inclusive() {
        let e = event("Call", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 0));
        assert!(e.is_happening(&at(2024, 1, 8, 9, 0)));
        assert!(e.is_happening(&at(2024, 1, 8, 10, 0)));
        assert!(!e.is_happening(&at(2024, 1, 8, 10, 1)));
    }

    #[test]
    fn test_format_clock() {
        let morning = at(2024, 1, 8, 9, 5);
        let evening = at(2024, 1, 8, 21, 30);
        assert_eq!(format_clock(&morning, true), "09:05");
        assert_eq!(format_clock(&morning, false), "9:05am");
        assert_eq!(format_clock(&evening, false), "9:30pm");
        assert_eq!(format_clock(&at(2024, 1, 8, 12, 0), false), "12:00pm");
    }

    #[test]
    fn test_format_length() {
        assert_eq!(format_length(Duration::minutes(15)), "0:15:00");
        assert_eq!(format_length(Duration::hours(26)), "1 day, 2:00:00");
        assert_eq!(format_length(Duration::days(3)), "3 days, 0:00:00");
        assert_eq!(format_length(Duration::hours(-1)), "-1 day, 23:00:00");
    }
}
