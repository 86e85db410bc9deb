//! Turns service payloads into sorted [`Event`]s in the display timezone.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use log::{debug, trace, warn};

use crate::calendar::Calendar;
use crate::error::{Error, Result};
use crate::event::{
    Attachment, Attendee, ConferenceEntry, Event, EventDetails, Instant, Reminders,
};
use crate::theme::ColorKey;
use crate::types::{ApiCalendar, ApiEvent, ApiPerson, ApiTime, Snapshot};

/// Events starting or ending in this year or later are dropped.
pub const YEAR_CUTOFF: i32 = 2038;

/// Event palette ids "1" to "11" in order.
const EVENT_COLORS: [ColorKey; 11] = [
    ColorKey::BrightBlue,
    ColorKey::BrightGreen,
    ColorKey::BrightMagenta,
    ColorKey::Magenta,
    ColorKey::BrightYellow,
    ColorKey::BrightRed,
    ColorKey::BrightCyan,
    ColorKey::BrightBlack,
    ColorKey::Blue,
    ColorKey::Green,
    ColorKey::Red,
];

/// Map an event `colorId` to a color key.
pub fn color_from_id(id: &str) -> Option<ColorKey> {
    let index: usize = id.trim().parse().ok()?;
    EVENT_COLORS.get(index.checked_sub(1)?).copied()
}

pub fn calendar_from_api(api: ApiCalendar) -> Calendar {
    let color = api.color_spec.as_deref().and_then(|spec| match spec.parse() {
        Ok(color) => Some(color),
        Err(e) => {
            warn!("calendar {}: {}", api.id, e);
            None
        }
    });
    let summary = api
        .summary_override
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(api.summary);
    Calendar {
        id: api.id,
        summary,
        access_role: api.access_role,
        color,
    }
}

pub fn normalize_calendars(list: Vec<ApiCalendar>) -> Vec<Calendar> {
    list.into_iter().map(calendar_from_api).collect()
}

/// Resolve an API time: dates become local midnight, date-times are converted.
///
/// A `dateTime` without an offset is read in the time's own `timeZone`, or in
/// `tz` when that is missing.
pub fn parse_time(time: &ApiTime, tz: Tz) -> Result<Instant> {
    if let Some(text) = &time.date_time {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return Ok(parsed.with_timezone(&tz));
        }
        let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
            .map_err(|e| Error::Event(format!("bad dateTime '{text}': {e}")))?;
        let zone = match time.time_zone.as_deref() {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| Error::Event(format!("bad timeZone '{name}': {e}")))?,
            None => tz,
        };
        let local = zone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| Error::Event(format!("{naive} does not exist in {zone}")))?;
        return Ok(local.with_timezone(&tz));
    }
    if let Some(text) = &time.date {
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|e| Error::Event(format!("bad date '{text}': {e}")))?;
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        return Ok(tz
            .from_local_datetime(&midnight)
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight)));
    }
    Err(Error::Event("time has neither date nor dateTime".into()))
}

fn attendee(person: ApiPerson) -> Attendee {
    Attendee {
        display_name: person.display_name,
        email: person.email,
        is_self: person.is_self,
        response: person.response_status,
    }
}

/// Normalize one event. `Ok(None)` means it was filtered out.
pub fn normalize_event(api: ApiEvent, default_calendar: &str, tz: Tz) -> Result<Option<Event>> {
    if api.status.as_deref() == Some("cancelled") {
        trace!("skipping cancelled event {}", api.id);
        return Ok(None);
    }

    let start = api
        .start
        .as_ref()
        .ok_or_else(|| Error::Event(format!("event {} has no start", api.id)))?;
    let end = api
        .end
        .as_ref()
        .ok_or_else(|| Error::Event(format!("event {} has no end", api.id)))?;
    let start = parse_time(start, tz)?;
    let end = parse_time(end, tz)?;

    if start.year() >= YEAR_CUTOFF || end.year() >= YEAR_CUTOFF {
        trace!("skipping event {} past {}", api.id, YEAR_CUTOFF);
        return Ok(None);
    }
    if end < start {
        return Err(Error::Event(format!("event {} ends before it starts", api.id)));
    }

    let conference = api
        .conference_data
        .map(|data| {
            data.entry_points
                .into_iter()
                .map(|ep| ConferenceEntry {
                    kind: ep.entry_point_type,
                    uri: ep.uri,
                })
                .collect()
        })
        .unwrap_or_default();

    let reminders = api.reminders.map(|r| {
        if r.use_default {
            Reminders::Default
        } else {
            Reminders::Overrides(r.overrides)
        }
    });

    let details = EventDetails {
        html_link: api.html_link,
        hangout_link: api.hangout_link,
        conference,
        location: api.location,
        description: api.description,
        organizer: api.organizer.map(attendee),
        attendees: api.attendees.into_iter().map(attendee).collect(),
        attachments: api
            .attachments
            .into_iter()
            .map(|a| Attachment {
                title: a.title,
                file_url: a.file_url,
            })
            .collect(),
        reminders,
        creator_email: api.creator.and_then(|c| c.email),
    };

    let event = Event {
        calendar_id: api
            .calendar_id
            .unwrap_or_else(|| default_calendar.to_string()),
        id: api.id,
        title: api.summary.unwrap_or_default(),
        start,
        end,
        color_override: api.color_id.as_deref().and_then(color_from_id),
        details,
    };
    trace!("normalized event {} ({} - {})", event.id, event.start, event.end);
    Ok(Some(event))
}

/// Normalize a batch, dropping unusable items, sorted by `(start, end)`.
pub fn normalize_events(items: Vec<ApiEvent>, default_calendar: &str, tz: Tz) -> Vec<Event> {
    let total = items.len();
    let mut events: Vec<Event> = items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.clone();
            match normalize_event(item, default_calendar, tz) {
                Ok(event) => event,
                Err(e) => {
                    warn!("skipping event {}: {}", id, e);
                    None
                }
            }
        })
        .collect();
    events.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
    debug!("normalized {} of {} events", events.len(), total);
    events
}

impl Snapshot {
    /// Read a snapshot saved as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Split into calendars and normalized events. Events without a
    /// calendar id belong to the first calendar.
    pub fn into_parts(self, tz: Tz) -> (Vec<Calendar>, Vec<Event>) {
        let fallback = self
            .calendars
            .first()
            .map(|c| c.id.clone())
            .unwrap_or_else(|| "primary".to_string());
        let calendars = normalize_calendars(self.calendars);
        let events = normalize_events(self.events, &fallback, tz);
        (calendars, events)
    }
}
