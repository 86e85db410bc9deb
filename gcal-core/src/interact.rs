//! Answers to the delete and edit prompts, and the edits they produce.
//!
//! Parsing never fails: unknown answers come back as `Invalid` so the caller
//! can re-prompt.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::event::{Event, Instant, Reminder};
use crate::types::{ApiReminders, ApiTime, EventPatch};

pub const DELETE_PROMPT: &str = "Delete? [N]o [y]es [q]uit: ";
pub const EDIT_PROMPT: &str =
    "Edit? [N]o [s]ave [q]uit [t]itle [l]ocation [w]hen len[g]th [r]eminder [c]olor [d]escr: ";

/// Event color names, in palette order "1" to "11".
pub const EVENT_COLOR_NAMES: [&str; 11] = [
    "lavender",
    "sage",
    "grape",
    "flamingo",
    "banana",
    "tangerine",
    "peacock",
    "graphite",
    "blueberry",
    "basil",
    "tomato",
];

/// Outcome of one prompt in an interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// Leave this event and move to the next one.
    Continue,
    /// Send the collected changes.
    Save,
    /// Stop the whole session.
    Quit,
    /// Unrecognized answer; ask again.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteChoice {
    Keep,
    Delete,
    Quit,
    Invalid,
}

pub fn parse_delete_answer(input: &str) -> DeleteChoice {
    match input.trim().to_lowercase().as_str() {
        "" | "n" | "no" => DeleteChoice::Keep,
        "y" | "yes" => DeleteChoice::Delete,
        "q" | "quit" => DeleteChoice::Quit,
        _ => DeleteChoice::Invalid,
    }
}

/// Field an edit answer selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Location,
    When,
    Length,
    Reminder,
    Color,
    Description,
}

impl EditField {
    /// Prompt asking for the new value.
    pub fn prompt(&self) -> &'static str {
        match self {
            EditField::Title => "Title: ",
            EditField::Location => "Location: ",
            EditField::When => "When (YYYY-MM-DD [HH:MM]): ",
            EditField::Length => "Length (e.g. 45, 90m, 2h, 1d): ",
            EditField::Reminder => "Reminder (e.g. 10m popup, 1d email): ",
            EditField::Color => "Color (name or 1-11): ",
            EditField::Description => "Description: ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditChoice {
    Step(SessionStep),
    Field(EditField),
}

pub fn parse_edit_answer(input: &str) -> EditChoice {
    let field = match input.trim().to_lowercase().as_str() {
        "" | "n" => return EditChoice::Step(SessionStep::Continue),
        "s" => return EditChoice::Step(SessionStep::Save),
        "q" => return EditChoice::Step(SessionStep::Quit),
        "t" => EditField::Title,
        "l" => EditField::Location,
        "w" => EditField::When,
        "g" => EditField::Length,
        "r" => EditField::Reminder,
        "c" => EditField::Color,
        "d" => EditField::Description,
        _ => return EditChoice::Step(SessionStep::Invalid),
    };
    EditChoice::Field(field)
}

/// Parse a duration like `45`, `90m`, `2h`, `1d` or `1w` into minutes.
pub fn parse_minutes(text: &str) -> Result<i64> {
    let text = text.trim().to_lowercase();
    let (number, unit) = match text.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&text[..idx], c),
        _ => (text.as_str(), 'm'),
    };
    let scale = match unit {
        'w' => 7 * 24 * 60,
        'd' => 24 * 60,
        'h' => 60,
        'm' => 1,
        other => return Err(Error::Input(format!("unknown time unit '{other}'"))),
    };
    let amount: i64 = number
        .trim()
        .parse()
        .map_err(|_| Error::Input(format!("not a duration: {text}")))?;
    if amount < 0 {
        return Err(Error::Input(format!("negative duration: {text}")));
    }
    amount
        .checked_mul(scale)
        .ok_or_else(|| Error::Input(format!("duration too long: {text}")))
}

/// Parse `10m popup` or `1d email`. The method defaults to popup.
pub fn parse_reminder(text: &str) -> Result<Reminder> {
    let mut parts = text.split_whitespace();
    let amount = parts
        .next()
        .ok_or_else(|| Error::Input("empty reminder".into()))?;
    let minutes = parse_minutes(amount)?;
    let method = parts.next().unwrap_or("popup").to_lowercase();
    if method != "popup" && method != "email" {
        return Err(Error::Input(format!(
            "unknown reminder method '{method}' (valid: popup, email)"
        )));
    }
    Ok(Reminder { method, minutes })
}

/// Event color id ("1" to "11") from a palette name or number.
pub fn parse_color_id(text: &str) -> Result<String> {
    let text = text.trim().to_lowercase();
    if let Ok(n) = text.parse::<usize>()
        && (1..=EVENT_COLOR_NAMES.len()).contains(&n)
    {
        return Ok(n.to_string());
    }
    EVENT_COLOR_NAMES
        .iter()
        .position(|name| *name == text)
        .map(|i| (i + 1).to_string())
        .ok_or_else(|| {
            Error::Input(format!(
                "unknown color '{text}' (valid: {} or 1-11)",
                EVENT_COLOR_NAMES.join(", ")
            ))
        })
}

/// Parse a start time. A bare date means an all-day event.
pub fn parse_when(text: &str, tz: Tz) -> Result<(Instant, bool)> {
    let text = text.trim();
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok((localize(naive, tz)?, false));
        }
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| Error::Input(format!("not a date: {text}")))?;
    Ok((localize(date.and_time(NaiveTime::MIN), tz)?, true))
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Result<Instant> {
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| Error::Input(format!("{naive} does not exist in {}", tz.name())))
}

/// Collects field edits for one event into an [`EventPatch`].
#[derive(Debug, Clone)]
pub struct EventEditor {
    tz: Tz,
    start: Instant,
    end: Instant,
    all_day: bool,
    patch: EventPatch,
}

impl EventEditor {
    pub fn new(event: &Event, tz: Tz) -> Self {
        Self {
            tz,
            start: event.start,
            end: event.end,
            all_day: event.is_all_day(),
            patch: EventPatch::default(),
        }
    }

    /// Apply one answer. A blank value leaves the field unchanged.
    pub fn apply(&mut self, field: EditField, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }
        match field {
            EditField::Title => self.patch.summary = Some(value.to_string()),
            EditField::Location => self.patch.location = Some(value.to_string()),
            EditField::Description => self.patch.description = Some(value.to_string()),
            EditField::Color => self.patch.color_id = Some(parse_color_id(value)?),
            EditField::Reminder => {
                let reminder = parse_reminder(value)?;
                self.patch.reminders = Some(ApiReminders {
                    use_default: false,
                    overrides: vec![reminder],
                });
            }
            EditField::When => {
                let (start, all_day) = parse_when(value, self.tz)?;
                let length = match (self.all_day, all_day) {
                    (false, true) => Duration::days(1),
                    (true, false) => Duration::hours(1),
                    _ => self.end - self.start,
                };
                let end = start
                    .checked_add_signed(length)
                    .ok_or_else(|| Error::Input(format!("event too long: {value}")))?;
                self.start = start;
                self.end = end;
                self.all_day = all_day;
                self.set_times();
            }
            EditField::Length => {
                let minutes = parse_minutes(value)?;
                self.end = Duration::try_minutes(minutes)
                    .and_then(|length| self.start.checked_add_signed(length))
                    .ok_or_else(|| Error::Input(format!("length too long: {value}")))?;
                self.set_times();
            }
        }
        Ok(())
    }

    fn set_times(&mut self) {
        let (start, end) = if self.all_day {
            (date_time(&self.start, None), date_time(&self.end, None))
        } else {
            (
                date_time(&self.start, Some(self.tz)),
                date_time(&self.end, Some(self.tz)),
            )
        };
        self.patch.start = Some(start);
        self.patch.end = Some(end);
    }

    pub fn patch(&self) -> &EventPatch {
        &self.patch
    }

    pub fn into_patch(self) -> EventPatch {
        self.patch
    }
}

fn date_time(at: &Instant, tz: Option<Tz>) -> ApiTime {
    match tz {
        Some(tz) => ApiTime {
            date_time: Some(at.to_rfc3339()),
            time_zone: Some(tz.name().to_string()),
            ..ApiTime::default()
        },
        None => ApiTime {
            date: Some(at.format("%Y-%m-%d").to_string()),
            ..ApiTime::default()
        },
    }
}
