//! Calendar metadata and selection.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ColorConfig;
use crate::error::Result;
use crate::theme::ColorKey;

/// The viewer's access level on a calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessRole {
    Owner,
    Writer,
    Reader,
    FreeBusyReader,
    #[default]
    #[serde(other)]
    None,
}

impl AccessRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessRole::Owner => "owner",
            AccessRole::Writer => "writer",
            AccessRole::Reader => "reader",
            AccessRole::FreeBusyReader => "freeBusyReader",
            AccessRole::None => "none",
        }
    }
}

/// Display metadata for one calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub access_role: AccessRole,
    /// Explicit color chosen by the user, wins over the access-role color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorKey>,
}

impl Calendar {
    /// Color used for this calendar's events.
    pub fn color(&self, colors: &ColorConfig) -> ColorKey {
        if let Some(color) = self.color {
            return color;
        }
        match self.access_role {
            AccessRole::Owner => colors.owner,
            AccessRole::Writer => colors.writer,
            AccessRole::Reader => colors.reader,
            AccessRole::FreeBusyReader => colors.freebusy,
            AccessRole::None => ColorKey::Default,
        }
    }
}

/// Calendars known to a render call, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct CalendarIndex {
    calendars: Vec<Calendar>,
}

impl CalendarIndex {
    pub fn new(calendars: Vec<Calendar>) -> Self {
        Self { calendars }
    }

    pub fn get(&self, id: &str) -> Option<&Calendar> {
        self.calendars.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }
}

/// A `--calendar` selector: a name regex with an optional `#color` suffix.
#[derive(Debug, Clone)]
pub struct CalendarFilter {
    pattern: Regex,
    color: Option<ColorKey>,
}

impl CalendarFilter {
    /// Parse `pattern` or `pattern#color`.
    ///
    /// A suffix that is not a known color is treated as part of the pattern.
    pub fn parse(spec: &str) -> Result<Self> {
        if let Some((pattern, color)) = spec.rsplit_once('#')
            && let Ok(color) = color.parse::<ColorKey>()
        {
            return Ok(Self {
                pattern: Regex::new(pattern)?,
                color: Some(color),
            });
        }
        Ok(Self {
            pattern: Regex::new(spec)?,
            color: None,
        })
    }

    pub fn matches(&self, calendar: &Calendar) -> bool {
        self.pattern.is_match(&calendar.summary)
    }
}

/// Keep the calendars matched by any filter. No filters keeps everything.
pub fn select_calendars(calendars: Vec<Calendar>, filters: &[CalendarFilter]) -> Vec<Calendar> {
    if filters.is_empty() {
        return calendars;
    }
    calendars
        .into_iter()
        .filter_map(|mut cal| {
            let matched: Vec<&CalendarFilter> =
                filters.iter().filter(|f| f.matches(&cal)).collect();
            if matched.is_empty() {
                return None;
            }
            if let Some(color) = matched.iter().find_map(|f| f.color) {
                cal.color = Some(color);
            }
            Some(cal)
        })
        .collect()
}
