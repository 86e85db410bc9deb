//! Wire types exchanged with the calendar service.
//!
//! Shapes follow the Google Calendar v3 resources the service proxies.

use serde::{Deserialize, Serialize};

use crate::calendar::AccessRole;
use crate::event::{Reminder, ResponseStatus};

/// Calendar list entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCalendar {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_override: Option<String>,
    #[serde(default)]
    pub access_role: AccessRole,
    /// Local color name, e.g. from a saved snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_spec: Option<String>,
}

/// Start or end of an event: `date` for all-day events, `dateTime` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPerson {
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "self", default)]
    pub is_self: bool,
    pub response_status: Option<ResponseStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEntryPoint {
    #[serde(default)]
    pub entry_point_type: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConferenceData {
    #[serde(default)]
    pub entry_points: Vec<ApiEntryPoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAttachment {
    pub title: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReminders {
    #[serde(default)]
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<Reminder>,
}

/// Event resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    #[serde(default)]
    pub id: String,
    /// Owning calendar. Set by the service on search results and in snapshots.
    pub calendar_id: Option<String>,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub start: Option<ApiTime>,
    pub end: Option<ApiTime>,
    pub color_id: Option<String>,
    pub html_link: Option<String>,
    pub hangout_link: Option<String>,
    pub conference_data: Option<ApiConferenceData>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub organizer: Option<ApiPerson>,
    #[serde(default)]
    pub attendees: Vec<ApiPerson>,
    #[serde(default)]
    pub attachments: Vec<ApiAttachment>,
    pub reminders: Option<ApiReminders>,
    pub creator: Option<ApiPerson>,
}

/// Partial event update sent with `PATCH`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<ApiTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<ApiTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<ApiReminders>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Calendars and events saved from the service, rendered offline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub calendars: Vec<ApiCalendar>,
    #[serde(default)]
    pub events: Vec<ApiEvent>,
}
