//! HTTP client for the calendar service.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::event::Instant;
use crate::types::{ApiCalendar, ApiEvent, EventPatch};

/// Client for the calendar service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: String,
}

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

impl ServiceClient {
    /// Create a new service client.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let timeout = timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// List the calendars visible to the account.
    pub fn calendars(&self) -> Result<Vec<ApiCalendar>> {
        decode(self.get("/calendars", &[])?)
    }

    /// Events of one calendar that overlap `[from, to)`.
    pub fn events(&self, calendar_id: &str, from: &Instant, to: &Instant) -> Result<Vec<ApiEvent>> {
        let from = from.to_rfc3339();
        let to = to.to_rfc3339();
        debug!("fetching {} from {} to {}", calendar_id, from, to);
        let params = [("calendar", calendar_id), ("from", &from), ("to", &to)];
        decode(self.get("/events", &params)?)
    }

    /// Free-text search within one calendar.
    pub fn search(
        &self,
        calendar_id: &str,
        query: &str,
        from: &Instant,
        to: &Instant,
    ) -> Result<Vec<ApiEvent>> {
        let from = from.to_rfc3339();
        let to = to.to_rfc3339();
        let params = [
            ("calendar", calendar_id),
            ("q", query),
            ("from", &from),
            ("to", &to),
        ];
        decode(self.get("/events/search", &params)?)
    }

    /// Apply a partial update and return the updated event.
    pub fn patch_event(&self, calendar_id: &str, event_id: &str, patch: &EventPatch) -> Result<ApiEvent> {
        let payload = serde_json::to_value(patch)?;
        decode(self.patch_json(&event_path(calendar_id, event_id), payload)?)
    }

    pub fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        self.delete(&event_path(calendar_id, event_id))?;
        Ok(())
    }

    // Internal HTTP methods

    fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.http.get(&url).query(params).send()?;
        self.handle_response(resp)
    }

    fn patch_json(&self, path: &str, payload: Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.http.patch(&url).json(&payload).send()?;
        self.handle_response(resp)
    }

    fn delete(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.http.delete(&url).send()?;
        self.handle_response(resp)
    }

    fn handle_response(&self, resp: reqwest::blocking::Response) -> Result<Value> {
        let status = resp.status();
        let text = resp.text()?;

        if !status.is_success() {
            // Prefer the service's own error detail
            if let Ok(val) = serde_json::from_str::<Value>(&text)
                && let Some(detail) = val
                    .as_object()
                    .and_then(|m| m.get("detail"))
                    .and_then(|d| d.as_str())
            {
                return Err(Error::Service(detail.to_string()));
            }
            let snippet: String = text.chars().take(400).collect();
            return Err(Error::Service(format!("{}: {}", status, snippet)));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(Into::into)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(Into::into)
}

fn event_path(calendar_id: &str, event_id: &str) -> String {
    format!(
        "/events/{}/{}",
        urlencoding::encode(calendar_id),
        urlencoding::encode(event_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_client_creation() {
        let client = ServiceClient::new("http://localhost:8788", None).unwrap();
        assert_eq!(client.base_url, "http://localhost:8788");
    }

    #[test]
    fn test_service_client_url_normalization() {
        let client = ServiceClient::new("http://localhost:8788/", None).unwrap();
        assert_eq!(client.base_url, "http://localhost:8788");
    }

    #[test]
    fn test_event_path_is_encoded() {
        assert_eq!(
            event_path("team@group.calendar.google.com", "abc 1"),
            "/events/team%40group.calendar.google.com/abc%201"
        );
    }

    #[test]
    fn test_decode_calendar_list() {
        let value = serde_json::json!([
            {"id": "primary", "summary": "Me", "accessRole": "owner"}
        ]);
        let calendars: Vec<ApiCalendar> = decode(value).unwrap();
        assert_eq!(calendars[0].id, "primary");
    }
}
