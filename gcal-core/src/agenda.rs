//! Agenda listing, event details and TSV export.

use std::io::{self, Write};

use crate::calendar::CalendarIndex;
use crate::config::ColorConfig;
use crate::conflicts::ConflictDetector;
use crate::event::{Event, Instant, Reminders, ResponseStatus, format_clock, format_length};
use crate::printer::{Printer, StyledLine};
use crate::theme::{ArtStyle, ColorKey, Glyph};
use crate::width::pad_to;
use crate::wrap::wrap;

/// Width of the day heading column; continuation lines are indented by it.
const DAY_INDENT: &str = "          ";
/// Indent of detail lines below an event.
const DETAILS_INDENT: &str = "                   ";
/// Heading printed in place of the day for a conflicting event.
pub const CONFLICT_PREFIX: &str = " !!! Conflict: ";
const NOT_PROVIDED: &str = "Not Provided";

/// Optional detail lines, printed in this order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Details {
    pub calendar: bool,
    pub url: bool,
    pub conference: bool,
    pub location: bool,
    pub attendees: bool,
    pub attachments: bool,
    pub length: bool,
    pub reminders: bool,
    pub email: bool,
    pub description: bool,
}

impl Details {
    pub const NAMES: [&'static str; 11] = [
        "all",
        "calendar",
        "url",
        "conference",
        "location",
        "attendees",
        "attachments",
        "length",
        "reminders",
        "email",
        "description",
    ];

    pub fn all() -> Self {
        Self {
            calendar: true,
            url: true,
            conference: true,
            location: true,
            attendees: true,
            attachments: true,
            length: true,
            reminders: true,
            email: true,
            description: true,
        }
    }

    /// Build from detail names such as `location` or `all`.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, String> {
        let mut details = Self::default();
        for name in names {
            details.enable(name.as_ref())?;
        }
        Ok(details)
    }

    pub fn enable(&mut self, name: &str) -> Result<(), String> {
        match name.trim().to_lowercase().as_str() {
            "all" => *self = Self::all(),
            "calendar" => self.calendar = true,
            "url" => self.url = true,
            "conference" => self.conference = true,
            "location" => self.location = true,
            "attendees" => self.attendees = true,
            "attachments" => self.attachments = true,
            "length" => self.length = true,
            "reminders" => self.reminders = true,
            "email" => self.email = true,
            "description" => self.description = true,
            other => {
                return Err(format!(
                    "unknown detail: {} (valid: {})",
                    other,
                    Self::NAMES.join(", ")
                ));
            }
        }
        Ok(())
    }
}

/// Options for agenda-style output.
#[derive(Debug, Clone)]
pub struct AgendaOptions {
    pub military: bool,
    pub details: Details,
    /// Total width of detail blocks (description box).
    pub width: usize,
    /// Skip events that started before now.
    pub ignore_started: bool,
    /// Skip events the calendar owner declined.
    pub ignore_declined: bool,
    /// Prefer the per-event color over the calendar color.
    pub override_color: bool,
    /// Print earlier overlapping events after each event.
    pub show_conflicts: bool,
    /// Use `%Y-%m-%d` headings and repeat them on every event.
    pub year_date: bool,
}

impl Default for AgendaOptions {
    fn default() -> Self {
        Self {
            military: false,
            details: Details::default(),
            width: 80,
            ignore_started: false,
            ignore_declined: false,
            override_color: false,
            show_conflicts: false,
            year_date: false,
        }
    }
}

/// Formats events as agenda lines for one render call.
pub struct AgendaFormatter<'a> {
    calendars: &'a CalendarIndex,
    colors: &'a ColorConfig,
    options: &'a AgendaOptions,
    now: Instant,
}

impl<'a> AgendaFormatter<'a> {
    pub fn new(
        calendars: &'a CalendarIndex,
        colors: &'a ColorConfig,
        options: &'a AgendaOptions,
        now: Instant,
    ) -> Self {
        Self {
            calendars,
            colors,
            options,
            now,
        }
    }

    /// Color for an event's main line.
    pub fn event_color(&self, event: &Event) -> ColorKey {
        if self.options.override_color
            && let Some(color) = event.color_override
        {
            return color;
        }
        if event.is_happening(&self.now) && !event.is_all_day() {
            return self.colors.now_marker;
        }
        self.calendars
            .get(&event.calendar_id)
            .map(|cal| cal.color(self.colors))
            .unwrap_or_default()
    }

    /// Whether the started/declined filters let `event` through.
    pub fn is_selected(&self, event: &Event) -> bool {
        if self.options.ignore_started && event.start < self.now {
            return false;
        }
        if self.options.ignore_declined && self.is_declined(event) {
            return false;
        }
        true
    }

    /// True when the calendar owner's attendee entry declined the event.
    pub fn is_declined(&self, event: &Event) -> bool {
        event.details.attendees.iter().any(|a| {
            let is_owner = a.is_self || a.email.as_deref() == Some(event.calendar_id.as_str());
            is_owner && a.response == Some(ResponseStatus::Declined)
        })
    }

    /// Lines for one event: the time/title line followed by requested details.
    ///
    /// `prefix` takes the place of the day heading column.
    pub fn format_event(&self, event: &Event, prefix: Option<&str>, art: ArtStyle) -> Vec<StyledLine> {
        let time = if event.is_all_day() {
            String::new()
        } else {
            format_clock(&event.start, self.options.military)
        };
        let time_width = if self.options.military { 5 } else { 7 };

        let mut head = StyledLine::new();
        head.push(prefix.unwrap_or(DAY_INDENT), self.colors.date);
        head.push(
            format!("  {:>time_width$}  {}", time, event.display_title()),
            self.event_color(event),
        );

        let mut lines = vec![head];
        lines.extend(self.detail_lines(event, art));
        lines
    }

    fn detail_lines(&self, event: &Event, art: ArtStyle) -> Vec<StyledLine> {
        let details = &self.options.details;
        let info = &event.details;
        let mut out: Vec<String> = Vec::new();

        if details.calendar
            && let Some(cal) = self.calendars.get(&event.calendar_id)
        {
            out.push(format!("{DETAILS_INDENT}  Calendar: {}", cal.summary));
        }

        if details.url {
            if let Some(link) = &info.html_link {
                out.push(format!("{DETAILS_INDENT}  Link: {}", link));
            }
            if let Some(link) = &info.hangout_link {
                out.push(format!("{DETAILS_INDENT}  Hangout Link: {}", link));
            }
        }

        if details.conference
            && let Some(entry) = info.conference.first()
        {
            out.push(format!(
                "{DETAILS_INDENT}  Conference Link: {}: {}",
                entry.kind, entry.uri
            ));
        }

        if details.location
            && let Some(location) = non_blank(&info.location)
        {
            out.push(format!("{DETAILS_INDENT}  Location: {}", location));
        }

        if details.attendees && !info.attendees.is_empty() {
            out.push(format!("{DETAILS_INDENT}  Attendees:"));
            let people = info
                .organizer
                .iter()
                .chain(info.attendees.iter())
                .filter(|a| !a.is_self);
            for person in people {
                out.push(format!(
                    "{DETAILS_INDENT}    {}: <{}>",
                    non_blank(&person.display_name).unwrap_or(NOT_PROVIDED),
                    non_blank(&person.email).unwrap_or(NOT_PROVIDED)
                ));
            }
        }

        if details.attachments && !info.attachments.is_empty() {
            out.push(format!("{DETAILS_INDENT}  Attachments:"));
            for attachment in &info.attachments {
                out.push(format!(
                    "{DETAILS_INDENT}    {}",
                    non_blank(&attachment.title).unwrap_or("(No title)")
                ));
                out.push(format!(
                    "{DETAILS_INDENT}    -> {}",
                    non_blank(&attachment.file_url).unwrap_or(NOT_PROVIDED)
                ));
            }
        }

        if details.length {
            out.push(format!(
                "{DETAILS_INDENT}  Length: {}",
                format_length(event.length())
            ));
        }

        if details.reminders {
            match &info.reminders {
                Some(Reminders::Default) => {
                    out.push(format!("{DETAILS_INDENT}  Reminder: (default)"));
                }
                Some(Reminders::Overrides(reminders)) => {
                    for r in reminders {
                        out.push(format!(
                            "{DETAILS_INDENT}  Reminder: {} {} minutes",
                            r.method, r.minutes
                        ));
                    }
                }
                None => {}
            }
        }

        if details.email
            && let Some(email) = non_blank(&info.creator_email)
        {
            out.push(format!("{DETAILS_INDENT}  Email: {}", email));
        }

        if details.description
            && let Some(description) = non_blank(&info.description)
        {
            out.push(format!("{DETAILS_INDENT}  Description:"));
            out.extend(self.description_box(description, art));
        }

        out.into_iter()
            .map(|text| StyledLine::single(text, ColorKey::Default))
            .collect()
    }

    /// Word-wrapped description framed by border glyphs.
    fn description_box(&self, description: &str, art: ArtStyle) -> Vec<String> {
        let indent = format!("{DETAILS_INDENT}  ");
        let inner = self.options.width.saturating_sub(indent.len() + 2).max(4);
        let rule = art.glyph(Glyph::Hrz).repeat(inner);
        let vrt = art.glyph(Glyph::Vrt);

        let mut lines = Vec::new();
        lines.push(format!(
            "{indent}{}{rule}{}",
            art.glyph(Glyph::Ulc),
            art.glyph(Glyph::Urc)
        ));
        for text in wrap(description, inner - 2) {
            lines.push(format!("{indent}{vrt} {}{vrt}", pad_to(&text, inner - 1)));
        }
        lines.push(format!(
            "{indent}{}{rule}{}",
            art.glyph(Glyph::Llc),
            art.glyph(Glyph::Lrc)
        ));
        lines
    }

    /// Print events grouped under day headings. Returns how many were shown.
    pub fn iterate_events<W: Write>(&self, p: &mut Printer<W>, events: &[Event]) -> io::Result<usize> {
        if events.is_empty() {
            p.line(&StyledLine::single("No Events Found...", ColorKey::Yellow))?;
            return Ok(0);
        }

        let art = p.theme().art;
        let day_format = if self.options.year_date { "%Y-%m-%d" } else { "%a %b %d" };
        let mut detector = ConflictDetector::new();
        let mut day = String::new();
        let mut selected = 0;

        for event in events {
            if !self.is_selected(event) {
                continue;
            }
            selected += 1;

            let heading = event.start.format(day_format).to_string();
            let prefix = if heading != day {
                p.newline()?;
                day = heading.clone();
                Some(heading)
            } else {
                None
            };

            for line in self.format_event(event, prefix.as_deref(), art) {
                p.line(&line)?;
            }

            if self.options.show_conflicts {
                for earlier in detector.check(event) {
                    for line in self.format_event(earlier, Some(CONFLICT_PREFIX), art) {
                        p.line(&line)?;
                    }
                }
            }
        }

        Ok(selected)
    }

    /// One tab-separated record for `event`. Never contains a raw newline.
    pub fn tsv_row(&self, event: &Event) -> String {
        let details = &self.options.details;
        let info = &event.details;
        let mut fields: Vec<String> = vec![
            event.start.format("%Y-%m-%d").to_string(),
            event.start.format("%H:%M").to_string(),
            event.end.format("%Y-%m-%d").to_string(),
            event.end.format("%H:%M").to_string(),
        ];

        if details.url {
            fields.push(info.html_link.clone().unwrap_or_default());
            fields.push(info.hangout_link.clone().unwrap_or_default());
        }
        if details.conference {
            match info.conference.first() {
                Some(entry) => {
                    fields.push(entry.kind.clone());
                    fields.push(entry.uri.clone());
                }
                None => fields.extend([String::new(), String::new()]),
            }
        }
        fields.push(event.display_title().to_string());
        if details.location {
            fields.push(trimmed(&info.location));
        }
        if details.description {
            fields.push(trimmed(&info.description));
        }
        if details.calendar {
            fields.push(
                self.calendars
                    .get(&event.calendar_id)
                    .map(|c| c.summary.trim().to_string())
                    .unwrap_or_default(),
            );
        }
        if details.email {
            fields.push(trimmed(&info.creator_email));
        }

        fields.join("\t").replace('\n', "\\n")
    }

    /// Write one TSV record per selected event. Returns how many were written.
    pub fn print_tsv<W: Write>(&self, out: &mut W, events: &[Event]) -> io::Result<usize> {
        let mut written = 0;
        for event in events.iter().filter(|e| self.is_selected(e)) {
            writeln!(out, "{}", self.tsv_row(event))?;
            written += 1;
        }
        Ok(written)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{AccessRole, Calendar};
    use crate::event::fixtures::{at, event};
    use crate::event::{Attendee, ConferenceEntry, Reminder};
    use crate::theme::Theme;

    fn calendars() -> CalendarIndex {
        CalendarIndex::new(vec![Calendar {
            id: "primary".to_string(),
            summary: "Work".to_string(),
            access_role: AccessRole::Owner,
            color: None,
        }])
    }

    fn person(name: &str, email: &str, is_self: bool) -> Attendee {
        Attendee {
            display_name: Some(name.to_string()),
            email: Some(email.to_string()),
            is_self,
            response: None,
        }
    }

    fn render(options: &AgendaOptions, events: &[Event], now: Instant) -> String {
        let cals = calendars();
        let colors = ColorConfig::default();
        let fmt = AgendaFormatter::new(&cals, &colors, options, now);
        let mut p = Printer::buffer(Theme::plain());
        fmt.iterate_events(&mut p, events).unwrap();
        p.contents()
    }

    #[test]
    fn test_empty_agenda_notice() {
        let out = render(&AgendaOptions::default(), &[], at(2024, 1, 8, 8, 0));
        assert_eq!(out, "No Events Found...\n");
    }

    #[test]
    fn test_day_headings_only_on_change() {
        let events = vec![
            event("Standup", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 9, 15)),
            event("Lunch", at(2024, 1, 8, 12, 0), at(2024, 1, 8, 13, 0)),
            event("Review", at(2024, 1, 9, 15, 30), at(2024, 1, 9, 16, 0)),
        ];
        let out = render(&AgendaOptions::default(), &events, at(2024, 1, 1, 0, 0));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "",
                "Mon Jan 08   9:00am  Standup",
                "            12:00pm  Lunch",
                "",
                "Tue Jan 09   3:30pm  Review",
            ]
        );
    }

    #[test]
    fn test_military_and_all_day() {
        let options = AgendaOptions {
            military: true,
            ..AgendaOptions::default()
        };
        let events = vec![
            event("Holiday", at(2024, 1, 8, 0, 0), at(2024, 1, 9, 0, 0)),
            event("Standup", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 9, 15)),
        ];
        let out = render(&options, &events, at(2024, 1, 1, 0, 0));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "Mon Jan 08         Holiday");
        assert_eq!(lines[2], "            09:00  Standup");
    }

    #[test]
    fn test_year_date_heading_once_per_day() {
        let options = AgendaOptions {
            military: true,
            year_date: true,
            ..AgendaOptions::default()
        };
        let events = vec![
            event("A", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 0)),
            event("B", at(2024, 1, 8, 11, 0), at(2024, 1, 8, 12, 0)),
            event("C", at(2024, 1, 9, 9, 0), at(2024, 1, 9, 10, 0)),
        ];
        let out = render(&options, &events, at(2024, 1, 1, 0, 0));
        assert_eq!(out.matches("2024-01-08").count(), 1);
        assert_eq!(out.matches("2024-01-09").count(), 1);
        assert!(!out.contains("Mon Jan 08"));
    }

    #[test]
    fn test_happening_now_uses_marker_color() {
        let cals = calendars();
        let colors = ColorConfig::default();
        let options = AgendaOptions::default();
        let now = at(2024, 1, 8, 9, 5);
        let fmt = AgendaFormatter::new(&cals, &colors, &options, now);

        let running = event("Standup", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 9, 15));
        let later = event("Lunch", at(2024, 1, 8, 12, 0), at(2024, 1, 8, 13, 0));
        let all_day = event("Holiday", at(2024, 1, 8, 0, 0), at(2024, 1, 9, 0, 0));

        assert_eq!(fmt.event_color(&running), colors.now_marker);
        assert_eq!(fmt.event_color(&later), colors.owner);
        assert_eq!(fmt.event_color(&all_day), colors.owner);
    }

    #[test]
    fn test_override_color() {
        let cals = calendars();
        let colors = ColorConfig::default();
        let mut e = event("Lunch", at(2024, 1, 8, 12, 0), at(2024, 1, 8, 13, 0));
        e.color_override = Some(ColorKey::Red);

        let plain = AgendaOptions::default();
        let fmt = AgendaFormatter::new(&cals, &colors, &plain, at(2024, 1, 1, 0, 0));
        assert_eq!(fmt.event_color(&e), colors.owner);

        let overriding = AgendaOptions {
            override_color: true,
            ..AgendaOptions::default()
        };
        let fmt = AgendaFormatter::new(&cals, &colors, &overriding, at(2024, 1, 1, 0, 0));
        assert_eq!(fmt.event_color(&e), ColorKey::Red);

        let fmt = AgendaFormatter::new(&cals, &colors, &overriding, at(2024, 1, 8, 12, 30));
        assert_eq!(fmt.event_color(&e), ColorKey::Red);

        e.color_override = None;
        assert_eq!(fmt.event_color(&e), colors.now_marker);
    }

    #[test]
    fn test_detail_lines_order() {
        let mut e = event("Planning", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 30));
        e.details.location = Some("  Room 4 ".to_string());
        e.details.conference = vec![
            ConferenceEntry {
                kind: "video".to_string(),
                uri: "https://meet.example.com/abc".to_string(),
            },
            ConferenceEntry {
                kind: "phone".to_string(),
                uri: "tel:+1-555".to_string(),
            },
        ];
        e.details.organizer = Some(person("Ada", "ada@example.com", false));
        e.details.attendees = vec![
            person("Me", "primary", true),
            person("Bob", "bob@example.com", false),
        ];
        e.details.reminders = Some(Reminders::Overrides(vec![Reminder {
            method: "popup".to_string(),
            minutes: 10,
        }]));
        e.details.creator_email = Some("ada@example.com".to_string());

        let options = AgendaOptions {
            military: true,
            details: Details::all(),
            ..AgendaOptions::default()
        };
        let out = render(&options, &[e], at(2024, 1, 1, 0, 0));
        let lines: Vec<String> = out.lines().map(|l| l.trim().to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "",
                "Mon Jan 08  09:00  Planning",
                "Calendar: Work",
                "Conference Link: video: https://meet.example.com/abc",
                "Location: Room 4",
                "Attendees:",
                "Ada: <ada@example.com>",
                "Bob: <bob@example.com>",
                "Length: 1:30:00",
                "Reminder: popup 10 minutes",
                "Email: ada@example.com",
            ]
        );
    }

    #[test]
    fn test_default_reminder() {
        let mut e = event("Planning", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 0));
        e.details.reminders = Some(Reminders::Default);
        let options = AgendaOptions {
            details: Details::from_names(&["reminders"]).unwrap(),
            ..AgendaOptions::default()
        };
        let out = render(&options, &[e], at(2024, 1, 1, 0, 0));
        assert!(out.contains("                     Reminder: (default)\n"));
    }

    #[test]
    fn test_description_box() {
        let mut e = event("Planning", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 0));
        e.details.description = Some("Agenda items for the quarterly plan\nBring notes".to_string());
        let options = AgendaOptions {
            details: Details::from_names(&["description"]).unwrap(),
            width: 40,
            ..AgendaOptions::default()
        };
        let out = render(&options, &[e], at(2024, 1, 1, 0, 0));
        let indent = " ".repeat(21);
        let expected = [
            format!("{indent}+-----------------+"),
            format!("{indent}| Agenda items    |"),
            format!("{indent}| for the         |"),
            format!("{indent}| quarterly plan  |"),
            format!("{indent}| Bring notes     |"),
            format!("{indent}+-----------------+"),
        ];
        let lines: Vec<&str> = out.lines().collect();
        let start = lines.len() - expected.len();
        assert_eq!(&lines[start..], &expected.iter().map(String::as_str).collect::<Vec<_>>()[..]);
        for line in &lines[start..] {
            assert_eq!(line.len(), 40);
        }
        assert_eq!(lines[start - 1], format!("{}  Description:", " ".repeat(19)));
    }

    #[test]
    fn test_ignore_started_and_declined() {
        let mut declined = event("Offsite", at(2024, 1, 9, 9, 0), at(2024, 1, 9, 17, 0));
        declined.details.attendees = vec![Attendee {
            display_name: None,
            email: Some("primary".to_string()),
            is_self: false,
            response: Some(ResponseStatus::Declined),
        }];
        let events = vec![
            event("Early", at(2024, 1, 8, 7, 0), at(2024, 1, 8, 8, 0)),
            event("Later", at(2024, 1, 8, 12, 0), at(2024, 1, 8, 13, 0)),
            declined,
        ];
        let options = AgendaOptions {
            ignore_started: true,
            ignore_declined: true,
            ..AgendaOptions::default()
        };
        let out = render(&options, &events, at(2024, 1, 8, 10, 0));
        assert!(!out.contains("Early"));
        assert!(out.contains("Later"));
        assert!(!out.contains("Offsite"));
    }

    #[test]
    fn test_conflicts_are_listed_after_event() {
        let events = vec![
            event("A", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 0)),
            event("B", at(2024, 1, 8, 9, 30), at(2024, 1, 8, 10, 30)),
        ];
        let options = AgendaOptions {
            military: true,
            show_conflicts: true,
            ..AgendaOptions::default()
        };
        let out = render(&options, &events, at(2024, 1, 1, 0, 0));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.last().copied(), Some(" !!! Conflict:   09:00  A"));
    }

    #[test]
    fn test_tsv_escapes_newlines() {
        let cals = calendars();
        let colors = ColorConfig::default();
        let options = AgendaOptions {
            details: Details::from_names(&["location", "description", "calendar"]).unwrap(),
            ..AgendaOptions::default()
        };
        let fmt = AgendaFormatter::new(&cals, &colors, &options, at(2024, 1, 1, 0, 0));
        let mut e = event("Planning", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 0));
        e.details.description = Some("line one\nline two".to_string());

        let row = fmt.tsv_row(&e);
        assert!(!row.contains('\n'));
        assert_eq!(
            row,
            "2024-01-08\t09:00\t2024-01-08\t10:00\tPlanning\t\tline one\\nline two\tWork"
        );
    }

    #[test]
    fn test_tsv_conference_columns() {
        let cals = calendars();
        let colors = ColorConfig::default();
        let options = AgendaOptions {
            details: Details::from_names(&["url", "conference"]).unwrap(),
            ..AgendaOptions::default()
        };
        let fmt = AgendaFormatter::new(&cals, &colors, &options, at(2024, 1, 1, 0, 0));
        let e = event("Sync", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 0));
        let mut out = Vec::new();
        assert_eq!(fmt.print_tsv(&mut out, &[e]).unwrap(), 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2024-01-08\t09:00\t2024-01-08\t10:00\t\t\t\t\tSync\n"
        );
    }

    #[test]
    fn test_details_from_names() {
        let d = Details::from_names(&["location", "LENGTH"]).unwrap();
        assert!(d.location && d.length && !d.description);
        assert_eq!(Details::from_names(&["all"]).unwrap(), Details::all());
        assert!(Details::from_names(&["colour"]).is_err());
    }
}
