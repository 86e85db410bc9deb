//! Week and month calendar grids.
//!
//! Each visible day is a [`DayCell`] holding a queue of text fragments. A
//! week is drawn in passes: every pass takes one line from the head fragment
//! of every cell, wrapping it to the cell width, until all queues are empty.

use std::collections::VecDeque;
use std::io::{self, Write};

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime};

use crate::calendar::CalendarIndex;
use crate::config::{ColorConfig, MIN_CELL_WIDTH, WeekStart};
use crate::event::{Event, Instant, format_clock};
use crate::printer::Printer;
use crate::theme::{ColorKey, Glyph};
use crate::width::{center_to, pad_to};
use crate::wrap::find_cut;

/// Layout parameters for the week and month grids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    /// Width of one day cell. Callers reject anything below [`MIN_CELL_WIDTH`].
    pub width: usize,
    /// Show Saturday and Sunday.
    pub weekend: bool,
    pub week_start: WeekStart,
    pub military: bool,
    /// Prefer per-event colors over calendar colors.
    pub override_color: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: MIN_CELL_WIDTH,
            weekend: true,
            week_start: WeekStart::Sunday,
            military: false,
            override_color: false,
        }
    }
}

impl GridConfig {
    pub fn columns(&self) -> usize {
        if self.weekend { 7 } else { 5 }
    }

    /// Hiding weekends always starts the week on Monday.
    pub fn week_start(&self) -> WeekStart {
        if self.weekend {
            self.week_start
        } else {
            WeekStart::Monday
        }
    }

    /// First day of the week containing `date`.
    pub fn start_of_week(&self, date: NaiveDate) -> NaiveDate {
        let back = match self.week_start() {
            WeekStart::Monday => date.weekday().num_days_from_monday(),
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
        };
        date - Duration::days(i64::from(back))
    }

    /// Number of week rows needed to cover the month containing `day`.
    pub fn month_week_count(&self, day: NaiveDate) -> usize {
        let first = first_of_month(day);
        let offset = (first - self.start_of_week(first)).num_days();
        ((days_in_month(first) + offset + 6) / 7) as usize
    }

    /// Dates covered by the month grid for `day`, end exclusive.
    pub fn month_window(&self, day: NaiveDate) -> (NaiveDate, NaiveDate) {
        let first_week = self.start_of_week(first_of_month(day));
        let rows = self.month_week_count(day) as i64;
        (first_week, first_week + Duration::days(7 * rows))
    }
}

/// Text queued for a day cell, in one color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub color: ColorKey,
}

impl Fragment {
    pub fn new(text: impl Into<String>, color: ColorKey) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// One day column of one week.
#[derive(Debug, Clone, Default)]
pub struct DayCell {
    fragments: VecDeque<Fragment>,
}

impl DayCell {
    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push_back(fragment);
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    pub fn is_done(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Take the next `width`-column line off the head fragment.
    ///
    /// An empty cell yields blank padding. A fragment starting with a newline
    /// yields one blank line before its text.
    pub fn next_line(&mut self, width: usize) -> (String, ColorKey) {
        let Some(head) = self.fragments.front_mut() else {
            return (" ".repeat(width), ColorKey::Default);
        };
        let cut = find_cut(&head.text, width);
        let line = pad_to(&head.text[..cut.index], width);
        let color = head.color;
        let rest = head.text[cut.resume..].trim_start().to_string();
        if rest.is_empty() {
            self.fragments.pop_front();
        } else {
            head.text = rest;
        }
        (line, color)
    }
}

/// Draws week and month grids for one render call.
pub struct GridRenderer<'a> {
    config: &'a GridConfig,
    calendars: &'a CalendarIndex,
    colors: &'a ColorConfig,
    now: Instant,
}

impl<'a> GridRenderer<'a> {
    pub fn new(
        config: &'a GridConfig,
        calendars: &'a CalendarIndex,
        colors: &'a ColorConfig,
        now: Instant,
    ) -> Self {
        Self {
            config,
            calendars,
            colors,
            now,
        }
    }

    fn event_color(&self, event: &Event) -> ColorKey {
        if self.config.override_color
            && let Some(color) = event.color_override
        {
            return color;
        }
        self.calendars
            .get(&event.calendar_id)
            .map(|cal| cal.color(self.colors))
            .unwrap_or_default()
    }

    fn fragment_text(&self, event: &Event) -> String {
        if event.is_all_day() {
            format!("\n{}", event.display_title())
        } else {
            format!(
                "\n{} {}",
                format_clock(&event.start, self.config.military),
                event.display_title()
            )
        }
    }

    /// First and last column `event` occupies in the week at `window_start`.
    fn columns_for(&self, event: &Event, window_start: NaiveDate) -> Option<(usize, usize)> {
        let columns = self.config.columns() as i64;
        let first = (event.start.date_naive() - window_start).num_days();

        if !event.is_all_day() {
            return (0..columns)
                .contains(&first)
                .then_some((first as usize, first as usize));
        }

        // All-day ends are exclusive midnights.
        let last_day = event.end.date_naive() - Duration::days(1);
        let last = (last_day - window_start).num_days().max(first);
        if last < 0 || first >= columns {
            return None;
        }
        Some((first.max(0) as usize, last.min(columns - 1) as usize))
    }

    /// Build the day cells for the week starting at `window_start`.
    ///
    /// `placed` records whether the now marker was already drawn during this
    /// render call; it is set once the divider or recoloring happens.
    pub fn week_cells(&self, window_start: NaiveDate, events: &[Event], placed: &mut bool) -> Vec<DayCell> {
        let mut cells = vec![DayCell::default(); self.config.columns()];
        let start = window_start.and_time(NaiveTime::MIN);
        let end = start + Duration::days(7);
        let now = self.now.naive_local();
        let now_in_window = start <= now && now < end;

        for event in events {
            let Some((first, last)) = self.columns_for(event, window_start) else {
                continue;
            };

            let mut color = self.event_color(event);
            if now_in_window && !*placed {
                let event_start = event.start.naive_local();
                if event_start > now {
                    cells[first].push(Fragment::new(
                        format!("\n{}", "-".repeat(self.config.width)),
                        self.colors.now_marker,
                    ));
                    *placed = true;
                } else if !event.is_all_day()
                    && event_start < now
                    && now < event.end.naive_local()
                {
                    color = self.colors.now_marker;
                    *placed = true;
                }
            }

            let text = self.fragment_text(event);
            for cell in &mut cells[first..=last] {
                cell.push(Fragment::new(text.clone(), color));
            }
        }
        cells
    }

    /// Draw body lines until every cell is exhausted. Returns the number of passes.
    pub fn draw_week<W: Write>(&self, p: &mut Printer<W>, cells: &mut [DayCell]) -> io::Result<usize> {
        let mut passes = 0;
        loop {
            p.art(Glyph::Vrt, self.colors.border)?;
            for cell in cells.iter_mut() {
                let (text, color) = cell.next_line(self.config.width);
                p.msg(&text, color)?;
                p.art(Glyph::Vrt, self.colors.border)?;
            }
            p.newline()?;
            passes += 1;
            if cells.iter().all(DayCell::is_done) {
                return Ok(passes);
            }
        }
    }

    fn divider<W: Write>(&self, p: &mut Printer<W>, left: Glyph, center: Glyph, right: Glyph) -> io::Result<()> {
        let theme = *p.theme();
        let rule = theme.glyph(Glyph::Hrz).repeat(self.config.width);
        let mut line = String::from(theme.glyph(left));
        for column in 0..self.config.columns() {
            if column > 0 {
                line.push_str(theme.glyph(center));
            }
            line.push_str(&rule);
        }
        line.push_str(theme.glyph(right));
        p.msg(&line, self.colors.border)?;
        p.newline()
    }

    fn inner_width(&self) -> usize {
        let columns = self.config.columns();
        self.config.width * columns + columns - 1
    }

    fn draw_titlebar<W: Write>(&self, p: &mut Printer<W>, first_week: NaiveDate, title: Option<&str>) -> io::Result<()> {
        match title {
            Some(title) => {
                let theme = *p.theme();
                let top = format!(
                    "{}{}{}",
                    theme.glyph(Glyph::Ulc),
                    theme.glyph(Glyph::Hrz).repeat(self.inner_width()),
                    theme.glyph(Glyph::Urc)
                );
                p.msg(&top, self.colors.border)?;
                p.newline()?;
                p.art(Glyph::Vrt, self.colors.border)?;
                p.msg(&center_to(title, self.inner_width()), self.colors.title)?;
                p.art(Glyph::Vrt, self.colors.border)?;
                p.newline()?;
                self.divider(p, Glyph::Lte, Glyph::Ute, Glyph::Rte)?;
            }
            None => self.divider(p, Glyph::Ulc, Glyph::Ute, Glyph::Urc)?,
        }

        p.art(Glyph::Vrt, self.colors.border)?;
        for column in 0..self.config.columns() {
            let day = first_week + Duration::days(column as i64);
            let name = day.format("%A").to_string();
            p.msg(&center_to(&name, self.config.width), self.colors.date)?;
            p.art(Glyph::Vrt, self.colors.border)?;
        }
        p.newline()?;
        self.divider(p, Glyph::Lte, Glyph::Crs, Glyph::Rte)
    }

    /// The date line at the top of a week. With `month`, days outside it are blank.
    fn draw_dates<W: Write>(&self, p: &mut Printer<W>, window_start: NaiveDate, month: Option<u32>) -> io::Result<()> {
        let today = self.now.date_naive();
        p.art(Glyph::Vrt, self.colors.border)?;
        for column in 0..self.config.columns() {
            let date = window_start + Duration::days(column as i64);
            let mut text = match month {
                Some(m) if date.month() != m => String::new(),
                Some(_) => date.format("%d").to_string(),
                None => date.format("%d %b").to_string(),
            };
            let color = if date == today && !text.is_empty() {
                text.push_str(" **");
                self.colors.now_marker
            } else {
                self.colors.date
            };
            p.msg(&pad_to(&text, self.config.width), color)?;
            p.art(Glyph::Vrt, self.colors.border)?;
        }
        p.newline()
    }

    fn draw_weeks<W: Write>(
        &self,
        p: &mut Printer<W>,
        first_week: NaiveDate,
        count: usize,
        month: Option<u32>,
        events: &[Event],
    ) -> io::Result<()> {
        let mut placed = false;
        for week in 0..count {
            let window_start = first_week + Duration::days(7 * week as i64);
            self.draw_dates(p, window_start, month)?;
            let mut cells = self.week_cells(window_start, events, &mut placed);
            self.draw_week(p, &mut cells)?;
            if week + 1 < count {
                self.divider(p, Glyph::Lte, Glyph::Crs, Glyph::Rte)?;
            } else {
                self.divider(p, Glyph::Llc, Glyph::Bte, Glyph::Lrc)?;
            }
        }
        Ok(())
    }

    /// Draw `count` weeks starting with the week that contains `start`.
    pub fn render_week_view<W: Write>(
        &self,
        p: &mut Printer<W>,
        start: NaiveDate,
        count: usize,
        events: &[Event],
    ) -> io::Result<()> {
        let first_week = self.config.start_of_week(start);
        self.draw_titlebar(p, first_week, None)?;
        self.draw_weeks(p, first_week, count.max(1), None, events)
    }

    /// Draw the month that contains `day`.
    pub fn render_month_view<W: Write>(&self, p: &mut Printer<W>, day: NaiveDate, events: &[Event]) -> io::Result<()> {
        let first = first_of_month(day);
        let first_week = self.config.start_of_week(first);
        let title = first.format("%B %Y").to_string();
        self.draw_titlebar(p, first_week, Some(&title))?;
        self.draw_weeks(p, first_week, self.month_week_count(first), Some(first.month()), events)
    }

    pub fn month_week_count(&self, day: NaiveDate) -> usize {
        self.config.month_week_count(day)
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.day0()))
}

fn days_in_month(first: NaiveDate) -> i64 {
    first
        .checked_add_months(Months::new(1))
        .map(|next| (next - first).num_days())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{AccessRole, Calendar};
    use crate::event::fixtures::{at, event};
    use crate::theme::Theme;

    fn calendars() -> CalendarIndex {
        CalendarIndex::new(vec![Calendar {
            id: "primary".to_string(),
            summary: "Work".to_string(),
            access_role: AccessRole::Owner,
            color: None,
        }])
    }

    fn monday_config() -> GridConfig {
        GridConfig {
            width: 10,
            week_start: WeekStart::Monday,
            military: true,
            ..GridConfig::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn texts(cell: &DayCell) -> Vec<&str> {
        cell.fragments().map(|f| f.text.as_str()).collect()
    }

    fn blank_cells(n: usize) -> String {
        "          |".repeat(n)
    }

    #[test]
    fn test_standup_lands_in_monday_column() {
        let config = monday_config();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2023, 1, 1, 0, 0));
        let events = vec![event("Standup", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 9, 15))];

        let mut placed = false;
        let cells = grid.week_cells(date(2024, 1, 8), &events, &mut placed);
        assert_eq!(cells.len(), 7);
        assert_eq!(texts(&cells[0]), vec!["\n09:00 Standup"]);
        assert!(cells[1..].iter().all(DayCell::is_done));
        assert!(!placed);
    }

    #[test]
    fn test_render_week_view_plain() {
        let config = monday_config();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2023, 1, 1, 0, 0));
        let events = vec![event("Standup", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 9, 15))];

        let mut p = Printer::buffer(Theme::plain());
        grid.render_week_view(&mut p, date(2024, 1, 10), 1, &events).unwrap();
        let out = p.contents();
        let lines: Vec<&str> = out.lines().collect();

        let rule = format!("+{}", "----------+".repeat(7));
        assert_eq!(
            lines,
            vec![
                rule.as_str(),
                "|  Monday  | Tuesday  |Wednesday | Thursday |  Friday  | Saturday |  Sunday  |",
                rule.as_str(),
                "|08 Jan    |09 Jan    |10 Jan    |11 Jan    |12 Jan    |13 Jan    |14 Jan    |",
                format!("|{}", blank_cells(7)).as_str(),
                format!("|09:00     |{}", blank_cells(6)).as_str(),
                format!("|Standup   |{}", blank_cells(6)).as_str(),
                rule.as_str(),
            ]
        );
    }

    #[test]
    fn test_all_day_event_spans_columns() {
        let config = monday_config();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2023, 1, 1, 0, 0));
        let events = vec![event("Trip", at(2024, 1, 8, 0, 0), at(2024, 1, 11, 0, 0))];

        let cells = grid.week_cells(date(2024, 1, 8), &events, &mut false);
        let spanned: Vec<usize> = (0..7).filter(|&i| !cells[i].is_done()).collect();
        assert_eq!(spanned, vec![0, 1, 2]);
        assert_eq!(texts(&cells[1]), vec!["\nTrip"]);
    }

    #[test]
    fn test_single_day_all_day_event() {
        let config = monday_config();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2023, 1, 1, 0, 0));
        let events = vec![event("Holiday", at(2024, 1, 9, 0, 0), at(2024, 1, 10, 0, 0))];

        let cells = grid.week_cells(date(2024, 1, 8), &events, &mut false);
        let spanned: Vec<usize> = (0..7).filter(|&i| !cells[i].is_done()).collect();
        assert_eq!(spanned, vec![1]);
    }

    #[test]
    fn test_all_day_event_clamped_to_window() {
        let config = monday_config();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2023, 1, 1, 0, 0));
        let events = vec![event("Conference", at(2024, 1, 6, 0, 0), at(2024, 1, 17, 0, 0))];

        let cells = grid.week_cells(date(2024, 1, 8), &events, &mut false);
        assert!(cells.iter().all(|c| !c.is_done()));
    }

    #[test]
    fn test_long_fragment_takes_two_passes() {
        let config = monday_config();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2023, 1, 1, 0, 0));

        let mut cells = vec![DayCell::default(); 7];
        cells[2].push(Fragment::new("a".repeat(20), ColorKey::Default));
        let mut p = Printer::buffer(Theme::plain());
        assert_eq!(grid.draw_week(&mut p, &mut cells).unwrap(), 2);

        let out = p.contents();
        let expected = format!("|{}aaaaaaaaaa|{}", blank_cells(2), blank_cells(4));
        assert_eq!(out.lines().collect::<Vec<_>>(), vec![expected.as_str(), expected.as_str()]);
    }

    #[test]
    fn test_empty_week_draws_one_blank_pass() {
        let config = monday_config();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2023, 1, 1, 0, 0));

        let mut cells = grid.week_cells(date(2024, 1, 8), &[], &mut false);
        let mut p = Printer::buffer(Theme::plain());
        assert_eq!(grid.draw_week(&mut p, &mut cells).unwrap(), 1);
        assert_eq!(p.contents(), format!("|{}\n", blank_cells(7)));
    }

    #[test]
    fn test_now_divider_before_next_event() {
        let config = monday_config();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2024, 1, 8, 10, 0));
        let events = vec![
            event("A", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 9, 15)),
            event("B", at(2024, 1, 8, 11, 0), at(2024, 1, 8, 12, 0)),
            event("C", at(2024, 1, 9, 9, 0), at(2024, 1, 9, 10, 0)),
        ];

        let mut placed = false;
        let cells = grid.week_cells(date(2024, 1, 8), &events, &mut placed);
        assert!(placed);
        assert_eq!(texts(&cells[0]), vec!["\n09:00 A", "\n----------", "\n11:00 B"]);
        assert_eq!(cells[0].fragments().nth(1).unwrap().color, colors.now_marker);
        assert_eq!(texts(&cells[1]), vec!["\n09:00 C"]);
    }

    #[test]
    fn test_now_recolors_running_event() {
        let config = monday_config();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2024, 1, 8, 9, 5));
        let events = vec![
            event("A", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 9, 15)),
            event("B", at(2024, 1, 8, 11, 0), at(2024, 1, 8, 12, 0)),
        ];

        let mut placed = false;
        let cells = grid.week_cells(date(2024, 1, 8), &events, &mut placed);
        let colors_seen: Vec<ColorKey> = cells[0].fragments().map(|f| f.color).collect();
        assert_eq!(colors_seen, vec![colors.now_marker, colors.owner]);
        assert_eq!(texts(&cells[0]).len(), 2);
    }

    #[test]
    fn test_now_marker_placed_once_per_render() {
        let config = monday_config();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2024, 1, 8, 10, 0));
        let events = vec![event("B", at(2024, 1, 8, 11, 0), at(2024, 1, 8, 12, 0))];

        let mut placed = true;
        let cells = grid.week_cells(date(2024, 1, 8), &events, &mut placed);
        assert_eq!(texts(&cells[0]), vec!["\n11:00 B"]);
    }

    #[test]
    fn test_hidden_weekend_forces_monday() {
        let config = GridConfig {
            weekend: false,
            week_start: WeekStart::Sunday,
            ..GridConfig::default()
        };
        assert_eq!(config.columns(), 5);
        assert_eq!(config.start_of_week(date(2024, 1, 10)), date(2024, 1, 8));
        assert_eq!(config.start_of_week(date(2024, 1, 14)), date(2024, 1, 8));

        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2023, 1, 1, 0, 0));
        let events = vec![
            event("Brunch", at(2024, 1, 13, 11, 0), at(2024, 1, 13, 12, 0)),
            event("Long weekend", at(2024, 1, 12, 0, 0), at(2024, 1, 15, 0, 0)),
        ];
        let cells = grid.week_cells(date(2024, 1, 8), &events, &mut false);
        assert_eq!(cells.len(), 5);
        assert_eq!(texts(&cells[4]), vec!["\nLong weekend"]);
        assert!(cells[..4].iter().all(DayCell::is_done));
    }

    #[test]
    fn test_sunday_start() {
        let config = GridConfig::default();
        assert_eq!(config.start_of_week(date(2024, 1, 10)), date(2024, 1, 7));
        assert_eq!(config.start_of_week(date(2024, 1, 7)), date(2024, 1, 7));
    }

    #[test]
    fn test_month_week_count() {
        let cals = calendars();
        let colors = ColorConfig::default();
        let now = at(2023, 1, 1, 0, 0);

        let sunday = GridConfig::default();
        let grid = GridRenderer::new(&sunday, &cals, &colors, now);
        assert_eq!(grid.month_week_count(date(2015, 2, 14)), 4);
        assert_eq!(grid.month_week_count(date(2024, 1, 1)), 5);
        assert_eq!(grid.month_week_count(date(2023, 12, 25)), 6);

        let monday = monday_config();
        let grid = GridRenderer::new(&monday, &cals, &colors, now);
        assert_eq!(grid.month_week_count(date(2015, 2, 1)), 5);
        assert_eq!(grid.month_week_count(date(2024, 1, 31)), 5);
    }

    #[test]
    fn test_month_window() {
        let config = GridConfig::default();
        assert_eq!(
            config.month_window(date(2024, 1, 20)),
            (date(2023, 12, 31), date(2024, 2, 4))
        );
        assert_eq!(
            monday_config().month_window(date(2024, 1, 20)),
            (date(2024, 1, 1), date(2024, 2, 5))
        );
    }

    #[test]
    fn test_month_view_blanks_other_months() {
        let config = GridConfig::default();
        let cals = calendars();
        let colors = ColorConfig::default();
        let grid = GridRenderer::new(&config, &cals, &colors, at(2024, 1, 15, 12, 0));

        let mut p = Printer::buffer(Theme::plain());
        grid.render_month_view(&mut p, date(2024, 1, 20), &[]).unwrap();
        let out = p.contents();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], format!("+{}+", "-".repeat(76)));
        assert_eq!(lines[1], format!("|{}|", center_to("January 2024", 76)));
        assert_eq!(
            lines[3],
            "|  Sunday  |  Monday  | Tuesday  |Wednesday | Thursday |  Friday  | Saturday |"
        );
        assert_eq!(
            lines[5],
            "|          |01        |02        |03        |04        |05        |06        |"
        );
        assert!(out.contains("|15 **     |"));
        assert!(out.contains("|31        |          |          |          |"));
    }
}
