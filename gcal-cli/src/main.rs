//! gcal CLI - calendar agenda, week/month grids and event management.

use std::env;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use dialoguer::Input;
use env_logger::fmt::WriteStyle;
use gcal_core::agenda::CONFLICT_PREFIX;
use gcal_core::calendar::select_calendars;
use gcal_core::config::{MIN_CELL_WIDTH, WeekStart};
use gcal_core::interact::{
    DELETE_PROMPT, DeleteChoice, EDIT_PROMPT, EditChoice, EventEditor, SessionStep,
    parse_delete_answer, parse_edit_answer,
};
use gcal_core::normalize::{normalize_calendars, normalize_events};
use gcal_core::theme::ArtStyle;
use gcal_core::types::{ApiEvent, Snapshot};
use gcal_core::{
    AgendaFormatter, AppConfig, AppPaths, Calendar, CalendarFilter, CalendarIndex, CalendarView,
    ColorKey, ColorMode, Details, Event, GridRenderer, Instant, Printer, RenderOptions,
    ServiceClient, StyledLine, find_conflicts,
};
use log::{LevelFilter, debug, info, warn};
use regex::RegexBuilder;
use serde::Serialize;

const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Days shown by `agenda` when no end is given.
const AGENDA_DAYS: i64 = 5;
/// Days searched by `search`, `delete` and `edit` when no end is given.
const SEARCH_DAYS: i64 = 365;

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = RuntimeContext::new(cli.common.clone())?;
    ctx.init_logging()?;
    debug!("config loaded from {}", ctx.paths.active_config().display());

    let command = cli.command.unwrap_or_else(|| match ctx.config.display.default_view {
        CalendarView::Agenda => Command::Agenda(AgendaArgs::default()),
        CalendarView::Week => Command::Calw(CalwArgs::default()),
        CalendarView::Month => Command::Calm(CalmArgs::default()),
    });

    match command {
        Command::List => handle_list(&ctx),
        Command::Agenda(args) => handle_agenda(&ctx, args),
        Command::Search(args) => handle_search(&ctx, args),
        Command::Calw(args) => handle_calw(&ctx, args),
        Command::Calm(args) => handle_calm(&ctx, args),
        Command::Conflicts(args) => handle_conflicts(&ctx, args),
        Command::Delete(args) => handle_delete(&ctx, args),
        Command::Edit(args) => handle_edit(&ctx, args),
        Command::Config { command } => handle_config(&ctx, command),
        Command::Init(cmd) => handle_init(&ctx, cmd),
        Command::Completions { shell } => handle_completions(shell),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Calendar agenda, week and month grids from the command line.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[arg(long, global = true)]
    debug: bool,
    #[arg(long, global = true)]
    trace: bool,
    #[arg(long, global = true, conflicts_with = "yaml")]
    json: bool,
    #[arg(long, global = true)]
    yaml: bool,
    #[arg(long = "no-color", global = true, conflicts_with = "color")]
    no_color: bool,
    #[arg(long, value_enum, default_value_t = ColorOption::Auto, global = true)]
    color: ColorOption,
    #[arg(short = 'y', long = "yes", alias = "force", global = true)]
    assume_yes: bool,
    #[arg(long = "timeout", value_name = "SECONDS", global = true)]
    timeout: Option<u64>,
    #[arg(long = "diagnostics", global = true)]
    diagnostics: bool,
    /// Calendar name regex, optionally `regex#color` (repeatable)
    #[arg(short = 'c', long = "calendar", value_name = "PATTERN", global = true)]
    calendars: Vec<String>,
    /// Render a saved service payload instead of calling the service
    #[arg(long = "events-file", value_name = "PATH", global = true)]
    events_file: Option<PathBuf>,
    /// Emit Conky color markup
    #[arg(long, global = true)]
    conky: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorOption {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List calendars and their access roles
    #[command(alias = "ls")]
    List,
    /// Events between START and END as a list
    Agenda(AgendaArgs),
    /// Events matching TEXT
    Search(SearchArgs),
    /// Week grid
    Calw(CalwArgs),
    /// Month grid
    Calm(CalmArgs),
    /// Overlapping events between START and END
    Conflicts(AgendaArgs),
    /// Delete events matching TEXT
    Delete(DeleteArgs),
    /// Edit events matching TEXT
    Edit(EditArgs),
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    Init(InitCommand),
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Default, Args)]
struct FormatArgs {
    /// Detail lines to show: all, calendar, url, conference, location,
    /// attendees, attachments, length, reminders, email, description
    #[arg(long = "details", value_name = "DETAIL", value_delimiter = ',')]
    details: Vec<String>,
    /// 24-hour clock
    #[arg(long, conflicts_with = "no_military")]
    military: bool,
    #[arg(long = "no-military")]
    no_military: bool,
    /// Tab-separated output
    #[arg(long)]
    tsv: bool,
    /// Hide events that already started
    #[arg(long = "nostarted")]
    no_started: bool,
    /// Hide events you declined
    #[arg(long = "nodeclined")]
    no_declined: bool,
    /// Use per-event colors
    #[arg(long = "override-color")]
    override_color: bool,
    /// Width of detail blocks
    #[arg(short = 'w', long, value_name = "COLUMNS")]
    width: Option<usize>,
    /// Show earlier overlapping events after each event
    #[arg(long)]
    conflicts: bool,
    /// Day headings as YYYY-MM-DD
    #[arg(long = "year-date")]
    year_date: bool,
}

#[derive(Debug, Clone, Default, Args)]
struct AgendaArgs {
    /// First day (YYYY-MM-DD, today, tomorrow, yesterday or a day offset)
    #[arg(allow_hyphen_values = true)]
    start: Option<String>,
    /// Day after the last day shown
    #[arg(allow_hyphen_values = true)]
    end: Option<String>,
    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Debug, Clone, Args)]
struct SearchArgs {
    text: String,
    #[arg(allow_hyphen_values = true)]
    start: Option<String>,
    #[arg(allow_hyphen_values = true)]
    end: Option<String>,
    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Debug, Clone, Default, Args)]
struct GridArgs {
    /// Width of one day cell
    #[arg(short = 'w', long, value_name = "COLUMNS")]
    width: Option<usize>,
    #[arg(long, conflicts_with = "sunday")]
    monday: bool,
    #[arg(long)]
    sunday: bool,
    /// Hide Saturday and Sunday
    #[arg(long = "noweekend")]
    no_weekend: bool,
    #[arg(long, conflicts_with = "no_military")]
    military: bool,
    #[arg(long = "no-military")]
    no_military: bool,
    /// Border style: fancy, unicode or ascii
    #[arg(long, value_name = "STYLE")]
    art: Option<ArtStyle>,
    #[arg(long = "override-color")]
    override_color: bool,
}

#[derive(Debug, Clone, Default, Args)]
struct CalwArgs {
    /// Number of weeks
    weeks: Option<usize>,
    #[arg(allow_hyphen_values = true)]
    start: Option<String>,
    #[command(flatten)]
    grid: GridArgs,
}

#[derive(Debug, Clone, Default, Args)]
struct CalmArgs {
    #[arg(allow_hyphen_values = true)]
    start: Option<String>,
    #[command(flatten)]
    grid: GridArgs,
}

#[derive(Debug, Clone, Args)]
struct DeleteArgs {
    text: String,
    #[arg(allow_hyphen_values = true)]
    start: Option<String>,
    #[arg(allow_hyphen_values = true)]
    end: Option<String>,
    /// Delete without asking
    #[arg(long = "iamaexpert")]
    expert: bool,
}

#[derive(Debug, Clone, Args)]
struct EditArgs {
    text: String,
    #[arg(allow_hyphen_values = true)]
    start: Option<String>,
    #[arg(allow_hyphen_values = true)]
    end: Option<String>,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    Show,
    Path,
    Reset,
}

#[derive(Debug, Clone, Args)]
struct InitCommand {
    #[arg(long = "force")]
    force: bool,
}

#[derive(Debug, Clone)]
struct RuntimeContext {
    common: CommonOpts,
    paths: AppPaths,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts) -> Result<Self> {
        let paths = AppPaths::discover(common.config.clone()).map_err(|e| anyhow!("{e}"))?;
        AppConfig::ensure_default(&paths.global_config).map_err(|e| anyhow!("{e}"))?;
        let config = AppConfig::load(&paths).map_err(|e| anyhow!("{e}"))?;
        Ok(Self {
            common,
            paths,
            config,
        })
    }

    fn init_logging(&self) -> Result<()> {
        if self.common.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }

        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

        builder.filter_level(self.effective_log_level());

        if self.color_disabled() {
            builder.write_style(WriteStyle::Never);
        } else if self.color_forced() {
            builder.write_style(WriteStyle::Always);
        } else {
            builder.write_style(WriteStyle::Auto);
        }

        if self.common.diagnostics {
            builder.format_timestamp_millis();
            builder.format_module_path(true);
            builder.format_target(true);
        }

        builder.try_init().or_else(|err| {
            if self.common.verbose > 0 {
                eprintln!("logger already initialized: {err}");
            }
            Ok(())
        })
    }

    fn effective_log_level(&self) -> LevelFilter {
        if self.common.trace {
            LevelFilter::Trace
        } else if self.common.debug {
            LevelFilter::Debug
        } else {
            match self.common.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    fn color_forced(&self) -> bool {
        matches!(self.common.color, ColorOption::Always) || env::var_os("FORCE_COLOR").is_some()
    }

    fn color_disabled(&self) -> bool {
        self.common.no_color
            || matches!(self.common.color, ColorOption::Never)
            || env::var_os("NO_COLOR").is_some()
    }

    fn service_client(&self) -> Result<ServiceClient> {
        let timeout = self.common.timeout.map(Duration::from_secs);
        ServiceClient::new(&self.config.service_url, timeout).map_err(|e| anyhow!("{e}"))
    }

    /// Config plus global flags, before any command-specific overrides.
    fn render_options(&self) -> Result<RenderOptions> {
        let mut options = self.config.render_options().map_err(|e| anyhow!("{e}"))?;
        if self.config.display.details_width == 0
            && let Some((width, _)) = terminal_size::terminal_size()
        {
            options.agenda.width = width.0 as usize;
        }
        if self.common.conky {
            options.theme.mode = ColorMode::Conky;
        }
        let plain_pipe = !self.color_forced() && !io::stdout().is_terminal();
        if options.theme.mode == ColorMode::Ansi && (self.color_disabled() || plain_pipe) {
            options.theme.mode = ColorMode::Off;
        }
        Ok(options)
    }

    fn now(&self, tz: Tz) -> Instant {
        Utc::now().with_timezone(&tz)
    }

    fn calendar_filters(&self) -> Result<Vec<CalendarFilter>> {
        let specs = if self.common.calendars.is_empty() {
            &self.config.calendars
        } else {
            &self.common.calendars
        };
        specs
            .iter()
            .map(|spec| CalendarFilter::parse(spec).map_err(|e| anyhow!("{e}")))
            .collect()
    }

    fn load_calendars(&self) -> Result<Vec<Calendar>> {
        let calendars = match &self.common.events_file {
            Some(path) => {
                let snapshot = Snapshot::load(path)
                    .map_err(|e| anyhow!("{e}"))
                    .with_context(|| format!("reading {}", path.display()))?;
                normalize_calendars(snapshot.calendars)
            }
            None => {
                let client = self.service_client()?;
                normalize_calendars(client.calendars().map_err(|e| anyhow!("{e}"))?)
            }
        };
        let selected = select_calendars(calendars, &self.calendar_filters()?);
        debug!("{} calendars selected", selected.len());
        Ok(selected)
    }

    /// Calendars and sorted events overlapping `[from, to)`, optionally
    /// restricted to events matching `query`.
    fn load_events(
        &self,
        tz: Tz,
        from: &Instant,
        to: &Instant,
        query: Option<&str>,
    ) -> Result<(CalendarIndex, Vec<Event>)> {
        if let Some(path) = &self.common.events_file {
            return self.load_snapshot_events(path, tz, from, to, query);
        }

        let calendars = self.load_calendars()?;
        let client = self.service_client()?;
        let mut items: Vec<ApiEvent> = Vec::new();
        for calendar in &calendars {
            let fetched = match query {
                Some(text) => client.search(&calendar.id, text, from, to),
                None => client.events(&calendar.id, from, to),
            }
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("fetching events for {}", calendar.summary))?;
            items.extend(fetched.into_iter().map(|mut item| {
                item.calendar_id.get_or_insert_with(|| calendar.id.clone());
                item
            }));
        }
        let fallback = calendars.first().map(|c| c.id.clone()).unwrap_or_default();
        let events = normalize_events(items, &fallback, tz);
        let index = CalendarIndex::new(calendars);
        log_selection(&index, &events);
        Ok((index, events))
    }

    fn load_snapshot_events(
        &self,
        path: &Path,
        tz: Tz,
        from: &Instant,
        to: &Instant,
        query: Option<&str>,
    ) -> Result<(CalendarIndex, Vec<Event>)> {
        let snapshot = Snapshot::load(path)
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("reading {}", path.display()))?;
        let (calendars, events) = snapshot.into_parts(tz);
        let calendars = select_calendars(calendars, &self.calendar_filters()?);
        let matcher = query
            .map(|text| {
                RegexBuilder::new(&regex::escape(text))
                    .case_insensitive(true)
                    .build()
            })
            .transpose()?;

        let events: Vec<Event> = events
            .into_iter()
            .filter(|e| calendars.iter().any(|c| c.id == e.calendar_id))
            .filter(|e| e.start < *to && e.end > *from)
            .filter(|e| match &matcher {
                Some(re) => {
                    re.is_match(&e.title)
                        || e.details.location.as_deref().is_some_and(|l| re.is_match(l))
                        || e.details.description.as_deref().is_some_and(|d| re.is_match(d))
                }
                None => true,
            })
            .collect();
        let index = CalendarIndex::new(calendars);
        log_selection(&index, &events);
        Ok((index, events))
    }
}

fn log_selection(calendars: &CalendarIndex, events: &[Event]) {
    if calendars.is_empty() {
        warn!("no calendars selected; check --calendar and the calendars config");
    } else {
        debug!("{} events from {} calendars", events.len(), calendars.len());
    }
}

fn handle_list(ctx: &RuntimeContext) -> Result<()> {
    let calendars = ctx.load_calendars()?;
    if ctx.common.json || ctx.common.yaml {
        return emit_output(&ctx.common, &calendars);
    }

    let options = ctx.render_options()?;
    let colors = &ctx.config.colors;
    let mut p = Printer::new(io::stdout().lock(), options.theme);
    p.line(&StyledLine::single(
        format!(" {:<16} {}", "Access", "Title"),
        colors.title,
    ))?;
    p.line(&StyledLine::single(
        format!(" {:<16} {}", "------", "-----"),
        colors.title,
    ))?;
    for calendar in &calendars {
        p.line(&StyledLine::single(
            format!(" {:<16} {}", calendar.access_role.as_str(), calendar.summary),
            calendar.color(colors),
        ))?;
    }
    p.flush()?;
    Ok(())
}

fn apply_format_args(options: &mut RenderOptions, args: &FormatArgs) -> Result<()> {
    let agenda = &mut options.agenda;
    agenda.details = Details::from_names(&args.details).map_err(|e| anyhow!(e))?;
    if args.military {
        agenda.military = true;
    } else if args.no_military {
        agenda.military = false;
    }
    if let Some(width) = args.width {
        agenda.width = width;
    }
    agenda.ignore_started = args.no_started;
    agenda.ignore_declined = args.no_declined;
    agenda.override_color = args.override_color;
    agenda.show_conflicts = args.conflicts;
    if args.year_date {
        agenda.year_date = true;
    }
    Ok(())
}

fn apply_grid_args(options: &mut RenderOptions, args: &GridArgs) -> Result<()> {
    let grid = &mut options.grid;
    if let Some(width) = args.width {
        if width < MIN_CELL_WIDTH {
            return Err(anyhow!(
                "cell width must be at least {MIN_CELL_WIDTH} (got {width})"
            ));
        }
        grid.width = width;
    }
    if args.monday {
        grid.week_start = WeekStart::Monday;
    } else if args.sunday {
        grid.week_start = WeekStart::Sunday;
    }
    if args.no_weekend {
        grid.weekend = false;
    }
    if args.military {
        grid.military = true;
    } else if args.no_military {
        grid.military = false;
    }
    if let Some(art) = args.art {
        options.theme.art = art;
    }
    grid.override_color = args.override_color;
    Ok(())
}

/// Resolve a date argument relative to `today`.
fn parse_date_arg(raw: &str, today: NaiveDate) -> Result<NaiveDate> {
    let offset = match raw.trim().to_lowercase().as_str() {
        "today" => 0,
        "tomorrow" => 1,
        "yesterday" => -1,
        other => {
            if let Ok(date) = NaiveDate::parse_from_str(other, "%Y-%m-%d") {
                return Ok(date);
            }
            other.trim_start_matches('+').parse::<i64>().map_err(|_| {
                anyhow!(
                    "invalid date: '{}' (use YYYY-MM-DD, a day offset, 'today', 'tomorrow', or 'yesterday')",
                    raw
                )
            })?
        }
    };
    today
        .checked_add_signed(ChronoDuration::days(offset))
        .ok_or_else(|| anyhow!("date offset out of range: {raw}"))
}

fn local_midnight(date: NaiveDate, tz: Tz) -> Result<Instant> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| anyhow!("{naive} does not exist in {tz}"))
}

/// `[start, end)` as instants. `end` defaults to `days` after `start`.
fn date_range(
    start: Option<&str>,
    end: Option<&str>,
    days: i64,
    today: NaiveDate,
    tz: Tz,
) -> Result<(Instant, Instant)> {
    let start = match start {
        Some(raw) => parse_date_arg(raw, today)?,
        None => today,
    };
    let end = match end {
        Some(raw) => parse_date_arg(raw, today)?,
        None => start + ChronoDuration::days(days),
    };
    if end <= start {
        return Err(anyhow!("end date {end} is not after start date {start}"));
    }
    Ok((local_midnight(start, tz)?, local_midnight(end, tz)?))
}

fn print_agenda(
    ctx: &RuntimeContext,
    options: &RenderOptions,
    calendars: &CalendarIndex,
    events: &[Event],
    tsv: bool,
) -> Result<()> {
    let now = ctx.now(options.tz);
    let formatter = AgendaFormatter::new(calendars, &ctx.config.colors, &options.agenda, now);
    let shown = if tsv {
        let mut out = io::stdout().lock();
        let shown = formatter.print_tsv(&mut out, events)?;
        out.flush()?;
        shown
    } else {
        let mut p = Printer::new(io::stdout().lock(), options.theme);
        let shown = formatter.iterate_events(&mut p, events)?;
        p.flush()?;
        shown
    };
    info!("{} of {} events shown", shown, events.len());
    Ok(())
}

fn handle_agenda(ctx: &RuntimeContext, args: AgendaArgs) -> Result<()> {
    let mut options = ctx.render_options()?;
    apply_format_args(&mut options, &args.format)?;
    let today = ctx.now(options.tz).date_naive();
    let (from, to) = date_range(
        args.start.as_deref(),
        args.end.as_deref(),
        AGENDA_DAYS,
        today,
        options.tz,
    )?;
    let (calendars, events) = ctx.load_events(options.tz, &from, &to, None)?;
    print_agenda(ctx, &options, &calendars, &events, args.format.tsv)
}

fn handle_search(ctx: &RuntimeContext, args: SearchArgs) -> Result<()> {
    let mut options = ctx.render_options()?;
    apply_format_args(&mut options, &args.format)?;
    let today = ctx.now(options.tz).date_naive();
    let (from, to) = date_range(
        args.start.as_deref(),
        args.end.as_deref(),
        SEARCH_DAYS,
        today,
        options.tz,
    )?;
    let (calendars, events) = ctx.load_events(options.tz, &from, &to, Some(&args.text))?;
    print_agenda(ctx, &options, &calendars, &events, args.format.tsv)
}

fn handle_calw(ctx: &RuntimeContext, args: CalwArgs) -> Result<()> {
    let mut options = ctx.render_options()?;
    apply_grid_args(&mut options, &args.grid)?;
    let now = ctx.now(options.tz);
    let start = match args.start.as_deref() {
        Some(raw) => parse_date_arg(raw, now.date_naive())?,
        None => now.date_naive(),
    };
    let weeks = args.weeks.unwrap_or(1).max(1);
    let first_week = options.grid.start_of_week(start);
    let from = local_midnight(first_week, options.tz)?;
    let to = local_midnight(first_week + ChronoDuration::days(7 * weeks as i64), options.tz)?;

    let (calendars, events) = ctx.load_events(options.tz, &from, &to, None)?;
    let grid = GridRenderer::new(&options.grid, &calendars, &ctx.config.colors, now);
    let mut p = Printer::new(io::stdout().lock(), options.theme);
    grid.render_week_view(&mut p, start, weeks, &events)?;
    p.flush()?;
    Ok(())
}

fn handle_calm(ctx: &RuntimeContext, args: CalmArgs) -> Result<()> {
    let mut options = ctx.render_options()?;
    apply_grid_args(&mut options, &args.grid)?;
    let now = ctx.now(options.tz);
    let day = match args.start.as_deref() {
        Some(raw) => parse_date_arg(raw, now.date_naive())?,
        None => now.date_naive(),
    };

    let (first, last) = options.grid.month_window(day);
    let from = local_midnight(first, options.tz)?;
    let to = local_midnight(last, options.tz)?;
    let (calendars, events) = ctx.load_events(options.tz, &from, &to, None)?;

    let grid = GridRenderer::new(&options.grid, &calendars, &ctx.config.colors, now);
    let mut p = Printer::new(io::stdout().lock(), options.theme);
    grid.render_month_view(&mut p, day, &events)?;
    p.flush()?;
    Ok(())
}

fn handle_conflicts(ctx: &RuntimeContext, args: AgendaArgs) -> Result<()> {
    let mut options = ctx.render_options()?;
    apply_format_args(&mut options, &args.format)?;
    let now = ctx.now(options.tz);
    let (from, to) = date_range(
        args.start.as_deref(),
        args.end.as_deref(),
        AGENDA_DAYS,
        now.date_naive(),
        options.tz,
    )?;
    let (calendars, events) = ctx.load_events(options.tz, &from, &to, None)?;

    let formatter = AgendaFormatter::new(&calendars, &ctx.config.colors, &options.agenda, now);
    let events: Vec<Event> = events
        .into_iter()
        .filter(|e| formatter.is_selected(e))
        .collect();
    let conflicts = find_conflicts(&events);

    let mut p = Printer::new(io::stdout().lock(), options.theme);
    if conflicts.is_empty() {
        p.line(&StyledLine::single("No conflicts found.", ColorKey::Yellow))?;
        p.flush()?;
        return Ok(());
    }

    let art = options.theme.art;
    let mut last_later: Option<&Event> = None;
    for conflict in &conflicts {
        if last_later.is_none_or(|prev| !std::ptr::eq(prev, conflict.later)) {
            p.newline()?;
            let heading = conflict.later.start.format("%a %b %d").to_string();
            for line in formatter.format_event(conflict.later, Some(heading.as_str()), art) {
                p.line(&line)?;
            }
            last_later = Some(conflict.later);
        }
        for line in formatter.format_event(conflict.earlier, Some(CONFLICT_PREFIX), art) {
            p.line(&line)?;
        }
    }
    p.flush()?;
    Ok(())
}

/// Ask a question on the terminal. Blank answers are allowed.
fn prompt(question: &str) -> Result<String> {
    let answer = Input::<String>::new()
        .with_prompt(question.trim_end_matches(": "))
        .allow_empty(true)
        .interact_text()
        .context("reading answer")?;
    Ok(answer)
}

/// Matching events with every detail enabled, for the delete and edit flows.
fn matching_events(
    ctx: &RuntimeContext,
    text: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(RenderOptions, CalendarIndex, Vec<Event>)> {
    if ctx.common.events_file.is_some() {
        return Err(anyhow!("--events-file is read-only; it cannot be used to change events"));
    }
    let mut options = ctx.render_options()?;
    options.agenda.details = Details::all();
    let today = ctx.now(options.tz).date_naive();
    let (from, to) = date_range(start, end, SEARCH_DAYS, today, options.tz)?;
    let (calendars, events) = ctx.load_events(options.tz, &from, &to, Some(text))?;
    Ok((options, calendars, events))
}

fn print_event_block<W: Write>(
    p: &mut Printer<W>,
    formatter: &AgendaFormatter<'_>,
    event: &Event,
    art: ArtStyle,
) -> Result<()> {
    p.newline()?;
    let heading = event.start.format("%a %b %d").to_string();
    for line in formatter.format_event(event, Some(heading.as_str()), art) {
        p.line(&line)?;
    }
    p.flush()?;
    Ok(())
}

fn handle_delete(ctx: &RuntimeContext, args: DeleteArgs) -> Result<()> {
    let (options, calendars, events) = matching_events(
        ctx,
        &args.text,
        args.start.as_deref(),
        args.end.as_deref(),
    )?;
    if events.is_empty() {
        println!("No events found matching '{}'", args.text);
        return Ok(());
    }

    let client = ctx.service_client()?;
    let now = ctx.now(options.tz);
    let formatter = AgendaFormatter::new(&calendars, &ctx.config.colors, &options.agenda, now);
    let mut p = Printer::new(io::stdout(), options.theme);

    for event in &events {
        print_event_block(&mut p, &formatter, event, options.theme.art)?;
        let choice = if args.expert {
            DeleteChoice::Delete
        } else {
            loop {
                match parse_delete_answer(&prompt(DELETE_PROMPT)?) {
                    DeleteChoice::Invalid => eprintln!("Invalid choice, please try again."),
                    choice => break choice,
                }
            }
        };
        match choice {
            DeleteChoice::Delete => {
                client
                    .delete_event(&event.calendar_id, &event.id)
                    .map_err(|e| anyhow!("{e}"))
                    .with_context(|| format!("deleting '{}'", event.display_title()))?;
                p.line(&StyledLine::single("Deleted!", ColorKey::Red))?;
                info!("deleted event {} from {}", event.id, event.calendar_id);
            }
            DeleteChoice::Quit => return Ok(()),
            DeleteChoice::Keep | DeleteChoice::Invalid => {}
        }
    }
    p.flush()?;
    Ok(())
}

fn handle_edit(ctx: &RuntimeContext, args: EditArgs) -> Result<()> {
    let (options, calendars, events) = matching_events(
        ctx,
        &args.text,
        args.start.as_deref(),
        args.end.as_deref(),
    )?;
    if events.is_empty() {
        println!("No events found matching '{}'", args.text);
        return Ok(());
    }

    let client = ctx.service_client()?;
    let now = ctx.now(options.tz);
    let formatter = AgendaFormatter::new(&calendars, &ctx.config.colors, &options.agenda, now);
    let mut p = Printer::new(io::stdout(), options.theme);

    for event in &events {
        print_event_block(&mut p, &formatter, event, options.theme.art)?;
        let mut editor = EventEditor::new(event, options.tz);
        loop {
            match parse_edit_answer(&prompt(EDIT_PROMPT)?) {
                EditChoice::Step(SessionStep::Continue) => break,
                EditChoice::Step(SessionStep::Quit) => return Ok(()),
                EditChoice::Step(SessionStep::Invalid) => {
                    eprintln!("Invalid choice, please try again.");
                }
                EditChoice::Step(SessionStep::Save) => {
                    if editor.patch().is_empty() {
                        warn!("nothing to save for '{}'", event.display_title());
                        break;
                    }
                    client
                        .patch_event(&event.calendar_id, &event.id, editor.patch())
                        .map_err(|e| anyhow!("{e}"))
                        .with_context(|| format!("saving '{}'", event.display_title()))?;
                    p.line(&StyledLine::single("Saved!", ColorKey::Green))?;
                    break;
                }
                EditChoice::Field(field) => {
                    let value = prompt(field.prompt())?;
                    if let Err(err) = editor.apply(field, &value) {
                        eprintln!("{err}");
                    }
                }
            }
        }
    }
    p.flush()?;
    Ok(())
}

fn handle_config(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => emit_output(&ctx.common, &ctx.config),
        ConfigCommand::Path => {
            println!("{}", ctx.paths.active_config().display());
            Ok(())
        }
        ConfigCommand::Reset => {
            AppConfig::write_default(ctx.paths.active_config()).map_err(|e| anyhow!("{e}"))
        }
    }
}

fn handle_init(ctx: &RuntimeContext, cmd: InitCommand) -> Result<()> {
    let path = ctx.paths.active_config();
    if path.exists() && !(cmd.force || ctx.common.assume_yes) {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    AppConfig::write_default(path).map_err(|e| anyhow!("{e}"))?;
    println!("wrote {}", path.display());
    Ok(())
}

fn handle_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
    Ok(())
}

/// Print `value` as JSON with `--json`, YAML otherwise.
fn emit_output<T: ?Sized + Serialize + std::fmt::Debug>(
    opts: &CommonOpts,
    value: &T,
) -> Result<()> {
    if opts.json {
        let json = serde_json::to_string_pretty(value)?;
        println!("{json}");
        return Ok(());
    }
    let yaml = serde_yaml::to_string(value)?;
    print!("{yaml}");
    Ok(())
}
