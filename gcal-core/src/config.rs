//! Configuration management for gcal.

use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::agenda::{AgendaOptions, Details};
use crate::error::{Error, Result};
use crate::grid::GridConfig;
use crate::paths::AppPaths;
use crate::theme::{ArtStyle, ColorKey, ColorMode, Theme};

const APP_NAME: &str = "gcal";

/// Narrowest usable grid cell.
pub const MIN_CELL_WIDTH: usize = 10;

/// What `gcal` shows when run without a subcommand.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    /// Chronological agenda list
    #[default]
    Agenda,
    /// One-week grid
    Week,
    /// Month grid
    Month,
}

impl std::fmt::Display for CalendarView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalendarView::Agenda => write!(f, "agenda"),
            CalendarView::Week => write!(f, "week"),
            CalendarView::Month => write!(f, "month"),
        }
    }
}

impl std::str::FromStr for CalendarView {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "agenda" => Ok(CalendarView::Agenda),
            "week" | "calw" => Ok(CalendarView::Week),
            "month" | "calm" => Ok(CalendarView::Month),
            _ => Err(format!("unknown view: {} (valid: agenda, week, month)", s)),
        }
    }
}

/// First column of the week grid.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

/// Display configuration shared by the agenda and the grids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width of one day cell in the week/month grids.
    pub width: usize,
    /// 24-hour clock.
    pub military: bool,
    /// Show Saturday and Sunday columns.
    pub weekend: bool,
    pub week_start: WeekStart,
    /// Border drawing style.
    pub art: ArtStyle,
    /// Width of agenda detail blocks; 0 follows the terminal.
    pub details_width: usize,
    /// Emit Conky color markup instead of ANSI escapes.
    pub conky: bool,
    /// Agenda day headings as `YYYY-MM-DD`.
    pub year_date: bool,
    pub default_view: CalendarView,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: MIN_CELL_WIDTH,
            military: false,
            weekend: true,
            week_start: WeekStart::Sunday,
            art: ArtStyle::Unicode,
            details_width: 80,
            conky: false,
            year_date: false,
            default_view: CalendarView::Agenda,
        }
    }
}

/// Semantic color assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Calendars you own.
    pub owner: ColorKey,
    /// Calendars you can write to.
    pub writer: ColorKey,
    /// Read-only calendars.
    pub reader: ColorKey,
    /// Free/busy-only calendars.
    pub freebusy: ColorKey,
    /// Dates and headings.
    pub date: ColorKey,
    /// The "now" marker and events in progress.
    pub now_marker: ColorKey,
    /// Grid borders.
    pub border: ColorKey,
    /// Month title and calendar list headings.
    pub title: ColorKey,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            owner: ColorKey::Cyan,
            writer: ColorKey::Green,
            reader: ColorKey::Magenta,
            freebusy: ColorKey::Default,
            date: ColorKey::Yellow,
            now_marker: ColorKey::BrightRed,
            border: ColorKey::White,
            title: ColorKey::BrightYellow,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// URL of the calendar service.
    pub service_url: String,
    /// Timezone for display (e.g., "Europe/Berlin").
    pub timezone: String,
    /// Calendar filters used when none are given on the command line.
    #[serde(default)]
    pub calendars: Vec<String>,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub colors: ColorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:8788".to_string(),
            timezone: "UTC".to_string(),
            calendars: Vec::new(),
            display: DisplayConfig::default(),
            colors: ColorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from paths with environment overlay.
    pub fn load(paths: &AppPaths) -> Result<Self> {
        let env_prefix = env_prefix();
        let mut builder = Config::builder()
            .add_source(
                File::from(paths.global_config.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                File::from(paths.local_config.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(&env_prefix).separator("__"));

        if let Some(cli_cfg) = &paths.cli_config {
            builder = builder.add_source(
                File::from(cli_cfg.as_path())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        let defaults = AppConfig::default();
        builder = builder
            .set_default("service_url", defaults.service_url)?
            .set_default("timezone", defaults.timezone)?
            .set_default("display.width", MIN_CELL_WIDTH as i64)?
            .set_default("display.weekend", true)?
            .set_default("display.details_width", 80)?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the renderers cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.display.width < MIN_CELL_WIDTH {
            return Err(Error::Config(format!(
                "display.width must be at least {} (got {})",
                MIN_CELL_WIDTH, self.display.width
            )));
        }
        self.tz()?;
        Ok(())
    }

    /// Parsed display timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| Error::Config(format!("invalid timezone '{}': {e}", self.timezone)))
    }

    /// Write default config to a path.
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("creating config directory {parent:?}: {e}")))?;
        }
        let cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&cfg)
            .map_err(|e| Error::Config(format!("serializing default config: {e}")))?;
        let mut content = String::new();
        content.push_str("# gcal configuration\n");
        content.push_str(
            "# Place this file at $XDG_CONFIG_HOME/gcal/config.toml (or ~/.config/gcal/config.toml)\n\n",
        );
        content.push_str(&toml);
        content.push('\n');
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("writing config file to {}: {e}", path.display())))
    }

    /// Ensure default config exists, creating it if necessary.
    pub fn ensure_default(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        Self::write_default(path)
    }
}

/// Settings for one render call: the loaded config plus command-line overrides.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub tz: Tz,
    pub theme: Theme,
    pub agenda: AgendaOptions,
    pub grid: GridConfig,
}

impl AppConfig {
    /// Starting point for a render call. A `details_width` of 0 falls back to
    /// 80 columns; the CLI replaces it with the terminal width when it can.
    pub fn render_options(&self) -> Result<RenderOptions> {
        let display = &self.display;
        let mode = if display.conky {
            ColorMode::Conky
        } else {
            ColorMode::Ansi
        };
        let details_width = match display.details_width {
            0 => 80,
            width => width,
        };
        Ok(RenderOptions {
            tz: self.tz()?,
            theme: Theme::new(mode, display.art),
            agenda: AgendaOptions {
                military: display.military,
                details: Details::default(),
                width: details_width,
                year_date: display.year_date,
                ..AgendaOptions::default()
            },
            grid: GridConfig {
                width: display.width,
                weekend: display.weekend,
                week_start: display.week_start,
                military: display.military,
                override_color: false,
            },
        })
    }
}

/// Generate environment variable prefix from app name.
fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
