//! gcal-core: Core library for gcal - event model, config, and rendering.
//!
//! This crate provides everything behind the `gcal` command line:
//! - Configuration management and path discovery
//! - Service client for the calendar backend and payload normalization
//! - Text width measurement and line wrapping
//! - Agenda, TSV and week/month grid rendering
//! - Conflict detection
//! - Parsing for the interactive edit and delete prompts

pub mod agenda;
pub mod calendar;
pub mod config;
pub mod conflicts;
pub mod error;
pub mod event;
pub mod grid;
pub mod interact;
pub mod normalize;
pub mod paths;
pub mod printer;
pub mod service;
pub mod theme;
pub mod types;
pub mod width;
pub mod wrap;

pub use agenda::{AgendaFormatter, AgendaOptions, Details};
pub use calendar::{Calendar, CalendarFilter, CalendarIndex};
pub use config::{AppConfig, CalendarView, RenderOptions};
pub use conflicts::{ConflictDetector, find_conflicts};
pub use error::{Error, Result};
pub use event::{Event, Instant};
pub use grid::{GridConfig, GridRenderer};
pub use paths::AppPaths;
pub use printer::{Printer, StyledLine};
pub use service::ServiceClient;
pub use theme::{ColorKey, ColorMode, Theme};
