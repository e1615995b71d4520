//! Focus sessions.
//!
//! Provides timed work/break sessions for many users at once:
//! - Per-user duration settings
//! - A shared scheduler with one cancellable timer per user
//! - Completed session history and reports

pub mod history;
pub mod report;
pub mod scheduler;
pub mod settings;
pub mod timer;

pub use history::{HistoryLog, SessionRecord};
pub use report::{FocusReport, ReportPeriod};
pub use scheduler::{FocusScheduler, Notifier, RecordHook, TimerStatus};
pub use settings::{Settings, SettingsStore};
pub use timer::{format_minutes, BreakKind, Phase, TimerNotice};
