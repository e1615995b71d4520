//! Timer phases, break selection and user-facing timer notices.

use serde::{Deserialize, Serialize};

/// Phase of a live timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Work interval is running
    Working,
    /// Break after the work interval is running
    OnBreak(BreakKind),
}

/// Which break follows a completed work interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    /// Ordinary break
    Short,
    /// Break after every Nth completed session
    Long,
}

impl BreakKind {
    /// Pick the break for a user with `completed` total sessions.
    ///
    /// Every `every`th completion selects a long break.
    #[must_use]
    pub const fn after(completed: usize, every: u32) -> Self {
        let every = if every == 0 { 1 } else { every as usize };
        if completed > 0 && completed % every == 0 {
            Self::Long
        } else {
            Self::Short
        }
    }

    /// Get display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Short => "Short break",
            Self::Long => "Long break",
        }
    }
}

/// Something the scheduler tells a user about their timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerNotice {
    /// A work interval began.
    Started { task: String, minutes: u32 },
    /// The work interval elapsed and was recorded.
    WorkFinished { task: String },
    /// A break began.
    BreakStarted { kind: BreakKind, minutes: u32 },
    /// The break elapsed; the user is idle again.
    BreakOver,
    /// The user stopped their timer.
    Stopped,
}

impl TimerNotice {
    /// Render the notice as chat text.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Started { task, minutes } => {
                format!("⏳ Focus session started: {task}\nDuration: {}.", format_minutes(*minutes))
            },
            Self::WorkFinished { task } => format!("✅ Focus session finished: {task}"),
            Self::BreakStarted {
                kind: BreakKind::Short,
                minutes,
            } => format!("🥤 {}: {}.", BreakKind::Short.display_name(), format_minutes(*minutes)),
            Self::BreakStarted {
                kind: BreakKind::Long,
                minutes,
            } => format!("💤 {}: {}.", BreakKind::Long.display_name(), format_minutes(*minutes)),
            Self::BreakOver => "🔔 Break over. Ready to continue!".to_string(),
            Self::Stopped => "⛔ Timer stopped.".to_string(),
        }
    }
}

/// Format a whole number of minutes as a human-readable string.
#[must_use]
pub fn format_minutes(total_minutes: u32) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    let plural = |n: u32| if n == 1 { "" } else { "s" };

    if hours > 0 {
        if minutes > 0 {
            format!(
                "{hours} hour{}, {minutes} minute{}",
                plural(hours),
                plural(minutes)
            )
        } else {
            format!("{hours} hour{}", plural(hours))
        }
    } else {
        format!("{minutes} minute{}", plural(minutes))
    }
}
