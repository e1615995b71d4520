//! Focus timer scheduler.
//!
//! Owns at most one live timer per user and drives the
//! work -> record -> break -> idle cycle on a tokio task per timer.
//!
//! Every live timer carries a generation number. `start` and `cancel` swap
//! the user's slot under its mutex, and the deadline path re-checks the
//! generation under the same mutex before it transitions, so a cancelled or
//! replaced timer can never record a completion or notify.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::history::HistoryLog;
use super::settings::{Settings, SettingsStore};
use super::timer::{BreakKind, Phase, TimerNotice};
use crate::core::keyed::lock;
use crate::core::{PerUser, UserId};
use crate::error::FocusError;

const MINUTE: Duration = Duration::from_secs(60);

/// Delivers timer notices to a user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notice. Failures are logged by the scheduler, never retried.
    async fn notify(&self, user: &UserId, notice: &TimerNotice) -> Result<(), FocusError>;
}

/// Callback run after a completion has been appended to the history log.
pub type RecordHook = Arc<dyn Fn(&UserId) + Send + Sync>;

struct ActiveTimer {
    generation: u64,
    phase: Phase,
    task_text: String,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct TimerSlot {
    active: Option<ActiveTimer>,
}

struct Inner {
    settings: Arc<SettingsStore>,
    history: Arc<HistoryLog>,
    notifier: Arc<dyn Notifier>,
    on_record: Option<RecordHook>,
    timers: PerUser<TimerSlot>,
    next_generation: AtomicU64,
    sessions_until_long_break: u32,
}

/// Snapshot of a user's live timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerStatus {
    /// Current phase.
    pub phase: Phase,
    /// Task the session is bound to.
    pub task_text: String,
}

/// Shared scheduler serving every user.
#[derive(Clone)]
pub struct FocusScheduler {
    inner: Arc<Inner>,
}

impl FocusScheduler {
    /// Create a scheduler.
    pub fn new(
        settings: Arc<SettingsStore>,
        history: Arc<HistoryLog>,
        notifier: Arc<dyn Notifier>,
        sessions_until_long_break: u32,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                history,
                notifier,
                on_record: None,
                timers: PerUser::new(),
                next_generation: AtomicU64::new(0),
                sessions_until_long_break,
            }),
        }
    }

    /// Run `hook` after every recorded completion.
    ///
    /// Must be called before the scheduler is cloned or started.
    #[must_use]
    pub fn with_record_hook(mut self, hook: RecordHook) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.on_record = Some(hook);
        } else {
            warn!("record hook ignored: scheduler already shared");
        }
        self
    }

    /// Start a work interval on `task_text`, replacing any live timer.
    ///
    /// The replaced timer is dropped silently. Must be called from within a
    /// tokio runtime.
    pub fn start(&self, user: &UserId, task_text: &str) -> TimerNotice {
        let settings = self.inner.settings.get(user);
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed) + 1;

        let slot = self.inner.timers.slot(user);
        let mut guard = lock(&slot);

        if let Some(old) = guard.active.take() {
            old.handle.abort();
            debug!(%user, old_generation = old.generation, "replaced live timer");
        }

        let handle = tokio::spawn(run_cycle(
            Arc::clone(&self.inner),
            user.clone(),
            generation,
            task_text.to_string(),
            settings,
        ));

        guard.active = Some(ActiveTimer {
            generation,
            phase: Phase::Working,
            task_text: task_text.to_string(),
            handle,
        });

        info!(%user, generation, task = task_text, minutes = settings.work_minutes, "focus timer started");

        TimerNotice::Started {
            task: task_text.to_string(),
            minutes: settings.work_minutes,
        }
    }

    /// Stop the user's live timer.
    ///
    /// No completion is recorded for an interrupted work interval.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveTimer` if the user has no live timer.
    pub fn cancel(&self, user: &UserId) -> Result<TimerNotice, FocusError> {
        let active = self
            .inner
            .timers
            .with(user, |slot| slot.active.take())
            .ok_or(FocusError::NoActiveTimer)?;

        active.handle.abort();
        info!(%user, generation = active.generation, phase = ?active.phase, "focus timer cancelled");
        Ok(TimerNotice::Stopped)
    }

    /// The user's live timer, if any.
    #[must_use]
    pub fn status(&self, user: &UserId) -> Option<TimerStatus> {
        self.inner
            .timers
            .peek(user, |slot| {
                slot.active.as_ref().map(|a| TimerStatus {
                    phase: a.phase,
                    task_text: a.task_text.clone(),
                })
            })
            .flatten()
    }
}

impl Inner {
    fn minutes(minutes: u32) -> Duration {
        MINUTE * minutes
    }

    /// Work deadline: record the completion and move to a break.
    ///
    /// Returns `None` if the timer was cancelled or replaced.
    fn finish_work(&self, user: &UserId, generation: u64, task_text: &str) -> Option<BreakKind> {
        let slot = self.timers.slot(user);
        let kind = {
            let mut guard = lock(&slot);
            let active = guard
                .active
                .as_mut()
                .filter(|a| a.generation == generation && a.phase == Phase::Working)?;

            self.history.record(user, task_text, Utc::now());
            let completed = self.history.total(user);
            let kind = BreakKind::after(completed, self.sessions_until_long_break);
            active.phase = Phase::OnBreak(kind);

            info!(%user, generation, completed, ?kind, "work interval completed");
            kind
        };

        if let Some(hook) = &self.on_record {
            hook(user);
        }

        Some(kind)
    }

    /// Break deadline: clear the slot if this timer still owns it.
    fn finish_break(&self, user: &UserId, generation: u64) -> bool {
        self.timers.with(user, |slot| {
            if slot.active.as_ref().is_some_and(|a| a.generation == generation) {
                slot.active = None;
                true
            } else {
                false
            }
        })
    }

    async fn deliver(&self, user: &UserId, notice: TimerNotice) {
        if let Err(e) = self.notifier.notify(user, &notice).await {
            warn!(%user, error = %e, ?notice, "timer notification not delivered");
        }
    }
}

async fn run_cycle(
    inner: Arc<Inner>,
    user: UserId,
    generation: u64,
    task_text: String,
    settings: Settings,
) {
    tokio::time::sleep(Inner::minutes(settings.work_minutes)).await;

    let Some(kind) = inner.finish_work(&user, generation, &task_text) else {
        debug!(%user, generation, "work deadline ignored: timer no longer active");
        return;
    };

    let break_minutes = match kind {
        BreakKind::Short => settings.short_break_minutes,
        BreakKind::Long => settings.long_break_minutes,
    };

    inner
        .deliver(&user, TimerNotice::WorkFinished { task: task_text })
        .await;
    inner
        .deliver(
            &user,
            TimerNotice::BreakStarted {
                kind,
                minutes: break_minutes,
            },
        )
        .await;

    tokio::time::sleep(Inner::minutes(break_minutes)).await;

    if inner.finish_break(&user, generation) {
        debug!(%user, generation, "break finished");
        inner.deliver(&user, TimerNotice::BreakOver).await;
    }
}
