//! Conversation dispatcher.
//!
//! Maps `(menu state, input)` to a reply and the next menu state. Buttons
//! are matched first so a user can always leave a free-text prompt. Every
//! user-input error is turned into a retry prompt in the same state.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::menu::{Button, Keyboard, Menu};
use crate::core::{format_timestamp, split_due, PerUser, UserId};
use crate::error::FocusError;
use crate::features::advice::{advise_on, Advisor};
use crate::features::focus::{FocusReport, FocusScheduler, HistoryLog, Settings, SettingsStore};
use crate::features::tasks::{format_list, TaskStore};
use crate::storage::{LoadedState, PersistenceSync};

const NO_TASKS: &str = "📭 No tasks.";
const UNKNOWN_COMMAND: &str = "🤖 Unknown command. Send /start";
const SETTINGS_FORMAT: &str = "❗ Use the format 25/5/15";
const INVALID_INDEX: &str = "❗ Invalid task number.";
const SEND_NUMBER: &str = "❗ Send the task number, e.g. 1.";
const TRY_AGAIN: &str = "⚠️ Something went wrong, please try again.";

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message text.
    pub text: String,
    /// Keyboard to show with the message, if it changes.
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Per-user conversation state machine.
pub struct Conversation {
    tasks: Arc<TaskStore>,
    settings: Arc<SettingsStore>,
    history: Arc<HistoryLog>,
    scheduler: FocusScheduler,
    advisor: Arc<dyn Advisor>,
    sync: Arc<PersistenceSync>,
    menus: PerUser<Menu>,
}

type Step = (Reply, Menu);

impl Conversation {
    /// Create a dispatcher over loaded stores.
    pub fn new(
        state: &LoadedState,
        scheduler: FocusScheduler,
        advisor: Arc<dyn Advisor>,
        sync: Arc<PersistenceSync>,
    ) -> Self {
        Self {
            tasks: Arc::clone(&state.tasks),
            settings: Arc::clone(&state.settings),
            history: Arc::clone(&state.history),
            scheduler,
            advisor,
            sync,
            menus: PerUser::new(),
        }
    }

    /// Current menu state of `user`.
    #[must_use]
    pub fn menu(&self, user: &UserId) -> Menu {
        self.menus.peek(user, |m| *m).unwrap_or_default()
    }

    /// Handle one inbound message.
    ///
    /// Messages from one user must be handled one at a time.
    pub async fn handle(&self, user: &UserId, text: &str) -> Reply {
        let state = self.menu(user);
        let (reply, next) = self.dispatch(user, state, text.trim()).await;

        if next != state {
            debug!(%user, from = ?state, to = ?next, "menu transition");
        }
        self.menus.with(user, |m| *m = next);
        reply
    }

    async fn dispatch(&self, user: &UserId, state: Menu, text: &str) -> Step {
        if let Some(button) = Button::from_input(text) {
            return self.press(user, state, button).await;
        }

        match state {
            Menu::AwaitingTaskText => self.add_task(user, text),
            Menu::AwaitingEditIndex => self.choose_edit(user, text),
            Menu::AwaitingEditText { index } => self.commit_edit(user, index, text),
            Menu::AwaitingDeleteIndex => self.commit_delete(user, text),
            Menu::AwaitingDoneIndex => self.commit_done(user, text),
            Menu::AwaitingFocusChoice => self.start_focus(user, text),
            Menu::AwaitingSettings => self.commit_settings(user, text),
            Menu::Main | Menu::TaskMenu => {
                debug!(%user, input = text, "unknown command");
                (Reply::text(UNKNOWN_COMMAND), state)
            },
        }
    }

    async fn press(&self, user: &UserId, state: Menu, button: Button) -> Step {
        match button {
            Button::Start => (
                Reply::with_keyboard("👋 Hi! Main menu:", Keyboard::main()),
                Menu::Main,
            ),
            Button::Back => (
                Reply::with_keyboard("🔙 Main menu:", Keyboard::main()),
                Menu::Main,
            ),
            Button::Focus => {
                if self.tasks.is_empty(user) {
                    return (Reply::text(NO_TASKS), Menu::Main);
                }
                (
                    Reply::text(format!("Choose a task:\n{}", self.task_list(user))),
                    Menu::AwaitingFocusChoice,
                )
            },
            Button::Tasks => {
                let list = if self.tasks.is_empty(user) {
                    NO_TASKS.to_string()
                } else {
                    self.task_list(user)
                };
                (
                    Reply::with_keyboard(format!("📋 Your tasks:\n{list}"), Keyboard::tasks()),
                    Menu::TaskMenu,
                )
            },
            Button::Add => (
                Reply::text("Enter the task text (end with \"in 2 hours\" or \"tomorrow\" to set a due time):"),
                Menu::AwaitingTaskText,
            ),
            Button::Edit => self.ask_index(user, "edit", Menu::AwaitingEditIndex),
            Button::Delete => self.ask_index(user, "delete", Menu::AwaitingDeleteIndex),
            Button::Done => self.ask_index(user, "mark done", Menu::AwaitingDoneIndex),
            Button::Stats => {
                let tasks = self.tasks.list(user);
                let report = FocusReport::generate(&self.history, &tasks, user, Utc::now());
                (Reply::text(report.render()), Menu::Main)
            },
            Button::Settings => {
                let current = self.settings.get(user);
                (
                    Reply::text(format!(
                        "Enter durations in minutes as work/short/long, e.g. 25/5/15\nCurrent: {}",
                        format_settings(current)
                    )),
                    Menu::AwaitingSettings,
                )
            },
            Button::Advice => {
                let tasks = self.tasks.list(user);
                let answer = advise_on(self.advisor.as_ref(), &tasks).await;
                (Reply::text(answer), Menu::Main)
            },
            Button::Stop => match self.scheduler.cancel(user) {
                Ok(notice) => (Reply::text(notice.render()), state),
                Err(_) => (Reply::text("❗ No active timer."), state),
            },
        }
    }

    fn ask_index(&self, user: &UserId, action: &str, next: Menu) -> Step {
        if self.tasks.is_empty(user) {
            return (Reply::with_keyboard(NO_TASKS, Keyboard::tasks()), Menu::TaskMenu);
        }
        (
            Reply::text(format!(
                "Enter the number of the task to {action}:\n{}",
                self.task_list(user)
            )),
            next,
        )
    }

    fn add_task(&self, user: &UserId, text: &str) -> Step {
        if text.is_empty() {
            return (Reply::text("❗ Task text cannot be empty."), Menu::AwaitingTaskText);
        }

        let (title, due) = split_due(text, Utc::now());
        let task = self.tasks.add(user, &title, due);
        self.sync.save_profile();
        info!(%user, task = %task.text, "task added");

        let reply = task.due.map_or_else(
            || "✅ Task added.".to_string(),
            |d| format!("✅ Task added. Due {}.", format_timestamp(d)),
        );
        (Reply::with_keyboard(reply, Keyboard::tasks()), Menu::TaskMenu)
    }

    fn choose_edit(&self, user: &UserId, text: &str) -> Step {
        let tasks = self.tasks.list(user);
        match parse_index(text, tasks.len()) {
            Ok(index) => (
                Reply::text(format!("Enter the new task text (was: {}):", tasks[index].text)),
                Menu::AwaitingEditText { index },
            ),
            Err(e) => (Reply::text(index_hint(&e)), Menu::AwaitingEditIndex),
        }
    }

    fn commit_edit(&self, user: &UserId, index: usize, text: &str) -> Step {
        if text.is_empty() {
            return (
                Reply::text("❗ Task text cannot be empty."),
                Menu::AwaitingEditText { index },
            );
        }

        match self.tasks.edit(user, index, text) {
            Ok(()) => {
                self.sync.save_profile();
                (
                    Reply::with_keyboard("✅ Task updated.", Keyboard::tasks()),
                    Menu::TaskMenu,
                )
            },
            Err(_) if self.tasks.is_empty(user) => {
                (Reply::with_keyboard(NO_TASKS, Keyboard::tasks()), Menu::TaskMenu)
            },
            Err(_) => (
                Reply::text(format!(
                    "❗ That task no longer exists. Enter the number of the task to edit:\n{}",
                    self.task_list(user)
                )),
                Menu::AwaitingEditIndex,
            ),
        }
    }

    fn commit_delete(&self, user: &UserId, text: &str) -> Step {
        let result = parse_index(text, self.tasks.len(user)).and_then(|i| self.tasks.delete(user, i));
        match result {
            Ok(task) => {
                self.sync.save_profile();
                (
                    Reply::with_keyboard(format!("🗑 Deleted: {}", task.text), Keyboard::tasks()),
                    Menu::TaskMenu,
                )
            },
            Err(e) => (Reply::text(index_hint(&e)), Menu::AwaitingDeleteIndex),
        }
    }

    fn commit_done(&self, user: &UserId, text: &str) -> Step {
        let result =
            parse_index(text, self.tasks.len(user)).and_then(|i| self.tasks.mark_done(user, i));
        match result {
            Ok(task) => {
                self.sync.save_profile();
                (
                    Reply::with_keyboard(format!("✅ Done: {}", task.text), Keyboard::tasks()),
                    Menu::TaskMenu,
                )
            },
            Err(e) => (Reply::text(index_hint(&e)), Menu::AwaitingDoneIndex),
        }
    }

    fn start_focus(&self, user: &UserId, text: &str) -> Step {
        let tasks = self.tasks.list(user);
        let chosen = parse_index(text, tasks.len()).and_then(|i| tasks.get(i).ok_or(FocusError::InvalidIndex));
        match chosen {
            Ok(task) => {
                let notice = self.scheduler.start(user, &task.text);
                (Reply::with_keyboard(notice.render(), Keyboard::main()), Menu::Main)
            },
            Err(e) => (Reply::text(index_hint(&e)), Menu::AwaitingFocusChoice),
        }
    }

    fn commit_settings(&self, user: &UserId, text: &str) -> Step {
        let result = Settings::parse_triple(text).and_then(|(w, s, l)| self.settings.set(user, w, s, l));
        match result {
            Ok(settings) => {
                self.sync.save_profile();
                (
                    Reply::with_keyboard(
                        format!("✅ Settings updated: {}", format_settings(settings)),
                        Keyboard::main(),
                    ),
                    Menu::Main,
                )
            },
            Err(e) => (Reply::text(settings_hint(&e)), Menu::AwaitingSettings),
        }
    }

    fn task_list(&self, user: &UserId) -> String {
        format_list(&self.tasks.list(user))
    }
}

/// Parse a 1-based task number against the current list length.
///
/// Returns the 0-based position.
fn parse_index(text: &str, len: usize) -> Result<usize, FocusError> {
    let not_a_number = || FocusError::Parse(format!("{text:?} is not a task number"));
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_a_number());
    }
    let number: usize = text.parse().map_err(|_| not_a_number())?;

    if (1..=len).contains(&number) {
        Ok(number - 1)
    } else {
        Err(FocusError::InvalidIndex)
    }
}

fn index_hint(error: &FocusError) -> String {
    match error {
        FocusError::InvalidIndex => INVALID_INDEX.to_string(),
        e if e.is_user_input() => SEND_NUMBER.to_string(),
        e => unexpected(e),
    }
}

fn settings_hint(error: &FocusError) -> String {
    match error {
        FocusError::InvalidSettings(reason) => {
            format!("❗ Invalid settings: {reason}.\n{SETTINGS_FORMAT}")
        },
        e if e.is_user_input() => SETTINGS_FORMAT.to_string(),
        e => unexpected(e),
    }
}

/// Errors that are not the user's fault still leave the prompt open.
fn unexpected(error: &FocusError) -> String {
    warn!(error = %error, "unexpected error in conversation step");
    TRY_AGAIN.to_string()
}

fn format_settings(settings: Settings) -> String {
    format!(
        "{}/{}/{}",
        settings.work_minutes, settings.short_break_minutes, settings.long_break_minutes
    )
}
