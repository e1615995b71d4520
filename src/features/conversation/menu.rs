//! Menu states, buttons and keyboards.

use serde::{Deserialize, Serialize};

/// Where a user currently is in the multi-turn flow.
///
/// Absent state is `Main`. Scratch data lives in the variant that needs it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Menu {
    /// Main menu, nothing pending.
    #[default]
    Main,
    /// Task submenu, nothing pending.
    TaskMenu,
    /// Waiting for the text of a new task.
    AwaitingTaskText,
    /// Waiting for the number of the task to edit.
    AwaitingEditIndex,
    /// Waiting for the replacement text of the task at `index` (0-based).
    AwaitingEditText {
        /// Position chosen in the previous step.
        index: usize,
    },
    /// Waiting for the number of the task to delete.
    AwaitingDeleteIndex,
    /// Waiting for the number of the task to mark done.
    AwaitingDoneIndex,
    /// Waiting for the number of the task to focus on.
    AwaitingFocusChoice,
    /// Waiting for a `work/short/long` triple.
    AwaitingSettings,
}

/// A fixed menu label or command.
///
/// Recognized in every state, ahead of any free-text interpretation.
#[deny(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// `/start`: greet and show the main menu.
    Start,
    /// Pick a task and start a focus session.
    Focus,
    /// Open the task list.
    Tasks,
    /// Show session counts and task completion.
    Stats,
    /// Change the focus and break durations.
    Settings,
    /// Ask the assistant about the task list.
    Advice,
    /// `/stop` or the stop button: cancel the live timer.
    Stop,
    /// Add a task.
    Add,
    /// Replace a task's text.
    Edit,
    /// Remove a task.
    Delete,
    /// Mark a task done.
    Done,
    /// Return to the main menu.
    Back,
}

impl Button {
    const LABELED: [Self; 11] = [
        Self::Focus,
        Self::Tasks,
        Self::Stats,
        Self::Settings,
        Self::Advice,
        Self::Stop,
        Self::Add,
        Self::Edit,
        Self::Delete,
        Self::Done,
        Self::Back,
    ];

    /// Text shown on the button.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Focus => "🍅 Focus",
            Self::Tasks => "📝 Tasks",
            Self::Stats => "📊 Stats",
            Self::Settings => "⚙ Settings",
            Self::Advice => "💡 Advice",
            Self::Stop => "⛔ Stop",
            Self::Add => "➕ Add",
            Self::Edit => "✏ Edit",
            Self::Delete => "❌ Delete",
            Self::Done => "✔ Done",
            Self::Back => "🔙 Back",
        }
    }

    /// Recognize a label or command.
    #[must_use]
    pub fn from_input(text: &str) -> Option<Self> {
        match text.trim() {
            "/start" => Some(Self::Start),
            "/stop" => Some(Self::Stop),
            other => Self::LABELED.into_iter().find(|b| b.label() == other),
        }
    }
}

/// Reply keyboard: rows of button labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    /// Button labels, row by row.
    pub rows: Vec<Vec<String>>,
}

impl Keyboard {
    fn from_buttons(rows: &[&[Button]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|b| b.label().to_string()).collect())
                .collect(),
        }
    }

    /// Main menu keyboard.
    #[must_use]
    pub fn main() -> Self {
        Self::from_buttons(&[
            &[Button::Focus, Button::Tasks],
            &[Button::Stats, Button::Settings],
            &[Button::Advice, Button::Stop],
        ])
    }

    /// Task submenu keyboard.
    #[must_use]
    pub fn tasks() -> Self {
        Self::from_buttons(&[
            &[Button::Add, Button::Edit],
            &[Button::Delete, Button::Done],
            &[Button::Back],
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for button in Button::LABELED {
            assert_eq!(Button::from_input(button.label()), Some(button));
        }
        assert_eq!(Button::from_input("/start"), Some(Button::Start));
        assert_eq!(Button::from_input(" /stop "), Some(Button::Stop));
    }

    #[test]
    fn test_free_text_is_not_a_button() {
        assert_eq!(Button::from_input("write report"), None);
        assert_eq!(Button::from_input("Focus"), None);
        assert_eq!(Button::from_input("1"), None);
    }

    #[test]
    fn test_keyboards() {
        let main = Keyboard::main();
        assert_eq!(main.rows.len(), 3);
        assert_eq!(main.rows[0], vec!["🍅 Focus", "📝 Tasks"]);
        assert_eq!(Keyboard::tasks().rows[2], vec!["🔙 Back"]);
    }
}
