//! Messaging gateway plumbing.
//!
//! Inbound messages are routed to one actor per user; replies and timer
//! notices leave through a `MessageSink`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::UserId;
use crate::error::FocusError;
use crate::features::focus::{Notifier, TimerNotice};

mod console;
mod router;

pub use crate::features::conversation::Keyboard;
pub use console::{parse_line, render, run_console, ConsoleSink};
pub use router::{Router, IDLE_TIMEOUT};

/// A message received from a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Sender.
    pub user: UserId,
    /// Raw message text.
    pub text: String,
}

/// A message to deliver to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Recipient.
    pub user: UserId,
    /// Message text.
    pub text: String,
    /// Reply keyboard, if the message changes it.
    pub keyboard: Option<Keyboard>,
}

impl Outbound {
    /// A plain text message.
    pub fn text(user: UserId, text: impl Into<String>) -> Self {
        Self {
            user,
            text: text.into(),
            keyboard: None,
        }
    }
}

/// Delivers outbound messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send one message.
    ///
    /// # Errors
    ///
    /// Returns `Delivery` if the message could not be delivered.
    async fn send(&self, message: Outbound) -> Result<(), FocusError>;
}

/// Timer notifier that renders notices and sends them through a sink.
pub struct GatewayNotifier {
    sink: Arc<dyn MessageSink>,
}

impl GatewayNotifier {
    /// Wrap a sink.
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Notifier for GatewayNotifier {
    async fn notify(&self, user: &UserId, notice: &TimerNotice) -> Result<(), FocusError> {
        self.sink.send(Outbound::text(user.clone(), notice.render())).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;
    use crate::config::FocusConfig;
    use crate::core::keyed::lock;
    use crate::features::advice::{Advisor, NoAdvisor};
    use crate::features::conversation::Conversation;
    use crate::features::focus::FocusScheduler;
    use crate::storage::{self, Database, PersistenceSync};

    /// Conversation over an in-memory database, notifying through `sink`.
    pub fn conversation(sink: Arc<dyn MessageSink>) -> Arc<Conversation> {
        conversation_with(sink, Arc::new(NoAdvisor))
    }

    /// Same as [`conversation`] with a chosen advisor.
    pub fn conversation_with(
        sink: Arc<dyn MessageSink>,
        advisor: Arc<dyn Advisor>,
    ) -> Arc<Conversation> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let focus = FocusConfig::default();
        let state = storage::load(db.as_ref(), &focus);
        let scheduler = FocusScheduler::new(
            Arc::clone(&state.settings),
            Arc::clone(&state.history),
            Arc::new(GatewayNotifier::new(sink)),
            focus.sessions_until_long_break,
        );
        let sync = Arc::new(PersistenceSync::new(db, &state));
        Arc::new(Conversation::new(&state, scheduler, advisor, sync))
    }

    /// Sink that keeps every message it was given.
    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: Mutex<Vec<Outbound>>,
    }

    impl RecordingSink {
        pub fn texts_for(&self, user: &UserId) -> Vec<String> {
            lock(&self.sent)
                .iter()
                .filter(|m| &m.user == user)
                .map(|m| m.text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn send(&self, message: Outbound) -> Result<(), FocusError> {
            lock(&self.sent).push(message);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;
    use crate::features::focus::BreakKind;

    #[tokio::test]
    async fn test_notifier_renders_notice() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = GatewayNotifier::new(sink.clone());
        let user = UserId::new("7");

        notifier
            .notify(
                &user,
                &TimerNotice::BreakStarted {
                    kind: BreakKind::Short,
                    minutes: 5,
                },
            )
            .await
            .unwrap();

        assert_eq!(sink.texts_for(&user), vec!["🥤 Short break: 5 minutes."]);
    }
}
