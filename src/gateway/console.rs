//! Line-oriented console gateway.
//!
//! Input lines look like `<user_id> <text>`; output lines look like
//! `[user_id] text`, followed by one indented line per keyboard row.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use super::{Inbound, MessageSink, Outbound, Router};
use crate::core::UserId;
use crate::error::FocusError;
use crate::features::conversation::Conversation;

const INBOUND_QUEUE: usize = 64;

/// Parse one input line into an inbound message.
///
/// Returns `None` for blank lines and lines without text after the user id.
#[must_use]
pub fn parse_line(line: &str) -> Option<Inbound> {
    let (user, text) = line.trim().split_once(char::is_whitespace)?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(Inbound {
        user: UserId::new(user),
        text: text.to_string(),
    })
}

/// Render an outbound message for the console.
#[must_use]
pub fn render(message: &Outbound) -> String {
    let mut out = format!("[{}] {}\n", message.user, message.text);
    if let Some(keyboard) = &message.keyboard {
        for row in &keyboard.rows {
            let buttons: Vec<String> = row.iter().map(|label| format!("[{label}]")).collect();
            out.push_str(&format!("    {}\n", buttons.join(" ")));
        }
    }
    out
}

/// Sink writing rendered messages to an async writer.
pub struct ConsoleSink<W> {
    out: Mutex<W>,
}

impl<W> ConsoleSink<W> {
    /// Wrap a writer such as `tokio::io::stdout()`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessageSink for ConsoleSink<W> {
    async fn send(&self, message: Outbound) -> Result<(), FocusError> {
        let mut out = self.out.lock().await;
        out.write_all(render(&message).as_bytes())
            .await
            .map_err(|e| FocusError::Delivery(format!("console write failed: {e}")))?;
        out.flush()
            .await
            .map_err(|e| FocusError::Delivery(format!("console flush failed: {e}")))
    }
}

/// Feed `reader` lines through a router until EOF, then wait for replies.
///
/// # Errors
///
/// Returns an error if `reader` fails or the router task panics.
pub async fn run_console<R>(
    reader: R,
    conversation: Arc<Conversation>,
    sink: Arc<dyn MessageSink>,
) -> Result<(), FocusError>
where
    R: AsyncBufRead + Unpin,
{
    let (tx, rx) = mpsc::channel(INBOUND_QUEUE);
    let router = tokio::spawn(Router::new(conversation, sink).run(rx));

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(message) => {
                if tx.send(message).await.is_err() {
                    break;
                }
            },
            None => warn!(line = %line, "ignoring line, expected `<user_id> <text>`"),
        }
    }

    info!("console input closed");
    drop(tx);
    router
        .await
        .map_err(|e| FocusError::Delivery(format!("router stopped: {e}")))
}
