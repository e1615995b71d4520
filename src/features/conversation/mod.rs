//! Multi-turn chat flow.

mod dispatcher;
mod menu;

pub use dispatcher::{Conversation, Reply};
pub use menu::{Button, Keyboard, Menu};
