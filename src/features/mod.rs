//! Feature implementations for pomobot.
//!
//! - Task lists with due phrases
//! - Focus timers, history and stats
//! - The chat conversation flow
//! - Assistant advice

pub mod advice;
pub mod conversation;
pub mod focus;
pub mod tasks;
