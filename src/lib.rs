//! pomobot - focus sessions for many chat users at once
//!
//! This crate provides per-user task lists, pomodoro timers with short and
//! long breaks, session statistics and the menu-driven conversation that
//! ties them together behind a messaging gateway.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod gateway;
pub mod storage;

pub use cli::args::Cli;
pub use error::FocusError;
pub use features::conversation::{Conversation, Reply};
pub use features::focus::FocusScheduler;
