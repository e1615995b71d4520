//! Core abstractions for pomobot.
//!
//! This module provides shared types and utilities used across features.

mod datetime;
pub mod keyed;
mod user;

pub use datetime::{format_timestamp, split_due};
pub use keyed::PerUser;
pub use user::UserId;
