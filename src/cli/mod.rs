//! Command-line interface for the pomobot binary.

pub mod args;
