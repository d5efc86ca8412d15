//! Command-line host

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
