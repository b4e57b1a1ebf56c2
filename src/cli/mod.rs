//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{Args, Command, KeyAction};
pub use commands::{default_edit_output, handle_key_action, run_edit, run_video};
pub use enums::Aspect;
