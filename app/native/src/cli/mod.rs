//! Command-line interface: argument parsing and the interactive intent console.

mod commands;
pub mod console;
mod listener;

pub use commands::Cli;
pub use listener::listen;
