//! Line-based intent console.
//!
//! Stands in for a tray menu: each line on stdin is one command.
//!
//! ```text
//! gif ~/Pictures/cat.gif   play a GIF (alias: open)
//! fps 24                   change the frame rate
//! quit                     restore the wallpaper and exit (alias: exit, q)
//! help                     list commands
//! ```

use thiserror::Error;

use crate::animation::{FrameRate, InvalidFrameRate};
use crate::app::Intent;
use crate::platform::path::expand;

/// Help text printed for the `help` command.
pub const HELP: &str = "\
Commands:
  gif <path>   play a GIF as wallpaper (alias: open)
  fps <n>      set frames per second
  quit         restore the original wallpaper and exit (alias: exit, q)
  help         show this message";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Forward an intent to the application.
    Intent(Intent),
    /// Print [`HELP`].
    Help,
    /// Blank line.
    Empty,
}

/// Errors for lines that cannot be turned into a command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command '{0}', type 'help' for a list of commands")]
    UnknownCommand(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error(transparent)]
    InvalidFrameRate(#[from] InvalidFrameRate),
}

/// Parses one console line.
///
/// # Errors
///
/// Returns [`ConsoleError`] for unknown commands, missing arguments and
/// invalid frame rates.
pub fn parse_line(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleCommand::Empty);
    }

    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "gif" | "open" => {
            let path = expand(argument);
            if path.as_os_str().is_empty() {
                return Err(ConsoleError::MissingArgument("gif"));
            }
            Ok(ConsoleCommand::Intent(Intent::SelectAnimation(path)))
        }
        "fps" => {
            if argument.is_empty() {
                return Err(ConsoleError::MissingArgument("fps"));
            }
            let rate: FrameRate = argument.parse()?;
            Ok(ConsoleCommand::Intent(Intent::SelectFrameRate(rate)))
        }
        "quit" | "exit" | "q" => Ok(ConsoleCommand::Intent(Intent::Quit)),
        "help" | "?" => Ok(ConsoleCommand::Help),
        _ => Err(ConsoleError::UnknownCommand(command.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_parse_gif() {
        assert_eq!(
            parse_line("gif /tmp/cat.gif").unwrap(),
            ConsoleCommand::Intent(Intent::SelectAnimation(PathBuf::from("/tmp/cat.gif")))
        );
        assert_eq!(
            parse_line("  OPEN   '/tmp/my cat.gif' ").unwrap(),
            ConsoleCommand::Intent(Intent::SelectAnimation(PathBuf::from("/tmp/my cat.gif")))
        );
    }

    #[test]
    fn test_parse_fps() {
        assert_eq!(
            parse_line("fps 24").unwrap(),
            ConsoleCommand::Intent(Intent::SelectFrameRate(FrameRate::new(24).unwrap()))
        );
        assert!(matches!(parse_line("fps 0"), Err(ConsoleError::InvalidFrameRate(_))));
        assert!(matches!(parse_line("fps -2"), Err(ConsoleError::InvalidFrameRate(_))));
        assert!(matches!(parse_line("fps many"), Err(ConsoleError::InvalidFrameRate(_))));
    }

    #[test]
    fn test_parse_missing_arguments() {
        assert_eq!(parse_line("fps"), Err(ConsoleError::MissingArgument("fps")));
        assert_eq!(parse_line("gif   "), Err(ConsoleError::MissingArgument("gif")));
    }

    #[test]
    fn test_parse_quit_help_and_blank() {
        for line in ["quit", "exit", "Q"] {
            assert_eq!(parse_line(line).unwrap(), ConsoleCommand::Intent(Intent::Quit));
        }
        assert_eq!(parse_line("help").unwrap(), ConsoleCommand::Help);
        assert_eq!(parse_line("   ").unwrap(), ConsoleCommand::Empty);
    }

    #[test]
    fn test_parse_unknown() {
        let err = parse_line("dance now").unwrap_err();
        assert_eq!(err, ConsoleError::UnknownCommand("dance".to_string()));
        assert!(err.to_string().contains("help"));
    }
}
