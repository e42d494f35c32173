//! # Display
//!
//! User-facing output of the CLI. Every line is an action column followed by details, e.g.
//!
//! ```text
//!       Generated models/page_view.py
//! ```
//!
//! Errors go to stderr, everything else to stdout. Colors are dropped when
//! `NO_COLOR` is set or the stream is not a terminal.

pub mod terminal;

use serde::Serialize;
use std::io::{stderr, stdout, IsTerminal};

use terminal::{write_styled_line, StyledText};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageType {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub action: String,
    pub details: String,
}

impl Message {
    pub fn new(action: String, details: String) -> Message {
        Message { action, details }
    }

    pub fn is_empty(&self) -> bool {
        self.action.is_empty() && self.details.is_empty()
    }
}

fn styled_action(message_type: MessageType, action: &str) -> StyledText {
    let text = StyledText::from_str(action);
    match message_type {
        MessageType::Info => text.cyan(),
        MessageType::Success => text.green(),
        MessageType::Error => text.red().bold(),
    }
}

fn colors_disabled() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub fn show_message_wrapper(message_type: MessageType, message: Message) {
    let styled = styled_action(message_type, &message.action);

    // Output errors are swallowed; there is nowhere left to report them
    let _ = match message_type {
        MessageType::Error => {
            let mut out = stderr();
            let no_ansi = colors_disabled() || !out.is_terminal();
            write_styled_line(&mut out, &styled, &message.details, no_ansi)
        }
        _ => {
            let mut out = stdout();
            let no_ansi = colors_disabled() || !out.is_terminal();
            write_styled_line(&mut out, &styled, &message.details, no_ansi)
        }
    };

    tracing::info!("{}: {}", message.action, message.details);
}

macro_rules! show_message {
    ($message_type:expr, $message:expr) => {
        $crate::cli::display::show_message_wrapper($message_type, $message)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styled_action_by_type() {
        assert_eq!(
            styled_action(MessageType::Error, "Failed"),
            StyledText::from_str("Failed").red().bold()
        );
        assert_eq!(
            styled_action(MessageType::Success, "Generated"),
            StyledText::from_str("Generated").green()
        );
    }

    #[test]
    fn test_empty_message() {
        assert!(Message::new(String::new(), String::new()).is_empty());
        assert!(!Message::new("Parsed".to_string(), String::new()).is_empty());
    }
}
