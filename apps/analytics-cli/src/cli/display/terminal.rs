//! Styled single-line terminal output built on crossterm.

use crossterm::{
    execute,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};
use std::io::{Result as IoResult, Write};

/// Width of the action column in terminal output
pub const ACTION_WIDTH: usize = 15;

/// Action text plus the color and weight it is printed with.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledText {
    text: String,
    foreground: Option<Color>,
    bold: bool,
}

impl StyledText {
    pub fn new(text: String) -> Self {
        Self {
            text,
            foreground: None,
            bold: false,
        }
    }

    pub fn from_str(text: &str) -> Self {
        Self::new(text.to_string())
    }

    pub fn cyan(mut self) -> Self {
        self.foreground = Some(Color::Cyan);
        self
    }

    pub fn green(mut self) -> Self {
        self.foreground = Some(Color::Green);
        self
    }

    pub fn red(mut self) -> Self {
        self.foreground = Some(Color::Red);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Writes `[ACTION] message` with the action right-aligned in a [`ACTION_WIDTH`] column.
///
/// With `no_ansi` the action is written without color or weight escapes.
pub fn write_styled_line<W: Write>(
    writer: &mut W,
    styled_text: &StyledText,
    message: &str,
    no_ansi: bool,
) -> IoResult<()> {
    // Character-aware truncation so multi-byte actions never split
    let truncated_action: String = styled_text.text.chars().take(ACTION_WIDTH).collect();
    let padded_action = format!("{truncated_action:>ACTION_WIDTH$}");

    if !no_ansi {
        if let Some(color) = styled_text.foreground {
            execute!(writer, SetForegroundColor(color))?;
        }
        if styled_text.bold {
            execute!(writer, SetAttribute(Attribute::Bold))?;
        }
    }

    execute!(writer, Print(&padded_action))?;

    if !no_ansi {
        execute!(writer, ResetColor)?;
        if styled_text.bold {
            execute!(writer, SetAttribute(Attribute::Reset))?;
        }
    }

    execute!(writer, Print(" "), Print(message), Print("\n"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(styled: &StyledText, message: &str, no_ansi: bool) -> String {
        let mut buffer = Vec::new();
        write_styled_line(&mut buffer, styled, message, no_ansi).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_styled_text_equality() {
        let styled1 = StyledText::from_str("Test").green().bold();
        let styled2 = StyledText::from_str("Test").green().bold();
        assert_eq!(styled1, styled2);
        assert_ne!(styled1, StyledText::from_str("Test").red().bold());
    }

    #[test]
    fn test_action_is_right_aligned() {
        let output = render(&StyledText::from_str("Generated"), "models/a.py", true);
        assert_eq!(output, "      Generated models/a.py\n");
    }

    #[test]
    fn test_long_action_is_truncated_on_char_boundary() {
        let output = render(&StyledText::from_str("ééééééééééééééééééé"), "m", true);
        assert_eq!(output, format!("{} m\n", "é".repeat(ACTION_WIDTH)));
    }

    #[test]
    fn test_ansi_codes_present_unless_disabled() {
        let styled = StyledText::from_str("Test").green().bold();

        let output = render(&styled, "test message", false);
        assert!(output.contains("\x1b["), "expected ANSI codes in {output:?}");
        assert!(output.contains("\x1b[1m"), "expected bold in {output:?}");

        for styled in [
            StyledText::from_str("Cyan").cyan(),
            StyledText::from_str("Green").green(),
            StyledText::from_str("Red").red().bold(),
        ] {
            let output = render(&styled, "message", true);
            assert!(!output.contains("\x1b["), "unexpected ANSI codes in {output:?}");
            assert!(output.ends_with(" message\n"));
        }
    }
}
