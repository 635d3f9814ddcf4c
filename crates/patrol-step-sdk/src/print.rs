//! Console banners for the step log.
//!
//! [`Printer`] holds a single capability flag and no other state; color support
//! is decided once by the caller and passed in.

/// Banner styles, one per kind of step message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Error,
    Success,
    Warning,
    Action,
    StepCompleted,
    StepInitiated,
}

impl Style {
    fn ansi_code(&self) -> &'static str {
        match self {
            Style::Error => "\x1b[31m",
            Style::Success => "\x1b[32m",
            Style::Warning => "\x1b[33m",
            Style::Action => "\x1b[34m",
            Style::StepCompleted => "\x1b[35m",
            Style::StepInitiated => "\x1b[36m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Renders `message` in `style`; without color the message is returned as-is.
pub fn format_message(style: Style, message: &str, color: bool) -> String {
    if color {
        format!("{}{}{}", style.ansi_code(), message, RESET)
    } else {
        message.to_string()
    }
}

/// Prints step banners to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Printer {
    color: bool,
}

impl Printer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Printer for logs that are not attached to a terminal.
    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn render(&self, style: Style, message: &str) -> String {
        format_message(style, message, self.color)
    }

    pub fn print(&self, style: Style, message: &str) {
        println!("{}", self.render(style, message));
    }

    pub fn error(&self, message: &str) {
        self.print(Style::Error, message);
    }

    pub fn success(&self, message: &str) {
        self.print(Style::Success, message);
    }

    pub fn warning(&self, message: &str) {
        self.print(Style::Warning, message);
    }

    pub fn action(&self, message: &str) {
        self.print(Style::Action, message);
    }

    pub fn step_completed(&self, message: &str) {
        self.print(Style::StepCompleted, message);
    }

    pub fn step_initiated(&self, message: &str) {
        self.print(Style::StepInitiated, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colored_output_wraps_in_escape_codes() {
        assert_eq!(format_message(Style::Error, "boom", true), "\x1b[31mboom\x1b[0m");
        assert_eq!(
            Printer::new(true).render(Style::StepInitiated, "--- Step ---"),
            "\x1b[36m--- Step ---\x1b[0m"
        );
    }

    #[test]
    fn plain_output_has_no_escape_codes() {
        for style in [
            Style::Error,
            Style::Success,
            Style::Warning,
            Style::Action,
            Style::StepCompleted,
            Style::StepInitiated,
        ] {
            assert_eq!(Printer::plain().render(style, "msg"), "msg");
        }
    }
}
