use console::Style;
use std::fmt;

use crate::domain::models::Severity;

const ANSI_RESET: &str = "\u{1b}[0m";

/// A display renderer for one severity
#[derive(Clone)]
pub enum Color {
    /// A `console` style, always applied regardless of terminal detection
    Styled(Style),
    /// A raw ANSI escape prefix, closed with a reset
    Ansi(String),
}

impl Color {
    /// Wrap a `console` style
    pub fn style(style: Style) -> Self {
        Self::Styled(style.force_styling(true))
    }

    /// Use a raw escape sequence such as `"\x1b[35m"`
    pub fn ansi(code: impl Into<String>) -> Self {
        Self::Ansi(code.into())
    }

    /// Render `message` with this colour
    pub fn paint(&self, message: &str) -> String {
        match self {
            Self::Styled(style) => style.apply_to(message).to_string(),
            Self::Ansi(code) => format!("{code}{message}{ANSI_RESET}"),
        }
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Styled(_) => f.write_str("Color::Styled"),
            Self::Ansi(code) => f.debug_tuple("Color::Ansi").field(code).finish(),
        }
    }
}

/// Severity to colour table
///
/// Severities without an entry are rendered unchanged. The default is the
/// built-in scheme.
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub debug: Option<Color>,
    pub info: Option<Color>,
    pub warn: Option<Color>,
    pub error: Option<Color>,
    pub fatal: Option<Color>,
}

impl ColorScheme {
    /// A scheme with no entries
    pub const fn empty() -> Self {
        Self {
            debug: None,
            info: None,
            warn: None,
            error: None,
            fatal: None,
        }
    }

    /// The scheme installed when colour is enabled without one
    pub fn builtin() -> Self {
        Self {
            debug: Some(Color::style(Style::new().blue())),
            info: Some(Color::style(Style::new().green())),
            warn: Some(Color::style(Style::new().yellow())),
            error: Some(Color::style(Style::new().red())),
            fatal: Some(Color::style(Style::new().magenta().bold())),
        }
    }

    /// Set the colour of one severity
    #[must_use]
    pub fn with(mut self, severity: Severity, color: Color) -> Self {
        *self.slot_mut(severity) = Some(color);
        self
    }

    /// Colour for `severity`, if any
    pub const fn get(&self, severity: Severity) -> Option<&Color> {
        match severity {
            Severity::Debug => self.debug.as_ref(),
            Severity::Info => self.info.as_ref(),
            Severity::Warn => self.warn.as_ref(),
            Severity::Error => self.error.as_ref(),
            Severity::Fatal => self.fatal.as_ref(),
        }
    }

    fn slot_mut(&mut self, severity: Severity) -> &mut Option<Color> {
        match severity {
            Severity::Debug => &mut self.debug,
            Severity::Info => &mut self.info,
            Severity::Warn => &mut self.warn,
            Severity::Error => &mut self.error,
            Severity::Fatal => &mut self.fatal,
        }
    }

    /// Render the free-text message of an event
    pub fn colorize(&self, severity: Severity, message: &str) -> String {
        self.get(severity)
            .map_or_else(|| message.to_string(), |color| color.paint(message))
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::builtin()
    }
}
