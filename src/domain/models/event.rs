use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::panic::Location;

use super::severity::Severity;

/// Source location of the code that issued a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Source file as recorded by the compiler
    pub file: &'static str,
    /// 1-based line number
    pub line: u32,
}

impl CallSite {
    /// Location of the caller
    ///
    /// Every frame between the user's call and this function must carry
    /// `#[track_caller]`, otherwise the location of the innermost untracked
    /// frame is reported.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
        }
    }

    /// File name without its directory
    pub fn file_name(&self) -> &'static str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file)
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_name(), self.line)
    }
}

/// One log call, as handed to a backend adapter
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub severity: Severity,
    pub message: String,
    /// Flattened key/value list: index `2i` is a key, `2i + 1` its value
    pub args: Vec<Value>,
    pub timestamp: DateTime<Utc>,
    /// Where the event was created, unless replaced with [`LogEvent::with_call_site`]
    pub call_site: Option<CallSite>,
}

impl LogEvent {
    /// Create an event stamped with the current instant and the caller's location
    #[track_caller]
    pub fn new(severity: Severity, message: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            severity,
            message: message.into(),
            args,
            timestamp: Utc::now(),
            call_site: Some(CallSite::caller()),
        }
    }

    /// Attach the originating call site
    #[must_use]
    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = Some(call_site);
        self
    }

    /// Override the event instant
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Flattened arguments split into structured fields and positional leftovers
///
/// Pairs whose key is a string become fields. A pair with a non-string key,
/// and a trailing unpaired entry, are kept as positional values: structured
/// renderers ignore them, text renderers print them after the fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub fields: Vec<(String, Value)>,
    pub positional: Vec<Value>,
}

impl Attributes {
    /// Validate a flattened key/value list
    pub fn from_args(args: Vec<Value>) -> Self {
        let mut attributes = Self::default();
        let mut iter = args.into_iter();

        while let Some(key) = iter.next() {
            let Some(value) = iter.next() else {
                attributes.positional.push(key);
                break;
            };
            match key {
                Value::String(key) => attributes.fields.push((key, value)),
                other => {
                    attributes.positional.push(other);
                    attributes.positional.push(value);
                }
            }
        }

        attributes
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.positional.is_empty()
    }
}

/// Render a value for line-oriented output
///
/// Strings are printed bare unless they contain whitespace, quotes or `=`,
/// in which case they are quoted.
pub fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) if needs_quoting(s) => format!("{s:?}"),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '"' || c == '=')
}

impl fmt::Display for Attributes {
    /// logfmt-style `key=value` pairs followed by positional values
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.fields {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{key}={}", text_value(value))?;
            first = false;
        }
        for value in &self.positional {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(&text_value(value))?;
            first = false;
        }
        Ok(())
    }
}
