//! Line renderers for the engines that only accept preformatted text

use serde_json::{Map, Value};
use std::fmt::Write;

use super::pipeline::Prepared;
use crate::domain::models::CallSite;

/// `time LEVEL [file:line] message key=value ...`
pub fn text_line(event: &Prepared, call_site: Option<CallSite>) -> String {
    let mut line = format!("{} {:<5} ", event.time, event.severity.as_str());
    if let Some(site) = call_site {
        let _ = write!(line, "[{site}] ");
    }
    line.push_str(&event.message);
    if !event.attributes.is_empty() {
        let _ = write!(line, " {}", event.attributes);
    }
    line
}

/// One JSON object; reserved keys win over fields of the same name
///
/// Positional values are not representable as fields and are dropped.
pub fn json_line(event: &Prepared, call_site: Option<CallSite>) -> String {
    json_line_with_message(event, &event.message, call_site)
}

/// [`json_line`] carrying `message` in place of the event's own text
pub fn json_line_with_message(event: &Prepared, message: &str, call_site: Option<CallSite>) -> String {
    let mut object = Map::new();
    for (key, value) in &event.attributes.fields {
        object.insert(key.clone(), value.clone());
    }
    object.insert("time".to_string(), Value::String(event.time.clone()));
    object.insert(
        "level".to_string(),
        Value::String(event.severity.as_str().to_string()),
    );
    object.insert("msg".to_string(), Value::String(message.to_string()));
    if let Some(site) = call_site {
        object.insert("caller".to_string(), Value::String(site.to_string()));
    }
    Value::Object(object).to_string()
}

/// Render with the configured format
pub fn line(event: &Prepared, call_site: Option<CallSite>, json: bool) -> String {
    if json {
        json_line(event, call_site)
    } else {
        text_line(event, call_site)
    }
}
