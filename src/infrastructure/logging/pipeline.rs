use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::domain::models::{Attributes, CallSite, LevelSwitch, LogEvent, Severity};
use crate::infrastructure::config::LogConfig;
use crate::services::redaction::RedactionPipeline;

/// An event that passed the filter, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    pub severity: Severity,
    /// Event instant rendered in the configured zone and format
    pub time: String,
    /// Message text, coloured when colour applies
    pub message: String,
    pub attributes: Attributes,
    /// Call site attached to primary records, if any
    pub primary_call_site: Option<CallSite>,
    /// Call site attached to error-sink records
    pub mirror_call_site: Option<CallSite>,
}

impl Prepared {
    /// Whether this event is also written to the error sink
    pub const fn is_mirrored(&self) -> bool {
        self.severity.is_error_or_above()
    }
}

/// Engine-independent part of every log call
///
/// Holds the frozen configuration, the shared threshold, the redaction
/// rules and the fields added by `with_fields`. Adapters run
/// [`EventPipeline::prepare`] and write the result to their engines.
#[derive(Debug, Clone)]
pub struct EventPipeline {
    config: Arc<LogConfig>,
    level: LevelSwitch,
    redaction: Option<Arc<RedactionPipeline>>,
    fields: Arc<[(String, Value)]>,
    cosmetics: bool,
    color_messages: bool,
}

impl EventPipeline {
    pub fn new(config: LogConfig) -> Self {
        let level = LevelSwitch::new(config.min_severity);
        let redaction = config
            .redaction_enabled
            .then(|| Arc::new(RedactionPipeline::new(config.redaction_rules.iter().cloned())));

        Self {
            config: Arc::new(config),
            level,
            redaction,
            fields: Arc::from(Vec::new()),
            cosmetics: true,
            color_messages: true,
        }
    }

    /// Leave messages uncoloured for engines that colour at write time
    #[must_use]
    pub fn without_message_color(mut self) -> Self {
        self.color_messages = false;
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn level(&self) -> Severity {
        self.level.get()
    }

    pub fn set_level(&self, level: Severity) {
        self.level.set(level);
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        self.level.enabled(severity)
    }

    /// Fields attached by `with_fields`, sorted by key
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Whether colour and primary call sites apply to this view
    pub const fn keeps_cosmetics(&self) -> bool {
        self.cosmetics
    }

    /// Derive a view with `fields` merged over the current ones
    ///
    /// The threshold and redaction rules are shared with `self`. Colour and
    /// primary call sites are kept only when `keep_cosmetics` is set.
    #[must_use]
    pub fn derive(&self, fields: HashMap<String, Value>, keep_cosmetics: bool) -> Self {
        let mut merged: BTreeMap<String, Value> = self.fields.iter().cloned().collect();
        merged.extend(fields);

        Self {
            config: Arc::clone(&self.config),
            level: self.level.clone(),
            redaction: self.redaction.clone(),
            fields: merged.into_iter().collect(),
            cosmetics: self.cosmetics && keep_cosmetics,
            color_messages: self.color_messages,
        }
    }

    /// Filter, redact, stamp and colorize one event
    ///
    /// Returns `None` when the event is below the threshold.
    pub fn prepare(&self, event: LogEvent) -> Option<Prepared> {
        if !self.enabled(event.severity) {
            return None;
        }

        let mut args = Vec::with_capacity(self.fields.len() * 2 + event.args.len());
        for (key, value) in self.fields.iter() {
            args.push(Value::String(key.clone()));
            args.push(value.clone());
        }
        args.extend(event.args);

        if let Some(redaction) = &self.redaction {
            args = redaction.process(args);
        }

        let message = if self.cosmetics && self.color_messages {
            self.config.colorize(event.severity, &event.message)
        } else {
            event.message
        };

        let primary_call_site = event
            .call_site
            .filter(|_| self.cosmetics && self.config.add_call_site);

        Some(Prepared {
            severity: event.severity,
            time: self.config.timestamper.format(event.timestamp),
            message,
            attributes: Attributes::from_args(args),
            primary_call_site,
            mirror_call_site: event.call_site,
        })
    }
}
