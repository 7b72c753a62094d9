use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{debug, warn, Dispatch, Event, Level, Metadata, Subscriber};
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{reload, Layer, Registry};

use super::{exit_if_fatal, open_sinks, EVENT_TARGET};
use crate::domain::error::ConfigError;
use crate::domain::models::{CallSite, LogEvent, Severity};
use crate::domain::ports::{LevelMapping, LogBackend};
use crate::infrastructure::config::LogConfig;
use crate::infrastructure::logging::{render, EventPipeline, Prepared, SharedSink};
use crate::services::color_theme::ColorScheme;

/// Severity mapping onto `tracing` levels
pub struct TracingLevels;

impl LevelMapping for TracingLevels {
    type Level = Level;

    fn to_backend(severity: Severity) -> Level {
        match severity {
            Severity::Debug => Level::DEBUG,
            Severity::Info => Level::INFO,
            Severity::Warn => Level::WARN,
            Severity::Error | Severity::Fatal => Level::ERROR,
        }
    }

    fn from_backend(level: Level) -> Severity {
        match level {
            Level::DEBUG => Severity::Debug,
            Level::WARN => Severity::Warn,
            Level::ERROR => Severity::Error,
            _ => Severity::Info,
        }
    }
}

fn level_filter(severity: Severity) -> LevelFilter {
    LevelFilter::from_level(TracingLevels::to_backend(severity))
}

thread_local! {
    static CURRENT: RefCell<Option<(Rc<Prepared>, Option<CallSite>)>> = const { RefCell::new(None) };
}

/// Expose the prepared event and its call site to the formatter while `emit` runs
fn with_current(event: &Rc<Prepared>, call_site: Option<CallSite>, emit: impl FnOnce()) {
    CURRENT.with_borrow_mut(|slot| *slot = Some((Rc::clone(event), call_site)));
    emit();
    CURRENT.with_borrow_mut(|slot| *slot = None);
}

/// Only facade events reach the sinks, never the crate's own diagnostics
fn is_facade_event(metadata: &Metadata<'_>) -> bool {
    metadata.target() == EVENT_TARGET
}

/// Collects the message of a facade event without escaping it
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

/// Line layout of the tracing engine
///
/// Text: `time LEVEL message caller=file:line key=value ...`; only the
/// message is coloured. JSON: one object with the attributes at the top
/// level, as the other engines write it.
struct FacadeFormat {
    json: bool,
    colors: Option<ColorScheme>,
}

impl FacadeFormat {
    fn write_text(
        writer: &mut Writer<'_>,
        event: &Prepared,
        message: &str,
        call_site: Option<CallSite>,
    ) -> fmt::Result {
        write!(writer, "{} {:>5} {message}", event.time, event.severity.as_str())?;
        if let Some(site) = call_site {
            write!(writer, " caller={site}")?;
        }
        if !event.attributes.is_empty() {
            write!(writer, " {}", event.attributes)?;
        }
        writeln!(writer)
    }
}

impl<S, N> FormatEvent<S, N> for FacadeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        CURRENT.with_borrow(|current| {
            let Some((prepared, call_site)) = current else {
                return writeln!(writer, "{}", visitor.message);
            };
            let message = match &self.colors {
                Some(scheme) => scheme.colorize(prepared.severity, &visitor.message),
                None => visitor.message.clone(),
            };
            if self.json {
                writeln!(writer, "{}", render::json_line_with_message(prepared, &message, *call_site))
            } else {
                Self::write_text(&mut writer, prepared, &message, *call_site)
            }
        })
    }
}

fn fmt_layer<S>(sink: SharedSink, json: bool, colors: Option<ColorScheme>) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(sink)
        .with_ansi(false)
        .event_format(FacadeFormat { json, colors })
        .with_filter(filter_fn(is_facade_event))
        .boxed()
}

type PrimaryBase = Layered<reload::Layer<LevelFilter, Registry>, Registry>;
type ErrorBase = Layered<LevelFilter, Registry>;

macro_rules! emit_at {
    ($level:expr, $($fields:tt)+) => {
        match $level {
            Level::ERROR => tracing::event!(target: EVENT_TARGET, Level::ERROR, $($fields)+),
            Level::WARN => tracing::event!(target: EVENT_TARGET, Level::WARN, $($fields)+),
            Level::INFO => tracing::event!(target: EVENT_TARGET, Level::INFO, $($fields)+),
            Level::DEBUG => tracing::event!(target: EVENT_TARGET, Level::DEBUG, $($fields)+),
            _ => tracing::event!(target: EVENT_TARGET, Level::TRACE, $($fields)+),
        }
    };
}

struct Engines {
    primary: Dispatch,
    reload: reload::Handle<LevelFilter, Registry>,
    primary_sink: SharedSink,
    error: Option<(Dispatch, SharedSink)>,
}

/// Adapter over a per-instance `tracing-subscriber` registry
///
/// Events are dispatched with [`tracing::dispatcher::with_default`], so the
/// host application's global subscriber is never replaced. The registry
/// filters by level and a custom event formatter writes the line.
///
/// Derived views inherit every setting.
#[derive(Clone)]
pub struct TracingBackend {
    pipeline: EventPipeline,
    engines: Arc<Engines>,
}

impl TracingBackend {
    /// Build the adapter, opening both sinks
    pub fn new(config: LogConfig) -> Result<Self, ConfigError> {
        let (primary_sink, error_sink) = open_sinks(&config)?;
        let json = config.json_output;
        let colors = config
            .color_scheme
            .clone()
            .filter(|_| config.color_enabled);

        let (filter, reload) = reload::Layer::new(level_filter(config.min_severity));
        let primary = Dispatch::new(
            Registry::default()
                .with(filter)
                .with(fmt_layer::<PrimaryBase>(primary_sink.clone(), json, colors.clone())),
        );

        let error = error_sink.map(|sink| {
            let dispatch = Dispatch::new(
                Registry::default()
                    .with(LevelFilter::ERROR)
                    .with(fmt_layer::<ErrorBase>(sink.clone(), json, colors)),
            );
            (dispatch, sink)
        });

        debug!(
            backend = "tracing",
            level = %config.min_severity,
            path = %config.primary_path.display(),
            json,
            "logger constructed"
        );

        Ok(Self {
            pipeline: EventPipeline::new(config).without_message_color(),
            engines: Arc::new(Engines {
                primary,
                reload,
                primary_sink,
                error,
            }),
        })
    }

    fn emit(dispatch: &Dispatch, event: &Rc<Prepared>, call_site: Option<CallSite>) {
        let level = TracingLevels::to_backend(event.severity);
        let message = &event.message;

        with_current(event, call_site, || {
            tracing::dispatcher::with_default(dispatch, || {
                emit_at!(level, "{}", message);
            });
        });
    }
}

impl LogBackend for TracingBackend {
    fn log(&self, event: LogEvent) {
        let severity = event.severity;
        if let Some(prepared) = self.pipeline.prepare(event) {
            let prepared = Rc::new(prepared);
            Self::emit(&self.engines.primary, &prepared, prepared.primary_call_site);
            if prepared.is_mirrored() {
                if let Some((dispatch, _)) = &self.engines.error {
                    Self::emit(dispatch, &prepared, prepared.mirror_call_site);
                }
            }
        }
        exit_if_fatal(severity, || self.flush());
    }

    fn set_level(&self, level: Severity) {
        self.pipeline.set_level(level);
        if let Err(e) = self.engines.reload.reload(level_filter(level)) {
            warn!(error = %e, "failed to reload tracing level filter");
        }
    }

    fn level(&self) -> Severity {
        self.pipeline.level()
    }

    fn supports_runtime_level_change(&self) -> bool {
        true
    }

    fn with_fields(&self, fields: HashMap<String, Value>) -> Self {
        Self {
            pipeline: self.pipeline.derive(fields, true),
            engines: Arc::clone(&self.engines),
        }
    }

    fn flush(&self) {
        self.engines.primary_sink.flush();
        if let Some((_, sink)) = &self.engines.error {
            sink.flush();
        }
    }
}
