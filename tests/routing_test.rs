//! Dual-sink routing, filtering and redaction across every backend kind

mod common;

use common::{line_with, Fixture};
use polylog::{args, BackendKind, LogEvent, LogOption, RedactionRule, Severity, Value};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[test]
fn test_threshold_drops_lower_severities() {
    for kind in BackendKind::ALL {
        let fixture = Fixture::new(kind, [LogOption::Level(Severity::Warn)]);

        fixture.logger.debug("debug noise", args![]);
        fixture.logger.info("info noise", args![]);
        fixture.logger.warn("disk at 91%", args![]);

        let primary = fixture.primary();
        assert!(!primary.contains("noise"), "{kind}: {primary}");
        assert!(primary.contains("disk at 91%"), "{kind}: {primary}");
        assert!(fixture.errors().is_empty(), "{kind}");
    }
}

#[test]
fn test_errors_are_mirrored_with_call_site() {
    for kind in BackendKind::ALL {
        let fixture = Fixture::new(kind, []);

        fixture.logger.info("request served", args!["status", 200]);
        let line = line!() + 1;
        fixture.logger.error("request failed", args!["status", 500]);

        let site = format!("routing_test.rs:{line}");
        let primary = fixture.primary();
        let errors = fixture.errors();

        assert!(primary.contains("request served"), "{kind}");
        assert!(primary.contains("request failed"), "{kind}");
        assert!(!primary.contains(&site), "{kind}: call site leaked into primary");
        assert!(!errors.contains("request served"), "{kind}");
        assert!(line_with(&errors, "request failed").contains(&site), "{kind}: {errors}");
    }
}

#[test]
fn test_add_source_puts_call_site_on_primary() {
    for kind in BackendKind::ALL {
        let fixture = Fixture::new(kind, [LogOption::AddSource]);

        let line = line!() + 1;
        fixture.logger.warn("config reloaded", args![]);

        let primary = fixture.primary();
        let expected = format!("routing_test.rs:{line}");
        assert!(line_with(&primary, "config reloaded").contains(&expected), "{kind}: {primary}");
    }
}

#[test]
fn test_without_error_sink_nothing_is_mirrored() {
    for kind in BackendKind::ALL {
        let fixture = Fixture::new(kind, [LogOption::NoErrorOutput]);

        fixture.logger.error("only once", args![]);

        assert_eq!(fixture.primary().matches("only once").count(), 1, "{kind}");
        assert!(!fixture.error_path().exists(), "{kind}");
    }
}

#[test]
fn test_passwords_never_reach_a_sink() {
    for kind in BackendKind::ALL {
        let fixture = Fixture::new(kind, [LogOption::Redaction(vec![])]);

        fixture
            .logger
            .error("login rejected", args!["user", "bob", "password", "hunter2", "phone", "13812345678"]);

        let primary = fixture.primary();
        let errors = fixture.errors();
        for log in [&primary, &errors] {
            assert!(!log.contains("hunter2"), "{kind}: {log}");
            assert!(log.contains("[****]"), "{kind}: {log}");
            assert!(log.contains("138****5678"), "{kind}: {log}");
            assert!(log.contains("bob"), "{kind}: {log}");
        }
    }
}

#[test]
fn test_custom_rule_runs_after_builtins() {
    let upper: Arc<dyn RedactionRule> = Arc::new(|key: &str, value: Value| match (key, &value) {
        ("user", Value::String(name)) => Value::String(name.to_uppercase()),
        _ => value,
    });

    for kind in BackendKind::ALL {
        let fixture = Fixture::new(kind, [LogOption::Redaction(vec![Arc::clone(&upper)])]);

        fixture.logger.info("login", args!["user", "bob", "pwd", "secret"]);

        let primary = fixture.primary();
        assert!(primary.contains("BOB"), "{kind}: {primary}");
        assert!(!primary.contains("secret"), "{kind}: {primary}");
    }
}

#[test]
fn test_redaction_off_leaves_values() {
    let fixture = Fixture::new(BackendKind::Flexi, []);
    fixture.logger.info("login", args!["password", "hunter2"]);
    assert!(fixture.primary().contains("password=hunter2"));
}

#[test]
fn test_with_fields_only_affects_derived_logger() {
    for kind in BackendKind::ALL {
        let fixture = Fixture::new(kind, []);
        let derived = fixture
            .logger
            .with_fields(HashMap::from([("tenant".to_string(), json!("acme"))]));

        derived.info("from derived", args!["step", 1]);
        fixture.logger.info("from parent", args![]);

        let primary = fixture.primary();
        let derived_line = line_with(&primary, "from derived");
        assert!(derived_line.contains("tenant=acme"), "{kind}: {derived_line}");
        assert!(derived_line.contains("step=1"), "{kind}: {derived_line}");
        assert!(!line_with(&primary, "from parent").contains("tenant"), "{kind}");
    }
}

#[test]
fn test_derived_logger_shares_threshold() {
    for kind in BackendKind::ALL {
        let fixture = Fixture::new(kind, []);
        let derived = fixture.logger.with_fields(HashMap::new());
        assert_eq!(derived.level(), Severity::Info, "{kind}");

        if fixture.logger.supports_runtime_level_change() {
            derived.set_level(Severity::Error);
            assert_eq!(fixture.logger.level(), Severity::Error, "{kind}");
        }
    }
}

#[test]
fn test_runtime_level_change_per_kind() {
    for kind in BackendKind::ALL {
        let fixture = Fixture::new(kind, []);

        fixture.logger.set_level(Severity::Debug);
        fixture.logger.debug("probe", args![]);

        let primary = fixture.primary();
        if kind == BackendKind::Log4rs {
            assert!(!fixture.logger.supports_runtime_level_change());
            assert_eq!(fixture.logger.level(), Severity::Info);
            assert!(!primary.contains("probe"));
        } else {
            assert!(fixture.logger.supports_runtime_level_change(), "{kind}");
            assert_eq!(fixture.logger.level(), Severity::Debug, "{kind}");
            assert!(primary.contains("probe"), "{kind}: {primary}");
        }
    }
}

#[test]
fn test_json_lines_parse() {
    for kind in [BackendKind::Tracing, BackendKind::Log4rs, BackendKind::Flexi] {
        let fixture = Fixture::new(kind, [LogOption::JsonFormat, LogOption::AddSource]);

        fixture.logger.info("cache warmed", args!["entries", 128]);
        fixture.logger.error("cache poisoned", args!["key", "user:7"]);

        for log in [fixture.primary(), fixture.errors()] {
            assert!(!log.is_empty(), "{kind}");
            for line in log.lines() {
                let parsed: Result<Value, _> = serde_json::from_str(line);
                assert!(parsed.is_ok(), "{kind}: not JSON: {line}");
            }
        }
    }
}

#[test]
fn test_positional_values_in_text_output() {
    for kind in [BackendKind::Log4rs, BackendKind::Flexi, BackendKind::EnvLogger] {
        let fixture = Fixture::new(kind, []);

        fixture.logger.info("odd arguments", args!["k", "v", "dangling"]);

        let primary = fixture.primary();
        assert!(line_with(&primary, "odd arguments").ends_with("k=v dangling"), "{kind}: {primary}");
    }
}

#[test]
fn test_color_applies_to_message() {
    for kind in [BackendKind::Tracing, BackendKind::Flexi] {
        let fixture = Fixture::new(kind, [LogOption::Color]);
        fixture.logger.warn("colourful", args!["user", "bob"]);

        let primary = fixture.primary();
        let line = line_with(&primary, "colourful");
        assert!(line.contains("\u{1b}[33mcolourful\u{1b}[0m"), "{kind}: {line:?}");
        assert!(!line.contains("\\x1b"), "{kind}: {line:?}");
        assert!(line.ends_with(" user=bob"), "{kind}: {line:?}");
    }
}

#[test]
fn test_direct_port_events_keep_a_call_site() {
    for kind in BackendKind::ALL {
        let fixture = Fixture::new(kind, []);

        let line = line!() + 1;
        let event = LogEvent::new(Severity::Error, "raised outside the facade", args![]);
        fixture.logger.backend().log(event);

        let errors = fixture.errors();
        let site = format!("routing_test.rs:{line}");
        assert!(line_with(&errors, "raised outside the facade").contains(&site), "{kind}: {errors}");
    }
}

#[test]
fn test_time_zone_and_format() {
    for kind in BackendKind::ALL {
        let fixture = Fixture::new(
            kind,
            [
                LogOption::TimeZone(polylog::zones::UTC.to_string()),
                LogOption::TimeFormat("%Y-%m-%dT%H:%M:%SZ".to_string()),
            ],
        );

        fixture.logger.info("stamped", args![]);

        let primary = fixture.primary();
        let line = line_with(&primary, "stamped");
        let year = chrono::Utc::now().format("%Y-").to_string();
        assert!(line.starts_with(&year), "{kind}: {line}");
        assert!(line.contains('T') && line.contains("Z "), "{kind}: {line}");
    }
}

#[test]
fn test_concurrent_writers_keep_lines_whole() {
    let fixture = Fixture::new(BackendKind::Flexi, []);
    std::thread::scope(|scope| {
        for worker in 0..4 {
            let logger = fixture.logger.clone();
            scope.spawn(move || {
                for n in 0..50 {
                    logger.info("tick", args!["worker", worker, "n", n]);
                }
            });
        }
    });

    let primary = fixture.primary();
    assert_eq!(primary.lines().count(), 200);
    assert!(primary.lines().all(|line| line.contains("tick worker=")));
}
