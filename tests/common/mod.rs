//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use polylog::{BackendKind, LogOption, Logger};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes a tracing subscriber so the crate's own diagnostics show up
/// in test output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A logger writing into its own temporary directory
pub struct Fixture {
    pub dir: TempDir,
    pub logger: Logger,
}

impl Fixture {
    /// Logger of `kind` with both sinks inside a fresh temp dir
    pub fn new(kind: BackendKind, extra: impl IntoIterator<Item = LogOption>) -> Self {
        setup_test_logging();
        let dir = temp_dir();
        let mut options = vec![
            LogOption::FileOutput(dir.path().join("app.log")),
            LogOption::ErrorOutput(dir.path().join("app_error.log")),
        ];
        options.extend(extra);
        let logger = Logger::with_kind(kind, options).expect("Failed to build logger");
        Self { dir, logger }
    }

    pub fn primary_path(&self) -> PathBuf {
        self.dir.path().join("app.log")
    }

    pub fn error_path(&self) -> PathBuf {
        self.dir.path().join("app_error.log")
    }

    /// Flush and read the primary sink
    pub fn primary(&self) -> String {
        self.logger.flush();
        read(self.primary_path())
    }

    /// Flush and read the error sink
    pub fn errors(&self) -> String {
        self.logger.flush();
        read(self.error_path())
    }
}

/// File contents, empty when the file does not exist
pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

/// The line containing `needle`, panicking with the whole log otherwise
#[allow(dead_code)]
pub fn line_with<'a>(log: &'a str, needle: &str) -> &'a str {
    log.lines()
        .find(|line| line.contains(needle))
        .unwrap_or_else(|| panic!("no line containing {needle:?} in:\n{log}"))
}
