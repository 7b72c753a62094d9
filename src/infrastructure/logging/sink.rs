use std::cell::Cell;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;
use tracing_subscriber::fmt::MakeWriter;

use super::rotation::{open_append, RotatingFile};
use crate::domain::error::ConfigError;
use crate::infrastructure::config::RotationPolicy;

thread_local! {
    static REPORTING: Cell<bool> = const { Cell::new(false) };
}

/// Cloneable handle to one log destination
///
/// All clones share one writer behind a mutex, so each line is written
/// whole. Write failures never reach the caller: they are reported as a
/// `tracing` warning and the line is dropped.
#[derive(Clone)]
pub struct SharedSink {
    path: Arc<PathBuf>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    echo_stderr: bool,
}

impl SharedSink {
    /// Open `path` for appending, wrapped in a [`RotatingFile`] when a
    /// policy is given
    pub fn open(path: &Path, rotation: Option<RotationPolicy>) -> Result<Self, ConfigError> {
        let unusable = |source| ConfigError::UnusableOutput {
            path: path.to_path_buf(),
            source,
        };

        let writer: Box<dyn Write + Send> = match rotation {
            Some(policy) => Box::new(RotatingFile::open(path, policy).map_err(unusable)?),
            None => Box::new(open_append(path).map_err(unusable)?),
        };

        Ok(Self::from_writer(path, writer))
    }

    /// Wrap an arbitrary writer
    pub fn from_writer(label: impl Into<PathBuf>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            path: Arc::new(label.into()),
            writer: Arc::new(Mutex::new(writer)),
            echo_stderr: false,
        }
    }

    /// Also copy everything written to stderr
    #[must_use]
    pub const fn with_stderr_echo(mut self, enabled: bool) -> Self {
        self.echo_stderr = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one line, appending the newline if missing
    pub fn write_line(&self, line: &str) {
        if line.ends_with('\n') {
            self.write_swallowing(line.as_bytes());
        } else {
            let mut buf = String::with_capacity(line.len() + 1);
            buf.push_str(line);
            buf.push('\n');
            self.write_swallowing(buf.as_bytes());
        }
    }

    /// Flush the underlying writer
    pub fn flush(&self) {
        let result = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();
        if let Err(e) = result {
            self.report(&e);
        }
        if self.echo_stderr {
            let _ = io::stderr().flush();
        }
    }

    fn write_swallowing(&self, buf: &[u8]) {
        let result = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_all(buf);
        if let Err(e) = result {
            self.report(&e);
        }
        if self.echo_stderr {
            let _ = io::stderr().lock().write_all(buf);
        }
    }

    fn report(&self, error: &io::Error) {
        // a failing sink must not report through itself
        REPORTING.with(|reporting| {
            if reporting.replace(true) {
                return;
            }
            warn!(path = %self.path.display(), error = %error, "dropped log output");
            reporting.set(false);
        });
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_swallowing(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Self::flush(self);
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedSink {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl fmt::Debug for SharedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSink")
            .field("path", &self.path)
            .field("echo_stderr", &self.echo_stderr)
            .finish_non_exhaustive()
    }
}
