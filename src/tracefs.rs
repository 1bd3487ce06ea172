//! Access to the kernel tracing control filesystem
//!
//! Each run gets its own ftrace instance under `instances/` so that it does
//! not disturb the global buffer or other users of tracefs.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default tracefs location
pub const DEFAULT_TRACING_ROOT: &str = "/sys/kernel/debug/tracing";

/// Errors raised while talking to tracefs
#[derive(Error, Debug)]
pub enum TracefsError {
    #[error("failed to create tracing instance {path}: {source}")]
    CreateInstance {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {value:?} to {path}: {source}")]
    Write {
        path: PathBuf,
        value: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle to a directory of tracefs control files
#[derive(Debug, Clone)]
pub struct TracingContext {
    root: PathBuf,
}

impl TracingContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `value` to the control file `attr` (relative to the root)
    ///
    /// Control files are opened for append; the kernel interprets each
    /// write as a command.
    pub fn set(&self, attr: &str, value: &str) -> Result<(), TracefsError> {
        let path = self.root.join(attr);
        tracing::debug!(path = %path.display(), value = value.trim_end(), "tracefs write");

        let result = OpenOptions::new()
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(value.as_bytes()));

        result.map_err(|source| TracefsError::Write {
            path,
            value: value.to_string(),
            source,
        })
    }

    /// Enable `events/<event>`, e.g. `sched/sched_switch`
    pub fn enable_event(&self, event: &str) -> Result<(), TracefsError> {
        self.set(&format!("events/{event}/enable"), "1\n")
    }

    /// Install a kernel filter expression on `events/<event>`
    pub fn set_filter(&self, event: &str, filter: &str) -> Result<(), TracefsError> {
        self.set(&format!("events/{event}/filter"), &format!("{filter}\n"))
    }
}

/// An ftrace instance owned by this process
///
/// The instance directory is removed again when the handle is dropped.
#[derive(Debug)]
pub struct TraceInstance {
    context: TracingContext,
}

impl TraceInstance {
    /// Create `instances/latency_trace.<pid>` below `tracing_root`
    pub fn create(tracing_root: &Path, pid: u32) -> Result<Self, TracefsError> {
        let path = tracing_root
            .join("instances")
            .join(format!("latency_trace.{pid}"));

        match fs::create_dir(&path) {
            Ok(()) => {}
            // Left behind by an earlier run with a recycled pid.
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!(path = %path.display(), "reusing existing tracing instance");
            }
            Err(source) => return Err(TracefsError::CreateInstance { path, source }),
        }
        tracing::debug!(path = %path.display(), "created tracing instance");

        Ok(Self {
            context: TracingContext::new(path),
        })
    }

    pub fn context(&self) -> &TracingContext {
        &self.context
    }

    pub fn set_tracing_on(&self, on: bool) -> Result<(), TracefsError> {
        self.context.set("tracing_on", if on { "1\n" } else { "0\n" })
    }

    /// Read the buffer of one CPU into lines
    pub fn read_cpu_trace(&self, cpu: usize) -> Result<Vec<String>, TracefsError> {
        let path = self
            .context
            .root()
            .join(format!("per_cpu/cpu{cpu}/trace"));
        read_lines(&path)
    }
}

impl Drop for TraceInstance {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir(self.context.root()) {
            tracing::warn!(
                path = %self.context.root().display(),
                "failed to remove tracing instance: {}",
                err
            );
        }
    }
}

/// Read a captured trace file into lines
pub fn read_lines(path: &Path) -> Result<Vec<String>, TracefsError> {
    let file = fs::File::open(path).map_err(|source| TracefsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    BufReader::new(file)
        .lines()
        .collect::<io::Result<Vec<_>>>()
        .map_err(|source| TracefsError::Read {
            path: path.to_path_buf(),
            source,
        })
}
