//! Trace line header parsing
//!
//! A line in the ftrace text format looks like
//!
//! ```text
//!            foo-7       [000] d..3  1234.567890: sched_wakeup: comm=foo pid=7 prio=120
//! ```
//!
//! Only the header is interpreted here: the `<taskname>-<pid>` token in front
//! of the CPU bracket and the timestamp in front of the first `": "`. The
//! event text is left to the pattern matchers.

use crate::pattern::TaskId;
use crate::timestamp::Timestamp;
use thiserror::Error;

/// Errors produced while parsing a trace line header
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing CPU bracket")]
    MissingCpuBracket,

    #[error("missing task id in front of the CPU bracket")]
    MissingTaskId,

    #[error("invalid task id: {0:?}")]
    InvalidTaskId(String),

    #[error("missing event separator")]
    MissingEventSeparator,

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Fields every trace line carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineHeader {
    pub timestamp: Timestamp,
    pub task: TaskId,
    pub task_name: String,
}

/// Extract timestamp, task id and task name from one raw trace line
pub fn parse_trace_line(line: &str) -> Result<LineHeader, ParseError> {
    let bracket = line.find(" [").ok_or(ParseError::MissingCpuBracket)?;
    let head = &line[..bracket];

    // Task names may contain dashes themselves, the pid follows the last one.
    let dash = head.rfind('-').ok_or(ParseError::MissingTaskId)?;
    let rest = &head[dash + 1..];
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let task: TaskId = rest[..digits_end]
        .parse()
        .map_err(|_| ParseError::InvalidTaskId(rest.trim().to_string()))?;
    let task_name = head[..dash].trim().to_string();

    let tail = &line[bracket..];
    let sep = tail.find(": ").ok_or(ParseError::MissingEventSeparator)?;
    let token = tail[..sep].rsplit(' ').next().unwrap_or_default();
    let timestamp =
        Timestamp::parse(token).ok_or_else(|| ParseError::InvalidTimestamp(token.to_string()))?;

    Ok(LineHeader {
        timestamp,
        task,
        task_name,
    })
}
