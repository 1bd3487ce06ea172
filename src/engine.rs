//! Interval matching engine
//!
//! Consumes trace lines one at a time. For every line the open Begin
//! instances get a chance to close first, then every registered kind may
//! open new ones:
//!
//! ```text
//! line ─► parse header ─► close pass (open set, newest first)
//!                     └─► open pass (registry order)
//! ```
//!
//! Closing before opening keeps a line that is both an End and a Begin
//! (a `sched_switch` typically is) from closing the instance it just opened.

use crate::analysis::Analysis;
use crate::parser::{parse_trace_line, LineHeader, ParseError};
use crate::pattern::{Boundary, TaskId};
use crate::registry::PatternRegistry;
use crate::timeline::{Instance, InstanceId, OpenSet, Timeline};
use crate::tracefs::{TracefsError, TracingContext};
use serde::Serialize;

/// Counters collected while consuming a trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Lines handed to the parser
    pub lines: u64,
    /// Comment and blank lines skipped before parsing
    pub skipped: u64,
    pub parse_failures: u64,
    pub instances: u64,
    pub pairs: u64,
}

/// Correlates trace lines into begin/end pairs for one focus task
pub struct Engine {
    // Instances hold payloads created by the registry's kinds, drop them first.
    timeline: Timeline,
    open: OpenSet,
    registry: PatternRegistry,
    focus: TaskId,
    stats: EngineStats,
}

impl Engine {
    pub fn new(registry: PatternRegistry, focus: TaskId) -> Self {
        Self {
            timeline: Timeline::new(),
            open: OpenSet::new(),
            registry,
            focus,
            stats: EngineStats::default(),
        }
    }

    pub fn focus(&self) -> TaskId {
        self.focus
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn open_set(&self) -> &OpenSet {
        &self.open
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Arm the trace events of every registered kind for the focus task
    pub fn enable(&self, ctx: &TracingContext) -> Result<(), TracefsError> {
        self.registry.enable_all(ctx, self.focus)
    }

    /// Consume a finite sequence of raw trace lines.
    ///
    /// Comment lines (`#`) and blank lines are skipped. Lines that fail to
    /// parse are reported and skipped; they never abort the scan.
    pub fn consume<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            let line = line.as_ref();
            if line.starts_with('#') || line.trim().is_empty() {
                self.stats.skipped += 1;
                continue;
            }
            if let Err(err) = self.handle_line(line) {
                tracing::warn!(line = self.stats.lines, "parse failed: {}: {}", err, line.trim_end());
            }
        }
    }

    /// Process a single non-comment trace line
    pub fn handle_line(&mut self, line: &str) -> Result<(), ParseError> {
        self.stats.lines += 1;
        let line_no = self.stats.lines;

        let header = match parse_trace_line(line) {
            Ok(header) => header,
            Err(err) => {
                self.stats.parse_failures += 1;
                return Err(err);
            }
        };

        self.close_pass(line, &header, line_no);
        self.open_pass(line, &header, line_no);
        Ok(())
    }

    fn close_pass(&mut self, line: &str, header: &LineHeader, line_no: u64) {
        for begin in self.open.recent_first() {
            let Some(end) = self.try_close(begin, line, header, line_no) else {
                continue;
            };
            if self.timeline.link(begin, end) {
                self.open.remove(begin);
                self.stats.pairs += 1;
                tracing::trace!(
                    begin = begin.index(),
                    end = end.index(),
                    line = line_no,
                    "paired instances"
                );
            } else {
                tracing::warn!(begin = begin.index(), "open instance already had a partner");
                self.open.remove(begin);
            }
        }
    }

    /// Ask the Begin's own kind whether `line` closes it
    fn try_close(
        &mut self,
        begin: InstanceId,
        line: &str,
        header: &LineHeader,
        line_no: u64,
    ) -> Option<InstanceId> {
        let open = &self.timeline[begin];
        let pattern_id = open.pattern;
        let Some(pattern) = self.registry.get(pattern_id) else {
            tracing::warn!(begin = begin.index(), "open instance of unknown pattern");
            return None;
        };
        let payload = pattern.match_line(line, header.task, Boundary::End, Some(open.payload()))?;

        let id = self.timeline.push(Instance::new(
            header.timestamp,
            header.task,
            header.task_name.as_str(),
            Boundary::End,
            pattern_id,
            line_no,
            payload,
        ));
        self.stats.instances += 1;
        Some(id)
    }

    fn open_pass(&mut self, line: &str, header: &LineHeader, line_no: u64) {
        for (pattern_id, pattern) in self.registry.iter() {
            let Some(payload) = pattern.match_line(line, header.task, Boundary::Begin, None) else {
                continue;
            };
            let id = self.timeline.push(Instance::new(
                header.timestamp,
                header.task,
                header.task_name.as_str(),
                Boundary::Begin,
                pattern_id,
                line_no,
                payload,
            ));
            self.open.insert(id);
            self.stats.instances += 1;
            tracing::trace!(
                id = id.index(),
                pattern = pattern.name(),
                line = line_no,
                "opened instance"
            );
        }
    }

    /// Stop matching and run significance propagation and level assignment
    pub fn finish(self) -> Analysis {
        let Engine {
            timeline,
            open,
            registry,
            focus,
            stats,
        } = self;
        Analysis::new(timeline, open, registry, focus, stats)
    }
}
