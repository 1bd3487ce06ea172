//! Time between a wakeup of a task and the switch that runs it

use super::{direction, field, SchedEvent};
use crate::pattern::{Boundary, Pattern, SchedTransition, TaskId};
use crate::tracefs::{TracefsError, TracingContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyData {
    /// Task that was running when the line was emitted
    pub running_task: TaskId,
    /// Task being woken or switched to
    pub task: TaskId,
    pub event: SchedEvent,
    pub boundary: Boundary,
}

/// `sched_wakeup` of a task up to the `sched_switch` onto it
#[derive(Debug, Default, Clone, Copy)]
pub struct SchedLatency;

impl Pattern for SchedLatency {
    type Payload = LatencyData;

    fn name(&self) -> &'static str {
        "sched_latency"
    }

    fn marks_scheduling(&self) -> bool {
        true
    }

    fn enable(&self, ctx: &TracingContext, focus: TaskId) -> Result<(), TracefsError> {
        ctx.enable_event(SchedEvent::Wakeup.tracefs_path())?;
        ctx.enable_event(SchedEvent::Switch.tracefs_path())?;
        ctx.set_filter(SchedEvent::Wakeup.tracefs_path(), &format!("pid == {focus}"))?;
        ctx.set_filter(SchedEvent::Switch.tracefs_path(), &format!("next_pid == {focus}"))
    }

    fn match_line(
        &self,
        line: &str,
        task: TaskId,
        boundary: Boundary,
        inbound: Option<&LatencyData>,
    ) -> Option<LatencyData> {
        let (event, key) = match boundary {
            Boundary::Begin => (SchedEvent::Wakeup, " pid="),
            Boundary::End => (SchedEvent::Switch, " next_pid="),
        };
        if !event.occurs_in(line) {
            return None;
        }
        let target: TaskId = field(line, key)?;
        if inbound.is_some_and(|begin| begin.task != target) {
            return None;
        }

        Some(LatencyData {
            running_task: task,
            task: target,
            event,
            boundary,
        })
    }

    fn is_relevant(&self, focus: TaskId, data: &LatencyData) -> Option<bool> {
        let woken_by_focus = data.boundary == Boundary::Begin && data.running_task == focus;
        Some(woken_by_focus || data.task == focus)
    }

    fn sched_out(&self, focus: TaskId, data: &LatencyData) -> Option<SchedTransition> {
        if data.task != focus {
            return Some(SchedTransition::Unaffected);
        }
        // Woken but not running yet, until the switch onto it.
        Some(match data.boundary {
            Boundary::Begin => SchedTransition::NowOff,
            Boundary::End => SchedTransition::NowOn,
        })
    }

    fn print(&self, data: &LatencyData) -> Option<String> {
        Some(format!(
            "sched_latency:{} {}task={}",
            direction(data.boundary),
            data.event,
            data.task
        ))
    }
}
