//! Time a task spends switched out in a given state

use super::{direction, field, SchedEvent};
use crate::pattern::{Boundary, Pattern, SchedTransition, TaskId};
use crate::tracefs::{TracefsError, TracingContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedOutData {
    pub task: TaskId,
    pub event: SchedEvent,
    pub boundary: Boundary,
}

/// From a `sched_switch` away from a task in one of `states` until the
/// task is woken or switched back in
#[derive(Debug, Clone, Copy)]
pub struct SchedOut {
    name: &'static str,
    states: &'static [&'static str],
}

impl SchedOut {
    /// Preempted while runnable
    pub fn runnable() -> Self {
        Self {
            name: "sched_out_runnable",
            states: &["R", "R+"],
        }
    }

    /// Interruptible sleep
    pub fn sleeping() -> Self {
        Self {
            name: "sched_out_sleeping",
            states: &["S"],
        }
    }

    /// Uninterruptible sleep
    pub fn nonint_sleeping() -> Self {
        Self {
            name: "sched_out_nonint_sleeping",
            states: &["D"],
        }
    }

    fn left_in_state(&self, line: &str) -> bool {
        self.states.iter().any(|state| {
            line.find(" prev_state=")
                .map(|at| &line[at + " prev_state=".len()..])
                .and_then(|rest| rest.strip_prefix(state))
                .is_some_and(|rest| rest.starts_with(' '))
        })
    }
}

impl Pattern for SchedOut {
    type Payload = SchedOutData;

    fn name(&self) -> &'static str {
        self.name
    }

    fn marks_scheduling(&self) -> bool {
        true
    }

    fn enable(&self, ctx: &TracingContext, focus: TaskId) -> Result<(), TracefsError> {
        ctx.enable_event(SchedEvent::Wakeup.tracefs_path())?;
        ctx.enable_event(SchedEvent::Switch.tracefs_path())?;
        ctx.set_filter(SchedEvent::Wakeup.tracefs_path(), &format!("pid == {focus}"))?;
        ctx.set_filter(
            SchedEvent::Switch.tracefs_path(),
            &format!("next_pid == {focus} || prev_pid == {focus}"),
        )
    }

    fn match_line(
        &self,
        line: &str,
        _task: TaskId,
        boundary: Boundary,
        inbound: Option<&SchedOutData>,
    ) -> Option<SchedOutData> {
        let (event, key) = match boundary {
            Boundary::Begin => {
                if !SchedEvent::Switch.occurs_in(line) || !self.left_in_state(line) {
                    return None;
                }
                (SchedEvent::Switch, " prev_pid=")
            }
            Boundary::End if SchedEvent::Wakeup.occurs_in(line) => (SchedEvent::Wakeup, " pid="),
            Boundary::End if SchedEvent::Switch.occurs_in(line) => (SchedEvent::Switch, " next_pid="),
            Boundary::End => return None,
        };

        let target: TaskId = field(line, key)?;
        if inbound.is_some_and(|begin| begin.task != target) {
            return None;
        }

        Some(SchedOutData {
            task: target,
            event,
            boundary,
        })
    }

    fn is_relevant(&self, focus: TaskId, data: &SchedOutData) -> Option<bool> {
        Some(data.task == focus)
    }

    fn sched_out(&self, focus: TaskId, data: &SchedOutData) -> Option<SchedTransition> {
        if data.task != focus {
            return Some(SchedTransition::Unaffected);
        }
        // A wakeup ends the interval but the task is not running yet.
        Some(match (data.boundary, data.event) {
            (Boundary::Begin, _) => SchedTransition::NowOff,
            (Boundary::End, SchedEvent::Wakeup) => SchedTransition::Unaffected,
            (Boundary::End, SchedEvent::Switch) => SchedTransition::NowOn,
        })
    }

    fn print(&self, data: &SchedOutData) -> Option<String> {
        Some(format!(
            "{}:{} {}task={}",
            self.name,
            direction(data.boundary),
            data.event,
            data.task
        ))
    }
}
