//! Priority inheritance boosts

use super::{direction, field};
use crate::pattern::{Boundary, Pattern, TaskId};
use crate::tracefs::{TracefsError, TracingContext};

const EVENT: &str = " sched_pi_setprio: ";
const EVENT_PATH: &str = "sched/sched_pi_setprio";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoostData {
    /// Task whose priority changed
    pub task: TaskId,
    /// Task the change was made from
    pub booster: TaskId,
    /// Kernel priorities, lower is more important
    pub oldprio: u32,
    pub newprio: u32,
    pub boundary: Boundary,
}

/// From a `sched_pi_setprio` that raises a task's priority until the one
/// that lowers it again
///
/// This kind does not seed significance on its own: a boost is only shown
/// when it encloses or straddles scheduling of the focus task.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrioBoost;

/// Kernel priority as a user visible real-time priority, 0 for non-RT
fn rt_priority(prio: u32) -> u32 {
    if prio < 99 {
        99 - prio
    } else {
        0
    }
}

impl Pattern for PrioBoost {
    type Payload = BoostData;

    fn name(&self) -> &'static str {
        "prio_boost"
    }

    fn enable(&self, ctx: &TracingContext, focus: TaskId) -> Result<(), TracefsError> {
        ctx.enable_event(EVENT_PATH)?;
        ctx.set_filter(EVENT_PATH, &format!("pid == {focus}"))
    }

    fn match_line(
        &self,
        line: &str,
        task: TaskId,
        boundary: Boundary,
        inbound: Option<&BoostData>,
    ) -> Option<BoostData> {
        if !line.contains(EVENT) {
            return None;
        }
        let target: TaskId = field(line, " pid=")?;
        let oldprio: u32 = field(line, " oldprio=")?;
        let newprio: u32 = field(line, " newprio=")?;

        let boosting = oldprio > newprio;
        let unboosting = oldprio < newprio;
        match boundary {
            Boundary::Begin if !boosting => return None,
            Boundary::End if !unboosting => return None,
            _ => {}
        }
        if inbound.is_some_and(|begin| begin.task != target) {
            return None;
        }

        Some(BoostData {
            task: target,
            booster: task,
            oldprio,
            newprio,
            boundary,
        })
    }

    fn is_relevant(&self, focus: TaskId, data: &BoostData) -> Option<bool> {
        Some(data.booster == focus || data.task == focus)
    }

    fn print(&self, data: &BoostData) -> Option<String> {
        Some(format!(
            "prio_boost:{}{}task={} prio={}->{}",
            direction(data.boundary),
            EVENT,
            data.task,
            rt_priority(data.oldprio),
            rt_priority(data.newprio)
        ))
    }
}
