//! System calls made by the focus task

use super::{direction, field};
use crate::pattern::{Boundary, Pattern, TaskId};
use crate::syscalls::{futex_command_name, syscall_name, FUTEX_NR};
use crate::tracefs::{TracefsError, TracingContext};
use std::fmt::Write;

const ENTER: &str = " sys_enter: ";
const EXIT: &str = " sys_exit: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyscallData {
    pub task: TaskId,
    pub nr: u32,
    /// Operation word of a futex call, carried over to its exit
    pub futex_op: Option<u32>,
    pub boundary: Boundary,
}

/// From `sys_enter` until the matching `sys_exit` of the same task
#[derive(Debug, Default, Clone, Copy)]
pub struct Syscall;

/// Second argument of a `sys_enter` line, printed in hex by the kernel
fn second_argument(line: &str) -> Option<u32> {
    let (_, rest) = line.split_once(", ")?;
    let end = rest
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(rest.len());
    u64::from_str_radix(&rest[..end], 16)
        .ok()
        .map(|op| op as u32)
}

impl Pattern for Syscall {
    type Payload = SyscallData;

    fn name(&self) -> &'static str {
        "syscall"
    }

    fn enable(&self, ctx: &TracingContext, focus: TaskId) -> Result<(), TracefsError> {
        let filter = format!("common_pid == {focus}");
        ctx.enable_event("raw_syscalls/sys_enter")?;
        ctx.enable_event("raw_syscalls/sys_exit")?;
        ctx.set_filter("raw_syscalls/sys_enter", &filter)?;
        ctx.set_filter("raw_syscalls/sys_exit", &filter)
    }

    fn match_line(
        &self,
        line: &str,
        task: TaskId,
        boundary: Boundary,
        inbound: Option<&SyscallData>,
    ) -> Option<SyscallData> {
        let event = match boundary {
            Boundary::Begin => ENTER,
            Boundary::End => EXIT,
        };
        if !line.contains(event) {
            return None;
        }
        if inbound.is_some_and(|begin| begin.task != task) {
            return None;
        }
        let nr: u32 = field(line, "NR ")?;

        let futex_op = if nr == FUTEX_NR {
            match boundary {
                Boundary::Begin => second_argument(line),
                Boundary::End => inbound.and_then(|begin| begin.futex_op),
            }
        } else {
            None
        };

        Some(SyscallData {
            task,
            nr,
            futex_op,
            boundary,
        })
    }

    fn is_relevant(&self, focus: TaskId, data: &SyscallData) -> Option<bool> {
        Some(data.task == focus)
    }

    fn print(&self, data: &SyscallData) -> Option<String> {
        let event = match data.boundary {
            Boundary::Begin => ENTER,
            Boundary::End => EXIT,
        };
        let mut text = format!(
            "syscall:{}{}nr={}/{}",
            direction(data.boundary),
            event,
            data.nr,
            syscall_name(data.nr).unwrap_or("?")
        );
        if let Some(command) = data.futex_op.and_then(futex_command_name) {
            let _ = write!(text, "/{command}");
        }
        let _ = write!(text, " task={}", data.task);
        Some(text)
    }
}
