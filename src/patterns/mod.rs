//! Built-in pattern kinds
//!
//! | kind                        | begin                     | end                              |
//! |-----------------------------|---------------------------|----------------------------------|
//! | `syscall`                   | `sys_enter`               | `sys_exit` of the same task      |
//! | `prio_boost`                | `sched_pi_setprio` raise  | `sched_pi_setprio` lower         |
//! | `sched_latency`             | `sched_wakeup`            | `sched_switch` to the task       |
//! | `sched_out_runnable`        | switch away in `R`/`R+`   | wakeup of or switch to the task  |
//! | `sched_out_sleeping`        | switch away in `S`        | wakeup of or switch to the task  |
//! | `sched_out_nonint_sleeping` | switch away in `D`        | wakeup of or switch to the task  |

pub mod prio_boost;
pub mod sched_latency;
pub mod sched_out;
pub mod syscall;

pub use prio_boost::PrioBoost;
pub use sched_latency::SchedLatency;
pub use sched_out::SchedOut;
pub use syscall::Syscall;

use crate::pattern::Boundary;
use crate::registry::PatternRegistry;
use std::fmt;
use std::str::FromStr;

/// Registry with every built-in kind.
///
/// Registration order is also the order in which kinds are offered a line
/// and in which their events are armed, so the wider `sched_switch` filter
/// of the `sched_out_*` kinds is written last.
pub fn default_registry() -> PatternRegistry {
    let mut registry = PatternRegistry::new();
    registry.register(Syscall);
    registry.register(PrioBoost);
    registry.register(SchedLatency);
    registry.register(SchedOut::runnable());
    registry.register(SchedOut::sleeping());
    registry.register(SchedOut::nonint_sleeping());
    registry
}

/// Scheduler trace events the built-in kinds key on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedEvent {
    Wakeup,
    Switch,
}

impl SchedEvent {
    /// Text identifying the event in a trace line
    pub fn marker(self) -> &'static str {
        match self {
            SchedEvent::Wakeup => " sched_wakeup: ",
            SchedEvent::Switch => " sched_switch: ",
        }
    }

    pub fn tracefs_path(self) -> &'static str {
        match self {
            SchedEvent::Wakeup => "sched/sched_wakeup",
            SchedEvent::Switch => "sched/sched_switch",
        }
    }

    pub fn occurs_in(self, line: &str) -> bool {
        line.contains(self.marker())
    }
}

impl fmt::Display for SchedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker().trim_start())
    }
}

/// `in` for a Begin, `out` for an End
pub(crate) fn direction(boundary: Boundary) -> &'static str {
    match boundary {
        Boundary::Begin => "in",
        Boundary::End => "out",
    }
}

/// Numeric value following `key` in `line`, e.g. `field(line, " pid=")`.
///
/// Only the leading digits after the key are read.
pub(crate) fn field<T: FromStr>(line: &str, key: &str) -> Option<T> {
    let start = line.find(key)? + key.len();
    let rest = &line[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_reads_leading_digits() {
        let line = "sched_wakeup: comm=foo pid=1234 prio=120 target_cpu=002";
        assert_eq!(field::<i32>(line, " pid="), Some(1234));
        assert_eq!(field::<u32>(line, " prio="), Some(120));
        assert_eq!(field::<u32>(line, " target_cpu="), Some(2));
        assert_eq!(field::<i32>(line, " next_pid="), None);
    }

    #[test]
    fn test_field_without_digits() {
        assert_eq!(field::<i32>("x pid=abc", " pid="), None);
        assert_eq!(field::<i32>("x pid=", " pid="), None);
    }

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry();
        let names: Vec<_> = registry.iter().map(|(_, p)| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "syscall",
                "prio_boost",
                "sched_latency",
                "sched_out_runnable",
                "sched_out_sleeping",
                "sched_out_nonint_sleeping",
            ]
        );
    }

    #[test]
    fn test_sched_event_display() {
        assert_eq!(SchedEvent::Wakeup.to_string(), "sched_wakeup: ");
        assert!(SchedEvent::Switch.occurs_in("  <idle>-0 [000] d..3 1.0: sched_switch: prev_comm=x"));
    }
}
