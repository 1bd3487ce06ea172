//! Pattern plugin contract
//!
//! A pattern describes one kind of begin/end pair in the trace, e.g. "the
//! focus task was woken up but is not running yet". Implementations only
//! recognize single lines; pairing, significance and rendering are done by
//! the engine.
//!
//! Plugins implement the typed [`Pattern`] trait. The registry stores them
//! behind [`ErasedPattern`], which carries payloads as `Box<dyn Any>` so
//! that different kinds can live in one timeline.

use crate::tracefs::{TracefsError, TracingContext};
use std::any::Any;

/// Kernel task id as printed in trace lines
pub type TaskId = i32;

/// Which end of a pattern occurrence an instance represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    Begin,
    End,
}

/// Effect of an occurrence on whether the focus task is on the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedTransition {
    /// The focus task stops running here
    NowOff,
    /// The focus task runs again here
    NowOn,
    Unaffected,
}

/// One kind of begin/end pair recognized in trace lines
///
/// Every method except [`Pattern::match_line`] and [`Pattern::name`] is
/// optional. Optional queries return `None` when the pattern does not
/// implement them, and the engine then behaves as if the capability was
/// absent.
pub trait Pattern {
    /// Data extracted from a matching line
    type Payload: 'static;

    fn name(&self) -> &'static str;

    /// Whether this kind directly represents the focus task losing or
    /// regaining the CPU. Such occurrences seed significance propagation.
    fn marks_scheduling(&self) -> bool {
        false
    }

    /// Arm the trace events this kind needs
    fn enable(&self, _ctx: &TracingContext, _focus: TaskId) -> Result<(), TracefsError> {
        Ok(())
    }

    /// Test `line` for the requested boundary.
    ///
    /// `task` is the task the line is attributed to. When looking for an
    /// `End`, `inbound` is the payload of the open `Begin` being closed.
    /// Must only depend on its arguments.
    fn match_line(
        &self,
        line: &str,
        task: TaskId,
        boundary: Boundary,
        inbound: Option<&Self::Payload>,
    ) -> Option<Self::Payload>;

    /// Whether the occurrence involves the focus task at all
    fn is_relevant(&self, _focus: TaskId, _payload: &Self::Payload) -> Option<bool> {
        None
    }

    fn sched_out(&self, _focus: TaskId, _payload: &Self::Payload) -> Option<SchedTransition> {
        None
    }

    /// Human readable description. Kinds without one never show up in the
    /// rendered output.
    fn print(&self, _payload: &Self::Payload) -> Option<String> {
        None
    }

    /// Called once when the registry is torn down
    fn unregister(&self) {}
}

/// Payload as stored on an instance
pub type Payload = Box<dyn Any>;

/// Object safe view of a [`Pattern`]
pub trait ErasedPattern {
    fn name(&self) -> &'static str;
    fn marks_scheduling(&self) -> bool;
    fn enable(&self, ctx: &TracingContext, focus: TaskId) -> Result<(), TracefsError>;
    fn match_line(
        &self,
        line: &str,
        task: TaskId,
        boundary: Boundary,
        inbound: Option<&dyn Any>,
    ) -> Option<Payload>;
    fn is_relevant(&self, focus: TaskId, payload: &dyn Any) -> Option<bool>;
    fn sched_out(&self, focus: TaskId, payload: &dyn Any) -> Option<SchedTransition>;
    fn print(&self, payload: &dyn Any) -> Option<String>;
    fn unregister(&self);
}

impl<P: Pattern> ErasedPattern for P {
    fn name(&self) -> &'static str {
        Pattern::name(self)
    }

    fn marks_scheduling(&self) -> bool {
        Pattern::marks_scheduling(self)
    }

    fn enable(&self, ctx: &TracingContext, focus: TaskId) -> Result<(), TracefsError> {
        Pattern::enable(self, ctx, focus)
    }

    fn match_line(
        &self,
        line: &str,
        task: TaskId,
        boundary: Boundary,
        inbound: Option<&dyn Any>,
    ) -> Option<Payload> {
        // A payload of another kind can never close one of ours.
        let inbound = match inbound {
            Some(data) => Some(data.downcast_ref::<P::Payload>()?),
            None => None,
        };
        Pattern::match_line(self, line, task, boundary, inbound)
            .map(|payload| Box::new(payload) as Payload)
    }

    fn is_relevant(&self, focus: TaskId, payload: &dyn Any) -> Option<bool> {
        Pattern::is_relevant(self, focus, payload.downcast_ref::<P::Payload>()?)
    }

    fn sched_out(&self, focus: TaskId, payload: &dyn Any) -> Option<SchedTransition> {
        Pattern::sched_out(self, focus, payload.downcast_ref::<P::Payload>()?)
    }

    fn print(&self, payload: &dyn Any) -> Option<String> {
        Pattern::print(self, payload.downcast_ref::<P::Payload>()?)
    }

    fn unregister(&self) {
        Pattern::unregister(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    impl Pattern for Marker {
        type Payload = u32;

        fn name(&self) -> &'static str {
            "marker"
        }

        fn match_line(
            &self,
            line: &str,
            _task: TaskId,
            boundary: Boundary,
            inbound: Option<&u32>,
        ) -> Option<u32> {
            match boundary {
                Boundary::Begin => line.contains("open").then_some(1),
                Boundary::End => line.contains("close").then(|| inbound.copied().unwrap_or(0) + 1),
            }
        }
    }

    #[test]
    fn test_erased_match_roundtrips_payload() {
        let erased: Box<dyn ErasedPattern> = Box::new(Marker);
        let begin = erased.match_line("open", 1, Boundary::Begin, None).unwrap();
        let end = erased
            .match_line("close", 1, Boundary::End, Some(&*begin))
            .unwrap();
        assert_eq!(end.downcast_ref::<u32>(), Some(&2));
    }

    #[test]
    fn test_erased_rejects_foreign_payload() {
        let erased: Box<dyn ErasedPattern> = Box::new(Marker);
        let foreign: Payload = Box::new("not a u32");
        assert!(erased
            .match_line("close", 1, Boundary::End, Some(&*foreign))
            .is_none());
    }

    #[test]
    fn test_optional_capabilities_default_to_absent() {
        let erased: Box<dyn ErasedPattern> = Box::new(Marker);
        let payload: Payload = Box::new(1u32);
        assert!(!erased.marks_scheduling());
        assert_eq!(erased.is_relevant(1, &*payload), None);
        assert_eq!(erased.sched_out(1, &*payload), None);
        assert_eq!(erased.print(&*payload), None);
    }
}
