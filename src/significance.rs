//! Significance propagation
//!
//! Decides which matched pairs explain the focus task's latency. Runs once
//! the whole trace has been consumed, in two passes:
//!
//! 1. Seed: every pair of a kind that marks scheduling is marked. Marking a
//!    pair also marks every pair that straddles it, i.e. begins inside and
//!    ends outside of it (or the other way around), transitively.
//! 2. Containment: every remaining relevant pair that fully encloses an
//!    already significant instance is marked, with the same straddle
//!    propagation.
//!
//! A pair that begins before and ends after a significant pair is not seen
//! by the straddle check; only the containment pass picks it up, and only
//! in chronological order of its Begin.

use crate::pattern::{Boundary, TaskId};
use crate::registry::PatternRegistry;
use crate::timeline::{InstanceId, Timeline};

/// Run both passes and return how many instances were newly marked
pub fn propagate(timeline: &mut Timeline, registry: &PatternRegistry, focus: TaskId) -> usize {
    let seeded = seed_pass(timeline, registry, focus);
    let contained = containment_pass(timeline, registry, focus);
    tracing::debug!(seeded, contained, "significance propagated");
    seeded + contained
}

fn seed_pass(timeline: &mut Timeline, registry: &PatternRegistry, focus: TaskId) -> usize {
    let mut marked = 0;
    for id in timeline.ids() {
        let instance = &timeline[id];
        if !instance.is_paired() || instance.is_significant() {
            continue;
        }
        let seeds = registry
            .get(instance.pattern)
            .is_some_and(|pattern| pattern.marks_scheduling());
        if seeds {
            marked += mark_significant(timeline, registry, focus, id);
        }
    }
    marked
}

fn containment_pass(timeline: &mut Timeline, registry: &PatternRegistry, focus: TaskId) -> usize {
    let mut marked = 0;
    for id in timeline.ids() {
        let instance = &timeline[id];
        if instance.is_significant() || instance.boundary != Boundary::Begin {
            continue;
        }
        let Some(end) = instance.partner() else {
            continue;
        };
        if relevance(timeline, registry, focus, id) == Some(false) {
            continue;
        }
        let encloses = timeline
            .ids_between(id, end)
            .any(|inner| timeline[inner].is_significant());
        if encloses {
            marked += mark_significant(timeline, registry, focus, id);
        }
    }
    marked
}

/// Mark the pair `id` belongs to and everything that straddles it.
///
/// Unpaired or already significant instances are left alone, as are pairs
/// whose kind reports both ends as unrelated to the focus task. Returns
/// the number of instances marked.
pub fn mark_significant(
    timeline: &mut Timeline,
    registry: &PatternRegistry,
    focus: TaskId,
    id: InstanceId,
) -> usize {
    let mut marked = 0;
    let mut pending = vec![id];

    while let Some(id) = pending.pop() {
        let Some((begin, end)) = timeline.pair(id) else {
            continue;
        };
        if timeline[begin].is_significant() {
            continue;
        }
        if relevance(timeline, registry, focus, begin) == Some(false)
            && relevance(timeline, registry, focus, end) == Some(false)
        {
            continue;
        }

        timeline.set_significant(begin);
        timeline.set_significant(end);
        marked += 2;

        let from = timeline[begin].timestamp;
        let to = timeline[end].timestamp;
        for inner in timeline.ids_between(begin, end) {
            let Some(partner) = timeline[inner].partner() else {
                continue;
            };
            let at = timeline[partner].timestamp;
            if at > from && at < to {
                continue;
            }
            pending.push(inner);
        }
    }

    marked
}

fn relevance(
    timeline: &Timeline,
    registry: &PatternRegistry,
    focus: TaskId,
    id: InstanceId,
) -> Option<bool> {
    let instance = &timeline[id];
    registry
        .get(instance.pattern)?
        .is_relevant(focus, instance.payload())
}
