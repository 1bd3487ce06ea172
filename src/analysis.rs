//! Result of correlating a complete trace

use crate::engine::EngineStats;
use crate::levels::assign_levels;
use crate::pattern::TaskId;
use crate::registry::PatternRegistry;
use crate::render::render_text;
use crate::significance::propagate;
use crate::timeline::{InstanceId, OpenSet, Timeline};
use serde::Serialize;
use std::io::{self, Write};

/// Counters describing an analysed trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    #[serde(flatten)]
    pub engine: EngineStats,
    /// Begin instances that never found their End
    pub unmatched: u64,
    pub significant: u64,
    /// One past the deepest diagram level, 0 when nothing is significant
    pub depth: usize,
}

/// A fully correlated trace with significance and levels decided
pub struct Analysis {
    // Payloads in the timeline belong to the registry's kinds.
    timeline: Timeline,
    registry: PatternRegistry,
    focus: TaskId,
    stats: AnalysisStats,
}

impl Analysis {
    pub(crate) fn new(
        mut timeline: Timeline,
        open: OpenSet,
        registry: PatternRegistry,
        focus: TaskId,
        engine: EngineStats,
    ) -> Self {
        let significant = propagate(&mut timeline, &registry, focus);
        let depth = assign_levels(&mut timeline);

        let stats = AnalysisStats {
            engine,
            unmatched: open.len() as u64,
            significant: significant as u64,
            depth,
        };
        tracing::debug!(
            focus,
            instances = timeline.len(),
            unmatched = stats.unmatched,
            significant = stats.significant,
            depth,
            "analysis complete"
        );

        Self {
            timeline,
            registry,
            focus,
            stats,
        }
    }

    pub fn focus(&self) -> TaskId {
        self.focus
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn stats(&self) -> AnalysisStats {
        self.stats
    }

    pub fn depth(&self) -> usize {
        self.stats.depth
    }

    /// Significant `(begin, end)` pairs ordered by their Begin
    pub fn significant_pairs(&self) -> impl Iterator<Item = (InstanceId, InstanceId)> + '_ {
        self.timeline.iter().filter_map(|(id, instance)| {
            if !instance.is_significant() {
                return None;
            }
            self.timeline
                .pair(id)
                .filter(|&(begin, _)| begin == id)
        })
    }

    /// Take the analysed timeline and the kinds its payloads belong to
    pub fn into_parts(self) -> (Timeline, PatternRegistry) {
        (self.timeline, self.registry)
    }

    /// Write the nested diagram of significant instances
    pub fn render_text<W: Write>(&self, out: &mut W, color: bool) -> io::Result<()> {
        render_text(self, out, color)
    }
}
