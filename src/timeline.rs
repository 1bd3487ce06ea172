//! Storage for matched boundary instances
//!
//! All instances live in one append-only arena in creation order, which is
//! also trace order. Instances refer to each other by [`InstanceId`], an
//! index into that arena, so partner links need no pointer bookkeeping.

use crate::pattern::{Boundary, Payload, TaskId};
use crate::registry::PatternId;
use crate::timestamp::Timestamp;
use std::any::Any;
use std::ops::Index;

/// Stable handle to an instance in a [`Timeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One matched boundary of a pattern occurrence
#[derive(Debug)]
pub struct Instance {
    pub timestamp: Timestamp,
    pub task: TaskId,
    pub task_name: String,
    pub boundary: Boundary,
    pub pattern: PatternId,
    /// Ordinal of the trace line that produced this instance
    pub line: u64,
    payload: Payload,
    partner: Option<InstanceId>,
    significant: bool,
    level: usize,
}

impl Instance {
    pub fn new(
        timestamp: Timestamp,
        task: TaskId,
        task_name: impl Into<String>,
        boundary: Boundary,
        pattern: PatternId,
        line: u64,
        payload: Payload,
    ) -> Self {
        Self {
            timestamp,
            task,
            task_name: task_name.into(),
            boundary,
            pattern,
            line,
            payload,
            partner: None,
            significant: false,
            level: 0,
        }
    }

    pub fn payload(&self) -> &dyn Any {
        &*self.payload
    }

    pub fn partner(&self) -> Option<InstanceId> {
        self.partner
    }

    pub fn is_paired(&self) -> bool {
        self.partner.is_some()
    }

    pub fn is_significant(&self) -> bool {
        self.significant
    }

    /// Nesting depth for rendering, 0 until levels are assigned
    pub fn level(&self) -> usize {
        self.level
    }
}

/// Chronological sequence of every instance ever created
#[derive(Debug, Default)]
pub struct Timeline {
    instances: Vec<Instance>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instance: Instance) -> InstanceId {
        self.instances.push(instance);
        InstanceId(self.instances.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id.0)
    }

    /// Instances with their ids, in chronological order
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances
            .iter()
            .enumerate()
            .map(|(index, instance)| (InstanceId(index), instance))
    }

    pub fn ids(&self) -> impl Iterator<Item = InstanceId> {
        (0..self.instances.len()).map(InstanceId)
    }

    /// Ids strictly between `first` and `last` in chronological order
    pub fn ids_between(&self, first: InstanceId, last: InstanceId) -> impl Iterator<Item = InstanceId> {
        (first.0 + 1..last.0).map(InstanceId)
    }

    /// `(begin, end)` of the pair `id` belongs to, `None` while unpaired
    pub fn pair(&self, id: InstanceId) -> Option<(InstanceId, InstanceId)> {
        let instance = self.get(id)?;
        let partner = instance.partner?;
        match instance.boundary {
            Boundary::Begin => Some((id, partner)),
            Boundary::End => Some((partner, id)),
        }
    }

    /// Make `begin` and `end` mutual partners.
    ///
    /// Links are set once: returns `false` and changes nothing if either
    /// side already has a partner.
    pub(crate) fn link(&mut self, begin: InstanceId, end: InstanceId) -> bool {
        if self[begin].partner.is_some() || self[end].partner.is_some() || begin == end {
            return false;
        }
        self.instances[begin.0].partner = Some(end);
        self.instances[end.0].partner = Some(begin);
        true
    }

    pub(crate) fn set_significant(&mut self, id: InstanceId) {
        self.instances[id.0].significant = true;
    }

    pub(crate) fn set_level(&mut self, id: InstanceId, level: usize) {
        self.instances[id.0].level = level;
    }
}

impl Index<InstanceId> for Timeline {
    type Output = Instance;

    fn index(&self, id: InstanceId) -> &Instance {
        &self.instances[id.0]
    }
}

/// Begin instances still waiting for their End, most recently opened first
#[derive(Debug, Default)]
pub struct OpenSet {
    // Newest at the back.
    stack: Vec<InstanceId>,
}

impl OpenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: InstanceId) {
        self.stack.push(id);
    }

    pub fn remove(&mut self, id: InstanceId) -> bool {
        match self.stack.iter().rposition(|&open| open == id) {
            Some(pos) => {
                self.stack.remove(pos);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn contains(&self, id: InstanceId) -> bool {
        self.stack.contains(&id)
    }

    /// Snapshot of the members, most recently opened first
    pub fn recent_first(&self) -> Vec<InstanceId> {
        self.stack.iter().rev().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
