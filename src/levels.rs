//! Nesting levels for the diagram
//!
//! Each significant pair gets a column. A Begin takes the next free level,
//! its End gives it back; trailing levels are reclaimed as soon as every
//! pair above them has closed.

use crate::pattern::Boundary;
use crate::timeline::Timeline;

/// Which levels currently hold an open pair
///
/// Level 0 is the root and is always active.
#[derive(Debug, Clone)]
pub struct LevelTable {
    active: Vec<bool>,
    next_level: usize,
    deepest: usize,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelTable {
    pub fn new() -> Self {
        Self {
            active: vec![true],
            next_level: 1,
            deepest: 0,
        }
    }

    /// Level the next Begin would get
    pub fn next_level(&self) -> usize {
        self.next_level
    }

    /// One past the deepest level handed out so far
    pub fn deepest(&self) -> usize {
        self.deepest
    }

    pub fn is_active(&self, level: usize) -> bool {
        self.active.get(level).copied().unwrap_or(false)
    }

    pub fn set_active(&mut self, level: usize, active: bool) {
        if level >= self.active.len() {
            self.active.resize(level + 1, false);
        }
        self.active[level] = active;
    }

    /// Take the next level for a Begin
    pub fn open(&mut self) -> usize {
        let level = self.next_level;
        self.set_active(level, true);
        self.next_level += 1;
        self.deepest = self.deepest.max(self.next_level);
        level
    }

    /// Release `level` for an End
    ///
    /// Levels above a still active one stay reserved; once the topmost
    /// level closes, every inactive level below it is reclaimed too.
    pub fn close(&mut self, level: usize) {
        self.set_active(level, false);
        if self.next_level - 1 > level {
            return;
        }
        while self.next_level > 1 && !self.is_active(self.next_level - 1) {
            self.next_level -= 1;
        }
    }
}

/// Assign a level to every significant instance.
///
/// Returns one past the deepest level in use, 0 if nothing is significant.
pub fn assign_levels(timeline: &mut Timeline) -> usize {
    let mut table = LevelTable::new();

    for id in timeline.ids() {
        let instance = &timeline[id];
        if !instance.is_significant() {
            continue;
        }
        match instance.boundary {
            Boundary::Begin => {
                let level = table.open();
                timeline.set_level(id, level);
            }
            Boundary::End => {
                let Some(begin) = instance.partner() else {
                    continue;
                };
                let level = timeline[begin].level();
                timeline.set_level(id, level);
                table.close(level);
            }
        }
    }

    table.deepest()
}
