//! Registry of active pattern kinds

use crate::pattern::{ErasedPattern, Pattern, TaskId};
use crate::tracefs::{TracefsError, TracingContext};

/// Id assigned to a pattern kind at registration, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternId(u32);

impl PatternId {
    pub fn get(self) -> u32 {
        self.0
    }
}

struct Entry {
    id: PatternId,
    pattern: Box<dyn ErasedPattern>,
}

/// Ordered set of pattern kinds
///
/// Built once before any line is processed and iterated read-only
/// afterwards. Dropping the registry runs every kind's `unregister` hook.
#[derive(Default)]
pub struct PatternRegistry {
    entries: Vec<Entry>,
    last_id: u32,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern kind and return its id
    pub fn register<P: Pattern + 'static>(&mut self, pattern: P) -> PatternId {
        self.last_id += 1;
        let id = PatternId(self.last_id);
        tracing::debug!(id = id.0, name = Pattern::name(&pattern), "registered pattern");
        self.entries.push(Entry {
            id,
            pattern: Box::new(pattern),
        });
        id
    }

    /// Look up a registered kind
    ///
    /// Ids are only handed out by [`PatternRegistry::register`], so a miss
    /// means the id came from another registry.
    pub fn get(&self, id: PatternId) -> Option<&dyn ErasedPattern> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.pattern.as_ref())
    }

    /// Kinds in registration order
    pub fn iter(&self) -> impl Iterator<Item = (PatternId, &dyn ErasedPattern)> {
        self.entries
            .iter()
            .map(|entry| (entry.id, entry.pattern.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arm the trace events of every kind, in registration order
    pub fn enable_all(&self, ctx: &TracingContext, focus: TaskId) -> Result<(), TracefsError> {
        for (id, pattern) in self.iter() {
            tracing::debug!(id = id.0, name = pattern.name(), "enabling pattern");
            pattern.enable(ctx, focus)?;
        }
        Ok(())
    }
}

impl Drop for PatternRegistry {
    fn drop(&mut self) {
        for entry in self.entries.drain(..) {
            entry.pattern.unregister();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Boundary;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Probe {
        name: &'static str,
        unregistered: Rc<Cell<u32>>,
    }

    impl Pattern for Probe {
        type Payload = ();

        fn name(&self) -> &'static str {
            self.name
        }

        fn match_line(&self, _: &str, _: TaskId, _: Boundary, _: Option<&()>) -> Option<()> {
            None
        }

        fn unregister(&self) {
            self.unregistered.set(self.unregistered.get() + 1);
        }
    }

    fn probe(name: &'static str, counter: &Rc<Cell<u32>>) -> Probe {
        Probe {
            name,
            unregistered: Rc::clone(counter),
        }
    }

    #[test]
    fn test_ids_increase_in_registration_order() {
        let counter = Rc::new(Cell::new(0));
        let mut registry = PatternRegistry::new();
        let a = registry.register(probe("a", &counter));
        let b = registry.register(probe("b", &counter));

        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        let names: Vec<_> = registry.iter().map(|(_, p)| p.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(registry.get(b).map(|p| p.name()), Some("b"));
    }

    #[test]
    fn test_drop_runs_unregister_hooks() {
        let counter = Rc::new(Cell::new(0));
        {
            let mut registry = PatternRegistry::new();
            registry.register(probe("a", &counter));
            registry.register(probe("b", &counter));
            assert_eq!(registry.len(), 2);
        }
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_unknown_id_is_absent() {
        let counter = Rc::new(Cell::new(0));
        let mut other = PatternRegistry::new();
        other.register(probe("a", &counter));
        let foreign = other.register(probe("b", &counter));

        let registry = PatternRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get(foreign).is_none());
    }
}
