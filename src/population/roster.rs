use std::collections::HashSet;

use serde::Serialize;

use crate::blob::BlobKind;
use crate::ecs::Entity;

/// Authoritative list of tracked blobs.
///
/// Per-category views and counts are derived from the single ordered list,
/// so `count(kind) == subset(kind).len()` cannot drift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<(Entity, BlobKind)>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a scan, keeping scan order and dropping repeated handles.
    pub fn from_scan(scan: impl IntoIterator<Item = (Entity, BlobKind)>) -> Self {
        let mut seen = HashSet::new();
        let entries = scan
            .into_iter()
            .filter(|(entity, _)| seen.insert(*entity))
            .collect();
        Self { entries }
    }

    /// Append a blob. Returns false if it was already tracked.
    pub fn push(&mut self, entity: Entity, kind: BlobKind) -> bool {
        if self.contains(entity) {
            return false;
        }
        self.entries.push((entity, kind));
        true
    }

    /// Remove a blob, preserving the order of the rest.
    pub fn remove(&mut self, entity: Entity) -> Option<BlobKind> {
        let index = self.entries.iter().position(|(e, _)| *e == entity)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.iter().any(|(e, _)| *e == entity)
    }

    pub fn kind_of(&self, entity: Entity) -> Option<BlobKind> {
        self.entries
            .iter()
            .find(|(e, _)| *e == entity)
            .map(|(_, kind)| *kind)
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entries.iter().map(|(entity, _)| *entity)
    }

    pub fn subset(&self, kind: BlobKind) -> Vec<Entity> {
        self.entries
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(entity, _)| *entity)
            .collect()
    }

    pub fn count(&self, kind: BlobKind) -> usize {
        self.entries.iter().filter(|(_, k)| *k == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Point-in-time roster counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterSummary {
    pub good: usize,
    pub bad: usize,
    pub total: usize,
    pub good_minimum: usize,
    pub bad_minimum: usize,
    pub frozen: bool,
}
