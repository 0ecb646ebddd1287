//! Entity handles and allocation

use serde::{Deserialize, Serialize};

/// Entity ID type - simple numeric ID
pub type EntityId = u64;

/// Generational entity handle.
///
/// A handle stays valid only while its slot carries the same generation.
/// Freed slots are reused with a bumped generation, so an old handle can
/// never alias the blob that took its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub generation: u32,
}

impl Entity {
    pub fn new(id: EntityId, generation: u32) -> Self {
        Self { id, generation }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.id, self.generation)
    }
}

/// Entity allocator
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_list: Vec<EntityId>,
    live: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    pub fn allocate(&mut self) -> Entity {
        let id = match self.free_list.pop() {
            Some(id) => id,
            None => {
                self.generations.push(0);
                self.alive.push(false);
                (self.generations.len() - 1) as EntityId
            }
        };
        let slot = id as usize;
        self.alive[slot] = true;
        self.live += 1;
        Entity::new(id, self.generations[slot])
    }

    /// Frees the slot behind `entity`. Returns false for stale or unknown handles.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = entity.id as usize;
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free_list.push(entity.id);
        self.live -= 1;
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.id as usize;
        matches!(
            (self.alive.get(slot), self.generations.get(slot)),
            (Some(true), Some(generation)) if *generation == entity.generation
        )
    }

    /// Handle for `id` at its current generation, whether or not it is alive.
    pub fn current(&self, id: EntityId) -> Entity {
        let generation = self.generations.get(id as usize).copied().unwrap_or(0);
        Entity::new(id, generation)
    }

    pub fn count(&self) -> usize {
        self.live
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_allocation() {
        let mut allocator = EntityAllocator::new();

        let e1 = allocator.allocate();
        assert_eq!(e1.id, 0);
        assert!(allocator.is_alive(e1));

        let e2 = allocator.allocate();
        assert_eq!(e2.id, 1);
        assert!(allocator.is_alive(e2));

        assert_eq!(allocator.count(), 2);
    }

    #[test]
    fn test_reused_slot_gets_new_generation() {
        let mut allocator = EntityAllocator::new();

        let e1 = allocator.allocate();
        let e2 = allocator.allocate();

        assert!(allocator.deallocate(e1));
        assert!(!allocator.is_alive(e1));
        assert!(allocator.is_alive(e2));
        assert_eq!(allocator.count(), 1);

        let e3 = allocator.allocate();
        assert_eq!(e3.id, e1.id);
        assert_eq!(e3.generation, 1);
        assert!(allocator.is_alive(e3));
        assert!(!allocator.is_alive(e1), "stale handle must not alias the reused slot");
    }

    #[test]
    fn test_double_free_is_rejected() {
        let mut allocator = EntityAllocator::new();
        let e1 = allocator.allocate();

        assert!(allocator.deallocate(e1));
        assert!(!allocator.deallocate(e1));
        assert_eq!(allocator.count(), 0);
    }

    #[test]
    fn test_unknown_handle_is_not_alive() {
        let allocator = EntityAllocator::new();
        assert!(!allocator.is_alive(Entity::new(42, 0)));
    }
}
