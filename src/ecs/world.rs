//! World - owns every live blob and its components

use super::entity::EntityAllocator;
use super::{Entity, TypedComponentStorage};
use crate::blob::{Blob, BlobKind, BlobProfile, NavAgent};
use crate::spatial::Position;

/// World holds all entities and their components.
///
/// Component lookups go through the allocator first, so a handle to a
/// despawned blob never reads another blob's data.
pub struct World {
    entities: EntityAllocator,
    blobs: TypedComponentStorage<Blob>,
    agents: TypedComponentStorage<NavAgent>,
    positions: TypedComponentStorage<Position>,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            blobs: TypedComponentStorage::new(),
            agents: TypedComponentStorage::new(),
            positions: TypedComponentStorage::new(),
        }
    }

    /// Instantiate a blob from `profile` at `position`
    pub fn spawn_blob(
        &mut self,
        kind: BlobKind,
        profile: &BlobProfile,
        position: Position,
    ) -> Entity {
        let entity = self.entities.allocate();
        let (blob, agent) = profile.instantiate(kind);
        self.blobs.insert(entity.id, blob);
        self.agents.insert(entity.id, agent);
        self.positions.insert(entity.id, position);
        entity
    }

    /// Destroy an entity and drop its components. Returns false if it was already gone.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.deallocate(entity) {
            return false;
        }
        self.blobs.remove(entity.id);
        self.agents.remove(entity.id);
        self.positions.remove(entity.id);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn blob(&self, entity: Entity) -> Option<&Blob> {
        self.live(entity)?;
        self.blobs.get(entity.id)
    }

    pub fn agent(&self, entity: Entity) -> Option<&NavAgent> {
        self.live(entity)?;
        self.agents.get(entity.id)
    }

    pub fn agent_mut(&mut self, entity: Entity) -> Option<&mut NavAgent> {
        self.live(entity)?;
        self.agents.get_mut(entity.id)
    }

    pub fn position(&self, entity: Entity) -> Option<Position> {
        self.live(entity)?;
        self.positions.get(entity.id).copied()
    }

    /// Detach the navigation agent, leaving the blob itself alive.
    pub fn remove_agent(&mut self, entity: Entity) -> Option<NavAgent> {
        self.live(entity)?;
        self.agents.remove(entity.id)
    }

    /// All live blobs in ascending id order
    pub fn blobs(&self) -> impl Iterator<Item = (Entity, &Blob)> + '_ {
        self.blobs.iter().map(|(id, blob)| (self.handle(id), blob))
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.blobs().map(|(entity, _)| entity).collect()
    }

    pub fn blob_count(&self) -> usize {
        self.entities.count()
    }

    pub fn count_kind(&self, kind: BlobKind) -> usize {
        self.blobs.iter().filter(|(_, blob)| blob.kind == kind).count()
    }

    fn live(&self, entity: Entity) -> Option<()> {
        self.entities.is_alive(entity).then_some(())
    }

    fn handle(&self, id: super::EntityId) -> Entity {
        // Storage only holds live ids, so the allocator's current generation is the right one.
        self.entities.current(id)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> BlobProfile {
        BlobProfile::new("good_blob", 1).with_speed(3.5)
    }

    #[test]
    fn test_world_blob_lifecycle() {
        let mut world = World::new();

        let e1 = world.spawn_blob(BlobKind::Good, &profile(), Position::ZERO);
        let e2 = world.spawn_blob(BlobKind::Bad, &profile(), Position::new(1.0, 0.0, 1.0));

        assert!(world.is_alive(e1));
        assert!(world.is_alive(e2));
        assert_eq!(world.blob_count(), 2);
        assert_eq!(world.count_kind(BlobKind::Good), 1);

        assert!(world.despawn(e1));
        assert!(!world.despawn(e1));
        assert!(!world.is_alive(e1));
        assert!(world.blob(e1).is_none());
        assert!(world.agent(e1).is_none());
        assert_eq!(world.blob_count(), 1);
        assert_eq!(world.position(e2), Some(Position::new(1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_spawned_components_follow_profile() {
        let mut world = World::new();
        let entity = world.spawn_blob(BlobKind::Bad, &profile().with_points(-5), Position::ZERO);

        let blob = world.blob(entity).unwrap();
        assert_eq!(blob.kind, BlobKind::Bad);
        assert_eq!(blob.prefab, "good_blob");
        assert_eq!(blob.points, -5);
        assert_eq!(world.agent(entity).unwrap().speed, 3.5);
    }

    #[test]
    fn test_stale_handle_does_not_reach_reused_slot() {
        let mut world = World::new();
        let old = world.spawn_blob(BlobKind::Good, &profile(), Position::ZERO);
        world.despawn(old);
        let new = world.spawn_blob(BlobKind::Bad, &profile(), Position::ZERO);

        assert_eq!(old.id, new.id);
        assert!(world.agent_mut(old).is_none());
        assert!(world.agent_mut(new).is_some());
        assert_eq!(world.entities(), vec![new]);
    }
}
