//! Component storage keyed by entity id

use std::collections::BTreeMap;

use super::EntityId;

/// Marker trait for components
pub trait Component: Send + Sync + 'static {}

/// Ordered storage for a single component type.
///
/// Iteration follows ascending entity id, which keeps world scans stable
/// between calls.
pub struct TypedComponentStorage<T: Component> {
    data: BTreeMap<EntityId, T>,
}

impl<T: Component> TypedComponentStorage<T> {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entity_id: EntityId, component: T) -> Option<T> {
        self.data.insert(entity_id, component)
    }

    pub fn remove(&mut self, entity_id: EntityId) -> Option<T> {
        self.data.remove(&entity_id)
    }

    pub fn get(&self, entity_id: EntityId) -> Option<&T> {
        self.data.get(&entity_id)
    }

    pub fn get_mut(&mut self, entity_id: EntityId) -> Option<&mut T> {
        self.data.get_mut(&entity_id)
    }

    pub fn has(&self, entity_id: EntityId) -> bool {
        self.data.contains_key(&entity_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.data.iter().map(|(id, comp)| (*id, comp))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.data.iter_mut().map(|(id, comp)| (*id, comp))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Component> Default for TypedComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}
