//! Minimal entity store for blobs.
//!
//! Generational handles plus ordered per-type component storage.

pub mod component;
pub mod entity;
pub mod world;

pub use component::{Component, TypedComponentStorage};
pub use entity::{Entity, EntityId};
pub use world::World;
