use anyhow::Result;
use rand::Rng;

use crate::{
    blob::BlobKind,
    ecs::{Entity, World},
    engine::{System, SystemContext, SystemOutcome},
    population::PopulationController,
    rng::SystemRng,
};

/// Stand-in for the game logic that kills blobs.
///
/// Each live blob is destroyed with `destroy_chance` per tick, and the
/// controller is notified right after each despawn. Idle once blobs are frozen.
pub struct AttritionSystem {
    destroy_chance: f64,
}

impl AttritionSystem {
    pub fn new(destroy_chance: f64) -> Self {
        Self {
            destroy_chance: destroy_chance.clamp(0.0, 1.0),
        }
    }
}

impl Default for AttritionSystem {
    fn default() -> Self {
        Self::new(0.02)
    }
}

impl System for AttritionSystem {
    fn name(&self) -> &str {
        "attrition"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        controller: &mut PopulationController,
        rng: &mut SystemRng<'_>,
    ) -> Result<SystemOutcome> {
        let mut outcome = SystemOutcome::default();
        if controller.is_frozen() || self.destroy_chance == 0.0 {
            return Ok(outcome);
        }

        let victims: Vec<(Entity, BlobKind)> = world
            .blobs()
            .filter(|_| rng.gen_bool(self.destroy_chance))
            .map(|(entity, blob)| (entity, blob.kind))
            .collect();

        for (entity, kind) in victims {
            let points = world.blob(entity).map_or(0, |blob| i64::from(blob.points));
            if !world.despawn(entity) {
                continue;
            }
            outcome.destroyed += 1;
            outcome.score += points;
            if controller.on_entity_destroyed(world, entity, kind).is_some() {
                outcome.spawned += 1;
            }
        }
        Ok(outcome)
    }
}
