use anyhow::Result;
use log::info;

use crate::{
    ecs::World,
    engine::{System, SystemContext, SystemOutcome},
    population::PopulationController,
    rng::SystemRng,
};

/// Ends the round at a fixed tick by freezing every blob.
pub struct RoundTimerSystem {
    round_ticks: Option<u64>,
    finished: bool,
}

impl RoundTimerSystem {
    pub fn new(round_ticks: Option<u64>) -> Self {
        Self {
            round_ticks,
            finished: false,
        }
    }
}

impl System for RoundTimerSystem {
    fn name(&self) -> &str {
        "round_timer"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        controller: &mut PopulationController,
        _rng: &mut SystemRng<'_>,
    ) -> Result<SystemOutcome> {
        let Some(round_ticks) = self.round_ticks else {
            return Ok(SystemOutcome::default());
        };
        if !self.finished && ctx.tick >= round_ticks {
            self.finished = true;
            let frozen = controller.on_game_over(world);
            info!(
                "round over in '{}' at tick {}: {} blobs frozen",
                ctx.scenario_name, ctx.tick, frozen
            );
        }
        Ok(SystemOutcome::default())
    }
}
