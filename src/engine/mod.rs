//! Fixed-step tick runner
//!
//! Drives the external game logic (systems) against the world and the
//! population controller, one logical tick at a time. Everything inside a
//! tick runs synchronously in registration order.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;

use crate::{
    blob::BlobKind,
    ecs::World,
    population::PopulationController,
    rng::{RngManager, SystemRng},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            settings: self.settings,
            tick: 0,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
    tick: u64,
}

impl Engine {
    pub fn run(
        &mut self,
        world: &mut World,
        controller: &mut PopulationController,
        ticks: u64,
    ) -> Result<()> {
        self.run_with_hook(world, controller, ticks, |_| {})
    }

    /// Like [`Engine::run`], handing a [`TickReport`] to `hook` after every tick.
    pub fn run_with_hook<F>(
        &mut self,
        world: &mut World,
        controller: &mut PopulationController,
        ticks: u64,
        mut hook: F,
    ) -> Result<()>
    where
        F: FnMut(&TickReport),
    {
        for _ in 0..ticks {
            self.tick += 1;
            let ctx = SystemContext {
                tick: self.tick,
                scenario_name: &self.settings.scenario_name,
            };
            let mut totals = SystemOutcome::default();
            for system in &mut self.systems {
                let mut rng_stream = self.rng.stream(system.name());
                let outcome = system
                    .run(&ctx, world, controller, &mut rng_stream)
                    .with_context(|| {
                        format!("system '{}' failed on tick {}", system.name(), ctx.tick)
                    })?;
                totals.merge(outcome);
            }
            let report = TickReport {
                tick: self.tick,
                destroyed: totals.destroyed,
                spawned: totals.spawned,
                score: totals.score,
                good: controller.count(BlobKind::Good),
                bad: controller.count(BlobKind::Bad),
                roster_size: controller.roster().len(),
                frozen: controller.is_frozen(),
            };
            if report.destroyed > 0 {
                debug!(
                    "tick {}: {} destroyed, {} spawned, {} good / {} bad",
                    report.tick, report.destroyed, report.spawned, report.good, report.bad
                );
            }
            hook(&report);
        }
        Ok(())
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub scenario_name: &'a str,
}

/// What a system did during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemOutcome {
    pub destroyed: usize,
    pub spawned: usize,
    /// Points carried by the blobs destroyed this tick.
    pub score: i64,
}

impl SystemOutcome {
    fn merge(&mut self, other: SystemOutcome) {
        self.destroyed += other.destroyed;
        self.spawned += other.spawned;
        self.score += other.score;
    }
}

/// Roster state observed at the end of a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub destroyed: usize,
    pub spawned: usize,
    pub score: i64,
    pub good: usize,
    pub bad: usize,
    pub roster_size: usize,
    pub frozen: bool,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        controller: &mut PopulationController,
        rng: &mut SystemRng<'_>,
    ) -> Result<SystemOutcome>;
}
