//! Population controller
//!
//! Keeps the good and bad blob populations topped up: every destroyed blob
//! is replaced, synchronously, by a fresh one of the same kind at a random
//! spawn point. Also freezes and unfreezes every tracked blob at once.

mod roster;

use log::{debug, info, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blob::{BlobKind, BlobProfile, NavAgent};
use crate::ecs::{Entity, World};
use crate::spatial::{Position, SpawnPoint};

pub use roster::{Roster, RosterSummary};

/// Recoverable conditions. Neither ever reaches a caller; both are logged and absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopulationError {
    #[error("blob {0} no longer exists")]
    StaleReference(Entity),
    #[error("no {0} configured")]
    MissingConfiguration(&'static str),
}

/// How a spawn point index is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnSelection {
    /// Every configured point is eligible.
    #[default]
    Uniform,
    /// Draw from `0..len - 1`, never picking the last point unless it is the only one.
    ExcludeLast,
}

impl SpawnSelection {
    fn pick<R: Rng + ?Sized>(self, len: usize, rng: &mut R) -> usize {
        let upper = match self {
            SpawnSelection::Uniform => len,
            SpawnSelection::ExcludeLast => len.saturating_sub(1).max(1),
        };
        rng.gen_range(0..upper)
    }
}

/// The host-side collaborator the controller scans, steers and spawns into.
pub trait BlobEnvironment {
    /// Every live blob with its kind, in a stable order.
    fn scan_blobs(&self) -> Vec<(Entity, BlobKind)>;
    /// Configured speed for `entity`, if it still exists.
    fn nominal_speed(&self, entity: Entity) -> Option<f32>;
    fn agent_mut(&mut self, entity: Entity) -> Option<&mut NavAgent>;
    /// Fire-and-forget instantiation. The returned handle is not inspected.
    fn spawn(&mut self, kind: BlobKind, profile: &BlobProfile, position: Position) -> Entity;
}

impl BlobEnvironment for World {
    fn scan_blobs(&self) -> Vec<(Entity, BlobKind)> {
        self.blobs().map(|(entity, blob)| (entity, blob.kind)).collect()
    }

    fn nominal_speed(&self, entity: Entity) -> Option<f32> {
        self.blob(entity).map(|blob| blob.speed)
    }

    fn agent_mut(&mut self, entity: Entity) -> Option<&mut NavAgent> {
        World::agent_mut(self, entity)
    }

    fn spawn(&mut self, kind: BlobKind, profile: &BlobProfile, position: Position) -> Entity {
        self.spawn_blob(kind, profile, position)
    }
}

#[derive(Debug, Clone)]
pub struct PopulationSettings {
    pub good: BlobProfile,
    pub bad: BlobProfile,
    pub spawn_points: Vec<SpawnPoint>,
    pub spawn_selection: SpawnSelection,
    pub show_debug: bool,
}

impl PopulationSettings {
    pub fn new(good: BlobProfile, bad: BlobProfile) -> Self {
        Self {
            good,
            bad,
            spawn_points: Vec::new(),
            spawn_selection: SpawnSelection::default(),
            show_debug: false,
        }
    }

    pub fn with_spawn_points(mut self, spawn_points: Vec<SpawnPoint>) -> Self {
        self.spawn_points = spawn_points;
        self
    }

    pub fn with_spawn_selection(mut self, selection: SpawnSelection) -> Self {
        self.spawn_selection = selection;
        self
    }

    pub fn with_debug(mut self, show_debug: bool) -> Self {
        self.show_debug = show_debug;
        self
    }

    pub fn profile(&self, kind: BlobKind) -> &BlobProfile {
        match kind {
            BlobKind::Good => &self.good,
            BlobKind::Bad => &self.bad,
        }
    }
}

#[derive(Clone, Copy)]
enum Speed {
    Stop,
    Nominal,
}

pub struct PopulationController {
    settings: PopulationSettings,
    roster: Roster,
    rng: ChaCha8Rng,
    frozen: bool,
}

impl PopulationController {
    /// Construct and run the initial scan.
    pub fn init<E: BlobEnvironment + ?Sized>(
        settings: PopulationSettings,
        seed: u64,
        env: &E,
    ) -> Self {
        let mut controller = Self {
            settings,
            roster: Roster::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            frozen: false,
        };
        controller.rebuild(env);
        controller
    }

    /// Replace the roster with a full scan of `env`.
    pub fn rebuild<E: BlobEnvironment + ?Sized>(&mut self, env: &E) {
        self.roster = Roster::from_scan(env.scan_blobs());
        debug!(
            "roster rebuilt: {} good, {} bad",
            self.roster.count(BlobKind::Good),
            self.roster.count(BlobKind::Bad)
        );
    }

    /// Stop every tracked blob. Returns how many agents were actually stopped.
    pub fn disable_all<E: BlobEnvironment + ?Sized>(&mut self, env: &mut E) -> usize {
        self.frozen = true;
        self.apply_speed(env, Speed::Stop)
    }

    /// Restore every tracked blob to its nominal speed.
    pub fn enable_all<E: BlobEnvironment + ?Sized>(&mut self, env: &mut E) -> usize {
        self.frozen = false;
        self.apply_speed(env, Speed::Nominal)
    }

    pub fn on_game_over<E: BlobEnvironment + ?Sized>(&mut self, env: &mut E) -> usize {
        self.report(format_args!("game over, freezing {} blobs", self.roster.len()));
        self.disable_all(env)
    }

    /// Drop `entity` from the roster and spawn its replacement.
    ///
    /// Unknown entities are ignored and `None` is returned. So is a replacement
    /// handle the roster already tracks.
    pub fn on_entity_destroyed<E: BlobEnvironment + ?Sized>(
        &mut self,
        env: &mut E,
        entity: Entity,
        kind: BlobKind,
    ) -> Option<Entity> {
        let Some(tracked) = self.roster.remove(entity) else {
            trace!("destroy notification for untracked blob {entity} ignored");
            return None;
        };
        if tracked != kind {
            warn!("blob {entity} tracked as {tracked} but reported destroyed as {kind}");
        }
        self.report(format_args!("{kind} blob {entity} destroyed"));

        let position = self.pick_spawn_position();
        let spawned = env.spawn(kind, self.settings.profile(kind), position);
        if !self.roster.push(spawned, kind) {
            warn!("replacement {spawned} for {kind} blob {entity} is already tracked");
            return None;
        }
        if self.frozen {
            if let Err(err) = set_speed(env, spawned, Speed::Stop) {
                trace!("{err}, replacement left moving");
            }
        }
        self.report(format_args!(
            "spawned {kind} blob {spawned} at ({:.2}, {:.2}, {:.2})",
            position.x, position.y, position.z
        ));
        Some(spawned)
    }

    /// Random spawn location. Falls back to the origin when none are configured.
    pub fn pick_spawn_position(&mut self) -> Position {
        match self.try_pick_spawn_position() {
            Ok(position) => position,
            Err(err) => {
                warn!("{err}, spawning at origin");
                Position::ZERO
            }
        }
    }

    fn try_pick_spawn_position(&mut self) -> Result<Position, PopulationError> {
        let points = &self.settings.spawn_points;
        if points.is_empty() {
            return Err(PopulationError::MissingConfiguration("spawn points"));
        }
        let index = self.settings.spawn_selection.pick(points.len(), &mut self.rng);
        points
            .get(index)
            .map(|point| point.position)
            .ok_or(PopulationError::MissingConfiguration("spawn points"))
    }

    fn apply_speed<E: BlobEnvironment + ?Sized>(&self, env: &mut E, speed: Speed) -> usize {
        let mut touched = 0;
        for entity in self.roster.entities() {
            match set_speed(env, entity, speed) {
                Ok(()) => touched += 1,
                Err(err) => trace!("{err}, skipped"),
            }
        }
        touched
    }

    fn report(&self, message: std::fmt::Arguments<'_>) {
        if self.settings.show_debug {
            info!("{message}");
        } else {
            debug!("{message}");
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn count(&self, kind: BlobKind) -> usize {
        self.roster.count(kind)
    }

    pub fn subset(&self, kind: BlobKind) -> Vec<Entity> {
        self.roster.subset(kind)
    }

    pub fn minimum(&self, kind: BlobKind) -> usize {
        self.settings.profile(kind).minimum
    }

    /// How far `kind` sits below its configured minimum. Not backfilled automatically.
    pub fn deficit(&self, kind: BlobKind) -> usize {
        self.minimum(kind).saturating_sub(self.count(kind))
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn settings(&self) -> &PopulationSettings {
        &self.settings
    }

    pub fn summary(&self) -> RosterSummary {
        RosterSummary {
            good: self.count(BlobKind::Good),
            bad: self.count(BlobKind::Bad),
            total: self.roster.len(),
            good_minimum: self.minimum(BlobKind::Good),
            bad_minimum: self.minimum(BlobKind::Bad),
            frozen: self.frozen,
        }
    }

    /// End of the controller's scope.
    pub fn teardown(self) -> RosterSummary {
        let summary = self.summary();
        info!(
            "population controller torn down with {} good / {} bad blobs",
            summary.good, summary.bad
        );
        summary
    }
}

fn set_speed<E: BlobEnvironment + ?Sized>(
    env: &mut E,
    entity: Entity,
    speed: Speed,
) -> Result<(), PopulationError> {
    let target = match speed {
        Speed::Stop => 0.0,
        Speed::Nominal => env
            .nominal_speed(entity)
            .ok_or(PopulationError::StaleReference(entity))?,
    };
    let agent = env
        .agent_mut(entity)
        .ok_or(PopulationError::StaleReference(entity))?;
    agent.speed = target;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PopulationSettings {
        PopulationSettings::new(
            BlobProfile::new("good_blob", 2).with_speed(4.0),
            BlobProfile::new("bad_blob", 1).with_speed(6.0),
        )
        .with_spawn_points(vec![
            SpawnPoint::at(Position::new(10.0, 0.0, 0.0)),
            SpawnPoint::at(Position::new(-10.0, 0.0, 0.0)),
        ])
    }

    fn seeded_world(good: usize, bad: usize) -> World {
        let s = settings();
        let mut world = World::new();
        for _ in 0..good {
            world.spawn_blob(BlobKind::Good, &s.good, Position::ZERO);
        }
        for _ in 0..bad {
            world.spawn_blob(BlobKind::Bad, &s.bad, Position::ZERO);
        }
        world
    }

    fn assert_counts_consistent(controller: &PopulationController) {
        let good = controller.count(BlobKind::Good);
        let bad = controller.count(BlobKind::Bad);
        assert_eq!(good, controller.subset(BlobKind::Good).len());
        assert_eq!(bad, controller.subset(BlobKind::Bad).len());
        assert_eq!(good + bad, controller.roster().len());
    }

    #[test]
    fn test_init_scans_world() {
        let world = seeded_world(3, 2);
        let controller = PopulationController::init(settings(), 1, &world);
        assert_eq!(controller.count(BlobKind::Good), 3);
        assert_eq!(controller.count(BlobKind::Bad), 2);
        assert_counts_consistent(&controller);
    }

    #[test]
    fn test_empty_world_gives_empty_roster() {
        let world = World::new();
        let controller = PopulationController::init(settings(), 1, &world);
        assert!(controller.roster().is_empty());
        assert_eq!(controller.count(BlobKind::Good), 0);
        assert_eq!(controller.deficit(BlobKind::Good), 2);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let world = seeded_world(4, 3);
        let mut controller = PopulationController::init(settings(), 1, &world);
        let first = controller.roster().clone();
        controller.rebuild(&world);
        assert_eq!(controller.roster(), &first);
    }

    #[test]
    fn test_rebuild_replaces_rather_than_merges() {
        let mut world = seeded_world(2, 1);
        let mut controller = PopulationController::init(settings(), 1, &world);
        let gone = controller.subset(BlobKind::Good)[0];
        world.despawn(gone);
        controller.rebuild(&world);
        assert!(!controller.roster().contains(gone));
        assert_eq!(controller.roster().len(), 2);
    }

    #[test]
    fn test_destroy_replaces_with_same_kind() {
        let mut world = seeded_world(2, 1);
        let mut controller = PopulationController::init(settings(), 5, &world);
        let before = controller.roster().len();
        let g1 = controller.subset(BlobKind::Good)[0];

        world.despawn(g1);
        let g3 = controller
            .on_entity_destroyed(&mut world, g1, BlobKind::Good)
            .expect("replacement spawned");

        assert_eq!(controller.roster().len(), before);
        assert!(!controller.roster().contains(g1));
        assert_eq!(controller.roster().kind_of(g3), Some(BlobKind::Good));
        assert_eq!(controller.count(BlobKind::Good), 2);
        assert_eq!(controller.count(BlobKind::Bad), 1);
        assert_eq!(world.blob(g3).map(|b| b.prefab.as_str()), Some("good_blob"));
        assert_counts_consistent(&controller);
    }

    #[test]
    fn test_destroy_of_untracked_blob_is_noop() {
        let mut world = seeded_world(1, 1);
        let mut controller = PopulationController::init(settings(), 5, &world);
        let snapshot = controller.roster().clone();
        let stranger = Entity::new(99, 0);

        assert_eq!(
            controller.on_entity_destroyed(&mut world, stranger, BlobKind::Bad),
            None
        );
        assert_eq!(controller.roster(), &snapshot);
        assert_eq!(world.blob_count(), 2);
    }

    #[test]
    fn test_repeated_destroy_notification_is_noop() {
        let mut world = seeded_world(1, 1);
        let mut controller = PopulationController::init(settings(), 5, &world);
        let b1 = controller.subset(BlobKind::Bad)[0];
        world.despawn(b1);

        assert!(controller.on_entity_destroyed(&mut world, b1, BlobKind::Bad).is_some());
        assert!(controller.on_entity_destroyed(&mut world, b1, BlobKind::Bad).is_none());
        assert_eq!(controller.count(BlobKind::Bad), 1);
    }

    #[test]
    fn test_disable_then_enable_restores_speed() {
        let mut world = seeded_world(2, 2);
        let mut controller = PopulationController::init(settings(), 1, &world);
        let before: Vec<f32> = world
            .entities()
            .into_iter()
            .map(|e| world.agent(e).unwrap().speed)
            .collect();

        assert_eq!(controller.disable_all(&mut world), 4);
        assert!(controller.is_frozen());
        for entity in world.entities() {
            assert!(world.agent(entity).unwrap().is_stopped());
        }

        assert_eq!(controller.enable_all(&mut world), 4);
        let after: Vec<f32> = world
            .entities()
            .into_iter()
            .map(|e| world.agent(e).unwrap().speed)
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_disable_skips_stale_entities() {
        let mut world = seeded_world(3, 0);
        let mut controller = PopulationController::init(settings(), 1, &world);
        let victims = controller.subset(BlobKind::Good);
        world.despawn(victims[0]);
        world.remove_agent(victims[1]);

        assert_eq!(controller.disable_all(&mut world), 1);
        assert_eq!(controller.enable_all(&mut world), 1);
        assert_eq!(world.agent(victims[2]).unwrap().speed, 4.0);
    }

    #[test]
    fn test_replacement_spawned_while_frozen_stays_frozen() {
        let mut world = seeded_world(1, 0);
        let mut controller = PopulationController::init(settings(), 1, &world);
        controller.on_game_over(&mut world);

        let victim = controller.subset(BlobKind::Good)[0];
        world.despawn(victim);
        let spawned = controller
            .on_entity_destroyed(&mut world, victim, BlobKind::Good)
            .unwrap();
        assert!(world.agent(spawned).unwrap().is_stopped());

        controller.enable_all(&mut world);
        assert_eq!(world.agent(spawned).unwrap().speed, 4.0);
    }

    #[test]
    fn test_no_spawn_points_falls_back_to_origin() {
        let mut world = seeded_world(0, 1);
        let mut controller = PopulationController::init(
            settings().with_spawn_points(Vec::new()),
            1,
            &world,
        );
        assert_eq!(controller.pick_spawn_position(), Position::ZERO);
        assert_eq!(
            controller.try_pick_spawn_position(),
            Err(PopulationError::MissingConfiguration("spawn points"))
        );

        let b1 = controller.subset(BlobKind::Bad)[0];
        world.despawn(b1);
        let spawned = controller
            .on_entity_destroyed(&mut world, b1, BlobKind::Bad)
            .unwrap();
        assert_eq!(world.position(spawned), Some(Position::ZERO));
    }

    #[test]
    fn test_uniform_selection_reaches_every_point() {
        let world = World::new();
        let mut controller = PopulationController::init(settings(), 3, &world);
        let picks: Vec<Position> = (0..64).map(|_| controller.pick_spawn_position()).collect();
        assert!(picks.contains(&Position::new(10.0, 0.0, 0.0)));
        assert!(picks.contains(&Position::new(-10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_exclude_last_selection_never_picks_last_point() {
        let world = World::new();
        let mut controller = PopulationController::init(
            settings().with_spawn_selection(SpawnSelection::ExcludeLast),
            3,
            &world,
        );
        for _ in 0..64 {
            assert_eq!(controller.pick_spawn_position(), Position::new(10.0, 0.0, 0.0));
        }
    }

    #[test]
    fn test_exclude_last_with_single_point_uses_it() {
        let world = World::new();
        let only = Position::new(1.0, 2.0, 3.0);
        let mut controller = PopulationController::init(
            settings()
                .with_spawn_points(vec![SpawnPoint::at(only)])
                .with_spawn_selection(SpawnSelection::ExcludeLast),
            3,
            &world,
        );
        assert_eq!(controller.pick_spawn_position(), only);
    }

    #[test]
    fn test_teardown_reports_final_counts() {
        let world = seeded_world(2, 1);
        let controller = PopulationController::init(settings(), 1, &world);
        let summary = controller.teardown();
        assert_eq!(summary.good, 2);
        assert_eq!(summary.bad, 1);
        assert_eq!(summary.total, 3);
        assert!(!summary.frozen);
    }
}
