//! Scenario configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blob::{BlobKind, BlobProfile, DurationRange};
use crate::ecs::World;
use crate::population::{PopulationSettings, SpawnSelection};
use crate::rng::RngManager;
use crate::spatial::{Position, SpawnPoint};

fn default_ticks() -> u64 {
    600
}

fn default_destroy_chance() -> f64 {
    0.02
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Everything a run needs: blob tuning, spawn layout and the scripted game around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub show_debug: bool,
    #[serde(default)]
    pub spawn_selection: SpawnSelection,
    #[serde(default)]
    pub spawn_points: Vec<SpawnPoint>,
    pub good: BlobProfile,
    pub bad: BlobProfile,
    #[serde(default)]
    pub initial: InitialPopulation,
    #[serde(default)]
    pub attrition: AttritionConfig,
    /// Tick at which the round ends and every blob freezes.
    #[serde(default)]
    pub round_ticks: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Blobs placed before the first tick. Unset counts fall back to the minimums.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitialPopulation {
    #[serde(default)]
    pub good: Option<usize>,
    #[serde(default)]
    pub bad: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttritionConfig {
    /// Probability that any one blob is destroyed on a given tick.
    #[serde(default = "default_destroy_chance")]
    pub destroy_chance: f64,
}

impl Default for AttritionConfig {
    fn default() -> Self {
        Self {
            destroy_chance: default_destroy_chance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("destroy chance {0} is outside [0, 1]")]
    InvalidChance(f64),
    #[error("{kind} blob speed {speed} must be finite and non-negative")]
    InvalidSpeed { kind: BlobKind, speed: f32 },
    #[error("{kind} blob {field} has min greater than max")]
    InvertedRange { kind: BlobKind, field: &'static str },
    #[error("{0} blob prefab id is empty")]
    EmptyPrefab(BlobKind),
    #[error("good and bad blobs share prefab id '{0}'")]
    SharedPrefab(String),
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text).context("Failed to parse scenario")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let chance = self.attrition.destroy_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(ConfigError::InvalidChance(chance));
        }
        for kind in BlobKind::ALL {
            let profile = self.profile(kind);
            if profile.prefab.trim().is_empty() {
                return Err(ConfigError::EmptyPrefab(kind));
            }
            if !profile.speed.is_finite() || profile.speed < 0.0 {
                return Err(ConfigError::InvalidSpeed {
                    kind,
                    speed: profile.speed,
                });
            }
            let ranges: [(&'static str, DurationRange); 3] = [
                ("untransformed_duration", profile.untransformed_duration),
                ("transformed_duration", profile.transformed_duration),
                ("patrol_wait_time", profile.patrol_wait_time),
            ];
            for (field, range) in ranges {
                if !range.is_ordered() {
                    return Err(ConfigError::InvertedRange { kind, field });
                }
            }
        }
        if self.good.prefab == self.bad.prefab {
            return Err(ConfigError::SharedPrefab(self.good.prefab.clone()));
        }
        Ok(())
    }

    pub fn profile(&self, kind: BlobKind) -> &BlobProfile {
        match kind {
            BlobKind::Good => &self.good,
            BlobKind::Bad => &self.bad,
        }
    }

    pub fn initial_count(&self, kind: BlobKind) -> usize {
        let configured = match kind {
            BlobKind::Good => self.initial.good,
            BlobKind::Bad => self.initial.bad,
        };
        configured.unwrap_or(self.profile(kind).minimum)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or_else(default_ticks)
    }

    pub fn population_settings(&self) -> PopulationSettings {
        PopulationSettings::new(self.good.clone(), self.bad.clone())
            .with_spawn_points(self.spawn_points.clone())
            .with_spawn_selection(self.spawn_selection)
            .with_debug(self.show_debug)
    }

    /// Populate a fresh world with the initial blobs, scattered over the spawn points.
    pub fn build_world(&self) -> World {
        let mut rng = ChaCha8Rng::seed_from_u64(RngManager::new(self.seed).seed_for("world"));
        let mut world = World::new();
        for kind in BlobKind::ALL {
            for _ in 0..self.initial_count(kind) {
                let position = self
                    .spawn_points
                    .choose(&mut rng)
                    .map(|point| point.position)
                    .unwrap_or(Position::ZERO);
                world.spawn_blob(kind, self.profile(kind), position);
            }
        }
        world
    }

    /// Built-in copy of `scenarios/meadow.yaml`
    pub fn meadow() -> Self {
        Self {
            name: "meadow".to_string(),
            description: Some("Default blob meadow".to_string()),
            seed: 7,
            ticks: Some(600),
            show_debug: false,
            spawn_selection: SpawnSelection::Uniform,
            spawn_points: vec![
                SpawnPoint::labelled("north", Position::new(0.0, 0.0, 20.0)),
                SpawnPoint::labelled("east", Position::new(20.0, 0.0, 0.0)),
                SpawnPoint::labelled("south", Position::new(0.0, 0.0, -20.0)),
                SpawnPoint::labelled("west", Position::new(-20.0, 0.0, 0.0)),
            ],
            good: BlobProfile::new("good_blob", 30).with_points(10),
            bad: BlobProfile::new("bad_blob", 15).with_speed(4.5).with_points(-25),
            initial: InitialPopulation::default(),
            attrition: AttritionConfig::default(),
            round_ticks: Some(480),
            logging: LoggingConfig::default(),
        }
    }
}

/// Resolves scenario paths against a base directory.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Config> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meadow_config() {
        let config = Config::meadow();

        assert_eq!(config.name, "meadow");
        assert_eq!(config.seed, 7);
        assert_eq!(config.spawn_points.len(), 4);
        assert_eq!(config.initial_count(BlobKind::Good), 30);
        assert_eq!(config.initial_count(BlobKind::Bad), 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::meadow();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("meadow.yaml");

        config.to_yaml(&path).unwrap();
        let loaded = ConfigLoader::new(temp_dir.path()).load("meadow.yaml").unwrap();

        assert_eq!(config.name, loaded.name);
        assert_eq!(config.seed, loaded.seed);
        assert_eq!(config.spawn_points, loaded.spawn_points);
        assert_eq!(config.bad, loaded.bad);
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = Config::from_yaml_str(
            "name: tiny\nseed: 3\ngood: { prefab: g, minimum: 2 }\nbad: { prefab: b }\n",
        )
        .unwrap();

        assert!(config.spawn_points.is_empty());
        assert_eq!(config.spawn_selection, SpawnSelection::Uniform);
        assert_eq!(config.attrition.destroy_chance, 0.02);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.ticks(None), 600);
        assert_eq!(config.ticks(Some(5)), 5);
        assert_eq!(config.initial_count(BlobKind::Bad), 0);
    }

    #[test]
    fn test_spawn_selection_parses_snake_case() {
        let config = Config::from_yaml_str(concat!(
            "name: t\nseed: 1\nspawn_selection: exclude_last\n",
            "good: { prefab: g }\nbad: { prefab: b }\n",
        ))
        .unwrap();
        assert_eq!(config.spawn_selection, SpawnSelection::ExcludeLast);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::meadow();
        config.attrition.destroy_chance = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::InvalidChance(1.5)));

        let mut config = Config::meadow();
        config.bad.speed = -1.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidSpeed {
                kind: BlobKind::Bad,
                speed: -1.0
            })
        );

        let mut config = Config::meadow();
        config.good.transformed_duration = DurationRange::new(4.0, 3.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedRange {
                kind: BlobKind::Good,
                field: "transformed_duration"
            })
        );

        let mut config = Config::meadow();
        config.bad.prefab = config.good.prefab.clone();
        assert_eq!(
            config.validate(),
            Err(ConfigError::SharedPrefab("good_blob".into()))
        );
    }

    #[test]
    fn test_build_world_is_deterministic() {
        let config = Config::meadow();
        let a = config.build_world();
        let b = config.build_world();

        assert_eq!(a.blob_count(), 45);
        assert_eq!(a.count_kind(BlobKind::Bad), 15);
        let positions_a: Vec<_> = a.entities().into_iter().map(|e| a.position(e)).collect();
        let positions_b: Vec<_> = b.entities().into_iter().map(|e| b.position(e)).collect();
        assert_eq!(positions_a, positions_b);
        assert!(positions_a
            .iter()
            .flatten()
            .all(|p| config.spawn_points.iter().any(|s| s.position == *p)));
    }

    #[test]
    fn test_loader_reports_missing_file() {
        let err = ConfigLoader::new("/nonexistent").load("nope.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read scenario file"));
    }
}
