//! Blob components and per-category tuning

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ecs::Component;

/// Minimum death animation length, in seconds.
pub const ANIMATION_TIME: f32 = 0.3;

/// Blob category. Decides which prefab and minimum-count rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobKind {
    Good,
    Bad,
}

impl BlobKind {
    pub const ALL: [BlobKind; 2] = [BlobKind::Good, BlobKind::Bad];

    pub fn as_str(self) -> &'static str {
        match self {
            BlobKind::Good => "good",
            BlobKind::Bad => "bad",
        }
    }
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a tracked creature
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub kind: BlobKind,
    pub prefab: String,
    /// Nominal movement speed, restored on enable.
    pub speed: f32,
    pub points: i32,
}

impl Component for Blob {}

/// Navigation agent driving a blob. Its speed is what gets frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct NavAgent {
    pub speed: f32,
}

impl NavAgent {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    pub fn is_stopped(&self) -> bool {
        self.speed == 0.0
    }
}

impl Component for NavAgent {}

/// Closed range of seconds (or metres) to draw from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min: f32,
    pub max: f32,
}

impl DurationRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn is_ordered(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

fn default_speed() -> f32 {
    4.0
}

fn default_untransformed_duration() -> DurationRange {
    DurationRange::new(5.0, 6.0)
}

fn default_transformed_duration() -> DurationRange {
    DurationRange::new(3.0, 4.0)
}

fn default_transformation_time() -> f32 {
    0.25
}

fn default_sight_range() -> f32 {
    4.0
}

fn default_patrol_radius() -> f32 {
    4.0
}

fn default_patrol_distance_threshold() -> f32 {
    0.25
}

fn default_patrol_wait_time() -> DurationRange {
    DurationRange::new(2.0, 4.0)
}

/// Tunables shared by every blob of one category.
///
/// Only `prefab`, `minimum`, `speed` and `points` are read by the population
/// controller; the rest are carried for the behaviour layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobProfile {
    pub prefab: String,
    #[serde(default)]
    pub minimum: usize,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub points: i32,
    #[serde(default = "default_untransformed_duration")]
    pub untransformed_duration: DurationRange,
    #[serde(default = "default_transformed_duration")]
    pub transformed_duration: DurationRange,
    #[serde(default = "default_transformation_time")]
    pub transformation_time: f32,
    #[serde(default = "default_sight_range")]
    pub sight_range: f32,
    #[serde(default = "default_patrol_radius")]
    pub patrol_radius: f32,
    #[serde(default = "default_patrol_distance_threshold")]
    pub patrol_distance_threshold: f32,
    #[serde(default = "default_patrol_wait_time")]
    pub patrol_wait_time: DurationRange,
}

impl BlobProfile {
    pub fn new(prefab: impl Into<String>, minimum: usize) -> Self {
        Self {
            prefab: prefab.into(),
            minimum,
            speed: default_speed(),
            points: 0,
            untransformed_duration: default_untransformed_duration(),
            transformed_duration: default_transformed_duration(),
            transformation_time: default_transformation_time(),
            sight_range: default_sight_range(),
            patrol_radius: default_patrol_radius(),
            patrol_distance_threshold: default_patrol_distance_threshold(),
            patrol_wait_time: default_patrol_wait_time(),
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_points(mut self, points: i32) -> Self {
        self.points = points;
        self
    }

    /// How long a blob stays in its current form before switching.
    pub fn transformation_interval<R: Rng + ?Sized>(&self, transformed: bool, rng: &mut R) -> f32 {
        if transformed {
            self.transformed_duration.sample(rng)
        } else {
            self.untransformed_duration.sample(rng)
        }
    }

    pub fn instantiate(&self, kind: BlobKind) -> (Blob, NavAgent) {
        let blob = Blob {
            kind,
            prefab: self.prefab.clone(),
            speed: self.speed,
            points: self.points,
        };
        (blob, NavAgent::new(self.speed))
    }
}

/// Death animation length: the effect's own duration, never shorter than [`ANIMATION_TIME`].
pub fn death_animation_duration(fx_duration: f32) -> f32 {
    if fx_duration >= ANIMATION_TIME {
        fx_duration
    } else {
        ANIMATION_TIME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_profile_defaults_from_yaml() {
        let profile: BlobProfile =
            serde_yaml::from_str("prefab: good_blob\nminimum: 30").expect("profile parses");
        assert_eq!(profile, BlobProfile::new("good_blob", 30));
        assert_eq!(profile.speed, 4.0);
        assert_eq!(profile.transformed_duration, DurationRange::new(3.0, 4.0));
    }

    #[test]
    fn test_transformation_interval_stays_in_range() {
        let profile = BlobProfile::new("good_blob", 1);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            let untransformed = profile.transformation_interval(false, &mut rng);
            assert!((5.0..=6.0).contains(&untransformed));
            let transformed = profile.transformation_interval(true, &mut rng);
            assert!((3.0..=4.0).contains(&transformed));
        }
    }

    #[test]
    fn test_degenerate_range_returns_min() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(DurationRange::new(2.0, 2.0).sample(&mut rng), 2.0);
        assert!(!DurationRange::new(3.0, 1.0).is_ordered());
    }

    #[test]
    fn test_death_animation_duration_floor() {
        assert_eq!(death_animation_duration(0.1), ANIMATION_TIME);
        assert_eq!(death_animation_duration(1.5), 1.5);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_yaml::to_string(&BlobKind::Bad).unwrap().trim(), "bad");
        assert_eq!(BlobKind::Good.to_string(), "good");
    }
}
