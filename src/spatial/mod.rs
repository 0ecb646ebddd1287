//! World-space positions and spawn points

use serde::{Deserialize, Serialize};

use crate::ecs::Component;

/// Position in world space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    /// Origin, also the spawn fallback when no spawn points are configured.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Component for Position {}

impl From<[f32; 3]> for Position {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Predefined location eligible for placing new blobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub position: Position,
}

impl SpawnPoint {
    pub fn at(position: Position) -> Self {
        Self {
            label: None,
            position,
        }
    }

    pub fn labelled(label: impl Into<String>, position: Position) -> Self {
        Self {
            label: Some(label.into()),
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_point_yaml_is_flat() {
        let point: SpawnPoint = serde_yaml::from_str("{ label: gate, x: 1.0, y: 0.0, z: -2.5 }")
            .expect("spawn point parses");
        assert_eq!(point.label.as_deref(), Some("gate"));
        assert_eq!(point.position, Position::new(1.0, 0.0, -2.5));

        let unlabelled: SpawnPoint =
            serde_yaml::from_str("{ x: 4.0, y: 1.0, z: 0.0 }").expect("spawn point parses");
        assert_eq!(unlabelled, SpawnPoint::at(Position::new(4.0, 1.0, 0.0)));
    }
}
