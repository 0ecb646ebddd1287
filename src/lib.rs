pub mod blob;
pub mod config;
pub mod ecs;
pub mod engine;
pub mod leaderboard;
pub mod logging;
pub mod population;
pub mod rng;
pub mod spatial;
pub mod systems;

pub use config::{Config, ConfigLoader};
pub use engine::{Engine, EngineBuilder, EngineSettings, TickReport};
pub use population::{PopulationController, PopulationSettings, RosterSummary};
