use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use blobkeeper::{
    blob::BlobKind,
    config::ConfigLoader,
    engine::{EngineBuilder, EngineSettings},
    leaderboard::{LeaderboardSettings, LeaderboardTool, MemoryLeaderboard},
    logging,
    population::{PopulationController, RosterSummary},
    rng::RngManager,
    systems::{AttritionSystem, RoundTimerSystem},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Blob population runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/meadow.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter used when RUST_LOG is unset (defaults to the scenario's level)
    #[arg(long)]
    log_level: Option<String>,

    /// Player name to file the run's score under
    #[arg(long)]
    player: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    scenario: String,
    seed: u64,
    ticks: u64,
    destroyed: usize,
    spawned: usize,
    score: i64,
    lowest_good: usize,
    lowest_bad: usize,
    roster: RosterSummary,
    rank: Option<u32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ConfigLoader::new(".");
    let mut config = loader.load(&cli.scenario)?;
    logging::init(cli.log_level.as_deref().unwrap_or(&config.logging.level));

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    let ticks = config.ticks(cli.ticks);
    let rng = RngManager::new(config.seed);

    let mut world = config.build_world();
    let mut controller =
        PopulationController::init(config.population_settings(), rng.seed_for("spawn"), &world);

    let settings = EngineSettings {
        scenario_name: config.name.clone(),
        seed: config.seed,
    };
    let mut engine = EngineBuilder::new(settings)
        .with_system(AttritionSystem::new(config.attrition.destroy_chance))
        .with_system(RoundTimerSystem::new(config.round_ticks))
        .build();

    let mut destroyed = 0;
    let mut spawned = 0;
    let mut score = 0;
    let mut lowest_good = controller.count(BlobKind::Good);
    let mut lowest_bad = controller.count(BlobKind::Bad);
    engine.run_with_hook(&mut world, &mut controller, ticks, |report| {
        destroyed += report.destroyed;
        spawned += report.spawned;
        score += report.score;
        lowest_good = lowest_good.min(report.good);
        lowest_bad = lowest_bad.min(report.bad);
    })?;
    let roster = controller.teardown();

    let board = LeaderboardTool::new(
        MemoryLeaderboard::new(),
        LeaderboardSettings {
            show_debug: config.show_debug,
            ..LeaderboardSettings::default()
        },
    );
    board.start();
    if let Some(player) = cli.player.as_deref() {
        board.update_player_name(player);
    }
    board.submit_score(score);
    board.refresh_scores_around_member();
    let member_id = board.member_id();
    let rank = board
        .members()
        .into_iter()
        .find(|member| member.member_id == member_id)
        .map(|member| member.rank);

    let summary = RunSummary {
        scenario: config.name.clone(),
        seed: config.seed,
        ticks,
        destroyed,
        spawned,
        score,
        lowest_good,
        lowest_bad,
        roster,
        rank,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Scenario '{}' ran {} ticks (seed {}). Destroyed {}, respawned {}, score {}.",
            summary.scenario,
            summary.ticks,
            summary.seed,
            summary.destroyed,
            summary.spawned,
            summary.score
        );
        println!(
            "Final roster: {} good (min {}), {} bad (min {}){}",
            summary.roster.good,
            summary.roster.good_minimum,
            summary.roster.bad,
            summary.roster.bad_minimum,
            if summary.roster.frozen { ", frozen" } else { "" }
        );
        if let Some(rank) = summary.rank {
            println!("Leaderboard rank: #{rank}");
        }
    }
    Ok(())
}
