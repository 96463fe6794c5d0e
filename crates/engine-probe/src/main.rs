//! Engine Probe - runs one engine-session request from the command line.
//!
//! Starts the configured engines, performs a single request, prints the
//! result as JSON on stdout and shuts the engines down again. Logs go to
//! stderr; set `RUST_LOG=engine_session=debug` for protocol detail.

use anyhow::Context;
use clap::{Parser, Subcommand};
use engine_session::{CoachConfig, EngineKind, EngineManager, Position, STARTING_FEN};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Engine Probe - query the coaching engines.
#[derive(Parser)]
#[command(name = "engine-probe")]
#[command(about = "Runs a single analysis request against the configured chess engines")]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "coach.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Position given as a FEN plus moves played from it.
#[derive(clap::Args)]
struct PositionArgs {
    /// Starting FEN
    #[arg(long, default_value = STARTING_FEN)]
    fen: String,

    /// Moves played from the FEN, comma-separated UCI notation
    #[arg(long, value_delimiter = ',')]
    moves: Vec<String>,
}

impl PositionArgs {
    fn position(&self) -> Position {
        self.moves
            .iter()
            .fold(Position::from_fen(self.fen.as_str()), |position, mv| {
                position.with_move(mv)
            })
    }
}

#[derive(Subcommand)]
enum Command {
    /// Report which engines are running
    Health,

    /// Show the engine's top candidate lines
    Analyze {
        #[command(flatten)]
        position: PositionArgs,

        /// Search depth (defaults to the configured analysis depth)
        #[arg(long)]
        depth: Option<u32>,

        /// Number of lines (defaults to the configured line count)
        #[arg(long)]
        lines: Option<u32>,

        /// Ask the human-like engine when it is available
        #[arg(long)]
        human_like: bool,
    },

    /// Pick a move to play
    BestMove {
        #[command(flatten)]
        position: PositionArgs,

        /// Target rating for the strong engine
        #[arg(long, conflicts_with = "calibrated")]
        elo: Option<u32>,

        /// Play at the configured default rating
        #[arg(long)]
        calibrated: bool,

        /// Thinking time in milliseconds (defaults to the configured move time)
        #[arg(long)]
        move_time_ms: Option<u64>,

        /// Ask the human-like engine when it is available
        #[arg(long)]
        human_like: bool,
    },

    /// Classify a move played in the position
    Evaluate {
        #[command(flatten)]
        position: PositionArgs,

        /// The move to classify, in UCI notation
        #[arg(value_name = "MOVE")]
        mv: String,

        /// Search depth (defaults to the configured evaluation depth)
        #[arg(long)]
        depth: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut config = CoachConfig::load_from(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    config.apply_overrides(|key| std::env::var(key).ok());

    let manager = EngineManager::new(config);
    if !manager.initialize().await {
        tracing::warn!("Strong engine not running; most requests will fail");
    }

    let result = run(&manager, args.command).await;
    manager.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&result?)?);
    Ok(())
}

async fn run(manager: &EngineManager, command: Command) -> anyhow::Result<Value> {
    let search = &manager.settings().search;

    match command {
        Command::Health => {
            let mut engines = serde_json::Map::new();
            for kind in EngineKind::ALL {
                engines.insert(
                    kind.to_string(),
                    json!({
                        "available": manager.is_available(kind),
                        "name": manager.engine_name(kind).await,
                    }),
                );
            }
            Ok(json!({
                "health": manager.health(),
                "engines": engines,
                "persona": manager.settings().default_persona,
            }))
        }
        Command::Analyze {
            position,
            depth,
            lines,
            human_like,
        } => {
            let lines = manager
                .analyze_position(
                    &position.position(),
                    depth.unwrap_or(search.analysis_depth),
                    lines.unwrap_or(search.analysis_lines),
                    human_like,
                )
                .await?;
            Ok(serde_json::to_value(lines)?)
        }
        Command::BestMove {
            position,
            elo,
            calibrated,
            move_time_ms,
            human_like,
        } => {
            let elo = elo.or(calibrated.then_some(search.default_elo));
            let time_limit = move_time_ms.map_or(search.move_time(), Duration::from_millis);
            let mv = manager
                .best_move(&position.position(), elo, time_limit, human_like)
                .await?;
            Ok(json!({ "move": mv, "elo": elo }))
        }
        Command::Evaluate {
            position,
            mv,
            depth,
        } => {
            let evaluation = manager
                .evaluate_move_quality(
                    &position.position(),
                    &mv,
                    depth.unwrap_or(search.evaluation_depth),
                )
                .await?;
            Ok(serde_json::to_value(evaluation)?)
        }
    }
}
