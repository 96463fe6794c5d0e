//! Chess engine sessions for a coaching backend.
//!
//! Runs a full-strength engine (Stockfish) and, optionally, a human-like
//! engine (Maia) as UCI subprocesses and exposes a small async API on top:
//!
//! - [`EngineManager::analyze_position`] - ranked candidate lines
//! - [`EngineManager::best_move`] - a move to play, optionally at a target rating
//! - [`EngineManager::evaluate_move_quality`] - how good a played move was
//!
//! Engines are found by [`Locator`], driven by [`UciEngine`] and shared by
//! [`EngineManager`]. Scores are normalized to [`Score`] and moves graded
//! with [`MoveQuality`].
//!
//! ```no_run
//! use engine_session::{CoachConfig, EngineManager, Position};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = EngineManager::new(CoachConfig::load()?);
//! if manager.initialize().await {
//!     let lines = manager
//!         .analyze_position(&Position::startpos(), 18, 3, false)
//!         .await?;
//!     println!("best: {:?} ({})", lines[0].mv, lines[0].score);
//! }
//! manager.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod analysis;
pub mod config;
mod error;
mod kind;
pub mod locator;
pub mod manager;
mod position;
pub mod quality;
mod score;

pub use adapter::{EngineCommand, Strength, UciEngine};
pub use analysis::{AnalysisLine, MoveEvaluation, SearchLimit};
pub use config::{CoachConfig, ConfigError, Persona};
pub use error::EngineError;
pub use kind::EngineKind;
pub use locator::{LocateError, Locator};
pub use manager::{EngineHealth, EngineManager};
pub use position::{Position, STARTING_FEN};
pub use quality::MoveQuality;
pub use score::Score;
