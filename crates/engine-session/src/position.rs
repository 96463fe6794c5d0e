//! Immutable position values handed to engines.

use std::fmt;
use uci::GuiCommand;

/// Standard starting position in FEN notation.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A board state as the engine sees it: a base FEN plus moves played from it.
///
/// Positions are already validated by the caller's board library. They are
/// never mutated; [`Position::with_move`] returns a new value, so the
/// position a caller passes in is exactly what it gets back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    fen: String,
    moves: Vec<String>,
}

impl Position {
    pub fn startpos() -> Self {
        Self::from_fen(STARTING_FEN)
    }

    pub fn from_fen(fen: impl Into<String>) -> Self {
        let fen: String = fen.into();
        Self {
            fen: fen.split_whitespace().collect::<Vec<_>>().join(" "),
            moves: Vec::new(),
        }
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    /// Moves (UCI notation) applied on top of the base FEN.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// The position after `mv`, which must be legal here.
    pub fn with_move(&self, mv: &str) -> Self {
        let mut next = self.clone();
        next.moves.push(mv.to_string());
        next
    }

    /// The `position` command that sets this position up.
    pub fn to_command(&self) -> GuiCommand {
        GuiCommand::Position {
            fen: Some(self.fen.clone()),
            moves: self.moves.clone(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen)?;
        if !self.moves.is_empty() {
            write!(f, " moves {}", self.moves.join(" "))?;
        }
        Ok(())
    }
}
