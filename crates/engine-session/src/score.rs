//! Engine score normalization.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

/// A position evaluation from the side to move's point of view.
///
/// Either a forced mate or a centipawn score, never both. Values are only
/// comparable within the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Mate in N moves. Positive: the side to move mates. Zero or negative:
    /// the side to move is mated (zero means it already is).
    Mate(i32),
    /// Centipawn evaluation (100 = one pawn).
    Centipawns(i32),
}

impl Score {
    /// Convert an engine-reported score. A missing score becomes zero
    /// centipawns; callers that need to tell "no line" apart from "equal"
    /// must check for the line itself.
    pub fn normalize(raw: Option<uci::Score>) -> Self {
        match raw {
            Some(uci::Score::Mate(n)) => Score::Mate(n),
            Some(uci::Score::Cp(cp)) => Score::Centipawns(cp),
            None => Score::Centipawns(0),
        }
    }

    pub fn is_mate(&self) -> bool {
        matches!(self, Score::Mate(_))
    }

    /// The raw number: moves to mate or centipawns.
    pub fn value(&self) -> i32 {
        match *self {
            Score::Mate(n) | Score::Centipawns(n) => n,
        }
    }

    /// Short human-readable form: `M3`, `M-2`, `0.35`, `-1.50`.
    pub fn display(&self) -> String {
        match *self {
            Score::Mate(n) => format!("M{}", n),
            Score::Centipawns(cp) => format!("{:.2}", f64::from(cp) / 100.0),
        }
    }
}

impl Default for Score {
    fn default() -> Self {
        Score::Centipawns(0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Score", 3)?;
        state.serialize_field("type", if self.is_mate() { "mate" } else { "cp" })?;
        state.serialize_field("value", &self.value())?;
        state.serialize_field("display", &self.display())?;
        state.end()
    }
}
