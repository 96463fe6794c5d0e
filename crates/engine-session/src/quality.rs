//! Move quality classification.

use crate::Score;
use serde::Serialize;
use std::fmt;

/// Centipawn value standing in for a forced mate when a mate score has to be
/// compared with a centipawn score. Centipawn scores are capped at the same
/// magnitude for such comparisons.
pub const MATE_EQUIVALENT_CP: i32 = 1000;

/// Classification of a move by how its outcome compares with the engine's
/// prediction for the position before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveQuality {
    /// At least a pawn better than predicted.
    Brilliant,
    /// As good as predicted, or better.
    Good,
    /// Slightly worse than predicted.
    Ok,
    /// Half a pawn to a pawn worse.
    Inaccuracy,
    /// One to three pawns worse.
    Mistake,
    /// Three pawns or more worse, or walking into a forced mate.
    Blunder,
}

impl MoveQuality {
    /// Classify a centipawn delta from the mover's point of view.
    ///
    /// | delta        | quality    |
    /// |--------------|------------|
    /// | <= -300      | blunder    |
    /// | -299 ..= -100| mistake    |
    /// | -99 ..= -50  | inaccuracy |
    /// | -49 ..= -1   | ok         |
    /// | 0 ..= 99     | good       |
    /// | >= 100       | brilliant  |
    pub fn from_delta(delta: i32) -> Self {
        match delta {
            i32::MIN..=-300 => MoveQuality::Blunder,
            -299..=-100 => MoveQuality::Mistake,
            -99..=-50 => MoveQuality::Inaccuracy,
            -49..=-1 => MoveQuality::Ok,
            0..=99 => MoveQuality::Good,
            100..=i32::MAX => MoveQuality::Brilliant,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoveQuality::Brilliant => "brilliant",
            MoveQuality::Good => "good",
            MoveQuality::Ok => "ok",
            MoveQuality::Inaccuracy => "inaccuracy",
            MoveQuality::Mistake => "mistake",
            MoveQuality::Blunder => "blunder",
        }
    }
}

impl fmt::Display for MoveQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A score seen from the mover's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outlook {
    Centipawns(i32),
    Mating,
    Mated,
}

impl Outlook {
    /// `before` is reported with the mover to move.
    fn before(score: Score) -> Self {
        match score {
            Score::Centipawns(cp) => Outlook::Centipawns(cp),
            Score::Mate(n) if n > 0 => Outlook::Mating,
            Score::Mate(_) => Outlook::Mated,
        }
    }

    /// `after` is reported with the opponent to move.
    fn after(score: Score) -> Self {
        match score {
            Score::Centipawns(cp) => Outlook::Centipawns(cp.saturating_neg()),
            Score::Mate(n) if n > 0 => Outlook::Mated,
            Score::Mate(_) => Outlook::Mating,
        }
    }

    fn capped(&self) -> i32 {
        match *self {
            Outlook::Centipawns(cp) => cp.clamp(-MATE_EQUIVALENT_CP, MATE_EQUIVALENT_CP),
            Outlook::Mating => MATE_EQUIVALENT_CP,
            Outlook::Mated => -MATE_EQUIVALENT_CP,
        }
    }
}

/// Compute the mover's delta and classify it.
///
/// `before` is the best line's score in the position before the move (mover
/// to move); `after` is the best line's score in the resulting position
/// (opponent to move). Mate and centipawn scores are never subtracted
/// directly: walking into a forced mate is always a blunder and escaping one
/// is always brilliant. The remaining mixed cases compare against
/// [`MATE_EQUIVALENT_CP`].
pub fn classify_transition(before: Score, after: Score) -> (i32, MoveQuality) {
    let (before, after) = (Outlook::before(before), Outlook::after(after));

    match (before, after) {
        (Outlook::Centipawns(b), Outlook::Centipawns(a)) => {
            let delta = a.saturating_sub(b);
            (delta, MoveQuality::from_delta(delta))
        }
        (Outlook::Mated, Outlook::Mated) | (Outlook::Mating, Outlook::Mating) => {
            (0, MoveQuality::Good)
        }
        (_, Outlook::Mated) => (
            after.capped() - before.capped(),
            MoveQuality::Blunder,
        ),
        (Outlook::Mated, _) => (
            after.capped() - before.capped(),
            MoveQuality::Brilliant,
        ),
        _ => {
            let delta = after.capped() - before.capped();
            (delta, MoveQuality::from_delta(delta))
        }
    }
}
